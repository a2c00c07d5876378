//! CSV adapter for minute bar files.
//!
//! Reads headerless rows of `datetime,volume,open,high,low,close`, e.g.
//! `2020-04-28 09:30:00,1520,284.1,284.5,283.9,284.2`. Seconds are optional.

use crate::domain::bar::Bar;
use crate::domain::error::BacktestError;
use crate::ports::data_port::DataPort;
use chrono::NaiveDateTime;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"];

pub struct CsvAdapter {
    path: PathBuf,
}

impl CsvAdapter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_bars(&self) -> Result<Vec<Bar>, BacktestError> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(false)
            .trim(csv::Trim::All)
            .flexible(true)
            .from_path(&self.path)
            .map_err(|e| BacktestError::Data {
                reason: format!("failed to open {}: {e}", self.path.display()),
            })?;

        let mut bars = Vec::new();
        for (i, record) in rdr.records().enumerate() {
            let line = i + 1;
            let record = record.map_err(|e| BacktestError::Data {
                reason: format!("{} line {line}: {e}", self.path.display()),
            })?;
            if record.iter().all(str::is_empty) {
                continue;
            }
            bars.push(parse_record(&record).map_err(|reason| BacktestError::Data {
                reason: format!("{} line {line}: {reason}", self.path.display()),
            })?);
        }
        Ok(bars)
    }
}

fn parse_record(record: &csv::StringRecord) -> Result<Bar, String> {
    if record.len() < 6 {
        return Err(format!("expected 6 fields, found {}", record.len()));
    }
    Ok(Bar {
        timestamp: parse_datetime(&record[0])?,
        volume: parse_volume(&record[1])?,
        open: parse_price(&record[2], "open")?,
        high: parse_price(&record[3], "high")?,
        low: parse_price(&record[4], "low")?,
        close: parse_price(&record[5], "close")?,
    })
}

fn parse_datetime(s: &str) -> Result<NaiveDateTime, String> {
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .ok_or_else(|| format!("invalid datetime '{s}'"))
}

/// Volume is an integer; some exports write it as `1520.0`.
fn parse_volume(s: &str) -> Result<i64, String> {
    i64::from_str(s)
        .or_else(|_| s.parse::<f64>().map(|v| v as i64))
        .map_err(|_| format!("invalid volume '{s}'"))
}

fn parse_price(s: &str, name: &str) -> Result<f64, String> {
    match s.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(format!("invalid {name} '{s}'")),
    }
}

impl DataPort for CsvAdapter {
    fn fetch_bars(&self) -> Result<Vec<Bar>, BacktestError> {
        let mut bars = self.read_bars()?;
        if bars.is_empty() {
            return Err(BacktestError::Data {
                reason: format!("no bars in {}", self.path.display()),
            });
        }
        bars.sort_by_key(|b| b.timestamp);
        debug!(path = %self.path.display(), bars = bars.len(), "loaded bars");
        Ok(bars)
    }
}
