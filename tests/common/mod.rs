#![allow(dead_code)]

use chrono::{Duration, NaiveDate, NaiveDateTime};
use intraday_backtest::domain::backtest::BacktestConfig;
use intraday_backtest::domain::bar::Bar;
use intraday_backtest::domain::error::BacktestError;
use intraday_backtest::ports::data_port::DataPort;
use std::io::Write;

pub struct MockDataPort {
    pub bars: Vec<Bar>,
    pub error: Option<String>,
}

impl MockDataPort {
    pub fn new(bars: Vec<Bar>) -> Self {
        Self { bars, error: None }
    }

    pub fn failing(reason: &str) -> Self {
        Self {
            bars: Vec::new(),
            error: Some(reason.to_string()),
        }
    }
}

impl DataPort for MockDataPort {
    fn fetch_bars(&self) -> Result<Vec<Bar>, BacktestError> {
        match &self.error {
            Some(reason) => Err(BacktestError::Data {
                reason: reason.clone(),
            }),
            None => Ok(self.bars.clone()),
        }
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn open_of(day: NaiveDate) -> NaiveDateTime {
    day.and_hms_opt(9, 30, 0).unwrap()
}

/// Minute bars from 09:30 on `day`, one per `(open, high, low, close)` row.
pub fn ohlc_bars(day: NaiveDate, rows: &[(f64, f64, f64, f64)]) -> Vec<Bar> {
    let start = open_of(day);
    rows.iter()
        .enumerate()
        .map(|(i, &(open, high, low, close))| Bar {
            timestamp: start + Duration::minutes(i as i64),
            volume: 1_000,
            open,
            high,
            low,
            close,
        })
        .collect()
}

/// Flat minute bars (open = high = low = close) on `day`.
pub fn close_bars(day: NaiveDate, closes: &[f64]) -> Vec<Bar> {
    let rows: Vec<_> = closes.iter().map(|&c| (c, c, c, c)).collect();
    ohlc_bars(day, &rows)
}

/// `days` consecutive sessions starting 2020-04-27, each with `closes`.
pub fn repeated_days(days: usize, closes: &[f64]) -> Vec<Bar> {
    (0..days)
        .flat_map(|d| close_bars(date(2020, 4, 27) + Duration::days(d as i64), closes))
        .collect()
}

/// A deterministic wavy series with a spread between high and low.
pub fn wave_bars(day: NaiveDate, len: usize) -> Vec<Bar> {
    let rows: Vec<_> = (0..len)
        .map(|i| {
            let t = i as f64;
            let close = 100.0 + 5.0 * (t / 7.0).sin() + 2.0 * (t / 3.0).cos();
            let open = close - 0.3 * (t / 5.0).sin();
            (open, open.max(close) + 0.4, open.min(close) - 0.4, close)
        })
        .collect();
    ohlc_bars(day, &rows)
}

pub fn sample_config(session_length: usize) -> BacktestConfig {
    BacktestConfig {
        session_length,
        ..BacktestConfig::default()
    }
}

/// Writes bars in the headerless `datetime,volume,open,high,low,close` layout.
pub fn write_bars_csv(bars: &[Bar]) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    for b in bars {
        writeln!(
            file,
            "{},{},{},{},{},{}",
            b.timestamp.format("%Y-%m-%d %H:%M:%S"),
            b.volume,
            b.open,
            b.high,
            b.low,
            b.close
        )
        .unwrap();
    }
    file.flush().unwrap();
    file
}

pub fn write_temp_ini(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}
