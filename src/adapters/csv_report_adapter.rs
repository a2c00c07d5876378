//! CSV report adapter implementing ReportPort.
//!
//! The series file has one row per recorded bar:
//! `session,timestamp,close,<metrics...>,<sub-metrics...>,long_marker,short_marker`.
//! Metric columns are the union of names over all recorded sessions, sorted;
//! missing values are left empty. The summary file is `metric,value` rows.

use crate::domain::backtest::BacktestResult;
use crate::domain::error::BacktestError;
use crate::domain::recorder::{RecordedSession, SeriesSet};
use crate::ports::report_port::ReportPort;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::info;

pub struct CsvReportAdapter;

impl CsvReportAdapter {
    pub fn new() -> Self {
        Self
    }

    /// `out/run.csv` -> `out/run.summary.csv`.
    pub fn summary_path(series_path: &Path) -> PathBuf {
        let stem = series_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "report".to_string());
        series_path.with_file_name(format!("{stem}.summary.csv"))
    }
}

impl Default for CsvReportAdapter {
    fn default() -> Self {
        Self::new()
    }
}

fn column_names<'a>(
    sessions: &'a [RecordedSession],
    pick: impl Fn(&'a RecordedSession) -> &'a SeriesSet,
) -> Vec<&'a str> {
    sessions
        .iter()
        .flat_map(|s| pick(s).names())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

fn cell(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn series_cell(set: &SeriesSet, name: &str, row: usize) -> String {
    cell(set.get(name).and_then(|column| column.get(row).copied().flatten()))
}

impl ReportPort for CsvReportAdapter {
    fn write_series(
        &self,
        result: &BacktestResult,
        output_path: &Path,
    ) -> Result<(), BacktestError> {
        let metric_names = column_names(&result.sessions, |s| &s.metrics);
        let sub_names = column_names(&result.sessions, |s| &s.sub_metrics);

        let mut wtr = csv::Writer::from_path(output_path)?;
        let mut header = vec!["session", "timestamp", "close"];
        header.extend(&metric_names);
        header.extend(&sub_names);
        header.extend(["long_marker", "short_marker"]);
        wtr.write_record(&header)?;

        let mut rows = 0usize;
        for session in &result.sessions {
            for i in 0..session.len() {
                let mut record = vec![
                    session.index.to_string(),
                    session.timestamps[i].format("%Y-%m-%d %H:%M:%S").to_string(),
                    session.closes[i].to_string(),
                ];
                record.extend(
                    metric_names
                        .iter()
                        .map(|name| series_cell(&session.metrics, name, i)),
                );
                record.extend(
                    sub_names
                        .iter()
                        .map(|name| series_cell(&session.sub_metrics, name, i)),
                );
                record.push(cell(session.long_markers[i]));
                record.push(cell(session.short_markers[i]));
                wtr.write_record(&record)?;
                rows += 1;
            }
        }
        wtr.flush()?;
        info!(path = %output_path.display(), rows, "series written");
        Ok(())
    }

    fn write_summary(
        &self,
        result: &BacktestResult,
        output_path: &Path,
    ) -> Result<(), BacktestError> {
        let mut wtr = csv::Writer::from_path(output_path)?;
        wtr.write_record(["metric", "value"])?;
        wtr.write_record(["strategy", result.strategy.as_str()])?;
        for (name, value) in result.report.entries() {
            wtr.write_record([name, value.to_string().as_str()])?;
        }
        wtr.write_record(["final_position", result.final_position.to_string().as_str()])?;
        wtr.write_record([
            "sessions_processed",
            result.sessions_processed.to_string().as_str(),
        ])?;
        wtr.write_record(["sessions_skipped", result.sessions_skipped.to_string().as_str()])?;
        wtr.write_record(["bars_processed", result.bars_processed.to_string().as_str()])?;
        wtr.flush()?;
        info!(path = %output_path.display(), "summary written");
        Ok(())
    }
}
