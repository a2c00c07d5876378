//! Report generation port trait.

use crate::domain::backtest::BacktestResult;
use crate::domain::error::BacktestError;
use std::path::Path;

/// Port for writing backtest reports.
pub trait ReportPort {
    /// Writes the recorded per-bar series.
    fn write_series(&self, result: &BacktestResult, output_path: &Path)
        -> Result<(), BacktestError>;

    /// Writes the account summary.
    fn write_summary(&self, result: &BacktestResult, output_path: &Path)
        -> Result<(), BacktestError>;
}
