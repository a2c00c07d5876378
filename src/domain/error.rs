//! Domain error types.

use crate::domain::order::{Direction, OrderType};

/// Top-level error type for the backtester.
#[derive(Debug, thiserror::Error)]
pub enum BacktestError {
    #[error("order type {order_type} is not supported")]
    InvalidOrderType { order_type: OrderType },

    #[error("invalid {direction} order size {size}: {reason}")]
    InvalidOrderSize {
        direction: Direction,
        size: u64,
        reason: String,
    },

    #[error("no bar has been seen yet, cannot fill {order_type} order")]
    NoMarketData { order_type: OrderType },

    #[error("data error: {reason}")]
    Data { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl BacktestError {
    pub(crate) fn invalid(section: &str, key: &str, reason: impl Into<String>) -> Self {
        BacktestError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<&BacktestError> for std::process::ExitCode {
    fn from(err: &BacktestError) -> Self {
        let code: u8 = match err {
            BacktestError::Io(_) | BacktestError::Csv(_) => 1,
            BacktestError::ConfigParse { .. }
            | BacktestError::ConfigMissing { .. }
            | BacktestError::ConfigInvalid { .. } => 2,
            BacktestError::Data { .. } => 3,
            BacktestError::InvalidOrderType { .. }
            | BacktestError::InvalidOrderSize { .. }
            | BacktestError::NoMarketData { .. } => 4,
        };
        std::process::ExitCode::from(code)
    }
}
