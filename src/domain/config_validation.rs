//! Configuration validation.
//!
//! Checks every configured value before a run. Absent optional keys fall back
//! to their defaults; present keys must parse and be in range.

use crate::domain::backtest::RecordSelection;
use crate::domain::error::BacktestError;
use crate::domain::indicator::parse_indicator_list;
use crate::domain::session::TrailingSession;
use crate::domain::strategy::{
    DEFAULT_LONG_PERIOD, DEFAULT_RSI_MAX, DEFAULT_RSI_MIN, DEFAULT_SHORT_PERIOD, StrategyName,
};
use crate::ports::config_port::{ConfigPort, parse_bool};
use std::str::FromStr;

pub fn validate_backtest_config(config: &dyn ConfigPort) -> Result<(), BacktestError> {
    validate_starting_balance(config)?;
    validate_session_length(config)?;
    parse_optional::<TrailingSession>(config, "backtest", "trailing_session")?;
    parse_optional::<RecordSelection>(config, "backtest", "record")?;
    for key in ["stop_after_record", "skip_unrecorded", "allow_reversal"] {
        validate_bool(config, "backtest", key)?;
    }
    Ok(())
}

pub fn validate_strategy_config(config: &dyn ConfigPort) -> Result<(), BacktestError> {
    let kind = strategy_name(config)?;
    validate_order_size(config)?;

    match kind {
        StrategyName::MaCrossover => validate_short_long(config)?,
        StrategyName::MacdCrossover => {
            validate_short_long(config)?;
            positive_int(config, "signal_period")?;
        }
        StrategyName::RsiPosition => validate_rsi(config)?,
        StrategyName::HeikinAshi => {
            positive_int(config, "heikin_period")?;
        }
    }

    if let Some(panel) = config.get_string("strategy", "panel") {
        parse_indicator_list(&panel)
            .map_err(|reason| BacktestError::invalid("strategy", "panel", reason))?;
    }
    Ok(())
}

/// The configured strategy kind; required.
pub fn strategy_name(config: &dyn ConfigPort) -> Result<StrategyName, BacktestError> {
    let kind = config
        .get_string("strategy", "kind")
        .ok_or_else(|| BacktestError::ConfigMissing {
            section: "strategy".to_string(),
            key: "kind".to_string(),
        })?;
    kind.parse::<StrategyName>()
        .map_err(|reason: String| BacktestError::invalid("strategy", "kind", reason))
}

pub(crate) fn parse_optional<T>(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<Option<T>, BacktestError>
where
    T: FromStr,
    T::Err: ToString,
{
    config
        .get_string(section, key)
        .map(|v| {
            v.parse::<T>()
                .map_err(|e| BacktestError::invalid(section, key, e.to_string()))
        })
        .transpose()
}

pub(crate) fn parse_number<T: FromStr>(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<Option<T>, BacktestError> {
    config
        .get_string(section, key)
        .map(|v| {
            v.parse::<T>()
                .map_err(|_| BacktestError::invalid(section, key, format!("'{v}' is not a number")))
        })
        .transpose()
}

fn validate_starting_balance(config: &dyn ConfigPort) -> Result<(), BacktestError> {
    if let Some(value) = parse_number::<f64>(config, "backtest", "starting_balance")? {
        if !(value > 0.0 && value.is_finite()) {
            return Err(BacktestError::invalid(
                "backtest",
                "starting_balance",
                "starting_balance must be positive",
            ));
        }
    }
    Ok(())
}

fn validate_session_length(config: &dyn ConfigPort) -> Result<(), BacktestError> {
    if let Some(value) = parse_number::<i64>(config, "backtest", "session_length")? {
        if value < 1 {
            return Err(BacktestError::invalid(
                "backtest",
                "session_length",
                "session_length must be at least 1",
            ));
        }
    }
    Ok(())
}

fn validate_bool(config: &dyn ConfigPort, section: &str, key: &str) -> Result<(), BacktestError> {
    match config.get_string(section, key) {
        Some(v) if parse_bool(&v).is_none() => Err(BacktestError::invalid(
            section,
            key,
            format!("'{v}' is not a boolean"),
        )),
        _ => Ok(()),
    }
}

fn validate_order_size(config: &dyn ConfigPort) -> Result<(), BacktestError> {
    positive_int(config, "order_size").map(|_| ())
}

/// A `[strategy]` integer that must be at least 1 when present.
fn positive_int(config: &dyn ConfigPort, key: &str) -> Result<Option<i64>, BacktestError> {
    let value = parse_number::<i64>(config, "strategy", key)?;
    if let Some(v) = value {
        if v < 1 {
            return Err(BacktestError::invalid(
                "strategy",
                key,
                format!("{key} must be at least 1"),
            ));
        }
    }
    Ok(value)
}

fn validate_short_long(config: &dyn ConfigPort) -> Result<(), BacktestError> {
    let short = positive_int(config, "short_period")?.unwrap_or(DEFAULT_SHORT_PERIOD as i64);
    let long = positive_int(config, "long_period")?.unwrap_or(DEFAULT_LONG_PERIOD as i64);
    if short >= long {
        return Err(BacktestError::invalid(
            "strategy",
            "short_period",
            "short_period must be below long_period",
        ));
    }
    Ok(())
}

fn validate_rsi(config: &dyn ConfigPort) -> Result<(), BacktestError> {
    positive_int(config, "rsi_period")?;
    let min = parse_number::<f64>(config, "strategy", "rsi_min")?.unwrap_or(DEFAULT_RSI_MIN);
    let max = parse_number::<f64>(config, "strategy", "rsi_max")?.unwrap_or(DEFAULT_RSI_MAX);
    if !(0.0..=100.0).contains(&min) || !(0.0..=100.0).contains(&max) {
        return Err(BacktestError::invalid(
            "strategy",
            "rsi_min",
            "RSI thresholds must be within 0 and 100",
        ));
    }
    if min >= max {
        return Err(BacktestError::invalid(
            "strategy",
            "rsi_min",
            "rsi_min must be below rsi_max",
        ));
    }
    Ok(())
}
