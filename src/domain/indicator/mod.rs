//! Incremental technical indicators.
//!
//! Every indicator consumes the current session window (session start through
//! the current bar) once per bar and does O(1) work. A window of length 1 marks
//! a new session and resets the recurrence state. `None` means the indicator
//! is still warming up.
//!
//! - `Indicator`: the per-bar update contract
//! - `IndicatorType`: indicator identity + parameters, parsed from config
//! - `IndicatorPanel`: a configured list of extra indicators reported by name

pub mod adx;
pub mod atr;
pub mod ema;
pub mod heikin_ashi;
pub mod macd;
pub mod rsi;
pub mod sma;
pub mod wilder;

use crate::domain::bar::Bar;
use std::fmt;
use std::str::FromStr;

pub use adx::Adx;
pub use atr::Atr;
pub use ema::Ema;
pub use heikin_ashi::{HaCandle, HeikinAshi};
pub use macd::Macd;
pub use rsi::Rsi;
pub use sma::Sma;
pub use wilder::{ValueEma, Wilder};

pub trait Indicator {
    type Output;

    /// Advances by the window's last bar.
    fn update(&mut self, window: &[Bar]) -> Option<Self::Output>;

    fn reset(&mut self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndicatorType {
    Sma(usize),
    Ema(usize),
    Macd { short: usize, long: usize },
    Rsi(usize),
    Atr(usize),
    Adx(usize),
    HeikinAshi,
}

impl fmt::Display for IndicatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorType::Sma(period) => write!(f, "SMA({})", period),
            IndicatorType::Ema(period) => write!(f, "EMA({})", period),
            IndicatorType::Macd { short, long } => write!(f, "MACD({},{})", short, long),
            IndicatorType::Rsi(period) => write!(f, "RSI({})", period),
            IndicatorType::Atr(period) => write!(f, "ATR({})", period),
            IndicatorType::Adx(period) => write!(f, "ADX({})", period),
            IndicatorType::HeikinAshi => write!(f, "HA"),
        }
    }
}

impl FromStr for IndicatorType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (name, args) = match s.split_once('(') {
            Some((name, rest)) => {
                let args = rest
                    .strip_suffix(')')
                    .ok_or_else(|| format!("missing ')' in '{s}'"))?;
                (name.trim(), Some(args))
            }
            None => (s, None),
        };

        let periods: Vec<usize> = match args {
            Some(args) => args
                .split(',')
                .map(|a| {
                    a.trim()
                        .parse::<usize>()
                        .map_err(|_| format!("invalid period '{}' in '{s}'", a.trim()))
                })
                .collect::<Result<_, _>>()?,
            None => Vec::new(),
        };
        if periods.contains(&0) {
            return Err(format!("periods must be positive in '{s}'"));
        }

        let single = |build: fn(usize) -> IndicatorType| match periods.as_slice() {
            [period] => Ok(build(*period)),
            _ => Err(format!("'{name}' takes exactly one period")),
        };

        match name.to_uppercase().as_str() {
            "SMA" => single(IndicatorType::Sma),
            "EMA" => single(IndicatorType::Ema),
            "RSI" => single(IndicatorType::Rsi),
            "ATR" => single(IndicatorType::Atr),
            "ADX" => single(IndicatorType::Adx),
            "MACD" => match periods.as_slice() {
                [short, long] if short < long => Ok(IndicatorType::Macd {
                    short: *short,
                    long: *long,
                }),
                [_, _] => Err(format!("MACD short period must be below long in '{s}'")),
                _ => Err("MACD takes two periods".to_string()),
            },
            "HA" if periods.is_empty() => Ok(IndicatorType::HeikinAshi),
            "HA" => Err("HA takes no periods".to_string()),
            other => Err(format!("unknown indicator '{other}'")),
        }
    }
}

impl IndicatorType {
    pub fn build(&self) -> PanelIndicator {
        match *self {
            IndicatorType::Sma(p) => PanelIndicator::Sma(Sma::new(p)),
            IndicatorType::Ema(p) => PanelIndicator::Ema(Ema::new(p)),
            IndicatorType::Macd { short, long } => PanelIndicator::Macd(Macd::new(short, long)),
            IndicatorType::Rsi(p) => PanelIndicator::Rsi(Rsi::new(p)),
            IndicatorType::Atr(p) => PanelIndicator::Atr(Atr::new(p)),
            IndicatorType::Adx(p) => PanelIndicator::Adx(Adx::new(p)),
            IndicatorType::HeikinAshi => PanelIndicator::HeikinAshi(HeikinAshi::new()),
        }
    }
}

/// Parses a comma-separated indicator list such as `ATR(14), MACD(12,26), HA`.
pub fn parse_indicator_list(s: &str) -> Result<Vec<IndicatorType>, String> {
    let mut out = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;
    for (i, ch) in s.char_indices() {
        match ch {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                push_entry(&s[start..i], &mut out)?;
                start = i + 1;
            }
            _ => {}
        }
    }
    push_entry(&s[start..], &mut out)?;
    Ok(out)
}

fn push_entry(entry: &str, out: &mut Vec<IndicatorType>) -> Result<(), String> {
    if !entry.trim().is_empty() {
        out.push(entry.parse()?);
    }
    Ok(())
}

/// Any indicator reduced to one number per bar. Heikin-Ashi reports its close.
#[derive(Debug, Clone, PartialEq)]
pub enum PanelIndicator {
    Sma(Sma),
    Ema(Ema),
    Macd(Macd),
    Rsi(Rsi),
    Atr(Atr),
    Adx(Adx),
    HeikinAshi(HeikinAshi),
}

impl Indicator for PanelIndicator {
    type Output = f64;

    fn update(&mut self, window: &[Bar]) -> Option<f64> {
        match self {
            PanelIndicator::Sma(i) => i.update(window),
            PanelIndicator::Ema(i) => i.update(window),
            PanelIndicator::Macd(i) => i.update(window),
            PanelIndicator::Rsi(i) => i.update(window),
            PanelIndicator::Atr(i) => i.update(window),
            PanelIndicator::Adx(i) => i.update(window),
            PanelIndicator::HeikinAshi(i) => i.update(window).map(|c| c.close),
        }
    }

    fn reset(&mut self) {
        match self {
            PanelIndicator::Sma(i) => i.reset(),
            PanelIndicator::Ema(i) => i.reset(),
            PanelIndicator::Macd(i) => i.reset(),
            PanelIndicator::Rsi(i) => i.reset(),
            PanelIndicator::Atr(i) => i.reset(),
            PanelIndicator::Adx(i) => i.reset(),
            PanelIndicator::HeikinAshi(i) => i.reset(),
        }
    }
}

/// Extra indicators a strategy carries for reporting only.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndicatorPanel {
    entries: Vec<(String, PanelIndicator)>,
}

impl IndicatorPanel {
    pub fn new(types: &[IndicatorType]) -> Self {
        IndicatorPanel {
            entries: types.iter().map(|t| (t.to_string(), t.build())).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn update(&mut self, window: &[Bar]) -> Vec<(String, Option<f64>)> {
        self.entries
            .iter_mut()
            .map(|(name, ind)| (name.clone(), ind.update(window)))
            .collect()
    }

    pub fn reset(&mut self) {
        for (_, ind) in &mut self.entries {
            ind.reset();
        }
    }
}
