//! Exponential Moving Average.
//!
//! rate = smoothing / (1 + n). Seeded with SMA(n) once n bars are in the
//! window, then EMA' = x * rate + EMA * (1 - rate).

use crate::domain::bar::{Bar, BarField};
use crate::domain::indicator::Indicator;
use crate::domain::indicator::wilder::ValueEma;

#[derive(Debug, Clone, PartialEq)]
pub struct Ema {
    field: BarField,
    inner: ValueEma,
}

impl Ema {
    pub fn new(period: usize) -> Self {
        Ema::with_smoothing(period, ValueEma::DEFAULT_SMOOTHING)
    }

    pub fn with_smoothing(period: usize, smoothing: f64) -> Self {
        Ema {
            field: BarField::Close,
            inner: ValueEma::with_smoothing(period, smoothing),
        }
    }

    pub fn on_field(mut self, field: BarField) -> Self {
        self.field = field;
        self
    }
}

impl Indicator for Ema {
    type Output = f64;

    fn update(&mut self, window: &[Bar]) -> Option<f64> {
        let last = window.last()?;
        if window.len() == 1 {
            self.reset();
        }
        self.inner.push(last.field(self.field))
    }

    fn reset(&mut self) {
        self.inner.reset();
    }
}
