//! Simple Moving Average over a running sum.

use crate::domain::bar::{Bar, BarField};
use crate::domain::indicator::Indicator;

#[derive(Debug, Clone, PartialEq)]
pub struct Sma {
    period: usize,
    field: BarField,
    sum: f64,
}

impl Sma {
    pub fn new(period: usize) -> Self {
        Sma::on_field(period, BarField::Close)
    }

    pub fn on_field(period: usize, field: BarField) -> Self {
        Sma {
            period,
            field,
            sum: 0.0,
        }
    }

    pub fn period(&self) -> usize {
        self.period
    }
}

impl Indicator for Sma {
    type Output = f64;

    fn update(&mut self, window: &[Bar]) -> Option<f64> {
        let last = window.last()?;
        if window.len() == 1 {
            self.reset();
        }
        if self.period == 0 {
            return None;
        }

        self.sum += last.field(self.field);
        let len = window.len();
        if len > self.period {
            self.sum -= window[len - 1 - self.period].field(self.field);
        }

        (len >= self.period).then(|| self.sum / self.period as f64)
    }

    fn reset(&mut self) {
        self.sum = 0.0;
    }
}
