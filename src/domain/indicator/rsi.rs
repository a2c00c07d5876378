//! Relative Strength Index with Wilder smoothing.
//!
//! Gains and losses are bar-over-bar close changes. Both averages are seeded
//! with the mean of the first n changes, so the first value lands on bar n
//! (window length n + 1). RSI = 100 - 100 / (1 + avg_gain / avg_loss).

use crate::domain::bar::Bar;
use crate::domain::indicator::Indicator;
use crate::domain::indicator::wilder::Wilder;

#[derive(Debug, Clone, PartialEq)]
pub struct Rsi {
    gains: Wilder,
    losses: Wilder,
}

impl Rsi {
    pub fn new(period: usize) -> Self {
        Rsi {
            gains: Wilder::new(period),
            losses: Wilder::new(period),
        }
    }
}

fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_gain == 0.0 {
        0.0
    } else if avg_loss == 0.0 {
        100.0
    } else {
        100.0 - 100.0 / (1.0 + avg_gain / avg_loss)
    }
}

impl Indicator for Rsi {
    type Output = f64;

    fn update(&mut self, window: &[Bar]) -> Option<f64> {
        let len = window.len();
        if len <= 1 {
            self.reset();
            return None;
        }

        let change = window[len - 1].close - window[len - 2].close;
        let avg_gain = self.gains.push(change.max(0.0));
        let avg_loss = self.losses.push((-change).max(0.0));

        Some(rsi_from_averages(avg_gain?, avg_loss?))
    }

    fn reset(&mut self) {
        self.gains.reset();
        self.losses.reset();
    }
}
