//! Average True Range.
//!
//! TR = max(high, prev_close) - min(low, prev_close); the first bar of a session
//! uses high - low. Seeded with the mean of the first n TRs, then Wilder.

use crate::domain::bar::Bar;
use crate::domain::indicator::Indicator;
use crate::domain::indicator::wilder::Wilder;

#[derive(Debug, Clone, PartialEq)]
pub struct Atr {
    average: Wilder,
}

impl Atr {
    pub fn new(period: usize) -> Self {
        Atr {
            average: Wilder::new(period),
        }
    }

    /// Latest value without consuming a bar.
    pub fn value(&self) -> Option<f64> {
        self.average.value()
    }
}

/// True range of the window's last bar.
pub(crate) fn window_true_range(window: &[Bar]) -> Option<f64> {
    let len = window.len();
    let bar = window.last()?;
    Some(match len {
        1 => bar.high - bar.low,
        _ => bar.true_range(window[len - 2].close),
    })
}

impl Indicator for Atr {
    type Output = f64;

    fn update(&mut self, window: &[Bar]) -> Option<f64> {
        let tr = window_true_range(window)?;
        if window.len() == 1 {
            self.reset();
        }
        self.average.push(tr)
    }

    fn reset(&mut self) {
        self.average.reset();
    }
}
