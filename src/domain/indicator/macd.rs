//! MACD line: EMA(short) - EMA(long).

use crate::domain::bar::Bar;
use crate::domain::indicator::Indicator;
use crate::domain::indicator::ema::Ema;

#[derive(Debug, Clone, PartialEq)]
pub struct Macd {
    short: Ema,
    long: Ema,
}

impl Macd {
    pub fn new(short_period: usize, long_period: usize) -> Self {
        Macd {
            short: Ema::new(short_period),
            long: Ema::new(long_period),
        }
    }
}

impl Indicator for Macd {
    type Output = f64;

    fn update(&mut self, window: &[Bar]) -> Option<f64> {
        // both averages must see every bar
        let short = self.short.update(window);
        let long = self.long.update(window);
        Some(short? - long?)
    }

    fn reset(&mut self) {
        self.short.reset();
        self.long.reset();
    }
}
