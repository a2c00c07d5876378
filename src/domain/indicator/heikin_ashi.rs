//! Heikin-Ashi candles.

use crate::domain::bar::Bar;
use crate::domain::indicator::Indicator;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HaCandle {
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

impl HaCandle {
    pub fn is_bearish(&self) -> bool {
        self.open > self.close
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct HeikinAshi {
    prev: Option<HaCandle>,
}

impl HeikinAshi {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Indicator for HeikinAshi {
    type Output = HaCandle;

    fn update(&mut self, window: &[Bar]) -> Option<HaCandle> {
        let bar = window.last()?;
        if window.len() == 1 {
            self.reset();
        }

        let open = match self.prev {
            Some(prev) => (prev.open + prev.close) / 2.0,
            None => (bar.open + bar.close) / 2.0,
        };
        let close = bar.average_price();
        let candle = HaCandle {
            open,
            high: bar.high.max(open).max(close),
            low: bar.low.min(open).min(close),
            close,
        };

        self.prev = Some(candle);
        Some(candle)
    }

    fn reset(&mut self) {
        self.prev = None;
    }
}
