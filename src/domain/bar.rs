//! OHLCV bar representation.

use chrono::{NaiveDate, NaiveDateTime};
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    pub timestamp: NaiveDateTime,
    pub volume: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

/// Columns of a bar, in data-file order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BarField {
    Timestamp,
    Volume,
    Open,
    High,
    Low,
    Close,
}

impl Bar {
    pub fn date(&self) -> NaiveDate {
        self.timestamp.date()
    }

    /// Numeric value of a price or volume column. The timestamp reads as seconds
    /// since the Unix epoch.
    pub fn field(&self, field: BarField) -> f64 {
        match field {
            BarField::Timestamp => self.timestamp.and_utc().timestamp() as f64,
            BarField::Volume => self.volume as f64,
            BarField::Open => self.open,
            BarField::High => self.high,
            BarField::Low => self.low,
            BarField::Close => self.close,
        }
    }

    /// (open + high + low + close) / 4
    pub fn average_price(&self) -> f64 {
        (self.open + self.high + self.low + self.close) / 4.0
    }

    /// max(high, prev_close) - min(low, prev_close)
    pub fn true_range(&self, prev_close: f64) -> f64 {
        self.high.max(prev_close) - self.low.min(prev_close)
    }
}

impl fmt::Display for BarField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BarField::Timestamp => "timestamp",
            BarField::Volume => "volume",
            BarField::Open => "open",
            BarField::High => "high",
            BarField::Low => "low",
            BarField::Close => "close",
        };
        f.write_str(name)
    }
}
