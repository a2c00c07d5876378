//! Bar source port trait.

use crate::domain::bar::Bar;
use crate::domain::error::BacktestError;
use chrono::NaiveDateTime;
use std::collections::BTreeSet;

/// Extent of the available bar data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataRange {
    pub first: NaiveDateTime,
    pub last: NaiveDateTime,
    pub bars: usize,
    pub days: usize,
}

impl DataRange {
    pub fn of(bars: &[Bar]) -> Option<DataRange> {
        let first = bars.first()?.timestamp;
        let last = bars.last()?.timestamp;
        let days = bars.iter().map(Bar::date).collect::<BTreeSet<_>>().len();
        Some(DataRange {
            first,
            last,
            bars: bars.len(),
            days,
        })
    }
}

pub trait DataPort {
    /// All bars in ascending timestamp order.
    fn fetch_bars(&self) -> Result<Vec<Bar>, BacktestError>;

    fn data_range(&self) -> Result<Option<DataRange>, BacktestError> {
        Ok(DataRange::of(&self.fetch_bars()?))
    }
}
