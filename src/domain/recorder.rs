//! Time-aligned per-bar series for recorded sessions.

use crate::domain::bar::Bar;
use crate::domain::order::Direction;
use crate::domain::strategy::StrategyUpdate;
use chrono::{NaiveDate, NaiveDateTime};
use std::collections::BTreeMap;

/// Named series that always share one length. A name first reported late is
/// back-filled with `None`; a name missing from a row gets `None`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SeriesSet {
    len: usize,
    series: BTreeMap<String, Vec<Option<f64>>>,
}

impl SeriesSet {
    pub fn push_row(&mut self, values: &[(String, Option<f64>)]) {
        for (name, value) in values {
            let len = self.len;
            let column = self
                .series
                .entry(name.clone())
                .or_insert_with(|| vec![None; len]);
            if column.len() == len {
                column.push(*value);
            }
        }
        self.len += 1;
        for column in self.series.values_mut() {
            if column.len() < self.len {
                column.push(None);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn get(&self, name: &str) -> Option<&[Option<f64>]> {
        self.series.get(name).map(Vec::as_slice)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.series.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Option<f64>])> {
        self.series.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }
}

/// Everything recorded for one session, one entry per bar.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedSession {
    pub index: usize,
    pub date: NaiveDate,
    pub timestamps: Vec<NaiveDateTime>,
    pub closes: Vec<f64>,
    pub metrics: SeriesSet,
    pub sub_metrics: SeriesSet,
    /// Close price on bars with a long marker.
    pub long_markers: Vec<Option<f64>>,
    /// Close price on bars with a short marker.
    pub short_markers: Vec<Option<f64>>,
}

impl RecordedSession {
    pub fn new(index: usize, date: NaiveDate) -> Self {
        RecordedSession {
            index,
            date,
            timestamps: Vec::new(),
            closes: Vec::new(),
            metrics: SeriesSet::default(),
            sub_metrics: SeriesSet::default(),
            long_markers: Vec::new(),
            short_markers: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    pub fn record(&mut self, bar: &Bar, update: &StrategyUpdate) {
        self.timestamps.push(bar.timestamp);
        self.closes.push(bar.close);
        self.metrics.push_row(&update.metrics);
        self.sub_metrics.push_row(&update.sub_metrics);

        let (long, short) = match update.direction {
            Some(Direction::Long) => (Some(bar.close), None),
            Some(Direction::Short) => (None, Some(bar.close)),
            None => (None, None),
        };
        self.long_markers.push(long);
        self.short_markers.push(short);
    }
}

#[derive(Debug, Clone, Default)]
pub struct MetricRecorder {
    sessions: Vec<RecordedSession>,
    current: Option<RecordedSession>,
}

impl MetricRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a session, finishing any session still open.
    pub fn begin(&mut self, index: usize, date: NaiveDate) {
        self.finish();
        self.current = Some(RecordedSession::new(index, date));
    }

    /// Records one bar into the open session. A no-op outside a session.
    pub fn record(&mut self, bar: &Bar, update: &StrategyUpdate) {
        if let Some(session) = self.current.as_mut() {
            session.record(bar, update);
        }
    }

    pub fn finish(&mut self) {
        if let Some(session) = self.current.take() {
            self.sessions.push(session);
        }
    }

    pub fn is_recording(&self) -> bool {
        self.current.is_some()
    }

    pub fn sessions(&self) -> &[RecordedSession] {
        &self.sessions
    }

    pub fn into_sessions(mut self) -> Vec<RecordedSession> {
        self.finish();
        self.sessions
    }
}
