//! Session partitioning and the per-bar session window.
//!
//! Bars arrive as one flat, ascending sequence. A session is a fixed-length
//! contiguous run of that sequence (one trading day of minute bars by default).

use crate::domain::bar::Bar;
use chrono::NaiveDate;
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_SESSION_LENGTH: usize = 390;

/// What to do with a final run of bars shorter than the session length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrailingSession {
    /// Drop the partial session.
    #[default]
    Skip,
    /// Replay it as a short session; its last bar is the session's last bar.
    Process,
}

impl fmt::Display for TrailingSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrailingSession::Skip => f.write_str("skip"),
            TrailingSession::Process => f.write_str("process"),
        }
    }
}

impl FromStr for TrailingSession {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "skip" => Ok(TrailingSession::Skip),
            "process" => Ok(TrailingSession::Process),
            other => Err(format!("expected skip or process, got '{other}'")),
        }
    }
}

/// A session's slice of the bar sequence.
#[derive(Debug, Clone, Copy)]
pub struct Session<'a> {
    pub index: usize,
    pub bars: &'a [Bar],
}

impl<'a> Session<'a> {
    pub fn date(&self) -> Option<NaiveDate> {
        self.bars.first().map(Bar::date)
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// Window over the session's first `bar_index + 1` bars.
    pub fn window(&self, bar_index: usize) -> SessionWindow<'a> {
        SessionWindow {
            bars: &self.bars[..=bar_index],
            session_len: self.bars.len(),
        }
    }
}

/// Number of sessions `total_bars` bars split into under `policy`.
pub fn session_count(total_bars: usize, session_length: usize, policy: TrailingSession) -> usize {
    if session_length == 0 {
        return 0;
    }
    let full = total_bars / session_length;
    match policy {
        TrailingSession::Skip => full,
        TrailingSession::Process if total_bars % session_length != 0 => full + 1,
        TrailingSession::Process => full,
    }
}

/// The `index`-th session, if it exists under `policy`.
pub fn session_at(
    bars: &[Bar],
    session_length: usize,
    policy: TrailingSession,
    index: usize,
) -> Option<Session<'_>> {
    if index >= session_count(bars.len(), session_length, policy) {
        return None;
    }
    let start = index * session_length;
    let end = (start + session_length).min(bars.len());
    Some(Session {
        index,
        bars: &bars[start..end],
    })
}

/// Splits `bars` into sessions.
pub fn partition(
    bars: &[Bar],
    session_length: usize,
    policy: TrailingSession,
) -> impl Iterator<Item = Session<'_>> {
    (0..session_count(bars.len(), session_length, policy))
        .filter_map(move |i| session_at(bars, session_length, policy, i))
}

/// The bars of the current session up to and including the current bar.
#[derive(Debug, Clone, Copy)]
pub struct SessionWindow<'a> {
    bars: &'a [Bar],
    session_len: usize,
}

impl<'a> SessionWindow<'a> {
    /// Builds a window directly; `bars` must be non-empty and no longer than
    /// `session_len`.
    pub fn new(bars: &'a [Bar], session_len: usize) -> Self {
        debug_assert!(!bars.is_empty() && bars.len() <= session_len);
        Self { bars, session_len }
    }

    pub fn bars(&self) -> &'a [Bar] {
        self.bars
    }

    /// Index of the current bar within its session.
    pub fn bar_index(&self) -> usize {
        self.bars.len() - 1
    }

    pub fn current(&self) -> &'a Bar {
        &self.bars[self.bars.len() - 1]
    }

    pub fn session_len(&self) -> usize {
        self.session_len
    }

    pub fn is_first_bar(&self) -> bool {
        self.bars.len() == 1
    }

    pub fn is_last_bar(&self) -> bool {
        self.bars.len() == self.session_len
    }
}
