//! Session-by-session replay engine.
//!
//! `BacktestConfig` holds the run parameters. `BacktestEngine` owns the
//! account, the order manager, the strategy and the bar sequence, and drives
//! them one bar at a time: `OrderManager::update` first, then the strategy.

use crate::domain::balance::{AccountReport, BalanceManager, DEFAULT_STARTING_BALANCE, Outcome};
use crate::domain::bar::Bar;
use crate::domain::error::BacktestError;
use crate::domain::order::{OrderManager, Position};
use crate::domain::recorder::{MetricRecorder, RecordedSession};
use crate::domain::session::{self, DEFAULT_SESSION_LENGTH, TrailingSession};
use crate::domain::strategy::{Broker, Strategy};
use chrono::NaiveDate;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use tracing::{debug, info};

/// Which sessions get their per-bar series recorded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum RecordSelection {
    #[default]
    None,
    All,
    Dates(BTreeSet<NaiveDate>),
}

impl RecordSelection {
    pub fn records(&self, date: NaiveDate) -> bool {
        match self {
            RecordSelection::None => false,
            RecordSelection::All => true,
            RecordSelection::Dates(dates) => dates.contains(&date),
        }
    }
}

impl FromStr for RecordSelection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s.to_lowercase().as_str() {
            "" | "none" => return Ok(RecordSelection::None),
            "all" => return Ok(RecordSelection::All),
            _ => {}
        }
        s.split(',')
            .map(|d| {
                NaiveDate::parse_from_str(d.trim(), "%Y-%m-%d")
                    .map_err(|_| format!("invalid date '{}' (expected YYYY-MM-DD)", d.trim()))
            })
            .collect::<Result<BTreeSet<_>, _>>()
            .map(RecordSelection::Dates)
    }
}

impl fmt::Display for RecordSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordSelection::None => f.write_str("none"),
            RecordSelection::All => f.write_str("all"),
            RecordSelection::Dates(dates) => {
                let dates: Vec<String> = dates.iter().map(|d| d.to_string()).collect();
                f.write_str(&dates.join(","))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestConfig {
    pub starting_balance: f64,
    pub session_length: usize,
    pub trailing_session: TrailingSession,
    pub record: RecordSelection,
    /// End the run after the first recorded session.
    pub stop_after_record: bool,
    /// Replay only recorded sessions.
    pub skip_unrecorded: bool,
    pub allow_reversal: bool,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        BacktestConfig {
            starting_balance: DEFAULT_STARTING_BALANCE,
            session_length: DEFAULT_SESSION_LENGTH,
            trailing_session: TrailingSession::default(),
            record: RecordSelection::default(),
            stop_after_record: false,
            skip_unrecorded: false,
            allow_reversal: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestResult {
    pub strategy: String,
    pub report: AccountReport,
    pub outcomes: Vec<Outcome>,
    pub sessions: Vec<RecordedSession>,
    pub final_position: Position,
    pub sessions_processed: usize,
    pub sessions_skipped: usize,
    pub bars_processed: usize,
}

pub struct BacktestEngine {
    config: BacktestConfig,
    bars: Vec<Bar>,
    balance: BalanceManager,
    orders: OrderManager,
    strategy: Box<dyn Strategy>,
    recorder: MetricRecorder,
    next_session: usize,
    stopped: bool,
    sessions_processed: usize,
    sessions_skipped: usize,
    bars_processed: usize,
}

/// Checks that timestamps never go backwards.
pub fn check_ascending(bars: &[Bar]) -> Result<(), BacktestError> {
    match bars.windows(2).position(|w| w[1].timestamp < w[0].timestamp) {
        Some(i) => Err(BacktestError::Data {
            reason: format!(
                "bars out of order at index {}: {} after {}",
                i + 1,
                bars[i + 1].timestamp,
                bars[i].timestamp
            ),
        }),
        None => Ok(()),
    }
}

impl BacktestEngine {
    pub fn new(
        config: BacktestConfig,
        bars: Vec<Bar>,
        strategy: Box<dyn Strategy>,
    ) -> Result<Self, BacktestError> {
        if config.session_length == 0 {
            return Err(BacktestError::invalid(
                "backtest",
                "session_length",
                "must be positive",
            ));
        }
        check_ascending(&bars)?;

        Ok(BacktestEngine {
            balance: BalanceManager::new(config.starting_balance),
            orders: OrderManager::new(config.allow_reversal),
            config,
            bars,
            strategy,
            recorder: MetricRecorder::new(),
            next_session: 0,
            stopped: false,
            sessions_processed: 0,
            sessions_skipped: 0,
            bars_processed: 0,
        })
    }

    pub fn session_count(&self) -> usize {
        session::session_count(
            self.bars.len(),
            self.config.session_length,
            self.config.trailing_session,
        )
    }

    pub fn balance(&self) -> &BalanceManager {
        &self.balance
    }

    pub fn position(&self) -> Position {
        self.orders.position()
    }

    pub fn is_finished(&self) -> bool {
        self.stopped || self.next_session >= self.session_count()
    }

    /// Replays the next session. Returns `Ok(false)` once nothing is left.
    pub fn step_session(&mut self) -> Result<bool, BacktestError> {
        if self.stopped {
            return Ok(false);
        }
        let Some(session) = session::session_at(
            &self.bars,
            self.config.session_length,
            self.config.trailing_session,
            self.next_session,
        ) else {
            return Ok(false);
        };
        self.next_session += 1;

        let Some(date) = session.date() else {
            return Ok(false);
        };
        let record = self.config.record.records(date);
        if !record && self.config.skip_unrecorded {
            self.sessions_skipped += 1;
            debug!(session = session.index, %date, "skipping unrecorded session");
            return Ok(true);
        }
        if record {
            self.recorder.begin(session.index, date);
        }

        for (i, bar) in session.bars.iter().enumerate() {
            self.orders.update(bar);
            let window = session.window(i);
            let mut broker = Broker::new(&mut self.orders, &mut self.balance);
            let update = self.strategy.update(&window, &mut broker)?;
            if record {
                self.recorder.record(bar, &update);
            }
        }
        self.bars_processed += session.len();
        self.sessions_processed += 1;

        debug!(
            session = session.index,
            %date,
            bars = session.len(),
            balance = self.balance.get_balance(),
            position = %self.orders.position(),
            "session complete"
        );

        if record {
            self.recorder.finish();
            if self.config.stop_after_record {
                info!(%date, "recorded session complete, stopping");
                self.stopped = true;
            }
        }
        Ok(true)
    }

    pub fn run(mut self) -> Result<BacktestResult, BacktestError> {
        info!(
            strategy = self.strategy.name(),
            bars = self.bars.len(),
            sessions = self.session_count(),
            session_length = self.config.session_length,
            "starting backtest"
        );
        while self.step_session()? {}
        Ok(self.finish())
    }

    /// Ends the run where it stands and collects the results.
    pub fn finish(self) -> BacktestResult {
        let report = self.balance.get_report();
        info!(
            sessions = self.sessions_processed,
            skipped = self.sessions_skipped,
            trades = self.balance.outcomes().len(),
            ending_balance = report.ending_balance,
            "backtest complete"
        );
        BacktestResult {
            strategy: self.strategy.name().to_string(),
            outcomes: self.balance.outcomes().to_vec(),
            report,
            sessions: self.recorder.into_sessions(),
            final_position: self.orders.position(),
            sessions_processed: self.sessions_processed,
            sessions_skipped: self.sessions_skipped,
            bars_processed: self.bars_processed,
        }
    }
}
