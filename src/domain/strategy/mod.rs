//! Strategy contract and the reference strategies.
//!
//! A strategy sees one [`SessionWindow`] per bar and trades through a
//! short-lived [`Broker`] that borrows the engine's order and balance managers
//! for the duration of the call.

pub mod heikin_ashi;
pub mod ma_crossover;
pub mod macd_crossover;
pub mod rsi_position;

use crate::domain::balance::BalanceManager;
use crate::domain::error::BacktestError;
use crate::domain::indicator::{IndicatorPanel, IndicatorType};
use crate::domain::order::{Direction, Fill, OrderManager, OrderType, Position};
use crate::domain::session::SessionWindow;
use std::fmt;
use std::str::FromStr;

pub use heikin_ashi::{DEFAULT_HEIKIN_PERIOD, HeikinAshiReversal};
pub use ma_crossover::MovingAverageCrossover;
pub use macd_crossover::MacdCrossover;
pub use rsi_position::RsiPosition;

pub const DEFAULT_ORDER_SIZE: u64 = 10;
pub const DEFAULT_SHORT_PERIOD: usize = 10;
pub const DEFAULT_LONG_PERIOD: usize = 30;
pub const DEFAULT_SIGNAL_PERIOD: usize = 9;
pub const DEFAULT_RSI_PERIOD: usize = 14;
pub const DEFAULT_RSI_MIN: f64 = 30.0;
pub const DEFAULT_RSI_MAX: f64 = 70.0;

/// Named values a strategy reports for one bar.
pub type MetricValues = Vec<(String, Option<f64>)>;

/// What a strategy did and saw on one bar.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StrategyUpdate {
    /// `Long` when the strategy entered, `Short` when it exited.
    pub direction: Option<Direction>,
    /// Values plotted against price.
    pub metrics: MetricValues,
    /// Values plotted on their own scale.
    pub sub_metrics: MetricValues,
}

pub trait Strategy {
    fn name(&self) -> &str;

    fn update(
        &mut self,
        window: &SessionWindow<'_>,
        broker: &mut Broker<'_>,
    ) -> Result<StrategyUpdate, BacktestError>;
}

/// Order entry for the duration of one strategy update.
pub struct Broker<'a> {
    orders: &'a mut OrderManager,
    balance: &'a mut BalanceManager,
}

impl<'a> Broker<'a> {
    pub fn new(orders: &'a mut OrderManager, balance: &'a mut BalanceManager) -> Self {
        Broker { orders, balance }
    }

    pub fn add_order(
        &mut self,
        order_type: OrderType,
        direction: Direction,
        size: u64,
    ) -> Result<Option<Fill>, BacktestError> {
        self.orders
            .add_order(order_type, direction, size, self.balance)
    }

    pub fn close(&mut self) -> Result<Option<Fill>, BacktestError> {
        self.add_order(OrderType::Close, Direction::Short, 0)
    }

    pub fn position(&self) -> Position {
        self.orders.position()
    }

    pub fn balance(&self) -> f64 {
        self.balance.get_balance()
    }
}

/// Entry/exit state shared by the reference strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Trader {
    pub state: Direction,
    pub order_size: u64,
}

impl Trader {
    pub fn new(order_size: u64) -> Self {
        Trader {
            state: Direction::Short,
            order_size,
        }
    }

    pub fn enter_long(&mut self, broker: &mut Broker<'_>) -> Result<Option<Direction>, BacktestError> {
        if self.state == Direction::Long {
            return Ok(None);
        }
        broker.add_order(OrderType::Market, Direction::Long, self.order_size)?;
        self.state = Direction::Long;
        Ok(Some(Direction::Long))
    }

    pub fn exit(&mut self, broker: &mut Broker<'_>) -> Result<Option<Direction>, BacktestError> {
        if self.state == Direction::Short {
            return Ok(None);
        }
        broker.close()?;
        self.state = Direction::Short;
        Ok(Some(Direction::Short))
    }

    /// Session-end exit: closes whatever is open and always marks it.
    pub fn force_exit(&mut self, broker: &mut Broker<'_>) -> Result<Option<Direction>, BacktestError> {
        broker.close()?;
        self.state = Direction::Short;
        Ok(Some(Direction::Short))
    }

    /// Crossover rule: enter when `fast` moves above `slow`, exit when it moves
    /// below, flatten on the session's last bar.
    pub fn crossover(
        &mut self,
        fast: Option<f64>,
        slow: Option<f64>,
        window: &SessionWindow<'_>,
        broker: &mut Broker<'_>,
    ) -> Result<Option<Direction>, BacktestError> {
        if window.is_last_bar() {
            return self.force_exit(broker);
        }
        match (fast, slow) {
            (Some(fast), Some(slow)) if fast > slow => self.enter_long(broker),
            (Some(fast), Some(slow)) if fast < slow => self.exit(broker),
            _ => Ok(None),
        }
    }
}

/// Which reference strategy to run, with its parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StrategyKind {
    MaCrossover {
        short_period: usize,
        long_period: usize,
    },
    MacdCrossover {
        short_period: usize,
        long_period: usize,
        signal_period: usize,
    },
    RsiPosition {
        period: usize,
        min: f64,
        max: f64,
    },
    HeikinAshi {
        period: usize,
    },
}

impl StrategyKind {
    pub fn key(&self) -> &'static str {
        match self {
            StrategyKind::MaCrossover { .. } => "ma_crossover",
            StrategyKind::MacdCrossover { .. } => "macd_crossover",
            StrategyKind::RsiPosition { .. } => "rsi_position",
            StrategyKind::HeikinAshi { .. } => "heikin_ashi",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StrategyKind::MaCrossover {
                short_period,
                long_period,
            } => write!(f, "MA crossover SMA({short_period}) / SMA({long_period})"),
            StrategyKind::MacdCrossover {
                short_period,
                long_period,
                signal_period,
            } => write!(
                f,
                "MACD crossover MACD({short_period},{long_period}) / signal({signal_period})"
            ),
            StrategyKind::RsiPosition { period, min, max } => {
                write!(f, "RSI position RSI({period}) in [{min}, {max}]")
            }
            StrategyKind::HeikinAshi { period } => {
                write!(f, "Heikin-Ashi reversal after {period} bearish candles")
            }
        }
    }
}

/// Strategy kinds accepted in configuration.
pub const STRATEGY_KINDS: &[&str] = &["ma_crossover", "macd_crossover", "rsi_position", "heikin_ashi"];

/// Kind name as written in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyName {
    MaCrossover,
    MacdCrossover,
    RsiPosition,
    HeikinAshi,
}

impl FromStr for StrategyName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ma_crossover" => Ok(StrategyName::MaCrossover),
            "macd_crossover" => Ok(StrategyName::MacdCrossover),
            "rsi_position" => Ok(StrategyName::RsiPosition),
            "heikin_ashi" => Ok(StrategyName::HeikinAshi),
            other => Err(format!(
                "unknown strategy '{other}', expected one of {}",
                STRATEGY_KINDS.join(", ")
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StrategyConfig {
    pub kind: StrategyKind,
    pub order_size: u64,
    pub panel: Vec<IndicatorType>,
}

impl StrategyConfig {
    pub fn new(kind: StrategyKind) -> Self {
        StrategyConfig {
            kind,
            order_size: DEFAULT_ORDER_SIZE,
            panel: Vec::new(),
        }
    }

    pub fn build(&self) -> Box<dyn Strategy> {
        let panel = IndicatorPanel::new(&self.panel);
        match self.kind {
            StrategyKind::MaCrossover {
                short_period,
                long_period,
            } => Box::new(MovingAverageCrossover::new(
                short_period,
                long_period,
                self.order_size,
                panel,
            )),
            StrategyKind::MacdCrossover {
                short_period,
                long_period,
                signal_period,
            } => Box::new(MacdCrossover::new(
                short_period,
                long_period,
                signal_period,
                self.order_size,
                panel,
            )),
            StrategyKind::RsiPosition { period, min, max } => {
                Box::new(RsiPosition::new(period, min, max, self.order_size, panel))
            }
            StrategyKind::HeikinAshi { period } => {
                Box::new(HeikinAshiReversal::new(period, self.order_size, panel))
            }
        }
    }
}
