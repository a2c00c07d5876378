//! Order handling and the position state machine.
//!
//! Fill policy (one convention for every transition):
//! - opening notional is debited at the entry-side price: bar high for longs,
//!   bar low for shorts;
//! - every reducing, reversing or closing leg is credited at the bar low;
//! - a reversal from `s` units to the other side with an order of `n > s` units
//!   settles in one movement of `low * (2s - n)`.

use std::fmt;

use tracing::debug;

use crate::domain::balance::BalanceManager;
use crate::domain::bar::Bar;
use crate::domain::error::BacktestError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrderType {
    Market,
    Close,
    Limit,
    Stop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Long,
    Short,
}

impl Direction {
    pub fn opposite(self) -> Direction {
        match self {
            Direction::Long => Direction::Short,
            Direction::Short => Direction::Long,
        }
    }
}

impl fmt::Display for OrderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OrderType::Market => "MARKET",
            OrderType::Close => "CLOSE",
            OrderType::Limit => "LIMIT",
            OrderType::Stop => "STOP",
        };
        f.write_str(name)
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Long => f.write_str("LONG"),
            Direction::Short => f.write_str("SHORT"),
        }
    }
}

/// Open position. Sizes carried by `Long`/`Short` are always positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Position {
    #[default]
    Flat,
    Long(u64),
    Short(u64),
}

impl Position {
    pub fn size(&self) -> u64 {
        match *self {
            Position::Flat => 0,
            Position::Long(s) | Position::Short(s) => s,
        }
    }

    pub fn direction(&self) -> Option<Direction> {
        match self {
            Position::Flat => None,
            Position::Long(_) => Some(Direction::Long),
            Position::Short(_) => Some(Direction::Short),
        }
    }

    pub fn is_flat(&self) -> bool {
        matches!(self, Position::Flat)
    }

    fn open(direction: Direction, size: u64) -> Position {
        match (direction, size) {
            (_, 0) => Position::Flat,
            (Direction::Long, s) => Position::Long(s),
            (Direction::Short, s) => Position::Short(s),
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Position::Flat => write!(f, "FLAT"),
            Position::Long(s) => write!(f, "LONG({s})"),
            Position::Short(s) => write!(f, "SHORT({s})"),
        }
    }
}

/// Prices available for fills on the current bar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FillContext {
    pub high: f64,
    pub low: f64,
}

impl FillContext {
    fn entry_price(&self, direction: Direction) -> f64 {
        match direction {
            Direction::Long => self.high,
            Direction::Short => self.low,
        }
    }

    fn exit_price(&self) -> f64 {
        self.low
    }
}

/// Result of an executed order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fill {
    pub order_type: OrderType,
    /// Side the order traded on.
    pub direction: Direction,
    pub size: u64,
    pub price: f64,
    pub cash_delta: f64,
    pub position: Position,
    pub closed: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderManager {
    position: Position,
    context: Option<FillContext>,
    allow_reversal: bool,
}

impl Default for OrderManager {
    fn default() -> Self {
        OrderManager::new(true)
    }
}

impl OrderManager {
    pub fn new(allow_reversal: bool) -> Self {
        OrderManager {
            position: Position::Flat,
            context: None,
            allow_reversal,
        }
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn fill_context(&self) -> Option<FillContext> {
        self.context
    }

    /// Refreshes the fill prices used by subsequent orders.
    pub fn update(&mut self, bar: &Bar) {
        self.context = Some(FillContext {
            high: bar.high,
            low: bar.low,
        });
    }

    /// Executes an order against the current bar.
    ///
    /// `Close` ignores `direction` and `size` and returns `Ok(None)` when there is
    /// nothing to close. On error neither the position nor the balance changes.
    pub fn add_order(
        &mut self,
        order_type: OrderType,
        direction: Direction,
        size: u64,
        balance: &mut BalanceManager,
    ) -> Result<Option<Fill>, BacktestError> {
        let fill = match order_type {
            OrderType::Market => Some(self.plan_market(direction, size)?),
            OrderType::Close => self.plan_close()?,
            OrderType::Limit | OrderType::Stop => {
                return Err(BacktestError::InvalidOrderType { order_type });
            }
        };

        if let Some(fill) = &fill {
            self.position = fill.position;
            balance.update(fill.cash_delta, fill.closed);
            debug!(
                order = %fill.order_type,
                side = %fill.direction,
                size = fill.size,
                price = fill.price,
                cash = fill.cash_delta,
                position = %fill.position,
                "order filled"
            );
        }

        Ok(fill)
    }

    fn context(&self, order_type: OrderType) -> Result<FillContext, BacktestError> {
        self.context
            .ok_or(BacktestError::NoMarketData { order_type })
    }

    fn plan_market(&self, direction: Direction, size: u64) -> Result<Fill, BacktestError> {
        if size == 0 {
            return Err(BacktestError::InvalidOrderSize {
                direction,
                size,
                reason: "size must be positive".into(),
            });
        }
        let ctx = self.context(OrderType::Market)?;

        let held = match (self.position, direction) {
            (Position::Flat, _) => 0,
            (Position::Long(s), Direction::Long) | (Position::Short(s), Direction::Short) => {
                let price = ctx.entry_price(direction);
                return Ok(Fill {
                    order_type: OrderType::Market,
                    direction,
                    size,
                    price,
                    cash_delta: -(price * size as f64),
                    position: Position::open(direction, s + size),
                    closed: false,
                });
            }
            (Position::Long(s), Direction::Short) | (Position::Short(s), Direction::Long) => s,
        };

        if held == 0 {
            let price = ctx.entry_price(direction);
            return Ok(Fill {
                order_type: OrderType::Market,
                direction,
                size,
                price,
                cash_delta: -(price * size as f64),
                position: Position::open(direction, size),
                closed: false,
            });
        }

        if size > held && !self.allow_reversal {
            return Err(BacktestError::InvalidOrderSize {
                direction,
                size,
                reason: format!("would reverse a position of {held} while reversals are disabled"),
            });
        }

        let price = ctx.exit_price();
        let (settled, position) = if size < held {
            (size as f64, Position::open(direction.opposite(), held - size))
        } else {
            (
                2.0 * held as f64 - size as f64,
                Position::open(direction, size - held),
            )
        };

        Ok(Fill {
            order_type: OrderType::Market,
            direction,
            size,
            price,
            cash_delta: price * settled,
            position,
            closed: position.is_flat(),
        })
    }

    fn plan_close(&self) -> Result<Option<Fill>, BacktestError> {
        let Some(held_direction) = self.position.direction() else {
            return Ok(None);
        };
        let ctx = self.context(OrderType::Close)?;
        let size = self.position.size();
        let price = ctx.exit_price();

        Ok(Some(Fill {
            order_type: OrderType::Close,
            direction: held_direction.opposite(),
            size,
            price,
            cash_delta: price * size as f64,
            position: Position::Flat,
            closed: true,
        }))
    }
}
