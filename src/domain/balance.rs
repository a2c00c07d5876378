//! Cash ledger and realized-outcome history.
//!
//! Every cash movement of the backtest goes through [`BalanceManager::update`].
//! While a position is open the manager also accumulates the position's net cash
//! flow (`position_value`) and the deepest capital commitment seen so far
//! (`position_cost`); both roll into an [`Outcome`] when the position closes.

pub const DEFAULT_STARTING_BALANCE: f64 = 10_000.0;

/// Realized result of one fully closed position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Outcome {
    /// Net cash the position returned (positive is a win).
    pub value: f64,
    /// Peak capital committed while the position was open.
    pub cost: f64,
}

impl Outcome {
    pub fn is_win(&self) -> bool {
        self.value > 0.0
    }

    /// value / cost as a percentage; 0 when nothing was committed.
    pub fn return_pct(&self) -> f64 {
        if self.cost > 0.0 {
            self.value / self.cost * 100.0
        } else {
            0.0
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BalanceManager {
    starting_balance: f64,
    balance: f64,
    position_value: f64,
    position_cost: f64,
    outcomes: Vec<Outcome>,
}

impl Default for BalanceManager {
    fn default() -> Self {
        BalanceManager::new(DEFAULT_STARTING_BALANCE)
    }
}

impl BalanceManager {
    pub fn new(starting_balance: f64) -> Self {
        BalanceManager {
            starting_balance,
            balance: starting_balance,
            position_value: 0.0,
            position_cost: 0.0,
            outcomes: Vec::new(),
        }
    }

    pub fn get_balance(&self) -> f64 {
        self.balance
    }

    pub fn starting_balance(&self) -> f64 {
        self.starting_balance
    }

    pub fn position_value(&self) -> f64 {
        self.position_value
    }

    pub fn position_cost(&self) -> f64 {
        self.position_cost
    }

    pub fn outcomes(&self) -> &[Outcome] {
        &self.outcomes
    }

    /// Applies a signed cash movement. A debit commits at least its own size even
    /// when earlier credits of the same position cover it.
    pub fn update(&mut self, delta: f64, position_closed: bool) {
        self.position_value += delta;
        let commitment = self.position_value.min(delta);
        if commitment < self.position_cost {
            self.position_cost = commitment;
        }

        if position_closed {
            self.outcomes.push(Outcome {
                value: self.position_value,
                cost: -self.position_cost,
            });
            self.position_value = 0.0;
            self.position_cost = 0.0;
        }

        self.balance += delta;
    }

    pub fn get_report(&self) -> AccountReport {
        AccountReport {
            starting_balance: self.starting_balance,
            ending_balance: self.balance,
            trades: TradeStats::compute(&self.outcomes, self.starting_balance, self.balance),
        }
    }
}

/// Account summary at the end of a replay.
#[derive(Debug, Clone, PartialEq)]
pub struct AccountReport {
    pub starting_balance: f64,
    pub ending_balance: f64,
    /// `None` when no position was ever closed.
    pub trades: Option<TradeStats>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TradeStats {
    pub total_trades: usize,
    pub wins: usize,
    pub losses: usize,
    pub total_profits: f64,
    pub total_losses: f64,
    pub total_return_pct: f64,
    pub accuracy_pct: f64,
    pub weighted_accuracy_pct: f64,
    pub average_return_pct: f64,
    pub average_winning_return_pct: f64,
    pub average_losing_return_pct: f64,
}

impl TradeStats {
    fn compute(outcomes: &[Outcome], starting_balance: f64, ending_balance: f64) -> Option<Self> {
        if outcomes.is_empty() {
            return None;
        }

        let mut wins = 0usize;
        let mut losses = 0usize;
        let mut total_profits = 0.0_f64;
        let mut total_losses = 0.0_f64;
        let mut win_returns = 0.0_f64;
        let mut loss_returns = 0.0_f64;

        for outcome in outcomes {
            let ret = outcome.return_pct();
            if outcome.is_win() {
                wins += 1;
                total_profits += outcome.value;
                win_returns += ret;
            } else {
                losses += 1;
                total_losses += outcome.value;
                loss_returns += ret;
            }
        }

        let total_trades = outcomes.len();
        let abs_total = total_profits.abs() + total_losses.abs();

        let total_return_pct = if starting_balance != 0.0 {
            (ending_balance - starting_balance) / starting_balance * 100.0
        } else {
            0.0
        };

        let weighted_accuracy_pct = if abs_total > 0.0 {
            total_profits.abs() / abs_total * 100.0
        } else {
            0.0
        };

        let average_winning_return_pct = if wins > 0 {
            win_returns / wins as f64
        } else {
            0.0
        };

        let average_losing_return_pct = if losses > 0 {
            loss_returns / losses as f64
        } else {
            0.0
        };

        Some(TradeStats {
            total_trades,
            wins,
            losses,
            total_profits,
            total_losses,
            total_return_pct,
            accuracy_pct: wins as f64 / total_trades as f64 * 100.0,
            weighted_accuracy_pct,
            average_return_pct: (win_returns + loss_returns) / total_trades as f64,
            average_winning_return_pct,
            average_losing_return_pct,
        })
    }
}

impl AccountReport {
    /// Named report lines in display order.
    pub fn entries(&self) -> Vec<(&'static str, f64)> {
        let mut entries = vec![
            ("start_balance", self.starting_balance),
            ("resulting_balance", self.ending_balance),
        ];
        if let Some(t) = &self.trades {
            entries.extend([
                ("total_trades", t.total_trades as f64),
                ("total_profits", t.total_profits),
                ("total_losses", t.total_losses),
                ("total_returns", t.total_return_pct),
                ("accuracy", t.accuracy_pct),
                ("weighted_accuracy", t.weighted_accuracy_pct),
                ("average_return", t.average_return_pct),
                ("average_positive_return", t.average_winning_return_pct),
                ("average_negative_return", t.average_losing_return_pct),
            ]);
        }
        entries
    }
}
