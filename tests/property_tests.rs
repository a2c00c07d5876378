//! Property tests for accounting and indicator invariants.
//!
//! Uses proptest to verify:
//! 1. Cash conservation: balance = start + sum of fill deltas, and realized
//!    outcomes account for the whole change once flat
//! 2. Position invariant: the position always equals the net signed order flow
//! 3. Rejected orders leave position and balance untouched
//! 4. RSI stays within [0, 100], ADX is never negative
//! 5. Full engine runs end flat and conserve cash

mod common;

use common::*;
use intraday_backtest::domain::backtest::BacktestEngine;
use intraday_backtest::domain::balance::BalanceManager;
use intraday_backtest::domain::bar::Bar;
use intraday_backtest::domain::indicator::{Adx, Ema, Indicator, Rsi, Sma};
use intraday_backtest::domain::order::{Direction, OrderManager, OrderType, Position};
use intraday_backtest::domain::strategy::{StrategyConfig, StrategyKind};
use proptest::prelude::*;

#[derive(Debug, Clone, Copy)]
enum Action {
    Market(Direction, u64),
    Close,
}

// ── Strategies (proptest) ────────────────────────────────────────────

fn arb_rows(max: usize) -> impl Strategy<Value = Vec<(f64, f64, f64, f64)>> {
    prop::collection::vec(
        (10.0..200.0_f64, 0.0..5.0_f64, 0.0..1.0_f64, 0.0..1.0_f64),
        1..max,
    )
    .prop_map(|raw| {
        raw.into_iter()
            .map(|(low, spread, fo, fc)| (low + spread * fo, low + spread, low, low + spread * fc))
            .collect()
    })
}

fn arb_action() -> impl Strategy<Value = Action> {
    prop_oneof![
        (1..6_u64).prop_map(|n| Action::Market(Direction::Long, n)),
        (1..6_u64).prop_map(|n| Action::Market(Direction::Short, n)),
        Just(Action::Close),
    ]
}

fn signed(position: Position) -> i64 {
    match position {
        Position::Flat => 0,
        Position::Long(s) => s as i64,
        Position::Short(s) => -(s as i64),
    }
}

fn bars_for(rows: &[(f64, f64, f64, f64)]) -> Vec<Bar> {
    ohlc_bars(date(2020, 4, 28), rows)
}

// ── 1-2. Conservation and position invariant ────────────────────────

proptest! {
    #[test]
    fn fills_conserve_cash_and_track_net_flow(
        rows in arb_rows(40),
        actions in prop::collection::vec(arb_action(), 1..40),
    ) {
        let bars = bars_for(&rows);
        let mut orders = OrderManager::new(true);
        let mut balance = BalanceManager::new(10_000.0);
        let mut net = 0_i64;
        let mut cash = 0.0_f64;

        for (i, action) in actions.iter().enumerate() {
            orders.update(&bars[i % bars.len()]);
            let fill = match *action {
                Action::Market(direction, size) => {
                    net += match direction {
                        Direction::Long => size as i64,
                        Direction::Short => -(size as i64),
                    };
                    orders.add_order(OrderType::Market, direction, size, &mut balance).unwrap()
                }
                Action::Close => {
                    net = 0;
                    orders.add_order(OrderType::Close, Direction::Long, 0, &mut balance).unwrap()
                }
            };
            if let Some(fill) = fill {
                cash += fill.cash_delta;
                prop_assert_eq!(fill.position, orders.position());
            }

            prop_assert_eq!(signed(orders.position()), net);
            prop_assert!(orders.position().size() > 0 || orders.position().is_flat());
            prop_assert!((balance.get_balance() - (10_000.0 + cash)).abs() < 1e-6);
        }

        orders.add_order(OrderType::Close, Direction::Long, 0, &mut balance).unwrap();
        prop_assert!(orders.position().is_flat());
        let realized: f64 = balance.outcomes().iter().map(|o| o.value).sum();
        prop_assert!((balance.get_balance() - 10_000.0 - realized).abs() < 1e-6);
        prop_assert!(balance.outcomes().iter().all(|o| o.cost >= 0.0));
    }

    #[test]
    fn closing_flat_records_nothing(rows in arb_rows(5)) {
        let bars = bars_for(&rows);
        let mut orders = OrderManager::new(true);
        let mut balance = BalanceManager::new(10_000.0);
        orders.update(&bars[0]);

        let fill = orders.add_order(OrderType::Close, Direction::Short, 3, &mut balance).unwrap();
        prop_assert!(fill.is_none());
        prop_assert_eq!(balance.get_balance(), 10_000.0);
        prop_assert!(balance.outcomes().is_empty());
    }
}

// ── 3. Rejected orders ───────────────────────────────────────────────

proptest! {
    #[test]
    fn rejected_reversal_changes_nothing(held in 1..10_u64, extra in 1..10_u64, rows in arb_rows(3)) {
        let bars = bars_for(&rows);
        let mut orders = OrderManager::new(false);
        let mut balance = BalanceManager::new(10_000.0);
        orders.update(&bars[0]);
        orders.add_order(OrderType::Market, Direction::Short, held, &mut balance).unwrap();
        let before = (orders.position(), balance.clone());

        let result = orders.add_order(OrderType::Market, Direction::Long, held + extra, &mut balance);
        prop_assert!(result.is_err());
        prop_assert_eq!(orders.position(), before.0);
        prop_assert_eq!(&balance, &before.1);
    }

    #[test]
    fn unsupported_types_change_nothing(size in 1..10_u64, rows in arb_rows(3)) {
        let bars = bars_for(&rows);
        let mut orders = OrderManager::new(true);
        let mut balance = BalanceManager::new(10_000.0);
        orders.update(&bars[0]);

        for order_type in [OrderType::Limit, OrderType::Stop] {
            prop_assert!(orders.add_order(order_type, Direction::Long, size, &mut balance).is_err());
        }
        prop_assert_eq!(orders.position(), Position::Flat);
        prop_assert_eq!(balance.get_balance(), 10_000.0);
    }
}

// ── 4. Indicator ranges ──────────────────────────────────────────────

proptest! {
    #[test]
    fn rsi_is_bounded(rows in arb_rows(80), period in 1..15_usize) {
        let bars = bars_for(&rows);
        let mut rsi = Rsi::new(period);
        for n in 1..=bars.len() {
            if let Some(v) = rsi.update(&bars[..n]) {
                prop_assert!((0.0..=100.0).contains(&v), "RSI {} out of range", v);
            }
        }
    }

    #[test]
    fn adx_is_never_negative(rows in arb_rows(80), period in 1..15_usize) {
        let bars = bars_for(&rows);
        let mut adx = Adx::new(period);
        for n in 1..=bars.len() {
            if let Some(v) = adx.update(&bars[..n]) {
                prop_assert!(v >= 0.0, "ADX {} negative", v);
                prop_assert!(v <= 100.0 + 1e-9, "ADX {} above 100", v);
            }
        }
    }
}

// ── 5. Engine runs ───────────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn engine_runs_end_flat_and_conserve_cash(rows in arb_rows(120), kind_index in 0..4_usize) {
        let kind = [
            StrategyKind::MaCrossover { short_period: 2, long_period: 5 },
            StrategyKind::MacdCrossover { short_period: 3, long_period: 6, signal_period: 2 },
            StrategyKind::RsiPosition { period: 3, min: 40.0, max: 60.0 },
            StrategyKind::HeikinAshi { period: 2 },
        ][kind_index];
        let bars = bars_for(&rows);
        let engine = BacktestEngine::new(sample_config(20), bars, StrategyConfig::new(kind).build())
            .unwrap();
        let result = engine.run().unwrap();

        prop_assert_eq!(result.final_position, Position::Flat);
        let realized: f64 = result.outcomes.iter().map(|o| o.value).sum();
        let change = result.report.ending_balance - result.report.starting_balance;
        prop_assert!((change - realized).abs() < 1e-6);
    }
}

#[test]
fn ema_tracks_sma_on_a_linear_trend() {
    let closes: Vec<f64> = (0..400).map(|i| 50.0 + 0.25 * i as f64).collect();
    let bars = close_bars(date(2020, 4, 28), &closes);
    let mut ema = Ema::new(20);
    let mut sma = Sma::new(20);

    let mut last = (None, None);
    for n in 1..=bars.len() {
        last = (ema.update(&bars[..n]), sma.update(&bars[..n]));
    }
    let (ema, sma) = (last.0.unwrap(), last.1.unwrap());
    approx::assert_relative_eq!(ema, sma, epsilon = 1e-6);
}
