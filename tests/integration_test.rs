//! End-to-end replay tests.
//!
//! Tests cover:
//! - The SMA(1)/SMA(3) crossover scenario through the full engine
//! - Recording selection, skip_unrecorded and stop_after_record
//! - Trailing partial sessions under both policies
//! - Determinism of complete runs
//! - Replays fed through the CSV adapter and the mock data port
//! - Cash conservation across many sessions for every strategy kind

mod common;

use approx::assert_relative_eq;
use common::*;
use intraday_backtest::adapters::csv_adapter::CsvAdapter;
use intraday_backtest::domain::backtest::{BacktestConfig, BacktestEngine, BacktestResult, RecordSelection};
use intraday_backtest::domain::bar::Bar;
use intraday_backtest::domain::error::BacktestError;
use intraday_backtest::domain::indicator::IndicatorType;
use intraday_backtest::domain::order::Position;
use intraday_backtest::domain::session::TrailingSession;
use intraday_backtest::domain::strategy::{StrategyConfig, StrategyKind};
use intraday_backtest::ports::data_port::DataPort;
use std::collections::BTreeSet;

fn ma_config(short_period: usize, long_period: usize) -> StrategyConfig {
    StrategyConfig::new(StrategyKind::MaCrossover {
        short_period,
        long_period,
    })
}

fn run(config: BacktestConfig, bars: Vec<Bar>, strategy: &StrategyConfig) -> BacktestResult {
    BacktestEngine::new(config, bars, strategy.build())
        .unwrap()
        .run()
        .unwrap()
}

fn all_kinds() -> Vec<StrategyKind> {
    vec![
        StrategyKind::MaCrossover {
            short_period: 3,
            long_period: 8,
        },
        StrategyKind::MacdCrossover {
            short_period: 4,
            long_period: 9,
            signal_period: 3,
        },
        StrategyKind::RsiPosition {
            period: 5,
            min: 40.0,
            max: 60.0,
        },
        StrategyKind::HeikinAshi { period: 2 },
    ]
}

mod crossover_scenario {
    use super::*;

    #[test]
    fn one_long_then_exit_then_forced_close() {
        let bars = close_bars(date(2020, 4, 28), &[10.0, 11.0, 12.0, 11.0, 10.0]);
        let config = BacktestConfig {
            record: RecordSelection::All,
            ..sample_config(5)
        };
        let result = run(config, bars, &ma_config(1, 3));

        assert_eq!(result.sessions.len(), 1);
        let session = &result.sessions[0];
        assert_eq!(session.long_markers, vec![None, None, Some(12.0), None, None]);
        assert_eq!(
            session.short_markers,
            vec![None, None, None, Some(11.0), Some(10.0)]
        );
        assert_eq!(session.metrics.get("SMA(3)").unwrap()[2], Some(11.0));

        assert_eq!(result.outcomes.len(), 1);
        assert_relative_eq!(result.report.ending_balance, 9_990.0);
        assert_eq!(result.final_position, Position::Flat);
        let trades = result.report.trades.as_ref().unwrap();
        assert_eq!(trades.total_trades, 1);
        assert_eq!(trades.losses, 1);
    }

    #[test]
    fn not_recorded_by_default() {
        let bars = close_bars(date(2020, 4, 28), &[10.0, 11.0, 12.0, 11.0, 10.0]);
        let result = run(sample_config(5), bars, &ma_config(1, 3));
        assert!(result.sessions.is_empty());
        assert_eq!(result.outcomes.len(), 1);
    }
}

mod recording {
    use super::*;

    fn three_days() -> Vec<Bar> {
        repeated_days(3, &[10.0, 11.0, 12.0, 11.0, 10.0])
    }

    fn dates(days: &[(i32, u32, u32)]) -> RecordSelection {
        RecordSelection::Dates(days.iter().map(|&(y, m, d)| date(y, m, d)).collect::<BTreeSet<_>>())
    }

    #[test]
    fn records_only_selected_dates() {
        let config = BacktestConfig {
            record: dates(&[(2020, 4, 28)]),
            ..sample_config(5)
        };
        let result = run(config, three_days(), &ma_config(1, 3));

        assert_eq!(result.sessions_processed, 3);
        assert_eq!(result.sessions.len(), 1);
        assert_eq!(result.sessions[0].date, date(2020, 4, 28));
        assert_eq!(result.sessions[0].index, 1);
        assert_eq!(result.outcomes.len(), 3);
    }

    #[test]
    fn skip_unrecorded_replays_selected_only() {
        let config = BacktestConfig {
            record: dates(&[(2020, 4, 28)]),
            skip_unrecorded: true,
            ..sample_config(5)
        };
        let result = run(config, three_days(), &ma_config(1, 3));

        assert_eq!(result.sessions_processed, 1);
        assert_eq!(result.sessions_skipped, 2);
        assert_eq!(result.bars_processed, 5);
        assert_eq!(result.outcomes.len(), 1);
    }

    #[test]
    fn stop_after_record_ends_the_run() {
        let config = BacktestConfig {
            record: dates(&[(2020, 4, 28)]),
            stop_after_record: true,
            ..sample_config(5)
        };
        let result = run(config, three_days(), &ma_config(1, 3));

        assert_eq!(result.sessions_processed, 2);
        assert_eq!(result.bars_processed, 10);
        assert_eq!(result.sessions.len(), 1);
    }

    #[test]
    fn panel_goes_to_sub_metrics() {
        let mut strategy = ma_config(2, 4);
        strategy.panel = vec![IndicatorType::Atr(3), IndicatorType::Adx(2)];
        let config = BacktestConfig {
            record: RecordSelection::All,
            ..sample_config(30)
        };
        let result = run(config, wave_bars(date(2020, 4, 28), 30), &strategy);

        let session = &result.sessions[0];
        let names: Vec<&str> = session.sub_metrics.names().collect();
        assert_eq!(names, vec!["ADX(2)", "ATR(3)"]);
        assert_eq!(session.sub_metrics.len(), 30);
        assert!(session.sub_metrics.get("ATR(3)").unwrap()[29].is_some());
    }
}

mod trailing_sessions {
    use super::*;

    fn twelve_bars() -> Vec<Bar> {
        let closes: Vec<f64> = (0..12).map(|i| 10.0 + (i % 4) as f64).collect();
        close_bars(date(2020, 4, 28), &closes)
    }

    #[test]
    fn skip_drops_the_partial_session() {
        let config = BacktestConfig {
            trailing_session: TrailingSession::Skip,
            ..sample_config(5)
        };
        let result = run(config, twelve_bars(), &ma_config(1, 2));
        assert_eq!(result.sessions_processed, 2);
        assert_eq!(result.bars_processed, 10);
    }

    #[test]
    fn process_replays_the_partial_session() {
        let config = BacktestConfig {
            trailing_session: TrailingSession::Process,
            ..sample_config(5)
        };
        let result = run(config, twelve_bars(), &ma_config(1, 2));
        assert_eq!(result.sessions_processed, 3);
        assert_eq!(result.bars_processed, 12);
        assert_eq!(result.final_position, Position::Flat);
    }

    #[test]
    fn fewer_bars_than_one_session() {
        let bars = close_bars(date(2020, 4, 28), &[10.0, 11.0, 12.0]);
        let result = run(sample_config(5), bars, &ma_config(1, 2));
        assert_eq!(result.sessions_processed, 0);
        assert_eq!(result.report.ending_balance, result.report.starting_balance);
        assert!(result.report.trades.is_none());
    }
}

mod determinism {
    use super::*;

    #[test]
    fn identical_runs_produce_identical_results() {
        let bars: Vec<Bar> = (0..3)
            .flat_map(|d| wave_bars(date(2020, 4, 27) + chrono::Duration::days(d), 40))
            .collect();
        for kind in all_kinds() {
            let mut strategy = StrategyConfig::new(kind);
            strategy.panel = vec![IndicatorType::Rsi(4), IndicatorType::HeikinAshi];
            let config = BacktestConfig {
                record: RecordSelection::All,
                ..sample_config(40)
            };
            let first = run(config.clone(), bars.clone(), &strategy);
            let second = run(config, bars.clone(), &strategy);
            assert_eq!(first, second, "{kind} is not deterministic");
        }
    }
}

mod conservation {
    use super::*;

    #[test]
    fn balance_change_equals_sum_of_outcomes() {
        let bars: Vec<Bar> = (0..5)
            .flat_map(|d| wave_bars(date(2020, 4, 27) + chrono::Duration::days(d), 60))
            .collect();
        for kind in all_kinds() {
            let result = run(sample_config(60), bars.clone(), &StrategyConfig::new(kind));
            assert_eq!(result.final_position, Position::Flat);
            let realized: f64 = result.outcomes.iter().map(|o| o.value).sum();
            assert_relative_eq!(
                result.report.ending_balance - result.report.starting_balance,
                realized,
                epsilon = 1e-6
            );
        }
    }
}

mod data_sources {
    use super::*;

    #[test]
    fn replay_from_csv_file() {
        let bars = wave_bars(date(2020, 4, 28), 50);
        let file = write_bars_csv(&bars);
        let loaded = CsvAdapter::new(file.path()).fetch_bars().unwrap();
        assert_eq!(loaded.len(), 50);

        let strategy = StrategyConfig::new(StrategyKind::RsiPosition {
            period: 5,
            min: 40.0,
            max: 60.0,
        });
        let from_file = run(sample_config(25), loaded, &strategy);
        let from_memory = run(sample_config(25), bars, &strategy);
        assert_eq!(from_file.bars_processed, 50);
        assert_eq!(from_file.outcomes.len(), from_memory.outcomes.len());
        assert_relative_eq!(
            from_file.report.ending_balance,
            from_memory.report.ending_balance,
            epsilon = 1e-9
        );
    }

    #[test]
    fn mock_port_supplies_bars() {
        let port = MockDataPort::new(repeated_days(2, &[10.0, 11.0, 12.0, 11.0, 10.0]));
        let bars = port.fetch_bars().unwrap();
        let result = run(sample_config(5), bars, &ma_config(1, 3));
        assert_eq!(result.outcomes.len(), 2);
        assert_relative_eq!(result.report.ending_balance, 9_980.0);
    }

    #[test]
    fn out_of_order_bars_rejected() {
        let mut bars = close_bars(date(2020, 4, 28), &[10.0, 11.0, 12.0]);
        bars.swap(0, 2);
        let err = BacktestEngine::new(sample_config(3), bars, ma_config(1, 2).build())
            .err()
            .unwrap();
        assert!(matches!(err, BacktestError::Data { .. }));
    }
}
