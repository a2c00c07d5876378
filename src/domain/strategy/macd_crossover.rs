//! Long when the MACD line crosses above its signal line.

use crate::domain::error::BacktestError;
use crate::domain::indicator::{Indicator, IndicatorPanel, IndicatorType, Macd, ValueEma};
use crate::domain::session::SessionWindow;
use crate::domain::strategy::{Broker, Strategy, StrategyUpdate, Trader};

#[derive(Debug, Clone)]
pub struct MacdCrossover {
    macd: Macd,
    signal: ValueEma,
    macd_name: String,
    signal_name: String,
    trader: Trader,
    panel: IndicatorPanel,
}

impl MacdCrossover {
    pub fn new(
        short_period: usize,
        long_period: usize,
        signal_period: usize,
        order_size: u64,
        panel: IndicatorPanel,
    ) -> Self {
        MacdCrossover {
            macd: Macd::new(short_period, long_period),
            signal: ValueEma::new(signal_period),
            macd_name: IndicatorType::Macd {
                short: short_period,
                long: long_period,
            }
            .to_string(),
            signal_name: format!("SIGNAL({signal_period})"),
            trader: Trader::new(order_size),
            panel,
        }
    }
}

impl Strategy for MacdCrossover {
    fn name(&self) -> &str {
        "macd_crossover"
    }

    fn update(
        &mut self,
        window: &SessionWindow<'_>,
        broker: &mut Broker<'_>,
    ) -> Result<StrategyUpdate, BacktestError> {
        let bars = window.bars();
        if window.is_first_bar() {
            self.signal.reset();
        }
        let macd = self.macd.update(bars);
        let signal = match macd {
            Some(value) => self.signal.push(value),
            None => None,
        };

        let direction = self.trader.crossover(macd, signal, window, broker)?;

        let mut sub_metrics = vec![
            (self.macd_name.clone(), macd),
            (self.signal_name.clone(), signal),
        ];
        sub_metrics.extend(self.panel.update(bars));

        Ok(StrategyUpdate {
            direction,
            metrics: Vec::new(),
            sub_metrics,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::order::{Direction, Position};
    use crate::domain::strategy::test_support::{closes, markers, run_session};
    use approx::assert_relative_eq;

    #[test]
    fn warmup_needs_long_ema_and_signal() {
        let bars = closes(&[10.0, 11.0, 12.0, 13.0, 14.0, 15.0]);
        let mut strategy = MacdCrossover::new(2, 3, 2, 1, IndicatorPanel::default());
        let (updates, _, _) = run_session(&mut strategy, &bars);

        // MACD from bar 2, signal one bar later
        assert!(updates[1].sub_metrics[0].1.is_none());
        assert!(updates[2].sub_metrics[0].1.is_some());
        assert!(updates[2].sub_metrics[1].1.is_none());
        assert!(updates[3].sub_metrics[1].1.is_some());
        assert_eq!(updates[0].sub_metrics[0].0, "MACD(2,3)");
        assert_eq!(updates[0].sub_metrics[1].0, "SIGNAL(2)");
    }

    #[test]
    fn signal_is_ema_of_macd() {
        let bars = closes(&[10.0, 12.0, 11.0, 14.0, 13.0, 17.0, 16.0]);
        let mut strategy = MacdCrossover::new(2, 3, 2, 1, IndicatorPanel::default());
        let (updates, _, _) = run_session(&mut strategy, &bars);

        let m2 = updates[2].sub_metrics[0].1.unwrap();
        let m3 = updates[3].sub_metrics[0].1.unwrap();
        let m4 = updates[4].sub_metrics[0].1.unwrap();
        let seed = (m2 + m3) / 2.0;
        assert_relative_eq!(updates[3].sub_metrics[1].1.unwrap(), seed);
        let rate = 2.0 / 3.0;
        assert_relative_eq!(
            updates[4].sub_metrics[1].1.unwrap(),
            m4 * rate + seed * (1.0 - rate)
        );
    }

    #[test]
    fn accelerating_rally_goes_long_and_closes_at_session_end() {
        let bars = closes(&[10.0, 10.0, 10.0, 10.0, 11.0, 13.0, 16.0, 20.0]);
        let mut strategy = MacdCrossover::new(2, 4, 2, 3, IndicatorPanel::default());
        let (updates, orders, balance) = run_session(&mut strategy, &bars);

        let marks = markers(&updates);
        assert!(marks.contains(&Some(Direction::Long)));
        assert_eq!(marks[7], Some(Direction::Short));
        assert_eq!(orders.position(), Position::Flat);
        assert_eq!(balance.outcomes().len(), 1);
        assert!(balance.outcomes()[0].value > 0.0);
    }
}
