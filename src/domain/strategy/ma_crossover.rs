//! Long when the short SMA crosses above the long SMA.

use crate::domain::error::BacktestError;
use crate::domain::indicator::{Indicator, IndicatorPanel, IndicatorType, Sma};
use crate::domain::session::SessionWindow;
use crate::domain::strategy::{Broker, Strategy, StrategyUpdate, Trader};

#[derive(Debug, Clone)]
pub struct MovingAverageCrossover {
    short: Sma,
    long: Sma,
    short_name: String,
    long_name: String,
    trader: Trader,
    panel: IndicatorPanel,
}

impl MovingAverageCrossover {
    pub fn new(short_period: usize, long_period: usize, order_size: u64, panel: IndicatorPanel) -> Self {
        MovingAverageCrossover {
            short: Sma::new(short_period),
            long: Sma::new(long_period),
            short_name: IndicatorType::Sma(short_period).to_string(),
            long_name: IndicatorType::Sma(long_period).to_string(),
            trader: Trader::new(order_size),
            panel,
        }
    }
}

impl Strategy for MovingAverageCrossover {
    fn name(&self) -> &str {
        "ma_crossover"
    }

    fn update(
        &mut self,
        window: &SessionWindow<'_>,
        broker: &mut Broker<'_>,
    ) -> Result<StrategyUpdate, BacktestError> {
        let bars = window.bars();
        let short = self.short.update(bars);
        let long = self.long.update(bars);

        let direction = self.trader.crossover(short, long, window, broker)?;

        Ok(StrategyUpdate {
            direction,
            metrics: vec![
                (self.short_name.clone(), short),
                (self.long_name.clone(), long),
            ],
            sub_metrics: self.panel.update(bars),
        })
    }
}
