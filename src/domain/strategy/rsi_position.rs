//! Mean reversion on RSI zones: buy into oversold, sell into overbought.

use crate::domain::error::BacktestError;
use crate::domain::indicator::{Indicator, IndicatorPanel, IndicatorType, Rsi};
use crate::domain::session::SessionWindow;
use crate::domain::strategy::{Broker, Strategy, StrategyUpdate, Trader};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Zone {
    Below,
    Inside,
    Above,
}

#[derive(Debug, Clone)]
pub struct RsiPosition {
    rsi: Rsi,
    min: f64,
    max: f64,
    name: String,
    zone: Option<Zone>,
    trader: Trader,
    panel: IndicatorPanel,
}

impl RsiPosition {
    pub fn new(period: usize, min: f64, max: f64, order_size: u64, panel: IndicatorPanel) -> Self {
        RsiPosition {
            rsi: Rsi::new(period),
            min,
            max,
            name: IndicatorType::Rsi(period).to_string(),
            zone: None,
            trader: Trader::new(order_size),
            panel,
        }
    }

    fn zone(&self, rsi: f64) -> Zone {
        if rsi < self.min {
            Zone::Below
        } else if rsi > self.max {
            Zone::Above
        } else {
            Zone::Inside
        }
    }
}

impl Strategy for RsiPosition {
    fn name(&self) -> &str {
        "rsi_position"
    }

    fn update(
        &mut self,
        window: &SessionWindow<'_>,
        broker: &mut Broker<'_>,
    ) -> Result<StrategyUpdate, BacktestError> {
        let bars = window.bars();
        if window.is_first_bar() {
            self.zone = None;
        }
        let rsi = self.rsi.update(bars);

        let direction = if window.is_last_bar() {
            self.trader.force_exit(broker)?
        } else if let Some(value) = rsi {
            let zone = self.zone(value);
            // the first reading only establishes the zone
            let entered = self.zone.is_some_and(|prev| prev != zone);
            self.zone = Some(zone);
            match zone {
                Zone::Below if entered => self.trader.enter_long(broker)?,
                Zone::Above if entered => self.trader.exit(broker)?,
                _ => None,
            }
        } else {
            None
        };

        let mut sub_metrics = vec![(self.name.clone(), rsi)];
        sub_metrics.extend(self.panel.update(bars));

        Ok(StrategyUpdate {
            direction,
            metrics: Vec::new(),
            sub_metrics,
        })
    }
}
