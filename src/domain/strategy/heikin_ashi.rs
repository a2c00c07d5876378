//! Buys the turn after a run of bearish Heikin-Ashi candles and holds to the
//! end of the session.

use crate::domain::error::BacktestError;
use crate::domain::indicator::{HeikinAshi, Indicator, IndicatorPanel};
use crate::domain::session::SessionWindow;
use crate::domain::strategy::{Broker, Strategy, StrategyUpdate, Trader};
use tracing::debug;

pub const DEFAULT_HEIKIN_PERIOD: usize = 7;

#[derive(Debug, Clone)]
pub struct HeikinAshiReversal {
    ha: HeikinAshi,
    period: usize,
    candles: usize,
    bearish_run: usize,
    trader: Trader,
    panel: IndicatorPanel,
}

impl HeikinAshiReversal {
    pub fn new(period: usize, order_size: u64, panel: IndicatorPanel) -> Self {
        HeikinAshiReversal {
            ha: HeikinAshi::new(),
            period,
            candles: 0,
            bearish_run: 0,
            trader: Trader::new(order_size),
            panel,
        }
    }
}

impl Strategy for HeikinAshiReversal {
    fn name(&self) -> &str {
        "heikin_ashi"
    }

    fn update(
        &mut self,
        window: &SessionWindow<'_>,
        broker: &mut Broker<'_>,
    ) -> Result<StrategyUpdate, BacktestError> {
        let bars = window.bars();
        if window.is_first_bar() {
            self.candles = 0;
            self.bearish_run = 0;
        }

        let candle = self.ha.update(bars);
        if let Some(c) = candle {
            self.candles += 1;
            self.bearish_run = if c.is_bearish() { self.bearish_run + 1 } else { 0 };
        }

        let direction = if window.is_last_bar() {
            self.trader.force_exit(broker)?
        } else if self.candles > self.period && self.bearish_run >= self.period {
            let entered = self.trader.enter_long(broker)?;
            if entered.is_some() {
                debug!(
                    timestamp = %window.current().timestamp,
                    run = self.bearish_run,
                    "bearish run, entering long"
                );
            }
            entered
        } else {
            None
        };

        Ok(StrategyUpdate {
            direction,
            metrics: vec![
                ("HA_OPEN".to_string(), candle.map(|c| c.open)),
                ("HA_CLOSE".to_string(), candle.map(|c| c.close)),
            ],
            sub_metrics: self.panel.update(bars),
        })
    }
}
