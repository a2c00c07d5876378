//! Average Directional Index.

use crate::domain::bar::Bar;
use crate::domain::indicator::Indicator;
use crate::domain::indicator::atr::Atr;
use crate::domain::indicator::wilder::Wilder;

#[derive(Debug, Clone, PartialEq)]
pub struct Adx {
    atr: Atr,
    plus_dm: Wilder,
    minus_dm: Wilder,
    dx: Wilder,
}

impl Adx {
    pub fn new(period: usize) -> Self {
        Adx {
            atr: Atr::new(period),
            plus_dm: Wilder::new(period),
            minus_dm: Wilder::new(period),
            dx: Wilder::new(period),
        }
    }
}

/// (+DM, -DM) between two consecutive bars. Equal moves cancel.
fn directional_movement(prev: &Bar, bar: &Bar) -> (f64, f64) {
    let up = bar.high - prev.high;
    let down = prev.low - bar.low;
    let plus = if up > down && up > 0.0 { up } else { 0.0 };
    let minus = if down > up && down > 0.0 { down } else { 0.0 };
    (plus, minus)
}

fn directional_index(plus_di: f64, minus_di: f64) -> f64 {
    let sum = plus_di + minus_di;
    if sum == 0.0 {
        0.0
    } else {
        ((plus_di - minus_di) / sum).abs()
    }
}

impl Indicator for Adx {
    type Output = f64;

    fn update(&mut self, window: &[Bar]) -> Option<f64> {
        if window.len() == 1 {
            self.reset();
        }
        let atr = self.atr.update(window);

        let len = window.len();
        if len < 2 {
            return None;
        }
        let (plus, minus) = directional_movement(&window[len - 2], &window[len - 1]);
        let plus = self.plus_dm.push(plus);
        let minus = self.minus_dm.push(minus);

        let (plus, minus, atr) = (plus?, minus?, atr?);
        let (plus_di, minus_di) = if atr > 0.0 {
            (plus / atr, minus / atr)
        } else {
            (0.0, 0.0)
        };

        self.dx
            .push(directional_index(plus_di, minus_di))
            .map(|avg| 100.0 * avg)
    }

    fn reset(&mut self) {
        self.atr.reset();
        self.plus_dm.reset();
        self.minus_dm.reset();
        self.dx.reset();
    }
}
