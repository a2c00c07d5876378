//! Value-stream recurrences shared by the bar indicators.

/// Wilder smoothing: seeded with the mean of the first `period` inputs, then
/// `avg' = ((period - 1) * avg + x) / period`.
#[derive(Debug, Clone, PartialEq)]
pub struct Wilder {
    period: usize,
    count: usize,
    sum: f64,
    average: Option<f64>,
}

impl Wilder {
    pub fn new(period: usize) -> Self {
        Wilder {
            period,
            count: 0,
            sum: 0.0,
            average: None,
        }
    }

    pub fn push(&mut self, value: f64) -> Option<f64> {
        if self.period == 0 {
            return None;
        }
        match self.average {
            Some(avg) => {
                let p = self.period as f64;
                self.average = Some(((p - 1.0) * avg + value) / p);
            }
            None => {
                self.sum += value;
                self.count += 1;
                if self.count == self.period {
                    self.average = Some(self.sum / self.period as f64);
                }
            }
        }
        self.average
    }

    pub fn value(&self) -> Option<f64> {
        self.average
    }

    pub fn reset(&mut self) {
        self.count = 0;
        self.sum = 0.0;
        self.average = None;
    }
}

/// Exponential average over a stream of values, seeded with their simple mean.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueEma {
    period: usize,
    rate: f64,
    count: usize,
    sum: f64,
    average: Option<f64>,
}

impl ValueEma {
    pub const DEFAULT_SMOOTHING: f64 = 2.0;

    pub fn new(period: usize) -> Self {
        ValueEma::with_smoothing(period, Self::DEFAULT_SMOOTHING)
    }

    pub fn with_smoothing(period: usize, smoothing: f64) -> Self {
        ValueEma {
            period,
            rate: smoothing / (1.0 + period as f64),
            count: 0,
            sum: 0.0,
            average: None,
        }
    }

    pub fn rate(&self) -> f64 {
        self.rate
    }

    pub fn push(&mut self, value: f64) -> Option<f64> {
        if self.period == 0 {
            return None;
        }
        match self.average {
            Some(avg) => self.average = Some(value * self.rate + avg * (1.0 - self.rate)),
            None => {
                self.sum += value;
                self.count += 1;
                if self.count == self.period {
                    self.average = Some(self.sum / self.period as f64);
                }
            }
        }
        self.average
    }

    pub fn value(&self) -> Option<f64> {
        self.average
    }

    pub fn reset(&mut self) {
        self.count = 0;
        self.sum = 0.0;
        self.average = None;
    }
}
