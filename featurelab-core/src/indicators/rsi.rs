//! Relative Strength Index (RSI).
//!
//! delta = close[t] - close[t-1]
//! gain  = rolling mean of max(delta, 0) over `period` deltas
//! loss  = rolling mean of max(-delta, 0) over `period` deltas
//! RSI   = 100 - 100 / (1 + gain / loss)
//!
//! Simple (unsmoothed) averages. Lookback: period, since the first bar has
//! no delta. Edge cases: loss == 0 with gain > 0 saturates at 100;
//! gain == loss == 0 (no movement) is undefined.

use super::change::diff;
use super::Indicator;
use crate::domain::Bar;
use crate::rolling::RollingWindow;

#[derive(Debug, Clone)]
pub struct Rsi {
    period: usize,
    name: String,
}

impl Rsi {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "RSI period must be >= 1");
        Self {
            period,
            name: format!("rsi_{period}"),
        }
    }
}

impl Indicator for Rsi {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period
    }

    fn compute(&self, bars: &[Bar]) -> Vec<Option<f64>> {
        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        let mut gains = RollingWindow::new(self.period);
        let mut losses = RollingWindow::new(self.period);

        diff(&closes)
            .into_iter()
            .map(|delta| {
                gains.push(delta.map(|d| d.max(0.0)));
                losses.push(delta.map(|d| (-d).max(0.0)));
                compute_rsi(gains.mean()?, losses.mean()?)
            })
            .collect()
    }
}

fn compute_rsi(avg_gain: f64, avg_loss: f64) -> Option<f64> {
    if avg_loss == 0.0 && avg_gain == 0.0 {
        None // no movement
    } else if avg_loss == 0.0 {
        Some(100.0)
    } else {
        let rsi = 100.0 - 100.0 / (1.0 + avg_gain / avg_loss);
        Some(rsi.clamp(0.0, 100.0))
    }
}
