//! Indicator engine: runs the fixed indicator set over a cleaned series.

use super::{Bollinger, BollingerBand, Indicator, Rsi, Sma};
use crate::domain::{EnrichedRow, EnrichedSeries, Series};
use crate::rolling::StdDev;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Window lengths and conventions for the indicator set.
///
/// Column names (`ma_50`, `rsi_14`, ...) are fixed; the periods behind them
/// can be overridden.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicatorConfig {
    pub fast_ma_period: usize,
    pub slow_ma_period: usize,
    pub bollinger_period: usize,
    pub bollinger_multiplier: f64,
    pub rsi_period: usize,
    pub std_dev: StdDev,
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self {
            fast_ma_period: 50,
            slow_ma_period: 200,
            bollinger_period: 20,
            bollinger_multiplier: 2.0,
            rsi_period: 14,
            std_dev: StdDev::Sample,
        }
    }
}

impl IndicatorConfig {
    /// Check every period is usable.
    pub fn validate(&self) -> Result<(), String> {
        let periods = [
            ("fast_ma_period", self.fast_ma_period),
            ("slow_ma_period", self.slow_ma_period),
            ("bollinger_period", self.bollinger_period),
            ("rsi_period", self.rsi_period),
        ];
        for (name, period) in periods {
            if period == 0 {
                return Err(format!("{name} must be >= 1"));
            }
        }
        if !self.bollinger_multiplier.is_finite() || self.bollinger_multiplier < 0.0 {
            return Err("bollinger_multiplier must be a non-negative number".into());
        }
        Ok(())
    }
}

pub struct IndicatorEngine {
    fast_ma: Sma,
    slow_ma: Sma,
    bollinger: Bollinger,
    rsi: Rsi,
}

impl IndicatorEngine {
    pub fn new(config: &IndicatorConfig) -> Self {
        Self {
            fast_ma: Sma::new(config.fast_ma_period),
            slow_ma: Sma::new(config.slow_ma_period),
            bollinger: Bollinger::new(
                config.bollinger_period,
                config.bollinger_multiplier,
                config.std_dev,
                BollingerBand::Middle,
            ),
            rsi: Rsi::new(config.rsi_period),
        }
    }

    /// Largest lookback across the indicator set.
    pub fn warmup(&self) -> usize {
        [
            self.fast_ma.lookback(),
            self.slow_ma.lookback(),
            self.bollinger.lookback(),
            self.rsi.lookback(),
        ]
        .into_iter()
        .max()
        .unwrap_or(0)
    }

    /// Attach indicator values to every bar. Feature columns stay undefined.
    pub fn compute(&self, series: &Series) -> EnrichedSeries {
        let bars = series.bars();
        let fast = self.fast_ma.compute(bars);
        let slow = self.slow_ma.compute(bars);
        let bands = self.bollinger.bands(bars);
        let rsi = self.rsi.compute(bars);

        debug!(
            rows = bars.len(),
            warmup = self.warmup(),
            "computed indicators"
        );

        let rows = bars
            .iter()
            .enumerate()
            .map(|(i, bar)| {
                let mut row = EnrichedRow::from_bar(bar);
                row.ma_50 = fast[i];
                row.ma_200 = slow[i];
                if let Some(b) = bands[i] {
                    row.bb_mid = Some(b.middle);
                    row.bb_std = Some(b.std);
                    row.bb_upper = Some(b.upper);
                    row.bb_lower = Some(b.lower);
                }
                row.rsi_14 = rsi[i];
                row
            })
            .collect();

        EnrichedSeries::from_ordered(rows)
    }
}

impl Default for IndicatorEngine {
    fn default() -> Self {
        Self::new(&IndicatorConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_bars};

    fn series(closes: &[f64]) -> Series {
        Series::new(make_bars(closes)).unwrap()
    }

    #[test]
    fn default_warmup_is_slow_ma() {
        assert_eq!(IndicatorEngine::default().warmup(), 199);
    }

    #[test]
    fn output_is_row_aligned() {
        let closes: Vec<f64> = (0..250).map(|i| 100.0 + (i as f64 * 0.3).sin()).collect();
        let out = IndicatorEngine::default().compute(&series(&closes));
        assert_eq!(out.len(), 250);
        for (row, close) in out.rows().iter().zip(&closes) {
            assert_eq!(row.close, *close);
            assert!(row.volatility_20.is_none());
            assert!(row.price_vs_ma50.is_none());
        }
    }

    #[test]
    fn warmup_boundaries() {
        let closes: Vec<f64> = (0..210).map(|i| 50.0 + (i % 7) as f64).collect();
        let out = IndicatorEngine::default().compute(&series(&closes));
        let rows = out.rows();

        assert!(rows[48].ma_50.is_none());
        assert!(rows[49].ma_50.is_some());
        assert!(rows[198].ma_200.is_none());
        assert!(rows[199].ma_200.is_some());
        assert!(rows[18].bb_mid.is_none());
        assert!(rows[19].bb_mid.is_some());
        assert!(rows[13].rsi_14.is_none());
        assert!(rows[14].rsi_14.is_some());
    }

    #[test]
    fn bands_wrap_mid() {
        let closes: Vec<f64> = (0..40).map(|i| 10.0 + (i as f64).sqrt()).collect();
        let out = IndicatorEngine::default().compute(&series(&closes));
        for row in &out.rows()[19..] {
            let (mid, std) = (row.bb_mid.unwrap(), row.bb_std.unwrap());
            assert_approx(row.bb_upper.unwrap(), mid + 2.0 * std, 1e-9);
            assert_approx(row.bb_lower.unwrap(), mid - 2.0 * std, 1e-9);
        }
    }

    #[test]
    fn config_validation() {
        assert!(IndicatorConfig::default().validate().is_ok());
        let bad = IndicatorConfig {
            rsi_period: 0,
            ..Default::default()
        };
        assert!(bad.validate().is_err());
    }
}
