//! Engineered features derived from indicator output.
//!
//! - `volatility_20`: rolling stddev of one-period percentage changes of close,
//!   annualized by sqrt(periods_per_year). Defined from row `window`, since the
//!   first row has no percentage change.
//! - `price_vs_ma50`: close - ma_50, undefined wherever ma_50 is.

use crate::domain::EnrichedSeries;
use crate::indicators::pct_change;
use crate::rolling::{rolling_map, StdDev};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureConfig {
    pub volatility_window: usize,
    pub periods_per_year: f64,
    pub std_dev: StdDev,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            volatility_window: 20,
            periods_per_year: 252.0,
            std_dev: StdDev::Sample,
        }
    }
}

impl FeatureConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.volatility_window == 0 {
            return Err("volatility_window must be >= 1".into());
        }
        if !self.periods_per_year.is_finite() || self.periods_per_year <= 0.0 {
            return Err("periods_per_year must be positive".into());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct FeatureEngineer {
    config: FeatureConfig,
}

impl FeatureEngineer {
    pub fn new(config: FeatureConfig) -> Self {
        Self { config }
    }

    /// Return a new series with the feature columns filled in. The input is
    /// left untouched.
    pub fn apply(&self, series: &EnrichedSeries) -> EnrichedSeries {
        let closes: Vec<f64> = series.rows().iter().map(|r| r.close).collect();
        let annualize = self.config.periods_per_year.sqrt();
        let std_dev = self.config.std_dev;
        let volatility = rolling_map(
            &pct_change(&closes),
            self.config.volatility_window,
            |w| w.std_dev(std_dev).map(|s| s * annualize),
        );

        let rows: Vec<_> = series
            .rows()
            .iter()
            .zip(volatility)
            .map(|(row, vol)| {
                let mut out = row.clone();
                out.volatility_20 = vol;
                out.price_vs_ma50 = row.ma_50.map(|ma| row.close - ma);
                out
            })
            .collect();

        debug!(rows = rows.len(), "engineered features");
        EnrichedSeries::from_ordered(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Series;
    use crate::indicators::{assert_approx, make_bars, IndicatorEngine};

    fn enriched(closes: &[f64]) -> EnrichedSeries {
        let series = Series::new(make_bars(closes)).unwrap();
        IndicatorEngine::default().compute(&series)
    }

    #[test]
    fn volatility_first_defined_at_row_20() {
        let closes: Vec<f64> = (0..30).map(|i| 100.0 + (i as f64).sin()).collect();
        let out = FeatureEngineer::default().apply(&enriched(&closes));
        let rows = out.rows();
        assert!(rows[..20].iter().all(|r| r.volatility_20.is_none()));
        assert!(rows[20..].iter().all(|r| r.volatility_20.is_some()));
    }

    #[test]
    fn volatility_matches_hand_computation() {
        let closes: Vec<f64> = (0..21).map(|i| 100.0 * 1.01_f64.powi(i) + (i % 2) as f64).collect();
        let out = FeatureEngineer::default().apply(&enriched(&closes));

        let returns: Vec<f64> = closes.windows(2).map(|w| (w[1] - w[0]) / w[0]).collect();
        let mean = returns.iter().sum::<f64>() / 20.0;
        let var = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / 19.0;
        let expected = var.sqrt() * 252.0_f64.sqrt();

        assert_approx(out.rows()[20].volatility_20.unwrap(), expected, 1e-9);
    }

    #[test]
    fn constant_price_has_zero_volatility() {
        let out = FeatureEngineer::default().apply(&enriched(&[42.0; 30]));
        for row in &out.rows()[20..] {
            assert_eq!(row.volatility_20, Some(0.0));
        }
    }

    #[test]
    fn price_vs_ma50_follows_ma() {
        let closes: Vec<f64> = (0..60).map(|i| i as f64 + 1.0).collect();
        let out = FeatureEngineer::default().apply(&enriched(&closes));
        let rows = out.rows();
        assert!(rows[48].price_vs_ma50.is_none());
        // close[49] = 50, ma_50 = mean(1..=50) = 25.5
        assert_approx(rows[49].price_vs_ma50.unwrap(), 24.5, 1e-9);
    }

    #[test]
    fn input_is_not_mutated() {
        let input = enriched(&[10.0; 25]);
        let before = input.clone();
        let _ = FeatureEngineer::default().apply(&input);
        assert_eq!(input, before);
        assert!(input.rows().iter().all(|r| r.volatility_20.is_none()));
    }
}
