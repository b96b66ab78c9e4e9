//! Outlier filter: the cleaning stage in front of the indicator engine.
//!
//! 1. Reject malformed input (duplicate or out-of-order timestamps).
//! 2. Drop rows with any missing or non-finite value.
//! 3. Drop rows where any raw column sits at or beyond `z_threshold`
//!    standard deviations from that column's mean.
//!
//! Column statistics are computed once over the rows that survive step 2.
//! This is a single pass, not an iterated filter. Step 3 is skipped when
//! fewer than two rows remain.

use crate::domain::{check_strictly_increasing, Bar, PriceColumn, RawBar, Series, SeriesError};
use crate::rolling::StdDev;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutlierConfig {
    pub z_threshold: f64,
    pub std_dev: StdDev,
}

impl Default for OutlierConfig {
    fn default() -> Self {
        Self {
            z_threshold: 3.0,
            std_dev: StdDev::Sample,
        }
    }
}

impl OutlierConfig {
    pub fn validate(&self) -> Result<(), String> {
        if !self.z_threshold.is_finite() || self.z_threshold <= 0.0 {
            return Err("z_threshold must be a positive number".into());
        }
        Ok(())
    }
}

/// Mean and standard deviation of one raw column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColumnStats {
    pub mean: f64,
    pub std: f64,
}

impl ColumnStats {
    /// Statistics over `values`, or `None` when there are too few values for
    /// the requested convention.
    pub fn compute(values: &[f64], kind: StdDev) -> Option<Self> {
        let n = values.len();
        if n == 0 || n <= kind.ddof() {
            return None;
        }
        let mean = values.iter().sum::<f64>() / n as f64;
        let ss: f64 = values.iter().map(|v| (v - mean) * (v - mean)).sum();
        let std = (ss / (n - kind.ddof()) as f64).sqrt();
        Some(Self { mean, std })
    }

    /// |z| of `value`, or `None` for a degenerate (zero or non-finite) spread.
    pub fn abs_z(&self, value: f64) -> Option<f64> {
        if self.std > 0.0 && self.std.is_finite() {
            Some(((value - self.mean) / self.std).abs())
        } else {
            None
        }
    }
}

/// Row counts from one filter pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutlierReport {
    pub input_rows: usize,
    pub dropped_missing: usize,
    pub dropped_outliers: usize,
}

impl OutlierReport {
    pub fn output_rows(&self) -> usize {
        self.input_rows - self.dropped_missing - self.dropped_outliers
    }
}

#[derive(Debug, Clone, Default)]
pub struct OutlierFilter {
    config: OutlierConfig,
}

impl OutlierFilter {
    pub fn new(config: OutlierConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &OutlierConfig {
        &self.config
    }

    pub fn apply(&self, raw: &[RawBar]) -> Result<Series, SeriesError> {
        self.apply_with_report(raw).map(|(series, _)| series)
    }

    pub fn apply_with_report(&self, raw: &[RawBar]) -> Result<(Series, OutlierReport), SeriesError> {
        check_strictly_increasing(raw.iter().map(|r| r.timestamp))?;

        let complete: Vec<Bar> = raw.iter().filter_map(RawBar::to_bar).collect();
        let mut report = OutlierReport {
            input_rows: raw.len(),
            dropped_missing: raw.len() - complete.len(),
            dropped_outliers: 0,
        };

        let kept = if complete.len() < 2 {
            complete
        } else {
            let stats: Vec<(PriceColumn, Option<ColumnStats>)> = PriceColumn::ALL
                .iter()
                .map(|&col| {
                    let values: Vec<f64> = complete.iter().map(|b| b.get(col)).collect();
                    (col, ColumnStats::compute(&values, self.config.std_dev))
                })
                .collect();
            for (col, s) in &stats {
                match s {
                    Some(s) => trace!(column = col.name(), mean = s.mean, std = s.std, "column stats"),
                    None => trace!(column = col.name(), "column stats undefined"),
                }
            }

            let before = complete.len();
            let kept: Vec<Bar> = complete
                .into_iter()
                .filter(|bar| !self.is_outlier(bar, &stats))
                .collect();
            report.dropped_outliers = before - kept.len();
            kept
        };

        debug!(
            input = report.input_rows,
            dropped_missing = report.dropped_missing,
            dropped_outliers = report.dropped_outliers,
            "filtered raw rows"
        );

        Ok((Series::new(kept)?, report))
    }

    fn is_outlier(&self, bar: &Bar, stats: &[(PriceColumn, Option<ColumnStats>)]) -> bool {
        stats.iter().any(|(col, s)| {
            s.and_then(|s| s.abs_z(bar.get(*col)))
                .is_some_and(|z| z >= self.config.z_threshold)
        })
    }
}
