//! Per-ticker pipeline: filter → indicators → features → partitions.

use crate::domain::{EnrichedSeries, Partition, RawBar, SeriesError};
use crate::features::{FeatureConfig, FeatureEngineer};
use crate::indicators::{IndicatorConfig, IndicatorEngine};
use crate::outlier::{OutlierConfig, OutlierFilter, OutlierReport};
use crate::partitioner::partition;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Settings for every stage. Each section defaults independently, so a
/// config file only names what it overrides.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub outlier: OutlierConfig,
    pub indicators: IndicatorConfig,
    pub features: FeatureConfig,
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<(), String> {
        self.outlier.validate()?;
        self.indicators.validate()?;
        self.features.validate()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineStats {
    pub input_rows: usize,
    pub dropped_missing: usize,
    pub dropped_outliers: usize,
    pub output_rows: usize,
    pub partitions: usize,
}

impl PipelineStats {
    fn new(report: &OutlierReport, partitions: usize) -> Self {
        Self {
            input_rows: report.input_rows,
            dropped_missing: report.dropped_missing,
            dropped_outliers: report.dropped_outliers,
            output_rows: report.output_rows(),
            partitions,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub ticker: String,
    pub enriched: EnrichedSeries,
    pub partitions: Vec<Partition>,
    pub stats: PipelineStats,
}

pub struct Pipeline {
    filter: OutlierFilter,
    indicators: IndicatorEngine,
    features: FeatureEngineer,
}

impl Pipeline {
    /// Build a pipeline from a config. Call [`PipelineConfig::validate`]
    /// first for user-supplied configs: zero-length windows are rejected
    /// there, not here.
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            filter: OutlierFilter::new(config.outlier.clone()),
            indicators: IndicatorEngine::new(&config.indicators),
            features: FeatureEngineer::new(config.features.clone()),
        }
    }

    /// Run every stage for one ticker. `partition_prefix` names the
    /// partitions; it is usually the ticker itself.
    pub fn run(&self, partition_prefix: &str, raw: &[RawBar]) -> Result<PipelineOutput, SeriesError> {
        let (series, report) = self.filter.apply_with_report(raw)?;
        if report.dropped_missing + report.dropped_outliers > 0 {
            warn!(
                ticker = partition_prefix,
                missing = report.dropped_missing,
                outliers = report.dropped_outliers,
                "dropped rows during cleaning"
            );
        }

        let enriched = self.features.apply(&self.indicators.compute(&series));
        let partitions = partition(partition_prefix, &enriched);
        let stats = PipelineStats::new(&report, partitions.len());

        info!(
            ticker = partition_prefix,
            rows = stats.output_rows,
            partitions = stats.partitions,
            "pipeline complete"
        );

        Ok(PipelineOutput {
            ticker: partition_prefix.to_string(),
            enriched,
            partitions,
            stats,
        })
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new(&PipelineConfig::default())
    }
}
