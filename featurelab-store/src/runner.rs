//! Multi-ticker runner: fetch → pipeline → store, per ticker.
//!
//! Tickers are independent. With `parallel` set they run on the rayon pool;
//! each ticker writes its partitions as one store batch. A failing ticker is
//! recorded in the summary and does not stop the others.

use crate::config::{ConfigError, RunConfig};
use crate::store::{PartitionStore, StoreError};
use featurelab_core::data::{DataError, DataProvider, DataSource};
use featurelab_core::domain::SeriesError;
use featurelab_core::pipeline::{Pipeline, PipelineStats};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, info, warn};

#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("data error: {0}")]
    Data(#[from] DataError),
    #[error("malformed input: {0}")]
    Series(#[from] SeriesError),
    #[error("storage failure: {0}")]
    Store(#[from] StoreError),
}

/// Outcome of one successful ticker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TickerReport {
    pub ticker: String,
    pub source: DataSource,
    pub stats: PipelineStats,
    pub partitions: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TickerFailure {
    pub ticker: String,
    pub error: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunSummary {
    pub succeeded: Vec<TickerReport>,
    pub failed: Vec<TickerFailure>,
}

impl RunSummary {
    pub fn partitions_written(&self) -> usize {
        self.succeeded.iter().map(|r| r.partitions.len()).sum()
    }

    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

pub struct Runner<'a> {
    provider: &'a dyn DataProvider,
    store: &'a dyn PartitionStore,
    config: &'a RunConfig,
    pipeline: Pipeline,
}

impl<'a> Runner<'a> {
    /// Validate the config and build the pipeline.
    pub fn new(
        provider: &'a dyn DataProvider,
        store: &'a dyn PartitionStore,
        config: &'a RunConfig,
    ) -> Result<Self, RunError> {
        config.validate()?;
        Ok(Self {
            provider,
            store,
            config,
            pipeline: Pipeline::new(&config.pipeline),
        })
    }

    pub fn run_ticker(&self, ticker: &str) -> Result<TickerReport, RunError> {
        let fetched = self
            .provider
            .fetch(ticker, self.config.run.start_date, self.config.run.end_date)?;
        if fetched.source.is_synthetic() {
            warn!(ticker, "using synthetic data");
        }

        let prefix = self.config.partition_prefix(ticker);
        let output = self.pipeline.run(prefix, &fetched.bars)?;
        self.store.write_batch(&output.partitions)?;

        Ok(TickerReport {
            ticker: ticker.to_string(),
            source: fetched.source,
            stats: output.stats,
            partitions: output.partitions.iter().map(|p| p.name()).collect(),
        })
    }

    pub fn run_all(&self, parallel: bool) -> RunSummary {
        let tickers = &self.config.run.tickers;
        info!(
            tickers = tickers.len(),
            provider = self.provider.name(),
            parallel,
            "starting run"
        );

        let outcomes: Vec<(String, Result<TickerReport, RunError>)> = if parallel {
            tickers
                .par_iter()
                .map(|t| (t.clone(), self.run_ticker(t)))
                .collect()
        } else {
            tickers
                .iter()
                .map(|t| (t.clone(), self.run_ticker(t)))
                .collect()
        };

        let mut summary = RunSummary::default();
        for (ticker, outcome) in outcomes {
            match outcome {
                Ok(report) => summary.succeeded.push(report),
                Err(e) => {
                    error!(ticker = %ticker, error = %e, "ticker failed");
                    summary.failed.push(TickerFailure {
                        ticker,
                        error: e.to_string(),
                    });
                }
            }
        }

        info!(
            succeeded = summary.succeeded.len(),
            failed = summary.failed.len(),
            partitions = summary.partitions_written(),
            "run complete"
        );
        summary
    }
}
