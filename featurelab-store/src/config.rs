//! Run configuration, loaded from TOML.
//!
//! ```toml
//! [run]
//! tickers = ["AAPL", "MSFT", "GOOGL"]
//! start_date = "2023-01-01"
//! end_date = "2024-01-01"
//!
//! [storage]
//! root = "data"
//! database_name = "stock_data"
//!
//! [tables]
//! AAPL = "apple"
//!
//! [pipeline.outlier]
//! z_threshold = 3.0
//! ```

use chrono::NaiveDate;
use featurelab_core::pipeline::PipelineConfig;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {message}")]
    Read { path: String, message: String },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSection {
    pub tickers: Vec<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSection {
    pub root: PathBuf,
    pub database_name: String,
}

impl Default for StorageSection {
    fn default() -> Self {
        Self {
            root: PathBuf::from("data"),
            database_name: "stock_data".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    pub run: RunSection,
    #[serde(default)]
    pub storage: StorageSection,
    /// Partition prefix per ticker. Tickers not listed use their own symbol.
    #[serde(default)]
    pub tables: BTreeMap<String, String>,
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

impl RunConfig {
    pub fn new(tickers: Vec<String>, start_date: NaiveDate, end_date: NaiveDate) -> Self {
        Self {
            run: RunSection {
                tickers,
                start_date,
                end_date,
            },
            storage: StorageSection::default(),
            tables: BTreeMap::new(),
            pipeline: PipelineConfig::default(),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: RunConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.run.tickers.is_empty() {
            return Err(ConfigError::Invalid("run.tickers must not be empty".into()));
        }
        if let Some(t) = self.run.tickers.iter().find(|t| t.trim().is_empty()) {
            return Err(ConfigError::Invalid(format!("blank ticker {t:?}")));
        }
        if self.run.start_date > self.run.end_date {
            return Err(ConfigError::Invalid(format!(
                "start_date {} is after end_date {}",
                self.run.start_date, self.run.end_date
            )));
        }
        if self.storage.database_name.trim().is_empty() {
            return Err(ConfigError::Invalid("storage.database_name must not be empty".into()));
        }
        // No two tickers may share a partition prefix.
        let mut prefixes = BTreeSet::new();
        for ticker in &self.run.tickers {
            let prefix = self.partition_prefix(ticker);
            // Partition names must be storable as file names.
            crate::store::parse_partition_name(&format!("{prefix}_2000_01"))
                .map_err(|_| ConfigError::Invalid(format!("unusable partition prefix {prefix:?}")))?;
            if !prefixes.insert(prefix) {
                return Err(ConfigError::Invalid(format!(
                    "partition prefix {prefix:?} is used by more than one ticker (at {ticker:?})"
                )));
            }
        }
        self.pipeline.validate().map_err(ConfigError::Invalid)
    }

    /// The prefix partitions of `ticker` are stored under.
    pub fn partition_prefix<'a>(&'a self, ticker: &'a str) -> &'a str {
        self.tables.get(ticker).map(String::as_str).unwrap_or(ticker)
    }
}
