//! Partition store trait and structured error types.
//!
//! A store maps partition names (`{ticker}_{YYYY}_{MM}`) to the enriched rows
//! of that month. Writing a partition replaces it wholesale; there is no
//! append or merge.

use featurelab_core::domain::{EnrichedRow, Partition, PartitionKey, PartitionNameError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("partition not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    InvalidName(#[from] PartitionNameError),

    #[error("store is locked by another writer ({path})")]
    Locked { path: String },

    #[error("I/O error at {path}: {message}")]
    Io { path: String, message: String },

    #[error("parquet I/O error: {0}")]
    Parquet(String),

    #[error("schema mismatch in {partition}: {message}")]
    Schema { partition: String, message: String },

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("store lock poisoned")]
    Poisoned,
}

impl StoreError {
    pub(crate) fn io(path: &std::path::Path, err: std::io::Error) -> Self {
        StoreError::Io {
            path: path.display().to_string(),
            message: err.to_string(),
        }
    }
}

/// Persistence for partitions.
///
/// `write_batch` holds the store's lock for the whole batch and releases it
/// on every exit path, including errors.
pub trait PartitionStore: Send + Sync {
    /// Write every partition, replacing any existing partition of the same
    /// name. Returns the number of partitions written.
    fn write_batch(&self, partitions: &[Partition]) -> Result<usize, StoreError>;

    /// Rows of one partition, in timestamp order.
    fn read(&self, name: &str) -> Result<Vec<EnrichedRow>, StoreError>;

    /// All partition names, sorted.
    fn list(&self) -> Result<Vec<String>, StoreError>;

    fn remove(&self, name: &str) -> Result<(), StoreError>;

    fn contains(&self, name: &str) -> Result<bool, StoreError> {
        Ok(self.list()?.iter().any(|n| n == name))
    }
}

/// Parse a partition name and reject tickers that could escape a storage
/// directory. Tickers such as `BRK.B`, `^GSPC` or `EURUSD=X` are fine.
pub fn parse_partition_name(name: &str) -> Result<PartitionKey, StoreError> {
    let key: PartitionKey = name.parse()?;
    let safe = key
        .ticker
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || "_-.^=".contains(c));
    if !safe || key.ticker.starts_with('.') {
        return Err(PartitionNameError(name.to_string()).into());
    }
    Ok(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_market_tickers() {
        for name in ["AAPL_2023_04", "BRK.B_2024_01", "^GSPC_2020_12", "stock_data_AAPL_2023_04"] {
            assert!(parse_partition_name(name).is_ok(), "{name}");
        }
    }

    #[test]
    fn rejects_path_like_names() {
        for name in ["../x_2023_04", "a/b_2023_04", ".hidden_2023_04", "AAPL_2023_4", "AAPL"] {
            assert!(parse_partition_name(name).is_err(), "{name}");
        }
    }
}
