//! FeatureLab Store: partition persistence, CSV export, run configuration
//! and the multi-ticker runner.
//!
//! This crate builds on `featurelab-core` to provide:
//! - The `PartitionStore` trait with in-memory and Parquet implementations
//! - CSV export and re-import of stored partitions
//! - TOML run configuration
//! - A runner that fetches, processes and stores many tickers in parallel

pub mod config;
pub mod export;
pub mod memory;
pub mod parquet;
pub mod runner;
pub mod store;

pub use config::{ConfigError, RunConfig};
pub use export::{export_all, export_partition, read_csv, to_csv_string, write_csv, ExportError};
pub use memory::MemoryStore;
pub use parquet::{ParquetStore, PartitionMeta};
pub use runner::{RunError, RunSummary, Runner, TickerFailure, TickerReport};
pub use store::{parse_partition_name, PartitionStore, StoreError};
