//! Domain types for FeatureLab

pub mod bar;
pub mod enriched;
pub mod partition;
pub mod series;

pub use bar::{Bar, PriceColumn, RawBar};
pub use enriched::{EnrichedRow, ENRICHED_COLUMNS};
pub use partition::{Partition, PartitionKey, PartitionNameError};
pub use series::{check_strictly_increasing, EnrichedSeries, Series, SeriesError};
