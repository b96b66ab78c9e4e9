//! Raw data providers.

pub mod csv_source;
pub mod provider;
pub mod synthetic;
pub mod yahoo;

pub use csv_source::{read_raw_csv, CsvProvider};
pub use provider::{DataError, DataProvider, DataSource, FetchResult};
pub use synthetic::{generate_synthetic_bars, SyntheticProvider};
pub use yahoo::YahooProvider;
