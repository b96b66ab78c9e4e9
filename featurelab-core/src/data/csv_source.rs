//! CSV import provider.
//!
//! Reads `{dir}/{SYMBOL}.csv` with a header row naming
//! `timestamp,open,high,low,close,volume` (Yahoo-style capitalized headers and
//! `date` are accepted too). Empty cells are missing values. Extra columns are
//! ignored.

use super::provider::{check_range, DataError, DataProvider, DataSource, FetchResult};
use crate::domain::RawBar;
use chrono::NaiveDate;
use serde::Deserialize;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Deserialize)]
struct CsvRow {
    #[serde(alias = "date", alias = "Date", alias = "Timestamp")]
    timestamp: NaiveDate,
    #[serde(alias = "Open")]
    open: Option<f64>,
    #[serde(alias = "High")]
    high: Option<f64>,
    #[serde(alias = "Low")]
    low: Option<f64>,
    #[serde(alias = "Close")]
    close: Option<f64>,
    #[serde(alias = "Volume")]
    volume: Option<f64>,
}

impl From<CsvRow> for RawBar {
    fn from(row: CsvRow) -> Self {
        RawBar {
            timestamp: row.timestamp,
            open: row.open,
            high: row.high,
            low: row.low,
            close: row.close,
            volume: row.volume,
        }
    }
}

/// Parse raw rows from any CSV source. Row order is kept as-is.
pub fn read_raw_csv<R: Read>(reader: R) -> Result<Vec<RawBar>, csv::Error> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    rdr.deserialize::<CsvRow>()
        .map(|row| row.map(RawBar::from))
        .collect()
}

pub struct CsvProvider {
    dir: PathBuf,
}

impl CsvProvider {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, symbol: &str) -> PathBuf {
        self.dir.join(format!("{symbol}.csv"))
    }

    fn load(path: &Path) -> Result<Vec<RawBar>, DataError> {
        let file = std::fs::File::open(path).map_err(|e| DataError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        read_raw_csv(file).map_err(|e| DataError::Csv {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }
}

impl DataProvider for CsvProvider {
    fn name(&self) -> &str {
        "csv"
    }

    fn fetch(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> Result<FetchResult, DataError> {
        check_range(start, end)?;
        let path = self.path_for(symbol);
        if !path.exists() {
            return Err(DataError::SymbolNotFound {
                symbol: symbol.to_string(),
            });
        }

        let bars: Vec<RawBar> = Self::load(&path)?
            .into_iter()
            .filter(|b| b.timestamp >= start && b.timestamp <= end)
            .collect();
        debug!(symbol, rows = bars.len(), path = %path.display(), "loaded csv");

        Ok(FetchResult {
            symbol: symbol.to_string(),
            bars,
            source: DataSource::CsvImport,
        })
    }
}
