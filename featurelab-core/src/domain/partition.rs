//! Partition identity and contents.

use super::enriched::EnrichedRow;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Identity of a monthly partition: `(ticker, year, month)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PartitionKey {
    pub ticker: String,
    pub year: i32,
    pub month: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid partition name '{0}': expected {{ticker}}_{{YYYY}}_{{MM}}")]
pub struct PartitionNameError(pub String);

impl PartitionKey {
    pub fn new(ticker: impl Into<String>, year: i32, month: u32) -> Self {
        Self {
            ticker: ticker.into(),
            year,
            month,
        }
    }

    /// Storage address: `{ticker}_{year}_{month:02}`.
    pub fn name(&self) -> String {
        format!("{}_{}_{:02}", self.ticker, self.year, self.month)
    }
}

impl fmt::Display for PartitionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

impl FromStr for PartitionKey {
    type Err = PartitionNameError;

    /// Parse a partition name. The ticker may itself contain underscores;
    /// the last two segments are always year and month.
    fn from_str(name: &str) -> Result<Self, Self::Err> {
        let err = || PartitionNameError(name.to_string());
        let mut parts = name.rsplitn(3, '_');
        let month_str = parts.next().ok_or_else(err)?;
        let year_str = parts.next().ok_or_else(err)?;
        let ticker = parts.next().filter(|t| !t.is_empty()).ok_or_else(err)?;

        if month_str.len() != 2 || year_str.len() != 4 {
            return Err(err());
        }
        let month: u32 = month_str.parse().map_err(|_| err())?;
        let year: i32 = year_str.parse().map_err(|_| err())?;
        if !(1..=12).contains(&month) {
            return Err(err());
        }
        Ok(Self::new(ticker, year, month))
    }
}

/// The rows of one ticker falling in one calendar month.
#[derive(Debug, Clone, PartialEq)]
pub struct Partition {
    pub key: PartitionKey,
    pub rows: Vec<EnrichedRow>,
}

impl Partition {
    pub fn name(&self) -> String {
        self.key.name()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_is_zero_padded() {
        assert_eq!(PartitionKey::new("AAPL", 2023, 4).name(), "AAPL_2023_04");
        assert_eq!(PartitionKey::new("MSFT", 2024, 12).name(), "MSFT_2024_12");
    }

    #[test]
    fn parse_roundtrip() {
        let key = PartitionKey::new("BRK_B", 2023, 7);
        let parsed: PartitionKey = key.name().parse().unwrap();
        assert_eq!(parsed, key);
    }

    #[test]
    fn parse_rejects_malformed() {
        assert!("AAPL".parse::<PartitionKey>().is_err());
        assert!("AAPL_2023_4".parse::<PartitionKey>().is_err());
        assert!("AAPL_2023_13".parse::<PartitionKey>().is_err());
        assert!("_2023_01".parse::<PartitionKey>().is_err());
    }
}
