//! Bar: the fundamental market data unit.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Daily OHLCV row as delivered by a data provider.
///
/// Any column may be missing. Non-finite values are treated as missing by
/// [`RawBar::to_bar`], so providers that encode gaps as NaN need no special
/// handling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawBar {
    pub timestamp: NaiveDate,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: Option<f64>,
    pub volume: Option<f64>,
}

impl RawBar {
    /// A fully populated raw row.
    pub fn new(timestamp: NaiveDate, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Self {
        Self {
            timestamp,
            open: Some(open),
            high: Some(high),
            low: Some(low),
            close: Some(close),
            volume: Some(volume),
        }
    }

    /// Returns true if any OHLCV field is missing or non-finite.
    pub fn has_missing(&self) -> bool {
        self.to_bar().is_none()
    }

    /// Convert into a complete [`Bar`], or `None` if any field is missing.
    pub fn to_bar(&self) -> Option<Bar> {
        let finite = |v: Option<f64>| v.filter(|x| x.is_finite());
        Some(Bar {
            timestamp: self.timestamp,
            open: finite(self.open)?,
            high: finite(self.high)?,
            low: finite(self.low)?,
            close: finite(self.close)?,
            volume: finite(self.volume)?,
        })
    }
}

/// Complete OHLCV bar for a single day. Every field is present and finite.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// The raw columns the outlier filter scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PriceColumn {
    Open,
    High,
    Low,
    Close,
    Volume,
}

impl PriceColumn {
    pub const ALL: [PriceColumn; 5] = [
        PriceColumn::Open,
        PriceColumn::High,
        PriceColumn::Low,
        PriceColumn::Close,
        PriceColumn::Volume,
    ];

    pub fn name(self) -> &'static str {
        match self {
            PriceColumn::Open => "open",
            PriceColumn::High => "high",
            PriceColumn::Low => "low",
            PriceColumn::Close => "close",
            PriceColumn::Volume => "volume",
        }
    }
}

impl Bar {
    /// Value of one raw column.
    pub fn get(&self, column: PriceColumn) -> f64 {
        match column {
            PriceColumn::Open => self.open,
            PriceColumn::High => self.high,
            PriceColumn::Low => self.low,
            PriceColumn::Close => self.close,
            PriceColumn::Volume => self.volume,
        }
    }

    /// Basic OHLCV sanity check: high >= low, high >= open, high >= close, etc.
    pub fn is_sane(&self) -> bool {
        self.high >= self.low
            && self.high >= self.open
            && self.high >= self.close
            && self.low <= self.open
            && self.low <= self.close
            && self.volume >= 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_raw() -> RawBar {
        RawBar::new(
            NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            100.0,
            105.0,
            98.0,
            103.0,
            50_000.0,
        )
    }

    #[test]
    fn complete_raw_bar_converts() {
        let bar = sample_raw().to_bar().unwrap();
        assert_eq!(bar.close, 103.0);
        assert!(bar.is_sane());
    }

    #[test]
    fn missing_field_is_detected() {
        let mut raw = sample_raw();
        raw.volume = None;
        assert!(raw.has_missing());
        assert!(raw.to_bar().is_none());
    }

    #[test]
    fn nan_counts_as_missing() {
        let mut raw = sample_raw();
        raw.high = Some(f64::NAN);
        assert!(raw.has_missing());
    }

    #[test]
    fn bar_detects_insane_high_low() {
        let mut bar = sample_raw().to_bar().unwrap();
        bar.high = 97.0; // below low
        assert!(!bar.is_sane());
    }

    #[test]
    fn column_accessor() {
        let bar = sample_raw().to_bar().unwrap();
        let values: Vec<f64> = PriceColumn::ALL.iter().map(|c| bar.get(*c)).collect();
        assert_eq!(values, vec![100.0, 105.0, 98.0, 103.0, 50_000.0]);
    }

    #[test]
    fn column_names_match_output_columns() {
        let names: Vec<&str> = PriceColumn::ALL.iter().map(|c| c.name()).collect();
        assert_eq!(names.as_slice(), &crate::domain::ENRICHED_COLUMNS[1..6]);
    }

    #[test]
    fn bar_serialization_roundtrip() {
        let bar = sample_raw().to_bar().unwrap();
        let json = serde_json::to_string(&bar).unwrap();
        let deser: Bar = serde_json::from_str(&json).unwrap();
        assert_eq!(bar, deser);
    }
}
