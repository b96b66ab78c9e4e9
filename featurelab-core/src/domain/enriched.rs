//! Enriched row: a bar plus its derived indicator and feature columns.

use super::bar::Bar;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Column names in storage/export order.
pub const ENRICHED_COLUMNS: [&str; 15] = [
    "timestamp",
    "open",
    "high",
    "low",
    "close",
    "volume",
    "ma_50",
    "ma_200",
    "bb_mid",
    "bb_std",
    "bb_upper",
    "bb_lower",
    "rsi_14",
    "volatility_20",
    "price_vs_ma50",
];

/// A [`Bar`] extended with derived fields.
///
/// Every derived field is `None` until its window has filled. `None` is never
/// interchangeable with zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedRow {
    pub timestamp: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub ma_50: Option<f64>,
    pub ma_200: Option<f64>,
    pub bb_mid: Option<f64>,
    pub bb_std: Option<f64>,
    pub bb_upper: Option<f64>,
    pub bb_lower: Option<f64>,
    pub rsi_14: Option<f64>,
    pub volatility_20: Option<f64>,
    pub price_vs_ma50: Option<f64>,
}

impl EnrichedRow {
    /// Row with the bar's values and every derived field undefined.
    pub fn from_bar(bar: &Bar) -> Self {
        Self {
            timestamp: bar.timestamp,
            open: bar.open,
            high: bar.high,
            low: bar.low,
            close: bar.close,
            volume: bar.volume,
            ma_50: None,
            ma_200: None,
            bb_mid: None,
            bb_std: None,
            bb_upper: None,
            bb_lower: None,
            rsi_14: None,
            volatility_20: None,
            price_vs_ma50: None,
        }
    }

    /// Inverse of splitting a row into [`EnrichedRow::bar`] and
    /// [`EnrichedRow::derived`].
    pub fn from_parts(bar: &Bar, derived: [Option<f64>; 9]) -> Self {
        let [ma_50, ma_200, bb_mid, bb_std, bb_upper, bb_lower, rsi_14, volatility_20, price_vs_ma50] =
            derived;
        Self {
            ma_50,
            ma_200,
            bb_mid,
            bb_std,
            bb_upper,
            bb_lower,
            rsi_14,
            volatility_20,
            price_vs_ma50,
            ..Self::from_bar(bar)
        }
    }

    pub fn bar(&self) -> Bar {
        Bar {
            timestamp: self.timestamp,
            open: self.open,
            high: self.high,
            low: self.low,
            close: self.close,
            volume: self.volume,
        }
    }

    /// Derived values in [`ENRICHED_COLUMNS`] order (after the six bar columns).
    pub fn derived(&self) -> [Option<f64>; 9] {
        [
            self.ma_50,
            self.ma_200,
            self.bb_mid,
            self.bb_std,
            self.bb_upper,
            self.bb_lower,
            self.rsi_14,
            self.volatility_20,
            self.price_vs_ma50,
        ]
    }
}
