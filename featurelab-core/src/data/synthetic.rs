//! Deterministic synthetic data.
//!
//! A seeded random walk on weekdays, one independent stream per symbol
//! (seed = BLAKE3 of the symbol name). Used for demos and offline runs;
//! never mistake it for market data.

use super::provider::{check_range, DataError, DataProvider, DataSource, FetchResult};
use crate::domain::RawBar;
use chrono::{Datelike, NaiveDate, Weekday};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

#[derive(Debug, Clone, Default)]
pub struct SyntheticProvider;

impl SyntheticProvider {
    pub fn new() -> Self {
        Self
    }
}

/// Generate weekday rows for `[start, end]`.
pub fn generate_synthetic_bars(symbol: &str, start: NaiveDate, end: NaiveDate) -> Vec<RawBar> {
    let seed: [u8; 32] = *blake3::hash(symbol.as_bytes()).as_bytes();
    let mut rng = StdRng::from_seed(seed);

    let mut bars = Vec::new();
    let mut price = 100.0_f64;

    for current in start.iter_days().take_while(|d| *d <= end) {
        if matches!(current.weekday(), Weekday::Sat | Weekday::Sun) {
            continue;
        }

        let daily_return: f64 = rng.gen_range(-0.03..0.03);
        let open = price;
        let close = price * (1.0 + daily_return);
        let high = open.max(close) * (1.0 + rng.gen_range(0.0..0.01));
        let low = open.min(close) * (1.0 - rng.gen_range(0.0..0.01));
        let volume = rng.gen_range(500_000..5_000_000u64) as f64;

        bars.push(RawBar::new(current, open, high, low, close, volume));
        price = close;
    }

    bars
}

impl DataProvider for SyntheticProvider {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn fetch(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> Result<FetchResult, DataError> {
        check_range(start, end)?;
        Ok(FetchResult {
            symbol: symbol.to_string(),
            bars: generate_synthetic_bars(symbol, start, end),
            source: DataSource::Synthetic,
        })
    }
}
