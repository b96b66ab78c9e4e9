//! Look-ahead contamination tests for indicators and features.
//!
//! No derived value at row t may depend on data from row t+1 or later.
//!
//! Method: compute on a truncated series (rows 0..150) and the full series
//! (rows 0..300). Rows 0..150 must be identical between both runs.
//!
//! The outlier filter is deliberately left out: its column statistics are
//! computed over the whole input, so truncation legitimately changes them.

use chrono::{Duration, NaiveDate};
use featurelab_core::domain::{Bar, Series};
use featurelab_core::features::FeatureEngineer;
use featurelab_core::indicators::{Bollinger, Change, Indicator, IndicatorEngine, Rsi, Sma};

fn make_test_bars(n: usize) -> Vec<Bar> {
    let base_date = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
    let mut price = 100.0;

    (0..n)
        .map(|i| {
            // Deterministic pseudo-random walk using a simple LCG
            let seed = (i as u64).wrapping_mul(6364136223846793005).wrapping_add(1);
            let change = ((seed % 200) as f64 - 100.0) * 0.05;
            price = (price + change).max(10.0);

            let open = price - 0.5;
            let close = price + 0.3;
            Bar {
                timestamp: base_date + Duration::days(i as i64),
                open,
                high: open.max(close) + 2.0,
                low: open.min(close) - 2.0,
                close,
                volume: 1000.0 + (i as f64 * 100.0),
            }
        })
        .collect()
}

fn assert_no_lookahead(indicator: &dyn Indicator) {
    let full = make_test_bars(300);
    let truncated = &full[..150];

    let full_values = indicator.compute(&full);
    let truncated_values = indicator.compute(truncated);

    for (i, (a, b)) in truncated_values.iter().zip(&full_values).enumerate() {
        assert_eq!(a, b, "{} leaks future data at row {i}", indicator.name());
    }
}

#[test]
fn sma_no_lookahead() {
    assert_no_lookahead(&Sma::new(50));
    assert_no_lookahead(&Sma::new(200));
}

#[test]
fn bollinger_no_lookahead() {
    assert_no_lookahead(&Bollinger::upper(20, 2.0));
    assert_no_lookahead(&Bollinger::lower(20, 2.0));
}

#[test]
fn rsi_no_lookahead() {
    assert_no_lookahead(&Rsi::new(14));
}

#[test]
fn change_no_lookahead() {
    assert_no_lookahead(&Change::percent());
}

#[test]
fn engine_and_features_no_lookahead() {
    let full = make_test_bars(300);
    let engine = IndicatorEngine::default();
    let features = FeatureEngineer::default();

    let run = |bars: &[Bar]| {
        let series = Series::new(bars.to_vec()).unwrap();
        features.apply(&engine.compute(&series))
    };

    let full_out = run(&full);
    let truncated_out = run(&full[..150]);

    assert_eq!(truncated_out.rows(), &full_out.rows()[..150]);
}
