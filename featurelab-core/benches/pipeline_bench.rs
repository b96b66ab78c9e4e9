//! Criterion benchmarks for the pipeline stages.
//!
//! Benchmarks:
//! 1. Outlier filter over raw rows
//! 2. Indicator engine (single indicator vs full set)
//! 3. Feature engineer
//! 4. Full pipeline including partitioning

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use featurelab_core::domain::{RawBar, Series};
use featurelab_core::features::FeatureEngineer;
use featurelab_core::indicators::{Indicator, IndicatorEngine, Sma};
use featurelab_core::outlier::OutlierFilter;
use featurelab_core::pipeline::Pipeline;

// ── Helpers ──────────────────────────────────────────────────────────

fn make_raw_bars(n: usize) -> Vec<RawBar> {
    let base_date = chrono::NaiveDate::from_ymd_opt(2015, 1, 2).unwrap();
    (0..n)
        .map(|i| {
            let close = 100.0 + (i as f64 * 0.1).sin() * 10.0;
            RawBar::new(
                base_date + chrono::Duration::days(i as i64),
                close - 0.3,
                close + 1.5,
                close - 1.5,
                close,
                1_000_000.0 + (i % 500_000) as f64,
            )
        })
        .collect()
}

fn make_series(n: usize) -> Series {
    let bars = make_raw_bars(n).iter().filter_map(RawBar::to_bar).collect();
    Series::new(bars).unwrap()
}

const SIZES: [usize; 3] = [252, 1260, 2520];

// ── 1. Outlier filter ────────────────────────────────────────────────

fn bench_outlier_filter(c: &mut Criterion) {
    let mut group = c.benchmark_group("outlier_filter");
    let filter = OutlierFilter::default();

    for &n in &SIZES {
        let raw = make_raw_bars(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &raw, |b, raw| {
            b.iter(|| filter.apply(black_box(raw)))
        });
    }

    group.finish();
}

// ── 2. Indicators ────────────────────────────────────────────────────

fn bench_indicators(c: &mut Criterion) {
    let mut group = c.benchmark_group("indicators");
    let engine = IndicatorEngine::default();
    let sma = Sma::new(200);

    for &n in &SIZES {
        let series = make_series(n);
        group.bench_with_input(BenchmarkId::new("sma_200", n), &series, |b, s| {
            b.iter(|| sma.compute(black_box(s.bars())))
        });
        group.bench_with_input(BenchmarkId::new("full_set", n), &series, |b, s| {
            b.iter(|| engine.compute(black_box(s)))
        });
    }

    group.finish();
}

// ── 3. Features ──────────────────────────────────────────────────────

fn bench_features(c: &mut Criterion) {
    let mut group = c.benchmark_group("features");
    let features = FeatureEngineer::default();

    for &n in &SIZES {
        let enriched = IndicatorEngine::default().compute(&make_series(n));
        group.bench_with_input(BenchmarkId::from_parameter(n), &enriched, |b, e| {
            b.iter(|| features.apply(black_box(e)))
        });
    }

    group.finish();
}

// ── 4. Full pipeline ─────────────────────────────────────────────────

fn bench_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("pipeline");
    let pipeline = Pipeline::default();

    for &n in &SIZES {
        let raw = make_raw_bars(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &raw, |b, raw| {
            b.iter(|| pipeline.run("BENCH", black_box(raw)))
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_outlier_filter,
    bench_indicators,
    bench_features,
    bench_pipeline
);
criterion_main!(benches);
