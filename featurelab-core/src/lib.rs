//! FeatureLab Core: cleaning, indicators, features and monthly partitioning
//! for daily OHLCV series.
//!
//! Per ticker, strictly in order:
//! - Outlier filter: drop incomplete rows and z-score outliers
//! - Indicator engine: SMA 50/200, Bollinger 20/2σ, RSI 14
//! - Feature engineer: annualized volatility, price vs MA-50
//! - Partitioner: group rows into `{ticker}_{YYYY}_{MM}` partitions
//!
//! The stages are pure. Raw data comes in through the providers in [`data`];
//! persistence lives in `featurelab-store`.

pub mod data;
pub mod domain;
pub mod features;
pub mod indicators;
pub mod outlier;
pub mod partitioner;
pub mod pipeline;
pub mod rolling;

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: everything the runner hands across threads is
    /// Send + Sync.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        // Domain types
        require_send::<domain::RawBar>();
        require_sync::<domain::RawBar>();
        require_send::<domain::Bar>();
        require_sync::<domain::Bar>();
        require_send::<domain::Series>();
        require_sync::<domain::Series>();
        require_send::<domain::EnrichedRow>();
        require_sync::<domain::EnrichedRow>();
        require_send::<domain::EnrichedSeries>();
        require_sync::<domain::EnrichedSeries>();
        require_send::<domain::Partition>();
        require_sync::<domain::Partition>();

        // Stages
        require_send::<outlier::OutlierFilter>();
        require_sync::<outlier::OutlierFilter>();
        require_send::<indicators::IndicatorEngine>();
        require_sync::<indicators::IndicatorEngine>();
        require_send::<features::FeatureEngineer>();
        require_sync::<features::FeatureEngineer>();
        require_send::<pipeline::Pipeline>();
        require_sync::<pipeline::Pipeline>();
        require_send::<pipeline::PipelineOutput>();
        require_sync::<pipeline::PipelineOutput>();

        // Providers
        require_send::<data::YahooProvider>();
        require_sync::<data::YahooProvider>();
        require_send::<data::CsvProvider>();
        require_sync::<data::CsvProvider>();
        require_send::<data::SyntheticProvider>();
        require_sync::<data::SyntheticProvider>();
    }

    /// Architecture contract: indicators see bars only, never derived state.
    #[test]
    fn indicator_trait_takes_only_bars() {
        fn _check_trait_object_builds(
            indicator: &dyn indicators::Indicator,
            bars: &[domain::Bar],
        ) -> Vec<Option<f64>> {
            indicator.compute(bars)
        }
    }
}
