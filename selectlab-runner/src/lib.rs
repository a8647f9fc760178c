//! SelectLab Runner — orchestration, metrics, comparisons, caching, reports.
//!
//! This crate builds on `selectlab-core` to provide:
//! - TOML run configuration with content-addressed run IDs
//! - Data loading: parallel prefetch, CSV ingest, seeded synthetic fixtures
//! - The timeframe matrix orchestrator (independent simulations, rayon)
//! - Per-run performance metrics and cross-variant comparison
//! - Content-addressed result/bar/candidate caches
//! - Report sinks (JSON artifact, CSV tapes)

pub mod cache;
pub mod comparison;
pub mod config;
pub mod data_loader;
pub mod fixture;
pub mod metrics;
pub mod orchestrator;
pub mod report;
pub mod result;

pub use cache::{bar_cache_key, candidate_cache_key, CacheError, KeyedStore, ResultCache};
pub use comparison::{ComparisonEntry, ComparisonReport, RankingMetric};
pub use config::{DataConfig, FeedConfig, RunConfig, RunConfigError, RunId, VariantSpec};
pub use data_loader::{load_series, prefetch_series, LoadError, LoadedData};
pub use fixture::synthetic_series;
pub use metrics::PerformanceMetrics;
pub use orchestrator::{run_matrix, MatrixOutcome, TimeframeFailure};
pub use report::{CsvTapeSink, JsonResultSink, ReportError, ReportSink};
pub use result::{SimulationResult, SCHEMA_VERSION};

#[cfg(test)]
mod send_sync_checks {
    use super::*;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn orchestrator_types_are_send_sync() {
        assert_send::<SimulationResult>();
        assert_sync::<SimulationResult>();
        assert_send::<PerformanceMetrics>();
        assert_sync::<PerformanceMetrics>();
        assert_send::<RunConfig>();
        assert_sync::<RunConfig>();
        assert_send::<TimeframeFailure>();
        assert_sync::<TimeframeFailure>();
    }
}
