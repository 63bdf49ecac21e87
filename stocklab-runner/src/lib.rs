//! StockLab Runner: backtest orchestration, data loading, metrics, export.
//!
//! This crate builds on `stocklab-core` to provide:
//! - TOML backtest configuration with content-addressed run IDs
//! - Price loading from CSV files or the Yahoo Finance chart API
//! - Date-range filtering and initial-capital currency conversion
//! - Single-backtest runner and a parallel strategy × style matrix
//! - Performance metrics and JSON/CSV/Markdown artifacts

pub mod config;
pub mod currency;
pub mod data_loader;
pub mod export;
pub mod metrics;
pub mod runner;
pub mod yahoo;

pub use config::{BacktestConfig, ConfigError, ParameterOverrides, RunId};
pub use currency::{CurrencyConverter, CurrencyError, FixedRates};
pub use data_loader::{
    dataset_hash, filter_range, load_csv, load_price_series, read_csv, write_csv, LoadError,
    LoadOptions, PriceSource,
};
pub use metrics::PerformanceMetrics;
pub use runner::{
    run_backtest, run_matrix, run_single_backtest, BacktestRequest, BacktestResult, MatrixEntry,
    RunError, SCHEMA_VERSION,
};
pub use yahoo::{FetchRange, PriceProvider, ProviderError, YahooProvider};

#[cfg(test)]
mod send_sync_checks {
    use super::*;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn performance_metrics_is_send_sync() {
        assert_send::<PerformanceMetrics>();
        assert_sync::<PerformanceMetrics>();
    }

    #[test]
    fn backtest_result_is_send_sync() {
        assert_send::<BacktestResult>();
        assert_sync::<BacktestResult>();
        assert_send::<MatrixEntry>();
        assert_sync::<MatrixEntry>();
    }

    #[test]
    fn config_types_are_send_sync() {
        assert_send::<BacktestConfig>();
        assert_sync::<BacktestConfig>();
        assert_send::<LoadOptions>();
        assert_sync::<LoadOptions>();
        assert_send::<BacktestRequest>();
        assert_sync::<BacktestRequest>();
    }

    #[test]
    fn providers_are_send_sync() {
        assert_send::<YahooProvider>();
        assert_sync::<YahooProvider>();
        assert_send::<FixedRates>();
        assert_sync::<FixedRates>();
    }

    #[test]
    fn errors_are_send_sync() {
        assert_send::<RunError>();
        assert_sync::<RunError>();
    }
}
