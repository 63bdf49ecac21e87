//! Backtest runner: wires together loading, the core pipeline, and metrics.
//!
//! Three entry points:
//! - `run_single_backtest()`: loads data from the configured source, then runs. Used by CLI.
//! - `run_backtest()`: takes a pre-loaded series and a request. No I/O.
//! - `run_matrix()`: every strategy × style over one series, in parallel.

use rayon::prelude::*;
use serde::Serialize;
use thiserror::Error;

use stocklab_core::{
    compare_growth, run_strategy, CoreError, GrowthTrajectory, IndicatorFrame, PriceSeries,
    SignalSeries, SimulationResult, Strategy, StrategyKind, Style,
};

use crate::config::{BacktestConfig, ConfigError, RunId};
use crate::currency::CurrencyError;
use crate::data_loader::{dataset_hash, load_price_series, LoadError};
use crate::metrics::PerformanceMetrics;
use crate::yahoo::PriceProvider;

/// Errors from the runner.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("data error: {0}")]
    Data(#[from] LoadError),
    #[error("currency error: {0}")]
    Currency(#[from] CurrencyError),
    #[error("backtest error: {0}")]
    Core(#[from] CoreError),
}

/// Current schema version for persisted artifacts.
pub const SCHEMA_VERSION: u32 = 1;

/// What to run over a loaded series.
#[derive(Debug, Clone, PartialEq)]
pub struct BacktestRequest {
    pub strategy: Strategy,
    pub style: Style,
    pub initial_capital: f64,
    /// Currency code of `initial_capital`, if converted.
    pub currency: Option<String>,
    /// Style names for the growth comparison; empty skips it.
    pub comparison_styles: Vec<String>,
}

impl BacktestRequest {
    /// Strategy of `kind` with `style`'s parameters and a full growth comparison.
    pub fn from_style(kind: StrategyKind, style: Style, initial_capital: f64) -> Self {
        Self {
            strategy: Strategy::from_style(kind, style.parameters()),
            style,
            initial_capital,
            currency: None,
            comparison_styles: Style::ALL.iter().map(|s| s.name().to_string()).collect(),
        }
    }
}

/// Complete result of a single backtest run.
#[derive(Debug, Clone, Serialize)]
pub struct BacktestResult {
    /// Schema version for forward-compatible consumers.
    pub schema_version: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run_id: Option<RunId>,
    pub symbol: String,
    pub strategy: Strategy,
    pub style: Style,
    pub style_fell_back: bool,
    pub initial_capital: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    pub start_date: String,
    pub end_date: String,
    pub bar_count: usize,
    pub warmup_bars: usize,
    pub dataset_hash: String,
    pub metrics: PerformanceMetrics,
    pub frame: IndicatorFrame,
    pub signals: SignalSeries,
    pub simulation: SimulationResult,
    pub growth: Vec<GrowthTrajectory>,
}

/// One cell of a strategy × style matrix.
#[derive(Debug, Clone, Serialize)]
pub struct MatrixEntry {
    pub kind: StrategyKind,
    pub style: Style,
    pub strategy: Strategy,
    pub metrics: PerformanceMetrics,
}

/// Run a single backtest from a BacktestConfig (loads data from its source).
///
/// This is the high-level entry point used by the CLI.
pub fn run_single_backtest(
    config: &BacktestConfig,
    provider: Option<&dyn PriceProvider>,
) -> Result<BacktestResult, RunError> {
    config.validate()?;

    let source = config.price_source()?;
    let loaded = load_price_series(&source, provider, &config.load_options())?;
    let series = match &config.backtest.symbol {
        Some(symbol) if symbol != loaded.symbol() => {
            PriceSeries::new(symbol.clone(), loaded.bars().to_vec())?
        }
        _ => loaded,
    };

    let resolved = config.resolved_style();
    let (initial_capital, currency) = config.converted_capital()?;
    let request = BacktestRequest {
        strategy: config.strategy(&resolved)?,
        style: resolved.style,
        initial_capital,
        currency,
        comparison_styles: config.comparison.styles.clone(),
    };

    let mut result = run_backtest(&series, &request)?;
    result.style_fell_back = resolved.fell_back;
    result.run_id = Some(config.run_id()?);
    Ok(result)
}

/// Run a backtest on a pre-loaded series: no I/O.
pub fn run_backtest(
    series: &PriceSeries,
    request: &BacktestRequest,
) -> Result<BacktestResult, RunError> {
    let run = run_strategy(series, &request.strategy, request.initial_capital)?;
    let metrics = PerformanceMetrics::compute(&run.simulation, &run.signals);

    let growth = if request.comparison_styles.is_empty() {
        Vec::new()
    } else {
        compare_growth(series, request.initial_capital, &request.comparison_styles)?
    };

    let start_date = series
        .first()
        .map(|b| b.date.to_string())
        .unwrap_or_default();
    let end_date = series
        .last()
        .map(|b| b.date.to_string())
        .unwrap_or_default();

    tracing::info!(
        symbol = series.symbol(),
        strategy = %request.strategy.kind(),
        style = %request.style,
        bars = series.len(),
        final_capital = metrics.final_capital,
        roi_percent = metrics.roi_percent,
        "backtest complete"
    );

    Ok(BacktestResult {
        schema_version: SCHEMA_VERSION,
        run_id: None,
        symbol: series.symbol().to_string(),
        strategy: run.strategy,
        style: request.style,
        style_fell_back: false,
        initial_capital: request.initial_capital,
        currency: request.currency.clone(),
        start_date,
        end_date,
        bar_count: series.len(),
        warmup_bars: run.strategy.warmup_bars(),
        dataset_hash: dataset_hash(series),
        metrics,
        frame: run.frame,
        signals: run.signals,
        simulation: run.simulation,
        growth,
    })
}

/// Every `kinds × styles` combination over one series, in parallel.
///
/// Results keep the row-major order of the inputs. The first failing cell
/// aborts the whole matrix.
pub fn run_matrix(
    series: &PriceSeries,
    initial_capital: f64,
    kinds: &[StrategyKind],
    styles: &[Style],
) -> Result<Vec<MatrixEntry>, RunError> {
    let cells: Vec<(StrategyKind, Style)> = kinds
        .iter()
        .flat_map(|&k| styles.iter().map(move |&s| (k, s)))
        .collect();

    tracing::info!(
        symbol = series.symbol(),
        cells = cells.len(),
        "running strategy matrix"
    );

    cells
        .par_iter()
        .map(|&(kind, style)| -> Result<MatrixEntry, RunError> {
            let strategy = Strategy::from_style(kind, style.parameters());
            let run = run_strategy(series, &strategy, initial_capital)?;
            Ok(MatrixEntry {
                kind,
                style,
                strategy,
                metrics: PerformanceMetrics::compute(&run.simulation, &run.signals),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use stocklab_core::signal::CrossoverMa;
    use stocklab_core::Bar;

    fn series(n: usize) -> PriceSeries {
        let base = NaiveDate::from_ymd_opt(2023, 1, 2).unwrap();
        let bars = (0..n)
            .map(|i| {
                let p = 100.0 + (i as f64 * 0.3).sin() * 8.0 + i as f64 * 0.05;
                Bar::new(base + chrono::Duration::days(i as i64), p, p + 1.0, p - 1.0, p)
            })
            .collect();
        PriceSeries::new("RUN", bars).unwrap()
    }

    #[test]
    fn run_backtest_fills_every_section() {
        let s = series(60);
        let request = BacktestRequest {
            strategy: Strategy::CrossoverMa(CrossoverMa {
                short_window: 3,
                long_window: 10,
            }),
            style: Style::Aggressive,
            initial_capital: 1_000.0,
            currency: None,
            comparison_styles: vec!["Moderate".into()],
        };
        let result = run_backtest(&s, &request).unwrap();
        assert_eq!(result.schema_version, SCHEMA_VERSION);
        assert_eq!(result.bar_count, 60);
        assert_eq!(result.warmup_bars, 9);
        assert_eq!(result.start_date, "2023-01-02");
        assert_eq!(result.signals.len(), 60);
        assert_eq!(result.growth.len(), 1);
        assert_eq!(result.metrics.final_capital, result.simulation.final_capital());
    }

    #[test]
    fn empty_comparison_skips_growth() {
        let mut request =
            BacktestRequest::from_style(StrategyKind::VolatilityBand, Style::Aggressive, 500.0);
        request.comparison_styles.clear();
        let result = run_backtest(&series(30), &request).unwrap();
        assert!(result.growth.is_empty());
    }

    #[test]
    fn invalid_comparison_style_fails() {
        let mut request =
            BacktestRequest::from_style(StrategyKind::VolatilityBand, Style::Moderate, 500.0);
        request.comparison_styles = vec!["Bold".into()];
        assert!(matches!(
            run_backtest(&series(30), &request),
            Err(RunError::Core(CoreError::InvalidStyle(_)))
        ));
    }

    #[test]
    fn matrix_covers_every_cell_in_order() {
        let entries = run_matrix(&series(80), 1_000.0, &StrategyKind::ALL, &Style::ALL).unwrap();
        assert_eq!(entries.len(), 6);
        assert_eq!(entries[0].kind, StrategyKind::VolatilityBand);
        assert_eq!(entries[0].style, Style::Aggressive);
        assert_eq!(entries[5].kind, StrategyKind::CrossoverMa);
        assert_eq!(entries[5].style, Style::Passive);
    }

    #[test]
    fn matrix_propagates_core_errors() {
        assert!(matches!(
            run_matrix(&series(1), 1_000.0, &StrategyKind::ALL, &Style::ALL),
            Err(RunError::Core(CoreError::EmptySeries { bars: 1 }))
        ));
    }
}
