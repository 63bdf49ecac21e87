//! StockLab Core: price series, indicators, signals, style profiles, return simulation.
//!
//! This crate contains the pure part of the backtester:
//! - Domain types (bars, validated price series)
//! - Rolling indicators (SMA, sample stddev, volatility bands, dual MA)
//! - Signal generation for the volatility-band and MA-crossover strategies
//! - Style profiles mapping a risk appetite to indicator parameters
//! - Return simulation with a one-bar signal lag
//! - Style growth comparison
//!
//! Nothing here performs I/O; every stage is a function of its inputs.

pub mod domain;
pub mod error;
pub mod growth;
pub mod indicators;
pub mod pipeline;
pub mod signal;
pub mod simulate;
pub mod style;

pub use domain::{Bar, PriceSeries};
pub use error::CoreError;
pub use growth::{compare_growth, growth_for_style, GrowthTrajectory};
pub use indicators::{
    compute_bands, compute_dual_ma, rolling_mean, rolling_stddev, BandSeries, DualMaSeries,
    IndicatorFrame, IndicatorValues,
};
pub use pipeline::{run_strategy, StrategyRun};
pub use signal::{generate_signal, Signal, SignalSeries, Strategy, StrategyKind};
pub use simulate::{simulate, CapitalPoint, SimulationResult};
pub use style::{resolve, resolve_or_default, ResolvedStyle, Style, StyleParameters};
