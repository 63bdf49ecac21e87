//! Indicator engine.
//!
//! Indicators are pure functions: price series in, numeric series out, one
//! value per bar. They are computed once per run and collected into an
//! [`IndicatorFrame`] that the signal stage reads.
//!
//! Multi-series indicators (Bollinger) are exposed as separate named instances
//! per band, keeping the single-series `Indicator` trait unchanged;
//! [`compute_bands`] and [`compute_dual_ma`] build whole frames at once.

pub mod bollinger;
pub mod dual_ma;
pub mod frame;
pub mod rolling;
pub mod sma;

pub use bollinger::{compute_bands, Bollinger, BollingerBand};
pub use dual_ma::compute_dual_ma;
pub use frame::{BandSeries, DualMaSeries, IndicatorFrame, IndicatorValues};
pub use rolling::{rolling_mean, rolling_stddev, RollingStd};
pub use sma::Sma;

use crate::domain::PriceSeries;

/// Trait for indicators.
///
/// Indicators take a full price series and produce a numeric output series of
/// the same length. The first `lookback()` values are `f64::NAN` (warmup).
///
/// # Look-ahead contamination guard
/// No indicator value at bar t may depend on price data from bar t+1 or later.
pub trait Indicator: Send + Sync {
    /// Human-readable name (e.g., "sma_20", "std_20").
    fn name(&self) -> &str;

    /// Number of bars needed before the indicator produces valid output.
    fn lookback(&self) -> usize;

    /// Compute the indicator for the entire series.
    fn compute(&self, series: &PriceSeries) -> Vec<f64>;
}

/// Create a synthetic series from prices for testing.
///
/// Dates are consecutive days from 2024-01-02; open = previous price,
/// high/low = max/min(open, close) +/- 1.
#[cfg(test)]
pub fn make_series(prices: &[f64]) -> PriceSeries {
    use crate::domain::Bar;
    let base_date = chrono::NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
    let bars = prices
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { prices[i - 1] };
            Bar::new(
                base_date + chrono::Duration::days(i as i64),
                open,
                open.max(close) + 1.0,
                open.min(close) - 1.0,
                close,
            )
        })
        .collect();
    PriceSeries::new("TEST", bars).unwrap()
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
