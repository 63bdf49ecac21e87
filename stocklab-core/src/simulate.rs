//! Return simulation: signals to positions to a compounded capital path.
//!
//! 1. `ret[i] = ln(price[i] / price[i-1])`, undefined at index 0.
//! 2. `position[i] = signal[i-1]`, `position[0] = 0`. The signal observed at
//!    the close of day i-1 sets the position held through day i; using
//!    `signal[i]` to earn `ret[i]` would be look-ahead.
//! 3. `strategy_ret[i] = position[i] * ret[i]`.
//! 4. `cum[i] = prod_{j<=i} (1 + strategy_ret[j])`; non-finite strategy
//!    returns contribute a factor of 1.
//! 5. `capital[i] = initial_capital * cum[i]`.

use chrono::NaiveDate;
use serde::Serialize;

use crate::domain::PriceSeries;
use crate::error::{check_capital, CoreError};
use crate::signal::SignalSeries;

/// Capital at the close of one bar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CapitalPoint {
    pub date: NaiveDate,
    pub capital: f64,
}

/// Outcome of one simulation. Built once, read through accessors.
#[derive(Debug, Clone, Serialize)]
pub struct SimulationResult {
    trajectory: Vec<CapitalPoint>,
    positions: Vec<i8>,
    strategy_returns: Vec<f64>,
    initial_capital: f64,
    final_capital: f64,
    roi_percent: f64,
}

impl SimulationResult {
    pub fn trajectory(&self) -> &[CapitalPoint] {
        &self.trajectory
    }

    /// Capital values without dates.
    pub fn capital(&self) -> Vec<f64> {
        self.trajectory.iter().map(|p| p.capital).collect()
    }

    /// Lagged positions (-1, 0, +1) actually held on each bar.
    pub fn positions(&self) -> &[i8] {
        &self.positions
    }

    /// Per-bar strategy log returns; index 0 is NaN.
    pub fn strategy_returns(&self) -> &[f64] {
        &self.strategy_returns
    }

    pub fn initial_capital(&self) -> f64 {
        self.initial_capital
    }

    pub fn final_capital(&self) -> f64 {
        self.final_capital
    }

    pub fn roi_percent(&self) -> f64 {
        self.roi_percent
    }
}

/// Per-bar log returns; index 0 is NaN.
pub fn log_returns(prices: &[f64]) -> Vec<f64> {
    let mut result = vec![f64::NAN; prices.len()];
    for i in 1..prices.len() {
        result[i] = (prices[i] / prices[i - 1]).ln();
    }
    result
}

/// Positions lagged one bar behind the signals; the first position is flat.
pub fn lagged_positions(signals: &SignalSeries) -> Vec<i8> {
    let values = signals.values();
    let mut positions = vec![0i8; values.len()];
    for i in 1..values.len() {
        positions[i] = values[i - 1];
    }
    positions
}

/// Percentage change from `initial` to `final_value`.
pub fn roi_percent(initial: f64, final_value: f64) -> f64 {
    (final_value - initial) / initial * 100.0
}

/// Simulate holding the lagged signal position over the series.
///
/// Fails with `EmptySeries` for fewer than two bars, `InvalidCapital` for
/// non-positive capital, and `Misaligned` when the signals do not cover the
/// same dates as the prices.
pub fn simulate(
    series: &PriceSeries,
    signals: &SignalSeries,
    initial_capital: f64,
) -> Result<SimulationResult, CoreError> {
    if series.len() < 2 {
        return Err(CoreError::EmptySeries { bars: series.len() });
    }
    check_capital(initial_capital)?;

    let dates = series.dates();
    if signals.dates() != dates.as_slice() {
        return Err(CoreError::Misaligned(format!(
            "signal series covers {} bar(s), price series {} bar(s) with different dates",
            signals.len(),
            series.len()
        )));
    }

    let returns = log_returns(&series.prices());
    let positions = lagged_positions(signals);

    let strategy_returns: Vec<f64> = positions
        .iter()
        .zip(&returns)
        .map(|(&p, &r)| f64::from(p) * r)
        .collect();

    let mut skipped = 0usize;
    let mut cumulative = 1.0;
    let mut trajectory = Vec::with_capacity(dates.len());
    for (i, (&date, &r)) in dates.iter().zip(&strategy_returns).enumerate() {
        if r.is_finite() {
            cumulative *= 1.0 + r;
        } else if i > 0 {
            skipped += 1;
        }
        trajectory.push(CapitalPoint {
            date,
            capital: initial_capital * cumulative,
        });
    }
    if skipped > 0 {
        tracing::warn!(
            symbol = series.symbol(),
            skipped,
            "non-finite strategy returns treated as flat"
        );
    }

    let final_capital = trajectory
        .last()
        .map(|p| p.capital)
        .unwrap_or(initial_capital);

    tracing::debug!(
        symbol = series.symbol(),
        bars = trajectory.len(),
        final_capital,
        "simulation complete"
    );

    Ok(SimulationResult {
        trajectory,
        positions,
        strategy_returns,
        initial_capital,
        final_capital,
        roi_percent: roi_percent(initial_capital, final_capital),
    })
}
