//! Performance metrics: pure functions that compute strategy statistics.
//!
//! Every metric is a pure function: capital curve and/or signals in, scalar out.
//! No dependencies on the loader or the runner.

use serde::{Deserialize, Serialize};
use stocklab_core::{SignalSeries, SimulationResult};

const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Aggregate performance metrics for a single backtest run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub final_capital: f64,
    pub roi_percent: f64,
    pub total_return: f64,
    pub cagr: f64,
    pub sharpe: f64,
    pub sortino: f64,
    pub max_drawdown: f64,
    pub buy_signals: usize,
    pub sell_signals: usize,
    pub exposure: f64,
}

impl PerformanceMetrics {
    /// Compute all metrics from a simulation and the signals that drove it.
    pub fn compute(simulation: &SimulationResult, signals: &SignalSeries) -> Self {
        let capital = simulation.capital();
        let trading_days = capital.len();
        Self {
            final_capital: simulation.final_capital(),
            roi_percent: simulation.roi_percent(),
            total_return: total_return(&capital),
            cagr: cagr(&capital, trading_days),
            sharpe: sharpe_ratio(&capital, 0.0),
            sortino: sortino_ratio(&capital, 0.0),
            max_drawdown: max_drawdown(&capital),
            buy_signals: signals.buy_count(),
            sell_signals: signals.sell_count(),
            exposure: exposure(simulation.positions()),
        }
    }
}

// ─── Individual metric functions ────────────────────────────────────

/// Total return as a fraction: (final - initial) / initial.
pub fn total_return(capital: &[f64]) -> f64 {
    match (capital.first(), capital.last()) {
        (Some(&initial), Some(&last)) if capital.len() >= 2 && initial > 0.0 => {
            (last - initial) / initial
        }
        _ => 0.0,
    }
}

/// Compound Annual Growth Rate.
///
/// Assumes 252 trading days per year. Returns 0.0 for single-bar or non-positive capital.
pub fn cagr(capital: &[f64], trading_days: usize) -> f64 {
    if capital.len() < 2 || trading_days < 2 {
        return 0.0;
    }
    let (initial, last) = (capital[0], capital[capital.len() - 1]);
    if initial <= 0.0 || last <= 0.0 {
        return 0.0;
    }
    let years = trading_days as f64 / TRADING_DAYS_PER_YEAR;
    (last / initial).powf(1.0 / years) - 1.0
}

/// Annualized Sharpe ratio from daily returns.
///
/// Sharpe = mean(daily returns - rf) / std(daily returns) * sqrt(252).
/// Returns 0.0 if variance is zero or fewer than 2 returns.
pub fn sharpe_ratio(capital: &[f64], risk_free_rate: f64) -> f64 {
    let returns = daily_returns(capital);
    if returns.len() < 2 {
        return 0.0;
    }
    let daily_rf = risk_free_rate / TRADING_DAYS_PER_YEAR;
    let excess: Vec<f64> = returns.iter().map(|r| r - daily_rf).collect();
    let std = std_dev(&excess);
    if std < 1e-15 {
        return 0.0;
    }
    (mean_f64(&excess) / std) * TRADING_DAYS_PER_YEAR.sqrt()
}

/// Annualized Sortino ratio (downside deviation only).
///
/// Returns 0.0 if there is no downside or fewer than 2 returns.
pub fn sortino_ratio(capital: &[f64], risk_free_rate: f64) -> f64 {
    let returns = daily_returns(capital);
    if returns.len() < 2 {
        return 0.0;
    }
    let daily_rf = risk_free_rate / TRADING_DAYS_PER_YEAR;
    let excess: Vec<f64> = returns.iter().map(|r| r - daily_rf).collect();

    let downside_sq: f64 = excess.iter().filter(|&&r| r < 0.0).map(|r| r * r).sum();
    let downside_std = (downside_sq / returns.len() as f64).sqrt();
    if downside_std < 1e-15 {
        return 0.0;
    }
    (mean_f64(&excess) / downside_std) * TRADING_DAYS_PER_YEAR.sqrt()
}

/// Maximum drawdown as a negative fraction (e.g., -0.15 = 15% drawdown).
///
/// Returns 0.0 if capital is constant or monotonically increasing.
pub fn max_drawdown(capital: &[f64]) -> f64 {
    let Some(&first) = capital.first() else {
        return 0.0;
    };
    let mut peak = first;
    let mut max_dd = 0.0_f64;

    for &c in capital {
        if c > peak {
            peak = c;
        }
        if peak > 0.0 {
            max_dd = max_dd.min((c - peak) / peak);
        }
    }
    max_dd
}

/// Fraction of bars with a non-zero position.
pub fn exposure(positions: &[i8]) -> f64 {
    if positions.is_empty() {
        return 0.0;
    }
    positions.iter().filter(|&&p| p != 0).count() as f64 / positions.len() as f64
}

/// Simple daily returns of a capital curve.
pub fn daily_returns(capital: &[f64]) -> Vec<f64> {
    capital
        .windows(2)
        .map(|w| if w[0] > 0.0 { (w[1] - w[0]) / w[0] } else { 0.0 })
        .collect()
}

pub(crate) fn mean_f64(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

pub(crate) fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let mean = mean_f64(values);
    let variance =
        values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}
