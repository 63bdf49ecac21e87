//! Rolling mean and rolling sample standard deviation.
//!
//! Both read `Bar::price()` (adjusted close, falling back to close).
//! Output length equals input length; the first `window - 1` entries are NaN,
//! and any window containing a NaN or infinite price produces NaN.
//!
//! Standard deviation uses the sample estimator (divide by N - 1), matching
//! conventional rolling-statistics libraries. A window of 1 is rejected since
//! the sample estimator is undefined there.

use crate::domain::PriceSeries;
use crate::error::CoreError;

use super::{Indicator, Sma};

/// Rolling arithmetic mean of the series price over `window` bars.
pub fn rolling_mean(series: &PriceSeries, window: usize) -> Result<Vec<f64>, CoreError> {
    Ok(Sma::new(window)?.compute(series))
}

/// Rolling sample standard deviation (ddof = 1) over `window` bars.
pub fn rolling_stddev(series: &PriceSeries, window: usize) -> Result<Vec<f64>, CoreError> {
    Ok(RollingStd::new(window)?.compute(series))
}

/// Rolling sample standard deviation indicator.
#[derive(Debug, Clone)]
pub struct RollingStd {
    period: usize,
    name: String,
}

impl RollingStd {
    pub fn new(period: usize) -> Result<Self, CoreError> {
        check_window(period, 2, "stddev window")?;
        Ok(Self {
            period,
            name: format!("std_{period}"),
        })
    }
}

impl Indicator for RollingStd {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period.saturating_sub(1)
    }

    fn compute(&self, series: &PriceSeries) -> Vec<f64> {
        stddev_kernel(&series.prices(), self.period)
    }
}

pub(crate) fn check_window(window: usize, min: usize, what: &str) -> Result<(), CoreError> {
    if window < min {
        return Err(CoreError::InvalidParameter(format!(
            "{what} must be >= {min}, got {window}"
        )));
    }
    Ok(())
}

/// Rolling mean over a raw value slice. `window` must be >= 1.
///
/// Every window is summed from its own slice, so the value at `i` depends on
/// `values[i + 1 - window..=i]` alone.
pub(crate) fn mean_kernel(values: &[f64], window: usize) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];

    if window == 0 || n < window {
        return result;
    }

    for i in (window - 1)..n {
        if let Some(mean) = window_mean(&values[(i + 1 - window)..=i]) {
            result[i] = mean;
        }
    }

    result
}

/// Rolling sample standard deviation over a raw value slice. `window` must be >= 2.
pub(crate) fn stddev_kernel(values: &[f64], window: usize) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];

    if window < 2 || n < window {
        return result;
    }

    for i in (window - 1)..n {
        let slice = &values[(i + 1 - window)..=i];
        let Some(mean) = window_mean(slice) else {
            continue;
        };
        let sum_sq = compensated_sum(slice.iter().map(|v| {
            let diff = v - mean;
            diff * diff
        }));
        result[i] = (sum_sq / (window - 1) as f64).sqrt();
    }

    result
}

/// Mean of one window, or `None` if it holds a non-finite value.
///
/// Sums deviations from the first value, so a window of identical prices
/// yields that price exactly.
pub(crate) fn window_mean(window: &[f64]) -> Option<f64> {
    let &first = window.first()?;
    if window.iter().any(|v| !v.is_finite()) {
        return None;
    }
    let deviation = compensated_sum(window.iter().map(|v| v - first));
    Some(first + deviation / window.len() as f64)
}

/// Kahan summation.
fn compensated_sum(values: impl Iterator<Item = f64>) -> f64 {
    let mut sum = 0.0;
    let mut compensation = 0.0;
    for v in values {
        let y = v - compensation;
        let t = sum + y;
        compensation = (t - sum) - y;
        sum = t;
    }
    sum
}
