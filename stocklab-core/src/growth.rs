//! Growth comparison across investment styles.
//!
//! A simplified proportional model, separate from the return simulator: each
//! style scales the buy-and-hold price path by its growth multiplier,
//!
//! `trend[i] = price[i] / price[0] * initial_capital * growth_multiplier`.
//!
//! No signals are involved, and `trend[0]` equals `initial_capital *
//! growth_multiplier`, not `initial_capital`.

use serde::Serialize;

use crate::domain::PriceSeries;
use crate::error::{check_capital, CoreError};
use crate::simulate::{roi_percent, CapitalPoint};
use crate::style::Style;

/// Scaled buy-and-hold path for one style.
#[derive(Debug, Clone, Serialize)]
pub struct GrowthTrajectory {
    pub style: Style,
    pub growth_multiplier: f64,
    pub trend: Vec<CapitalPoint>,
    pub growth: f64,
    pub roi_percent: f64,
}

/// Growth trajectory for a single style.
pub fn growth_for_style(
    series: &PriceSeries,
    initial_capital: f64,
    style: Style,
) -> Result<GrowthTrajectory, CoreError> {
    check_capital(initial_capital)?;
    let start_price = series
        .first()
        .map(|b| b.price())
        .ok_or(CoreError::EmptySeries { bars: 0 })?;

    let multiplier = style.parameters().growth_multiplier;
    let trend: Vec<CapitalPoint> = series
        .bars()
        .iter()
        .map(|b| CapitalPoint {
            date: b.date,
            capital: b.price() / start_price * initial_capital * multiplier,
        })
        .collect();
    let growth = trend.last().map(|p| p.capital).unwrap_or(initial_capital);

    Ok(GrowthTrajectory {
        style,
        growth_multiplier: multiplier,
        trend,
        growth,
        roi_percent: roi_percent(initial_capital, growth),
    })
}

/// One growth trajectory per requested style name, in request order.
///
/// Every name is validated before any computation; an unrecognised name fails
/// with `InvalidStyle`.
pub fn compare_growth<S: AsRef<str>>(
    series: &PriceSeries,
    initial_capital: f64,
    styles: &[S],
) -> Result<Vec<GrowthTrajectory>, CoreError> {
    let parsed = styles
        .iter()
        .map(|name| {
            name.as_ref()
                .parse::<Style>()
                .map_err(|_| CoreError::InvalidStyle(name.as_ref().to_string()))
        })
        .collect::<Result<Vec<_>, _>>()?;

    parsed
        .into_iter()
        .map(|style| growth_for_style(series, initial_capital, style))
        .collect()
}
