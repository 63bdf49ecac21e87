//! Volatility band mean reversion.
//!
//! Buy when the price closes below the lower band, sell when it closes above
//! the upper band. A price on a band (within `TIE_TOLERANCE`) is Hold.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::domain::PriceSeries;
use crate::error::CoreError;
use crate::indicators::{compute_bands, IndicatorFrame, IndicatorValues};

use super::{compare_with_tolerance, Signal, SignalGenerator};

/// Band strategy parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VolatilityBand {
    pub window: usize,
    pub std_multiplier: f64,
}

impl SignalGenerator for VolatilityBand {
    fn name(&self) -> &str {
        "volatility_band"
    }

    fn warmup_bars(&self) -> usize {
        self.window.saturating_sub(1)
    }

    fn compute_indicators(&self, series: &PriceSeries) -> Result<IndicatorFrame, CoreError> {
        let bands = compute_bands(series, self.window, self.std_multiplier)?;
        Ok(IndicatorFrame::new(series, IndicatorValues::Bands(bands)))
    }

    fn evaluate(&self, frame: &IndicatorFrame, bar_index: usize) -> Option<Signal> {
        let bands = frame.bands()?;
        let price = *frame.price().get(bar_index)?;
        let upper = *bands.upper.get(bar_index)?;
        let lower = *bands.lower.get(bar_index)?;

        if price.is_nan() || upper.is_nan() || lower.is_nan() {
            return None;
        }

        if compare_with_tolerance(price, lower) == Ordering::Less {
            Some(Signal::Buy)
        } else if compare_with_tolerance(price, upper) == Ordering::Greater {
            Some(Signal::Sell)
        } else {
            Some(Signal::Hold)
        }
    }
}
