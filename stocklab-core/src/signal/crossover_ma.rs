//! Moving average crossover regime signal.
//!
//! Buy while the short MA sits above the long MA, sell while it sits below.
//! Averages within `TIE_TOLERANCE` of each other are Hold. The signal describes the current regime on every
//! bar, not only on the bar where the averages cross.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::domain::PriceSeries;
use crate::error::CoreError;
use crate::indicators::{compute_dual_ma, IndicatorFrame, IndicatorValues};

use super::{compare_with_tolerance, Signal, SignalGenerator};

/// Crossover strategy parameters. `short_window` must be below `long_window`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrossoverMa {
    pub short_window: usize,
    pub long_window: usize,
}

impl SignalGenerator for CrossoverMa {
    fn name(&self) -> &str {
        "crossover_ma"
    }

    fn warmup_bars(&self) -> usize {
        self.long_window.saturating_sub(1)
    }

    fn compute_indicators(&self, series: &PriceSeries) -> Result<IndicatorFrame, CoreError> {
        let ma = compute_dual_ma(series, self.short_window, self.long_window)?;
        Ok(IndicatorFrame::new(series, IndicatorValues::DualMa(ma)))
    }

    fn evaluate(&self, frame: &IndicatorFrame, bar_index: usize) -> Option<Signal> {
        let ma = frame.dual_ma()?;
        let short = *ma.short_ma.get(bar_index)?;
        let long = *ma.long_ma.get(bar_index)?;

        if short.is_nan() || long.is_nan() {
            return None;
        }

        Some(match compare_with_tolerance(short, long) {
            Ordering::Greater => Signal::Buy,
            Ordering::Less => Signal::Sell,
            Ordering::Equal => Signal::Hold,
        })
    }
}
