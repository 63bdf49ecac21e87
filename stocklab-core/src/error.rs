//! Structured error type shared by every core stage.

use chrono::NaiveDate;
use thiserror::Error;

/// Errors returned by the core pipeline.
///
/// Every variant is an explicit failure; the only silent default in the core is
/// [`crate::style::resolve_or_default`], which reports its fallback.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoreError {
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("unknown style '{0}' (expected Aggressive, Moderate or Passive)")]
    UnknownStyle(String),

    #[error("invalid investment style '{0}' (choose Aggressive, Moderate or Passive)")]
    InvalidStyle(String),

    #[error("price series has {bars} bar(s); at least 2 are needed to compute a return")]
    EmptySeries { bars: usize },

    #[error("initial capital must be positive, got {0}")]
    InvalidCapital(f64),

    #[error("bar {index} dated {date} does not come after {previous}")]
    UnorderedSeries {
        index: usize,
        previous: NaiveDate,
        date: NaiveDate,
    },

    #[error("series misaligned: {0}")]
    Misaligned(String),
}

impl CoreError {
    /// Stable snake_case identifier for presentation layers.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidParameter(_) => "invalid_parameter",
            Self::UnknownStyle(_) => "unknown_style",
            Self::InvalidStyle(_) => "invalid_style",
            Self::EmptySeries { .. } => "empty_series",
            Self::InvalidCapital(_) => "invalid_capital",
            Self::UnorderedSeries { .. } => "unordered_series",
            Self::Misaligned(_) => "misaligned",
        }
    }
}

/// Reject non-positive or non-finite starting capital.
pub(crate) fn check_capital(initial_capital: f64) -> Result<(), CoreError> {
    if !initial_capital.is_finite() || initial_capital <= 0.0 {
        return Err(CoreError::InvalidCapital(initial_capital));
    }
    Ok(())
}
