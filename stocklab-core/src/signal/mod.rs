//! Signal generation: maps indicator values to a discrete position intent.
//!
//! Signals see only the indicator frame (which carries the prices it was
//! built from). Generation is stateless: the signal at bar `i` depends on the
//! frame at bar `i` alone, and undefined indicator values yield `Hold`.

pub mod crossover_ma;
pub mod volatility_band;

pub use crossover_ma::CrossoverMa;
pub use volatility_band::VolatilityBand;

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::PriceSeries;
use crate::error::CoreError;
use crate::indicators::{IndicatorFrame, IndicatorValues};
use crate::style::StyleParameters;

/// Discrete trading signal for one bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Signal {
    Sell,
    #[default]
    Hold,
    Buy,
}

impl Signal {
    /// -1, 0 or +1.
    pub fn value(self) -> i8 {
        match self {
            Self::Sell => -1,
            Self::Hold => 0,
            Self::Buy => 1,
        }
    }

    pub fn from_value(value: i8) -> Result<Self, CoreError> {
        match value {
            -1 => Ok(Self::Sell),
            0 => Ok(Self::Hold),
            1 => Ok(Self::Buy),
            other => Err(CoreError::InvalidParameter(format!(
                "signal value must be -1, 0 or 1, got {other}"
            ))),
        }
    }
}

/// One signal per bar, aligned to the price series dates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalSeries {
    dates: Vec<NaiveDate>,
    signals: Vec<Signal>,
}

impl SignalSeries {
    pub fn new(dates: Vec<NaiveDate>, signals: Vec<Signal>) -> Result<Self, CoreError> {
        if dates.len() != signals.len() {
            return Err(CoreError::Misaligned(format!(
                "{} dates but {} signals",
                dates.len(),
                signals.len()
            )));
        }
        Ok(Self { dates, signals })
    }

    /// Build from raw -1/0/+1 values.
    pub fn from_values(dates: Vec<NaiveDate>, values: &[i8]) -> Result<Self, CoreError> {
        let signals = values
            .iter()
            .map(|&v| Signal::from_value(v))
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(dates, signals)
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn signals(&self) -> &[Signal] {
        &self.signals
    }

    pub fn values(&self) -> Vec<i8> {
        self.signals.iter().map(|s| s.value()).collect()
    }

    pub fn len(&self) -> usize {
        self.signals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signals.is_empty()
    }

    pub fn buy_count(&self) -> usize {
        self.signals.iter().filter(|s| **s == Signal::Buy).count()
    }

    pub fn sell_count(&self) -> usize {
        self.signals.iter().filter(|s| **s == Signal::Sell).count()
    }

    /// Dated buy/sell markers, skipping holds.
    pub fn markers(&self) -> impl Iterator<Item = (NaiveDate, Signal)> + '_ {
        self.dates
            .iter()
            .zip(&self.signals)
            .filter(|(_, s)| **s != Signal::Hold)
            .map(|(d, s)| (*d, *s))
    }
}

/// Relative gap under which two indicator values count as a tie.
pub const TIE_TOLERANCE: f64 = 1e-12;

/// Order `a` against `b`; values within `TIE_TOLERANCE` of each other
/// (relative to the larger magnitude) are `Equal`.
pub fn compare_with_tolerance(a: f64, b: f64) -> Ordering {
    let scale = a.abs().max(b.abs());
    if (a - b).abs() <= TIE_TOLERANCE * scale {
        Ordering::Equal
    } else if a < b {
        Ordering::Less
    } else {
        Ordering::Greater
    }
}

/// Trait for signal generators.
///
/// `evaluate` returns `None` where the indicator at `bar_index` is undefined
/// or the frame belongs to another strategy family; callers treat that as
/// `Hold`. It must only read the frame at `bar_index`.
pub trait SignalGenerator: Send + Sync {
    /// Human-readable name (e.g., "volatility_band").
    fn name(&self) -> &str;

    /// Number of bars before the indicators are defined.
    fn warmup_bars(&self) -> usize;

    /// Build the indicator frame this generator reads.
    fn compute_indicators(&self, series: &PriceSeries) -> Result<IndicatorFrame, CoreError>;

    /// Signal at `bar_index`, or `None` where undefined.
    fn evaluate(&self, frame: &IndicatorFrame, bar_index: usize) -> Option<Signal>;
}

/// Strategy family selector, as named on the command line or in config.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StrategyKind {
    VolatilityBand,
    CrossoverMa,
}

impl StrategyKind {
    pub const ALL: [StrategyKind; 2] = [StrategyKind::VolatilityBand, StrategyKind::CrossoverMa];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::VolatilityBand => "volatility-band",
            Self::CrossoverMa => "crossover-ma",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StrategyKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .to_ascii_lowercase()
            .chars()
            .map(|c| if c == '_' || c == ' ' { '-' } else { c })
            .collect();
        match normalized.as_str() {
            "volatility-band" | "bollinger" | "bollinger-bands" | "bands" => {
                Ok(Self::VolatilityBand)
            }
            "crossover-ma" | "sma-crossover" | "ma-crossover" | "crossover" => {
                Ok(Self::CrossoverMa)
            }
            _ => Err(CoreError::InvalidParameter(format!(
                "unknown strategy '{s}' (expected volatility-band or crossover-ma)"
            ))),
        }
    }
}

/// A strategy variant together with its parameter record.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Strategy {
    VolatilityBand(VolatilityBand),
    CrossoverMa(CrossoverMa),
}

impl Strategy {
    /// Build the strategy of `kind` with the windows of a style profile.
    pub fn from_style(kind: StrategyKind, params: &StyleParameters) -> Self {
        match kind {
            StrategyKind::VolatilityBand => Self::VolatilityBand(VolatilityBand {
                window: params.band_window,
                std_multiplier: params.band_std_multiplier,
            }),
            StrategyKind::CrossoverMa => Self::CrossoverMa(CrossoverMa {
                short_window: params.short_ma_window,
                long_window: params.long_ma_window,
            }),
        }
    }

    pub fn kind(&self) -> StrategyKind {
        match self {
            Self::VolatilityBand(_) => StrategyKind::VolatilityBand,
            Self::CrossoverMa(_) => StrategyKind::CrossoverMa,
        }
    }

    pub fn generator(&self) -> &dyn SignalGenerator {
        match self {
            Self::VolatilityBand(g) => g as &dyn SignalGenerator,
            Self::CrossoverMa(g) => g as &dyn SignalGenerator,
        }
    }

    pub fn compute_indicators(&self, series: &PriceSeries) -> Result<IndicatorFrame, CoreError> {
        self.generator().compute_indicators(series)
    }

    pub fn warmup_bars(&self) -> usize {
        self.generator().warmup_bars()
    }

    /// Check that `frame` was built by this strategy with the same parameters.
    fn check_frame(&self, frame: &IndicatorFrame) -> Result<(), CoreError> {
        let matches = match (self, frame.values()) {
            (Self::VolatilityBand(s), IndicatorValues::Bands(b)) => {
                s.window == b.window && s.std_multiplier == b.std_multiplier
            }
            (Self::CrossoverMa(s), IndicatorValues::DualMa(m)) => {
                s.short_window == m.short_window && s.long_window == m.long_window
            }
            _ => false,
        };
        if !matches {
            return Err(CoreError::InvalidParameter(format!(
                "indicator frame was not built for the {} strategy with these parameters",
                self.kind()
            )));
        }
        Ok(())
    }
}

/// Map an indicator frame to one signal per bar.
///
/// Undefined indicator entries yield `Hold`.
pub fn generate_signal(
    strategy: &Strategy,
    frame: &IndicatorFrame,
) -> Result<SignalSeries, CoreError> {
    strategy.check_frame(frame)?;
    let generator = strategy.generator();
    let signals: Vec<Signal> = (0..frame.len())
        .map(|i| generator.evaluate(frame, i).unwrap_or(Signal::Hold))
        .collect();
    tracing::debug!(
        strategy = generator.name(),
        bars = signals.len(),
        "signals generated"
    );
    SignalSeries::new(frame.dates().to_vec(), signals)
}
