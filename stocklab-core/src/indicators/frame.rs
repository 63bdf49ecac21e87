//! IndicatorFrame: indicator columns aligned to a price series.
//!
//! A frame is built once per strategy run and never modified; each strategy
//! produces its own frame instead of adding columns to a shared table.

use chrono::NaiveDate;
use serde::Serialize;

use crate::domain::PriceSeries;

/// Volatility band columns. Undefined entries are NaN.
#[derive(Debug, Clone, Serialize)]
pub struct BandSeries {
    pub window: usize,
    pub std_multiplier: f64,
    pub sma: Vec<f64>,
    pub std: Vec<f64>,
    pub upper: Vec<f64>,
    pub lower: Vec<f64>,
}

/// Short/long moving-average columns. Undefined entries are NaN.
#[derive(Debug, Clone, Serialize)]
pub struct DualMaSeries {
    pub short_window: usize,
    pub long_window: usize,
    pub short_ma: Vec<f64>,
    pub long_ma: Vec<f64>,
}

/// The indicator columns carried by a frame, tagged by strategy family.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IndicatorValues {
    Bands(BandSeries),
    DualMa(DualMaSeries),
}

/// Indicator values plus the dates and prices they were computed from.
#[derive(Debug, Clone, Serialize)]
pub struct IndicatorFrame {
    dates: Vec<NaiveDate>,
    price: Vec<f64>,
    values: IndicatorValues,
}

impl IndicatorFrame {
    pub fn new(series: &PriceSeries, values: IndicatorValues) -> Self {
        Self {
            dates: series.dates(),
            price: series.prices(),
            values,
        }
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn price(&self) -> &[f64] {
        &self.price
    }

    pub fn values(&self) -> &IndicatorValues {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn bands(&self) -> Option<&BandSeries> {
        match &self.values {
            IndicatorValues::Bands(b) => Some(b),
            IndicatorValues::DualMa(_) => None,
        }
    }

    pub fn dual_ma(&self) -> Option<&DualMaSeries> {
        match &self.values {
            IndicatorValues::DualMa(m) => Some(m),
            IndicatorValues::Bands(_) => None,
        }
    }

    /// Named indicator columns, in display order (for overlays and export).
    pub fn columns(&self) -> Vec<(&'static str, &[f64])> {
        match &self.values {
            IndicatorValues::Bands(b) => vec![
                ("sma", b.sma.as_slice()),
                ("std", b.std.as_slice()),
                ("upper", b.upper.as_slice()),
                ("lower", b.lower.as_slice()),
            ],
            IndicatorValues::DualMa(m) => vec![
                ("short_ma", m.short_ma.as_slice()),
                ("long_ma", m.long_ma.as_slice()),
            ],
        }
    }

    /// True when every indicator column is defined at `index`.
    pub fn is_defined(&self, index: usize) -> bool {
        self.columns()
            .iter()
            .all(|(_, col)| col.get(index).is_some_and(|v| !v.is_nan()))
    }

    /// Index of the first bar where every column is defined.
    pub fn first_defined(&self) -> Option<usize> {
        (0..self.len()).find(|&i| self.is_defined(i))
    }
}
