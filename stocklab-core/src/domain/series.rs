//! PriceSeries: validated, strictly time-ordered container of bars.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::bar::Bar;
use crate::error::CoreError;

/// Ordered daily bars for one symbol.
///
/// Dates are strictly increasing; gaps (weekends, holidays, irregular
/// calendars) are allowed. An empty series is a valid value, but the return
/// simulator rejects it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    symbol: String,
    bars: Vec<Bar>,
}

impl PriceSeries {
    pub fn new(symbol: impl Into<String>, bars: Vec<Bar>) -> Result<Self, CoreError> {
        for (index, pair) in bars.windows(2).enumerate() {
            if pair[1].date <= pair[0].date {
                return Err(CoreError::UnorderedSeries {
                    index: index + 1,
                    previous: pair[0].date,
                    date: pair[1].date,
                });
            }
        }
        Ok(Self {
            symbol: symbol.into(),
            bars,
        })
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn first(&self) -> Option<&Bar> {
        self.bars.first()
    }

    pub fn last(&self) -> Option<&Bar> {
        self.bars.last()
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.bars.iter().map(|b| b.date).collect()
    }

    /// Adjusted close (or close) per bar.
    pub fn prices(&self) -> Vec<f64> {
        self.bars.iter().map(Bar::price).collect()
    }

    /// Bars dated within `[start, end]`, as a new series.
    ///
    /// Returns an empty series when nothing falls inside the range.
    pub fn between(&self, start: NaiveDate, end: NaiveDate) -> PriceSeries {
        let bars = self
            .bars
            .iter()
            .filter(|b| b.date >= start && b.date <= end)
            .cloned()
            .collect();
        PriceSeries {
            symbol: self.symbol.clone(),
            bars,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    fn bar(d: u32, close: f64) -> Bar {
        Bar::new(day(d), close, close + 1.0, close - 1.0, close)
    }

    #[test]
    fn accepts_gaps() {
        let series = PriceSeries::new("T", vec![bar(1, 10.0), bar(4, 11.0), bar(5, 12.0)]).unwrap();
        assert_eq!(series.len(), 3);
        assert_eq!(series.prices(), vec![10.0, 11.0, 12.0]);
        assert_eq!(series.symbol(), "T");
    }

    #[test]
    fn rejects_duplicate_dates() {
        let err = PriceSeries::new("T", vec![bar(1, 10.0), bar(1, 11.0)]).unwrap_err();
        assert_eq!(
            err,
            CoreError::UnorderedSeries {
                index: 1,
                previous: day(1),
                date: day(1),
            }
        );
    }

    #[test]
    fn rejects_descending_dates() {
        let err = PriceSeries::new("T", vec![bar(1, 10.0), bar(3, 11.0), bar(2, 12.0)]).unwrap_err();
        assert!(matches!(err, CoreError::UnorderedSeries { index: 2, .. }));
    }

    #[test]
    fn empty_series_is_valid() {
        let series = PriceSeries::new("T", Vec::new()).unwrap();
        assert!(series.is_empty());
        assert!(series.first().is_none());
    }

    #[test]
    fn between_is_inclusive() {
        let series =
            PriceSeries::new("T", (1..=10).map(|d| bar(d, d as f64)).collect()).unwrap();
        let sliced = series.between(day(3), day(6));
        assert_eq!(sliced.len(), 4);
        assert_eq!(sliced.first().unwrap().date, day(3));
        assert_eq!(sliced.last().unwrap().date, day(6));
        assert!(series.between(day(20), day(25)).is_empty());
    }
}
