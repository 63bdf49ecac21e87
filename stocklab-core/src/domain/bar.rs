//! Bar: one dated daily price observation.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// OHLC bar for a single day.
///
/// `adj_close` is optional; when absent every computation falls back to `close`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub adj_close: Option<f64>,
}

impl Bar {
    pub fn new(date: NaiveDate, open: f64, high: f64, low: f64, close: f64) -> Self {
        Self {
            date,
            open,
            high,
            low,
            close,
            adj_close: None,
        }
    }

    pub fn with_adj_close(mut self, adj_close: f64) -> Self {
        self.adj_close = Some(adj_close);
        self
    }

    /// The price every indicator and return computation reads.
    pub fn price(&self) -> f64 {
        self.adj_close.unwrap_or(self.close)
    }
}
