//! Price loading for the runner.
//!
//! A series comes from one of two sources:
//! 1. A CSV file in the Yahoo export layout
//!    (`Date, Open, High, Low, Close[, Adj Close][, Volume]`)
//! 2. A ticker fetched through a [`PriceProvider`]
//!
//! Either way the loader hands the core a timezone-naive, strictly ordered
//! [`PriceSeries`], optionally restricted to an inclusive date range.

use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::Deserialize;
use stocklab_core::{Bar, CoreError, PriceSeries};
use thiserror::Error;

use crate::yahoo::{FetchRange, PriceProvider, ProviderError};

/// Errors from the data loading layer.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("invalid date range: end {end} is before start {start}")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },

    #[error("no bars for '{symbol}' between {start} and {end}")]
    EmptyRange {
        symbol: String,
        start: NaiveDate,
        end: NaiveDate,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("row {row}: unparseable date '{value}'")]
    Date { row: usize, value: String },

    #[error("row {row}: unparseable {column} value '{value}'")]
    Number {
        row: usize,
        column: &'static str,
        value: String,
    },

    #[error("duplicate date {0} in input")]
    DuplicateDate(NaiveDate),

    #[error("ticker source '{0}' requires a price provider")]
    NoProvider(String),

    #[error("provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Core(#[from] CoreError),
}

/// Where a price series comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PriceSource {
    Csv(PathBuf),
    Ticker(String),
}

impl PriceSource {
    /// Symbol implied by the source: the ticker, or the CSV file stem.
    pub fn symbol(&self) -> String {
        match self {
            Self::Ticker(t) => t.clone(),
            Self::Csv(path) => path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "UNKNOWN".into()),
        }
    }
}

/// Options controlling how bars are loaded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadOptions {
    /// Inclusive start date; open-ended when `None`.
    pub start: Option<NaiveDate>,
    /// Inclusive end date; open-ended when `None`.
    pub end: Option<NaiveDate>,
}

impl LoadOptions {
    pub fn validate(&self) -> Result<(), LoadError> {
        if let (Some(start), Some(end)) = (self.start, self.end) {
            if end < start {
                return Err(LoadError::InvalidDateRange { start, end });
            }
        }
        Ok(())
    }

    /// Provider range: a bounded request only when both ends are known.
    pub fn fetch_range(&self) -> FetchRange {
        match (self.start, self.end) {
            (Some(start), Some(end)) => FetchRange::Between { start, end },
            _ => FetchRange::Max,
        }
    }
}

#[derive(Debug, Deserialize)]
struct CsvRow {
    #[serde(rename = "Date")]
    date: String,
    #[serde(rename = "Open")]
    open: String,
    #[serde(rename = "High")]
    high: String,
    #[serde(rename = "Low")]
    low: String,
    #[serde(rename = "Close")]
    close: String,
    #[serde(rename = "Adj Close", default)]
    adj_close: Option<String>,
}

/// Load a price series from a source, then restrict it to the option range.
///
/// This is the primary entry point for the runner to get bar data.
pub fn load_price_series(
    source: &PriceSource,
    provider: Option<&dyn PriceProvider>,
    opts: &LoadOptions,
) -> Result<PriceSeries, LoadError> {
    opts.validate()?;

    let series = match source {
        PriceSource::Csv(path) => load_csv(path, None)?,
        PriceSource::Ticker(symbol) => {
            let provider = provider.ok_or_else(|| LoadError::NoProvider(symbol.clone()))?;
            let bars = provider.fetch(symbol, opts.fetch_range())?;
            PriceSeries::new(symbol.clone(), bars)?
        }
    };

    tracing::info!(
        symbol = series.symbol(),
        bars = series.len(),
        "price series loaded"
    );

    filter_range(&series, opts.start, opts.end)
}

/// Read a CSV file. The symbol defaults to the file stem.
pub fn load_csv(path: &Path, symbol: Option<&str>) -> Result<PriceSeries, LoadError> {
    let file = std::fs::File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let symbol = symbol
        .map(str::to_string)
        .unwrap_or_else(|| PriceSource::Csv(path.to_path_buf()).symbol());
    read_csv(&symbol, file)
}

/// Parse CSV rows into a sorted series.
///
/// Rows without any close value (`null` or empty) are skipped; duplicate
/// dates are rejected.
pub fn read_csv<R: Read>(symbol: &str, reader: R) -> Result<PriceSeries, LoadError> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut bars = Vec::new();
    let mut skipped = 0usize;

    for (i, record) in rdr.deserialize::<CsvRow>().enumerate() {
        let row = record?;
        let line = i + 2;

        let date = parse_date(&row.date).ok_or_else(|| LoadError::Date {
            row: line,
            value: row.date.clone(),
        })?;
        let close = parse_price(line, "Close", &row.close)?;
        let adj_close = match row.adj_close.as_deref() {
            Some(v) => parse_price(line, "Adj Close", v)?,
            None => None,
        };
        if close.is_none() && adj_close.is_none() {
            skipped += 1;
            continue;
        }

        bars.push(Bar {
            date,
            open: parse_price(line, "Open", &row.open)?.unwrap_or(f64::NAN),
            high: parse_price(line, "High", &row.high)?.unwrap_or(f64::NAN),
            low: parse_price(line, "Low", &row.low)?.unwrap_or(f64::NAN),
            close: close.or(adj_close).unwrap_or(f64::NAN),
            adj_close,
        });
    }

    if skipped > 0 {
        tracing::debug!(symbol, skipped, "skipped CSV rows without prices");
    }

    bars.sort_by_key(|b| b.date);
    if let Some(pair) = bars.windows(2).find(|w| w[0].date == w[1].date) {
        return Err(LoadError::DuplicateDate(pair[0].date));
    }

    Ok(PriceSeries::new(symbol, bars)?)
}

/// Restrict a series to `[start, end]`; either bound may be open.
///
/// Fails with `InvalidDateRange` when `end < start` and `EmptyRange` when no
/// bar falls inside.
pub fn filter_range(
    series: &PriceSeries,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> Result<PriceSeries, LoadError> {
    LoadOptions { start, end }.validate()?;
    if start.is_none() && end.is_none() {
        return Ok(series.clone());
    }

    let lo = start.unwrap_or(NaiveDate::MIN);
    let hi = end.unwrap_or(NaiveDate::MAX);
    let filtered = series.between(lo, hi);
    if filtered.is_empty() {
        return Err(LoadError::EmptyRange {
            symbol: series.symbol().to_string(),
            start: lo,
            end: hi,
        });
    }
    Ok(filtered)
}

/// Write a series in the same CSV layout `read_csv` accepts.
pub fn write_csv<W: Write>(series: &PriceSeries, writer: W) -> Result<(), LoadError> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(["Date", "Open", "High", "Low", "Close", "Adj Close"])?;
    for bar in series.bars() {
        wtr.write_record([
            bar.date.to_string(),
            fmt_price(bar.open),
            fmt_price(bar.high),
            fmt_price(bar.low),
            fmt_price(bar.close),
            bar.adj_close.map(fmt_price).unwrap_or_default(),
        ])?;
    }
    wtr.flush().map_err(|e| LoadError::Csv(e.into()))?;
    Ok(())
}

/// Deterministic BLAKE3 hash over the series' dates and prices.
pub fn dataset_hash(series: &PriceSeries) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(series.symbol().as_bytes());
    for bar in series.bars() {
        hasher.update(bar.date.to_string().as_bytes());
        hasher.update(&bar.open.to_le_bytes());
        hasher.update(&bar.high.to_le_bytes());
        hasher.update(&bar.low.to_le_bytes());
        hasher.update(&bar.close.to_le_bytes());
        hasher.update(&bar.adj_close.unwrap_or(f64::NAN).to_le_bytes());
    }
    hasher.finalize().to_hex().to_string()
}

/// Parse a date, dropping any time-of-day and UTC offset.
///
/// Accepts `2024-01-02`, `2024-01-02 00:00:00`, `2024-01-02T00:00:00`, and
/// offset forms such as `2024-01-02 00:00:00-05:00` or RFC 3339.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if let Ok(d) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Some(d);
    }
    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, fmt) {
            return Some(dt.date());
        }
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.naive_local().date());
    }
    DateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%:z")
        .ok()
        .map(|dt| dt.naive_local().date())
}

fn parse_price(row: usize, column: &'static str, value: &str) -> Result<Option<f64>, LoadError> {
    let v = value.trim();
    if v.is_empty() || v.eq_ignore_ascii_case("null") || v.eq_ignore_ascii_case("nan") {
        return Ok(None);
    }
    match v.parse::<f64>() {
        Ok(x) if x.is_finite() => Ok(Some(x)),
        _ => Err(LoadError::Number {
            row,
            column,
            value: value.to_string(),
        }),
    }
}

fn fmt_price(v: f64) -> String {
    if v.is_nan() {
        String::new()
    } else {
        format!("{v}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
Date,Open,High,Low,Close,Adj Close,Volume
2024-01-03,101,103,100,102,101.5,1200
2024-01-02,100,102,99,101,100.5,1000
2024-01-04,102,104,101,103,102.5,900
";

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn reads_and_sorts_rows() {
        let series = read_csv("SPY", SAMPLE.as_bytes()).unwrap();
        assert_eq!(series.len(), 3);
        assert_eq!(series.symbol(), "SPY");
        assert_eq!(series.bars()[0].date, d(2024, 1, 2));
        assert_eq!(series.bars()[0].adj_close, Some(100.5));
        assert_eq!(series.prices(), vec![100.5, 101.5, 102.5]);
    }

    #[test]
    fn adj_close_column_is_optional() {
        let csv = "Date,Open,High,Low,Close\n2024-01-02,1,2,0.5,1.5\n";
        let series = read_csv("X", csv.as_bytes()).unwrap();
        assert_eq!(series.bars()[0].adj_close, None);
        assert_eq!(series.bars()[0].price(), 1.5);
    }

    #[test]
    fn offset_timestamps_become_naive_dates() {
        let csv = "\
Date,Open,High,Low,Close
2024-01-02 00:00:00-05:00,1,2,0.5,1.5
2024-01-03T00:00:00+09:00,1,2,0.5,1.6
";
        let series = read_csv("X", csv.as_bytes()).unwrap();
        assert_eq!(series.dates(), vec![d(2024, 1, 2), d(2024, 1, 3)]);
    }

    #[test]
    fn null_rows_are_skipped() {
        let csv = "\
Date,Open,High,Low,Close,Adj Close
2024-01-02,1,2,0.5,1.5,1.4
2024-01-03,null,null,null,null,null
";
        let series = read_csv("X", csv.as_bytes()).unwrap();
        assert_eq!(series.len(), 1);
    }

    #[test]
    fn duplicate_dates_are_rejected() {
        let csv = "\
Date,Open,High,Low,Close
2024-01-02,1,2,0.5,1.5
2024-01-02,1,2,0.5,1.6
";
        assert!(matches!(
            read_csv("X", csv.as_bytes()),
            Err(LoadError::DuplicateDate(_))
        ));
    }

    #[test]
    fn bad_values_report_row() {
        let csv = "Date,Open,High,Low,Close\nyesterday,1,2,0.5,1.5\n";
        assert!(matches!(
            read_csv("X", csv.as_bytes()),
            Err(LoadError::Date { row: 2, .. })
        ));
        let csv = "Date,Open,High,Low,Close\n2024-01-02,1,2,0.5,abc\n";
        assert!(matches!(
            read_csv("X", csv.as_bytes()),
            Err(LoadError::Number { column: "Close", .. })
        ));
    }

    #[test]
    fn infinite_values_are_rejected() {
        for value in ["inf", "-inf", "Infinity"] {
            let csv = format!("Date,Open,High,Low,Close\n2024-01-02,1,2,0.5,{value}\n");
            assert!(
                matches!(
                    read_csv("X", csv.as_bytes()),
                    Err(LoadError::Number { column: "Close", row: 2, .. })
                ),
                "{value} was accepted"
            );
        }
    }

    #[test]
    fn fetch_range_needs_both_bounds() {
        let both = LoadOptions {
            start: Some(d(2024, 1, 2)),
            end: Some(d(2024, 3, 1)),
        };
        assert_eq!(
            both.fetch_range(),
            FetchRange::Between {
                start: d(2024, 1, 2),
                end: d(2024, 3, 1)
            }
        );
        let open_ended = LoadOptions {
            start: Some(d(2024, 1, 2)),
            end: None,
        };
        assert_eq!(open_ended.fetch_range(), FetchRange::Max);
        assert_eq!(LoadOptions::default().fetch_range(), FetchRange::Max);
    }

    #[test]
    fn filter_range_bounds() {
        let series = read_csv("SPY", SAMPLE.as_bytes()).unwrap();

        let f = filter_range(&series, Some(d(2024, 1, 3)), None).unwrap();
        assert_eq!(f.len(), 2);

        let f = filter_range(&series, None, Some(d(2024, 1, 3))).unwrap();
        assert_eq!(f.len(), 2);

        let f = filter_range(&series, Some(d(2024, 1, 3)), Some(d(2024, 1, 3))).unwrap();
        assert_eq!(f.len(), 1);

        assert!(matches!(
            filter_range(&series, Some(d(2024, 1, 4)), Some(d(2024, 1, 2))),
            Err(LoadError::InvalidDateRange { .. })
        ));
        assert!(matches!(
            filter_range(&series, Some(d(2025, 1, 1)), Some(d(2025, 2, 1))),
            Err(LoadError::EmptyRange { .. })
        ));
    }

    #[test]
    fn write_then_read_preserves_prices() {
        let series = read_csv("SPY", SAMPLE.as_bytes()).unwrap();
        let mut buf = Vec::new();
        write_csv(&series, &mut buf).unwrap();
        let back = read_csv("SPY", buf.as_slice()).unwrap();
        assert_eq!(back, series);
    }

    #[test]
    fn dataset_hash_is_deterministic() {
        let a = read_csv("SPY", SAMPLE.as_bytes()).unwrap();
        let b = read_csv("SPY", SAMPLE.as_bytes()).unwrap();
        assert_eq!(dataset_hash(&a), dataset_hash(&b));
        let c = filter_range(&a, Some(d(2024, 1, 3)), None).unwrap();
        assert_ne!(dataset_hash(&a), dataset_hash(&c));
    }

    #[test]
    fn ticker_without_provider_fails() {
        let err = load_price_series(
            &PriceSource::Ticker("SPY".into()),
            None,
            &LoadOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, LoadError::NoProvider(_)));
    }

    #[test]
    fn csv_source_symbol_is_file_stem() {
        let source = PriceSource::Csv(PathBuf::from("data/AAPL.csv"));
        assert_eq!(source.symbol(), "AAPL");
    }
}
