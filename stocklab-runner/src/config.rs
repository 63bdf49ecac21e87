//! Serializable backtest configuration.
//!
//! ```toml
//! [backtest]
//! symbol = "AAPL"
//! strategy = "volatility-band"
//! style = "moderate"
//! initial_capital = 10000.0
//! start_date = "2020-01-01"
//! end_date = "2021-01-01"
//!
//! [data]
//! csv = "data/AAPL.csv"
//!
//! [comparison]
//! styles = ["Aggressive", "Moderate", "Passive"]
//!
//! [overrides]
//! band_window = 15
//!
//! [currency]
//! from = "USD"
//! to = "INR"
//! rates = { "USD/INR" = 83.2 }
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use stocklab_core::{resolve_or_default, ResolvedStyle, Strategy, StrategyKind, StyleParameters};
use thiserror::Error;

use crate::currency::{CurrencyConverter, CurrencyError, FixedRates};
use crate::data_loader::{LoadOptions, PriceSource};

/// Unique identifier for a backtest run (content-addressable hash).
pub type RunId = String;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(String),

    #[error("invalid config: {0}")]
    Invalid(String),

    #[error(transparent)]
    Currency(#[from] CurrencyError),
}

/// Complete configuration for one backtest run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BacktestConfig {
    #[serde(default)]
    pub backtest: BacktestSection,
    #[serde(default)]
    pub data: DataSection,
    #[serde(default)]
    pub comparison: ComparisonSection,
    #[serde(default)]
    pub overrides: ParameterOverrides,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<CurrencySection>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BacktestSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
    #[serde(default = "default_strategy")]
    pub strategy: String,
    #[serde(default = "default_style")]
    pub style: String,
    #[serde(default = "default_capital")]
    pub initial_capital: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
}

impl Default for BacktestSection {
    fn default() -> Self {
        Self {
            symbol: None,
            strategy: default_strategy(),
            style: default_style(),
            initial_capital: default_capital(),
            start_date: None,
            end_date: None,
        }
    }
}

/// Price source: exactly one of `csv` or `ticker`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DataSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub csv: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ticker: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ComparisonSection {
    #[serde(default = "default_comparison_styles")]
    pub styles: Vec<String>,
}

impl Default for ComparisonSection {
    fn default() -> Self {
        Self {
            styles: default_comparison_styles(),
        }
    }
}

/// Per-parameter overrides applied on top of the style profile.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct ParameterOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub band_window: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub band_std_multiplier: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short_ma_window: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub long_ma_window: Option<usize>,
}

impl ParameterOverrides {
    pub fn apply(&self, base: StyleParameters) -> StyleParameters {
        StyleParameters {
            band_window: self.band_window.unwrap_or(base.band_window),
            band_std_multiplier: self.band_std_multiplier.unwrap_or(base.band_std_multiplier),
            short_ma_window: self.short_ma_window.unwrap_or(base.short_ma_window),
            long_ma_window: self.long_ma_window.unwrap_or(base.long_ma_window),
            growth_multiplier: base.growth_multiplier,
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Conversion of the initial capital from `from` to `to`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CurrencySection {
    pub from: String,
    pub to: String,
    #[serde(default)]
    pub rates: BTreeMap<String, f64>,
}

fn default_strategy() -> String {
    StrategyKind::VolatilityBand.as_str().to_string()
}

fn default_style() -> String {
    "moderate".to_string()
}

fn default_capital() -> f64 {
    10_000.0
}

fn default_comparison_styles() -> Vec<String> {
    stocklab_core::Style::ALL
        .iter()
        .map(|s| s.name().to_string())
        .collect()
}

impl BacktestConfig {
    /// A config reading `source` with every other field at its default.
    pub fn for_source(source: &PriceSource) -> Self {
        let data = match source {
            PriceSource::Csv(path) => DataSection {
                csv: Some(path.clone()),
                ticker: None,
            },
            PriceSource::Ticker(t) => DataSection {
                csv: None,
                ticker: Some(t.clone()),
            },
        };
        Self {
            backtest: BacktestSection::default(),
            data,
            comparison: ComparisonSection::default(),
            overrides: ParameterOverrides::default(),
            currency: None,
        }
    }

    /// Load a config from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse a config from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))
    }

    /// Check everything that can be checked without loading data.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let capital = self.backtest.initial_capital;
        if !capital.is_finite() || capital <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "initial_capital must be positive, got {capital}"
            )));
        }
        if let (Some(start), Some(end)) = (self.backtest.start_date, self.backtest.end_date) {
            if end < start {
                return Err(ConfigError::Invalid(format!(
                    "end_date {end} is before start_date {start}"
                )));
            }
        }
        self.price_source()?;
        self.strategy_kind()?;
        if let Some(currency) = &self.currency {
            FixedRates::from_table(&currency.rates)?;
        }
        Ok(())
    }

    pub fn strategy_kind(&self) -> Result<StrategyKind, ConfigError> {
        self.backtest
            .strategy
            .parse()
            .map_err(|e: stocklab_core::CoreError| ConfigError::Invalid(e.to_string()))
    }

    /// Style profile; unknown names fall back to Moderate with a warning.
    pub fn resolved_style(&self) -> ResolvedStyle {
        resolve_or_default(&self.backtest.style)
    }

    /// Parameters of an already resolved style with overrides applied.
    pub fn parameters(&self, style: &ResolvedStyle) -> StyleParameters {
        self.overrides.apply(style.parameters)
    }

    pub fn strategy(&self, style: &ResolvedStyle) -> Result<Strategy, ConfigError> {
        Ok(Strategy::from_style(self.strategy_kind()?, &self.parameters(style)))
    }

    pub fn price_source(&self) -> Result<PriceSource, ConfigError> {
        match (&self.data.csv, &self.data.ticker) {
            (Some(path), None) => Ok(PriceSource::Csv(path.clone())),
            (None, Some(ticker)) => Ok(PriceSource::Ticker(ticker.clone())),
            (Some(_), Some(_)) => Err(ConfigError::Invalid(
                "[data] must set exactly one of csv or ticker".into(),
            )),
            (None, None) => Err(ConfigError::Invalid(
                "no data source: set [data] csv or ticker".into(),
            )),
        }
    }

    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            start: self.backtest.start_date,
            end: self.backtest.end_date,
        }
    }

    /// Display symbol: explicit, else implied by the data source.
    pub fn symbol(&self) -> String {
        if let Some(s) = &self.backtest.symbol {
            return s.clone();
        }
        self.price_source()
            .map(|s| s.symbol())
            .unwrap_or_else(|_| "UNKNOWN".into())
    }

    /// Initial capital in the target currency, plus that currency's code.
    pub fn converted_capital(&self) -> Result<(f64, Option<String>), ConfigError> {
        let capital = self.backtest.initial_capital;
        match &self.currency {
            None => Ok((capital, None)),
            Some(c) => {
                let rates = FixedRates::from_table(&c.rates)?;
                let converted = rates.convert(capital, &c.from, &c.to)?;
                tracing::info!(
                    from = %c.from,
                    to = %c.to,
                    capital,
                    converted,
                    "initial capital converted"
                );
                Ok((converted, Some(c.to.to_ascii_uppercase())))
            }
        }
    }

    /// Deterministic hash ID for this configuration.
    ///
    /// Two runs with identical configs get the same RunId.
    pub fn run_id(&self) -> Result<RunId, ConfigError> {
        let json =
            serde_json::to_string(self).map_err(|e| ConfigError::Serialize(e.to_string()))?;
        Ok(blake3::hash(json.as_bytes()).to_hex().to_string())
    }
}
