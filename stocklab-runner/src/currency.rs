//! Currency conversion for the initial capital.
//!
//! Only the starting amount is converted; prices are used as delivered.
//! Rates come from a fixed table (config `[currency] rates`), keyed
//! `"FROM/TO"`. A missing direct rate falls back to the inverse pair.

use std::collections::BTreeMap;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CurrencyError {
    #[error("no exchange rate for {from} -> {to}")]
    UnknownRate { from: String, to: String },

    #[error("invalid currency pair '{0}' (expected FROM/TO)")]
    InvalidPair(String),

    #[error("invalid rate {rate} for {pair}: must be positive and finite")]
    InvalidRate { pair: String, rate: f64 },
}

/// Converts amounts between currencies.
pub trait CurrencyConverter: Send + Sync {
    /// Units of `to` per unit of `from`.
    fn rate(&self, from: &str, to: &str) -> Result<f64, CurrencyError>;

    fn convert(&self, amount: f64, from: &str, to: &str) -> Result<f64, CurrencyError> {
        Ok(amount * self.rate(from, to)?)
    }
}

/// Static rate table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FixedRates {
    rates: BTreeMap<(String, String), f64>,
}

impl FixedRates {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a `"FROM/TO" -> rate` table.
    pub fn from_table(table: &BTreeMap<String, f64>) -> Result<Self, CurrencyError> {
        let mut rates = Self::new();
        for (pair, &rate) in table {
            let (from, to) = pair
                .split_once('/')
                .map(|(f, t)| (f.trim(), t.trim()))
                .filter(|(f, t)| !f.is_empty() && !t.is_empty())
                .ok_or_else(|| CurrencyError::InvalidPair(pair.clone()))?;
            rates = rates.with_rate(from, to, rate)?;
        }
        Ok(rates)
    }

    pub fn with_rate(mut self, from: &str, to: &str, rate: f64) -> Result<Self, CurrencyError> {
        if !rate.is_finite() || rate <= 0.0 {
            return Err(CurrencyError::InvalidRate {
                pair: format!("{from}/{to}"),
                rate,
            });
        }
        self.rates.insert((normalize(from), normalize(to)), rate);
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }
}

impl CurrencyConverter for FixedRates {
    fn rate(&self, from: &str, to: &str) -> Result<f64, CurrencyError> {
        let (from, to) = (normalize(from), normalize(to));
        if from == to {
            return Ok(1.0);
        }
        if let Some(&rate) = self.rates.get(&(from.clone(), to.clone())) {
            return Ok(rate);
        }
        if let Some(&inverse) = self.rates.get(&(to.clone(), from.clone())) {
            return Ok(1.0 / inverse);
        }
        Err(CurrencyError::UnknownRate { from, to })
    }
}

fn normalize(code: &str) -> String {
    code.trim().to_ascii_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> FixedRates {
        let mut t = BTreeMap::new();
        t.insert("USD/INR".to_string(), 80.0);
        t.insert("USD/JPY".to_string(), 150.0);
        FixedRates::from_table(&t).unwrap()
    }

    #[test]
    fn same_currency_is_identity() {
        let rates = FixedRates::new();
        assert_eq!(rates.convert(123.0, "usd", "USD").unwrap(), 123.0);
    }

    #[test]
    fn direct_and_inverse_lookup() {
        let rates = table();
        assert_eq!(rates.convert(10.0, "USD", "INR").unwrap(), 800.0);
        assert!((rates.convert(800.0, "INR", "USD").unwrap() - 10.0).abs() < 1e-12);
    }

    #[test]
    fn unknown_pair_fails() {
        let rates = table();
        assert_eq!(
            rates.rate("INR", "JPY").unwrap_err(),
            CurrencyError::UnknownRate {
                from: "INR".into(),
                to: "JPY".into()
            }
        );
    }

    #[test]
    fn malformed_table_entries_are_rejected() {
        let mut t = BTreeMap::new();
        t.insert("USDINR".to_string(), 80.0);
        assert!(matches!(
            FixedRates::from_table(&t),
            Err(CurrencyError::InvalidPair(_))
        ));

        let mut t = BTreeMap::new();
        t.insert("USD/INR".to_string(), 0.0);
        assert!(matches!(
            FixedRates::from_table(&t),
            Err(CurrencyError::InvalidRate { .. })
        ));
    }
}
