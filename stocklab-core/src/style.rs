//! Investment style profiles.
//!
//! Three named styles map to a fixed parameter record. The table is a set of
//! constants; lookup is by explicit [`resolve`], and the only defaulting path
//! is [`resolve_or_default`], which reports when it falls back to Moderate.
//!
//! | Style      | band window | band k | short MA | long MA | growth x |
//! |------------|-------------|--------|----------|---------|----------|
//! | Aggressive | 10          | 1.5    | 20       | 50      | 1.5      |
//! | Moderate   | 20          | 2.0    | 50       | 200     | 1.0      |
//! | Passive    | 30          | 2.5    | 100      | 300     | 0.75     |

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Named risk profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Style {
    Aggressive,
    #[default]
    Moderate,
    Passive,
}

/// Indicator and growth parameters for one style.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StyleParameters {
    pub band_window: usize,
    pub band_std_multiplier: f64,
    pub short_ma_window: usize,
    pub long_ma_window: usize,
    pub growth_multiplier: f64,
}

const AGGRESSIVE: StyleParameters = StyleParameters {
    band_window: 10,
    band_std_multiplier: 1.5,
    short_ma_window: 20,
    long_ma_window: 50,
    growth_multiplier: 1.5,
};

const MODERATE: StyleParameters = StyleParameters {
    band_window: 20,
    band_std_multiplier: 2.0,
    short_ma_window: 50,
    long_ma_window: 200,
    growth_multiplier: 1.0,
};

const PASSIVE: StyleParameters = StyleParameters {
    band_window: 30,
    band_std_multiplier: 2.5,
    short_ma_window: 100,
    long_ma_window: 300,
    growth_multiplier: 0.75,
};

impl Style {
    pub const ALL: [Style; 3] = [Style::Aggressive, Style::Moderate, Style::Passive];

    pub fn parameters(self) -> &'static StyleParameters {
        match self {
            Self::Aggressive => &AGGRESSIVE,
            Self::Moderate => &MODERATE,
            Self::Passive => &PASSIVE,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Aggressive => "Aggressive",
            Self::Moderate => "Moderate",
            Self::Passive => "Passive",
        }
    }
}

impl fmt::Display for Style {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Style {
    type Err = CoreError;

    /// Case-insensitive; surrounding whitespace is ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "aggressive" => Ok(Self::Aggressive),
            "moderate" => Ok(Self::Moderate),
            "passive" => Ok(Self::Passive),
            _ => Err(CoreError::UnknownStyle(s.to_string())),
        }
    }
}

/// Look up the parameter record for a style name.
pub fn resolve(style_name: &str) -> Result<StyleParameters, CoreError> {
    style_name.parse::<Style>().map(|s| *s.parameters())
}

/// Outcome of [`resolve_or_default`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedStyle {
    pub style: Style,
    pub parameters: StyleParameters,
    /// True when the name was not recognised and Moderate was substituted.
    pub fell_back: bool,
}

/// Resolve a style name, substituting Moderate for unknown names.
///
/// The substitution is flagged in the result and logged at warn level.
pub fn resolve_or_default(style_name: &str) -> ResolvedStyle {
    match style_name.parse::<Style>() {
        Ok(style) => ResolvedStyle {
            style,
            parameters: *style.parameters(),
            fell_back: false,
        },
        Err(_) => {
            tracing::warn!(
                style = style_name,
                fallback = %Style::Moderate,
                "unknown style, using fallback profile"
            );
            ResolvedStyle {
                style: Style::Moderate,
                parameters: MODERATE,
                fell_back: true,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_values() {
        let a = resolve("Aggressive").unwrap();
        assert_eq!(a.band_window, 10);
        assert_eq!(a.band_std_multiplier, 1.5);
        assert_eq!(a.short_ma_window, 20);
        assert_eq!(a.long_ma_window, 50);
        assert_eq!(a.growth_multiplier, 1.5);

        let m = resolve("Moderate").unwrap();
        assert_eq!((m.band_window, m.short_ma_window, m.long_ma_window), (20, 50, 200));
        assert_eq!(m.band_std_multiplier, 2.0);
        assert_eq!(m.growth_multiplier, 1.0);

        let p = resolve("Passive").unwrap();
        assert_eq!((p.band_window, p.short_ma_window, p.long_ma_window), (30, 100, 300));
        assert_eq!(p.band_std_multiplier, 2.5);
        assert_eq!(p.growth_multiplier, 0.75);
    }

    #[test]
    fn every_profile_has_short_below_long() {
        for style in Style::ALL {
            let p = style.parameters();
            assert!(p.short_ma_window < p.long_ma_window, "{style}");
            assert!(p.band_window >= 2, "{style}");
        }
    }

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!("  passive ".parse::<Style>().unwrap(), Style::Passive);
        assert_eq!("AGGRESSIVE".parse::<Style>().unwrap(), Style::Aggressive);
    }

    #[test]
    fn unknown_style_is_an_error() {
        assert_eq!(
            resolve("Reckless"),
            Err(CoreError::UnknownStyle("Reckless".into()))
        );
    }

    #[test]
    fn fallback_is_explicit() {
        let resolved = resolve_or_default("Reckless");
        assert!(resolved.fell_back);
        assert_eq!(resolved.style, Style::Moderate);
        assert_eq!(resolved.parameters, *Style::Moderate.parameters());

        let resolved = resolve_or_default("passive");
        assert!(!resolved.fell_back);
        assert_eq!(resolved.style, Style::Passive);
    }
}
