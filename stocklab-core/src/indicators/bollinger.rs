//! Bollinger Bands: moving average +/- standard deviation multiplier.
//!
//! Three bands (separate Indicator instances):
//! - Middle: SMA(price, period)
//! - Upper: middle + mult * stddev(price, period)
//! - Lower: middle - mult * stddev(price, period)
//!
//! Uses sample stddev (divide by N - 1).
//! Lookback: period - 1.

use crate::domain::PriceSeries;
use crate::error::CoreError;

use super::frame::BandSeries;
use super::rolling::{check_window, RollingStd};
use super::{Indicator, Sma};

/// Which band of the Bollinger Bands to compute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BollingerBand {
    Upper,
    Middle,
    Lower,
}

#[derive(Debug, Clone)]
pub struct Bollinger {
    sma: Sma,
    std: RollingStd,
    multiplier: f64,
    band: BollingerBand,
    name: String,
}

impl Bollinger {
    pub fn new(period: usize, multiplier: f64, band: BollingerBand) -> Result<Self, CoreError> {
        check_band_params(period, multiplier)?;
        let label = match band {
            BollingerBand::Upper => "upper",
            BollingerBand::Middle => "middle",
            BollingerBand::Lower => "lower",
        };
        Ok(Self {
            sma: Sma::new(period)?,
            std: RollingStd::new(period)?,
            multiplier,
            band,
            name: format!("bollinger_{label}_{period}_{multiplier}"),
        })
    }

    pub fn upper(period: usize, multiplier: f64) -> Result<Self, CoreError> {
        Self::new(period, multiplier, BollingerBand::Upper)
    }

    pub fn middle(period: usize, multiplier: f64) -> Result<Self, CoreError> {
        Self::new(period, multiplier, BollingerBand::Middle)
    }

    pub fn lower(period: usize, multiplier: f64) -> Result<Self, CoreError> {
        Self::new(period, multiplier, BollingerBand::Lower)
    }

    /// This band from precomputed mean and stddev columns.
    fn band_from(&self, mean: &[f64], std: &[f64]) -> Vec<f64> {
        let sign = match self.band {
            BollingerBand::Upper => 1.0,
            BollingerBand::Middle => return mean.to_vec(),
            BollingerBand::Lower => -1.0,
        };
        mean.iter()
            .zip(std)
            .map(|(m, s)| m + sign * self.multiplier * s)
            .collect()
    }
}

impl Indicator for Bollinger {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.sma.lookback()
    }

    fn compute(&self, series: &PriceSeries) -> Vec<f64> {
        let mean = self.sma.compute(series);
        if self.band == BollingerBand::Middle {
            return mean;
        }
        let std = self.std.compute(series);
        self.band_from(&mean, &std)
    }
}

/// Middle, upper and lower bands plus the rolling stddev.
///
/// The mean and stddev are computed once and shared by both outer bands.
pub fn compute_bands(
    series: &PriceSeries,
    window: usize,
    std_multiplier: f64,
) -> Result<BandSeries, CoreError> {
    let upper_band = Bollinger::upper(window, std_multiplier)?;
    let lower_band = Bollinger::lower(window, std_multiplier)?;

    let sma = upper_band.sma.compute(series);
    let std = upper_band.std.compute(series);
    let upper = upper_band.band_from(&sma, &std);
    let lower = lower_band.band_from(&sma, &std);

    Ok(BandSeries {
        window,
        std_multiplier,
        sma,
        std,
        upper,
        lower,
    })
}

fn check_band_params(window: usize, multiplier: f64) -> Result<(), CoreError> {
    check_window(window, 2, "band window")?;
    if !multiplier.is_finite() || multiplier < 0.0 {
        return Err(CoreError::InvalidParameter(format!(
            "band std multiplier must be finite and >= 0, got {multiplier}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_series, DEFAULT_EPSILON};

    #[test]
    fn bollinger_middle_is_sma() {
        let series = make_series(&[10.0, 11.0, 12.0, 13.0, 14.0]);
        let result = Bollinger::middle(3, 2.0).unwrap().compute(&series);

        assert!(result[0].is_nan());
        assert!(result[1].is_nan());
        assert_approx(result[2], 11.0, DEFAULT_EPSILON);
        assert_approx(result[3], 12.0, DEFAULT_EPSILON);
    }

    #[test]
    fn bollinger_bands_symmetric() {
        let series = make_series(&[10.0, 11.0, 12.0, 13.0, 14.0]);
        let upper = Bollinger::upper(3, 2.0).unwrap().compute(&series);
        let middle = Bollinger::middle(3, 2.0).unwrap().compute(&series);
        let lower = Bollinger::lower(3, 2.0).unwrap().compute(&series);

        for i in 2..5 {
            let half_width = upper[i] - middle[i];
            assert_approx(middle[i] - lower[i], half_width, DEFAULT_EPSILON);
            // sample std of three consecutive integers is 1
            assert_approx(half_width, 2.0, DEFAULT_EPSILON);
        }
    }

    #[test]
    fn bollinger_constant_price_zero_width() {
        let series = make_series(&[100.0, 100.0, 100.0, 100.0]);
        let bands = compute_bands(&series, 3, 2.0).unwrap();
        assert_approx(bands.upper[2], 100.0, DEFAULT_EPSILON);
        assert_approx(bands.lower[2], 100.0, DEFAULT_EPSILON);
    }

    #[test]
    fn compute_bands_matches_single_band_indicators() {
        let series = make_series(&[5.0, 7.0, 6.0, 9.0, 8.0, 11.0, 10.0]);
        let bands = compute_bands(&series, 4, 1.5).unwrap();
        let upper = Bollinger::upper(4, 1.5).unwrap().compute(&series);
        let lower = Bollinger::lower(4, 1.5).unwrap().compute(&series);
        for i in 3..series.len() {
            assert_approx(bands.upper[i], upper[i], DEFAULT_EPSILON);
            assert_approx(bands.lower[i], lower[i], DEFAULT_EPSILON);
        }
        for i in 0..3 {
            assert!(bands.sma[i].is_nan());
            assert!(bands.upper[i].is_nan());
            assert!(bands.lower[i].is_nan());
        }
    }

    #[test]
    fn invalid_band_params_rejected() {
        let series = make_series(&[1.0, 2.0, 3.0]);
        assert!(compute_bands(&series, 0, 2.0).is_err());
        assert!(compute_bands(&series, 1, 2.0).is_err());
        assert!(compute_bands(&series, 3, -1.0).is_err());
        assert!(compute_bands(&series, 3, f64::NAN).is_err());
    }

    #[test]
    fn bollinger_lookback() {
        assert_eq!(Bollinger::upper(20, 2.0).unwrap().lookback(), 19);
    }
}
