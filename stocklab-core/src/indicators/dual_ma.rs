//! Short/long moving-average pair for crossover strategies.

use crate::domain::PriceSeries;
use crate::error::CoreError;

use super::frame::DualMaSeries;
use super::{Indicator, Sma};

/// Compute the short and long SMA over the series price.
///
/// Fails with `InvalidParameter` when either window is zero or when
/// `short_window >= long_window`.
pub fn compute_dual_ma(
    series: &PriceSeries,
    short_window: usize,
    long_window: usize,
) -> Result<DualMaSeries, CoreError> {
    let short = Sma::new(short_window)?;
    let long = Sma::new(long_window)?;
    if short.period() >= long.period() {
        return Err(CoreError::InvalidParameter(format!(
            "short window ({short_window}) must be < long window ({long_window})"
        )));
    }

    Ok(DualMaSeries {
        short_window,
        long_window,
        short_ma: short.compute(series),
        long_ma: long.compute(series),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_series, DEFAULT_EPSILON};

    #[test]
    fn dual_ma_windows() {
        let series = make_series(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        let ma = compute_dual_ma(&series, 2, 4).unwrap();
        assert_eq!(ma.short_ma.len(), 6);
        assert_eq!(ma.long_ma.len(), 6);
        assert!(ma.short_ma[0].is_nan());
        assert_approx(ma.short_ma[1], 1.5, DEFAULT_EPSILON);
        assert!(ma.long_ma[2].is_nan());
        assert_approx(ma.long_ma[3], 2.5, DEFAULT_EPSILON);
        assert_approx(ma.long_ma[5], 4.5, DEFAULT_EPSILON);
    }

    #[test]
    fn short_not_below_long_rejected() {
        let series = make_series(&[1.0, 2.0, 3.0]);
        assert!(matches!(
            compute_dual_ma(&series, 5, 5),
            Err(CoreError::InvalidParameter(_))
        ));
        assert!(matches!(
            compute_dual_ma(&series, 10, 5),
            Err(CoreError::InvalidParameter(_))
        ));
        assert!(compute_dual_ma(&series, 0, 5).is_err());
    }
}
