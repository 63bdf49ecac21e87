//! Look-ahead contamination tests.
//!
//! No indicator value, signal, or capital value at bar t may depend on price
//! data from bar t+1 or later.
//!
//! Method: run on a truncated series (bars 0..100) and the full series
//! (bars 0..200). Bars 0..100 must be identical between both runs.

use chrono::NaiveDate;
use stocklab_core::indicators::{Bollinger, Indicator, RollingStd, Sma};
use stocklab_core::signal::{CrossoverMa, VolatilityBand};
use stocklab_core::{compute_bands, compute_dual_ma, run_strategy, Bar, PriceSeries, Strategy};

/// N bars of a deterministic pseudo-random walk.
fn make_test_series(n: usize) -> PriceSeries {
    let base_date = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
    let mut bars = Vec::with_capacity(n);
    let mut price = 100.0;

    for i in 0..n {
        let seed = (i as u64).wrapping_mul(6364136223846793005).wrapping_add(1);
        let change = ((seed % 200) as f64 - 100.0) * 0.05;
        price += change;
        price = price.max(10.0);

        let open = price - 0.5;
        let close = price + 0.3;
        bars.push(
            Bar::new(
                base_date + chrono::Duration::days(i as i64),
                open,
                open.max(close) + 2.0,
                open.min(close) - 2.0,
                close,
            )
            .with_adj_close(close - 0.1),
        );
    }

    PriceSeries::new("TEST", bars).unwrap()
}

fn truncate(series: &PriceSeries, len: usize) -> PriceSeries {
    PriceSeries::new(series.symbol(), series.bars()[..len].to_vec()).unwrap()
}

fn assert_prefix_equal(label: &str, truncated: &[f64], full: &[f64]) {
    for (i, (&t, &f)) in truncated.iter().zip(full).enumerate() {
        if t.is_nan() && f.is_nan() {
            continue;
        }
        assert!(
            !t.is_nan() && !f.is_nan(),
            "{label}: NaN mismatch at bar {i} (truncated={t}, full={f})"
        );
        assert!(
            (t - f).abs() < 1e-10,
            "{label}: look-ahead contamination at bar {i}: truncated={t}, full={f}"
        );
    }
}

fn assert_no_lookahead(indicator: &dyn Indicator, full: &PriceSeries, truncated_len: usize) {
    let truncated = truncate(full, truncated_len);
    let full_result = indicator.compute(full);
    let truncated_result = indicator.compute(&truncated);

    assert_eq!(truncated_result.len(), truncated_len, "{}", indicator.name());
    assert_eq!(full_result.len(), full.len(), "{}", indicator.name());
    assert_prefix_equal(indicator.name(), &truncated_result, &full_result);
}

#[test]
fn lookahead_sma() {
    let series = make_test_series(200);
    assert_no_lookahead(&Sma::new(10).unwrap(), &series, 100);
    assert_no_lookahead(&Sma::new(50).unwrap(), &series, 100);
}

#[test]
fn lookahead_rolling_std() {
    let series = make_test_series(200);
    assert_no_lookahead(&RollingStd::new(10).unwrap(), &series, 100);
    assert_no_lookahead(&RollingStd::new(30).unwrap(), &series, 100);
}

#[test]
fn lookahead_bollinger() {
    let series = make_test_series(200);
    assert_no_lookahead(&Bollinger::upper(20, 2.0).unwrap(), &series, 100);
    assert_no_lookahead(&Bollinger::middle(20, 2.0).unwrap(), &series, 100);
    assert_no_lookahead(&Bollinger::lower(20, 2.0).unwrap(), &series, 100);
}

#[test]
fn lookahead_compute_bands() {
    let full = make_test_series(200);
    let truncated = truncate(&full, 100);
    let full_bands = compute_bands(&full, 20, 2.0).unwrap();
    let truncated_bands = compute_bands(&truncated, 20, 2.0).unwrap();

    assert_prefix_equal("bands sma", &truncated_bands.sma, &full_bands.sma);
    assert_prefix_equal("bands std", &truncated_bands.std, &full_bands.std);
    assert_prefix_equal("bands upper", &truncated_bands.upper, &full_bands.upper);
    assert_prefix_equal("bands lower", &truncated_bands.lower, &full_bands.lower);
}

#[test]
fn lookahead_compute_dual_ma() {
    let full = make_test_series(200);
    let truncated = truncate(&full, 100);
    let full_ma = compute_dual_ma(&full, 5, 20).unwrap();
    let truncated_ma = compute_dual_ma(&truncated, 5, 20).unwrap();

    assert_prefix_equal("short ma", &truncated_ma.short_ma, &full_ma.short_ma);
    assert_prefix_equal("long ma", &truncated_ma.long_ma, &full_ma.long_ma);
}

fn assert_run_has_no_lookahead(strategy: Strategy) {
    let full = make_test_series(200);
    let truncated = truncate(&full, 100);

    let full_run = run_strategy(&full, &strategy, 10_000.0).unwrap();
    let truncated_run = run_strategy(&truncated, &strategy, 10_000.0).unwrap();

    assert_eq!(
        truncated_run.signals.values(),
        full_run.signals.values()[..100].to_vec(),
        "{strategy:?}: signals differ"
    );
    assert_eq!(
        truncated_run.simulation.positions(),
        &full_run.simulation.positions()[..100]
    );
    assert_prefix_equal(
        "capital",
        &truncated_run.simulation.capital(),
        &full_run.simulation.capital()[..100],
    );
}

#[test]
fn lookahead_volatility_band_run() {
    assert_run_has_no_lookahead(Strategy::VolatilityBand(VolatilityBand {
        window: 10,
        std_multiplier: 1.5,
    }));
}

#[test]
fn lookahead_crossover_run() {
    assert_run_has_no_lookahead(Strategy::CrossoverMa(CrossoverMa {
        short_window: 5,
        long_window: 20,
    }));
}
