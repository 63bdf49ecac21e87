//! Indicator → signal → simulation, chained for one strategy.

use serde::Serialize;

use crate::domain::PriceSeries;
use crate::error::CoreError;
use crate::indicators::IndicatorFrame;
use crate::signal::{generate_signal, SignalSeries, Strategy};
use crate::simulate::{simulate, SimulationResult};

/// Every intermediate product of one strategy run.
#[derive(Debug, Clone, Serialize)]
pub struct StrategyRun {
    pub strategy: Strategy,
    pub frame: IndicatorFrame,
    pub signals: SignalSeries,
    pub simulation: SimulationResult,
}

/// Run the full pipeline for `strategy` over `series`.
pub fn run_strategy(
    series: &PriceSeries,
    strategy: &Strategy,
    initial_capital: f64,
) -> Result<StrategyRun, CoreError> {
    let frame = strategy.compute_indicators(series)?;
    let signals = generate_signal(strategy, &frame)?;
    let simulation = simulate(series, &signals, initial_capital)?;
    Ok(StrategyRun {
        strategy: *strategy,
        frame,
        signals,
        simulation,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::make_series;
    use crate::signal::CrossoverMa;

    #[test]
    fn pipeline_products_are_aligned() {
        let prices: Vec<f64> = (0..40).map(|i| 100.0 + (i as f64 * 0.7).sin() * 5.0).collect();
        let series = make_series(&prices);
        let strategy = Strategy::CrossoverMa(CrossoverMa {
            short_window: 3,
            long_window: 8,
        });
        let run = run_strategy(&series, &strategy, 10_000.0).unwrap();
        assert_eq!(run.frame.len(), 40);
        assert_eq!(run.signals.len(), 40);
        assert_eq!(run.simulation.trajectory().len(), 40);
        assert_eq!(run.simulation.trajectory()[0].capital, 10_000.0);
    }

    #[test]
    fn pipeline_surfaces_parameter_errors_first() {
        let series = make_series(&[1.0]);
        let strategy = Strategy::CrossoverMa(CrossoverMa {
            short_window: 8,
            long_window: 3,
        });
        assert!(matches!(
            run_strategy(&series, &strategy, 100.0),
            Err(CoreError::InvalidParameter(_))
        ));
    }
}
