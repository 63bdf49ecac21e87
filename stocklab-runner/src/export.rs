//! Reporting and export: JSON, CSV, and Markdown artifact generation.
//!
//! Provides three export formats for backtest results:
//! - **JSON**: the full result with schema versioning
//! - **CSV**: capital trajectory, indicator/signal overlay, growth comparison
//! - **Markdown**: human-readable single-run report
//!
//! Undefined numeric values (NaN) are written as empty CSV cells.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use stocklab_core::{GrowthTrajectory, IndicatorFrame, SignalSeries, SimulationResult};

use crate::runner::{BacktestResult, MatrixEntry};

// ─── JSON export ────────────────────────────────────────────────────

/// Serialize a `BacktestResult` to pretty JSON.
pub fn export_json(result: &BacktestResult) -> Result<String> {
    serde_json::to_string_pretty(result).context("failed to serialize BacktestResult to JSON")
}

// ─── CSV export ─────────────────────────────────────────────────────

/// Capital trajectory with the lagged position and strategy return per bar.
///
/// Columns: date, capital, position, strategy_return
pub fn export_trajectory_csv(simulation: &SimulationResult) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["date", "capital", "position", "strategy_return"])?;
    for ((point, position), ret) in simulation
        .trajectory()
        .iter()
        .zip(simulation.positions())
        .zip(simulation.strategy_returns())
    {
        wtr.write_record([
            point.date.to_string(),
            format!("{:.2}", point.capital),
            position.to_string(),
            fmt_value(*ret),
        ])?;
    }
    finish(wtr)
}

/// Price, every indicator column, and the signal per bar.
///
/// Columns: date, price, <indicator columns>, signal
pub fn export_overlay_csv(frame: &IndicatorFrame, signals: &SignalSeries) -> Result<String> {
    let columns = frame.columns();
    let values = signals.values();

    let mut wtr = csv::Writer::from_writer(vec![]);
    let mut header = vec!["date", "price"];
    header.extend(columns.iter().map(|(name, _)| *name));
    header.push("signal");
    wtr.write_record(&header)?;

    for (i, date) in frame.dates().iter().enumerate() {
        let mut record = Vec::with_capacity(header.len());
        record.push(date.to_string());
        record.push(fmt_value(frame.price()[i]));
        record.extend(columns.iter().map(|(_, col)| fmt_value(col[i])));
        record.push(values.get(i).map(|v| v.to_string()).unwrap_or_default());
        wtr.write_record(&record)?;
    }
    finish(wtr)
}

/// One row per date, one column per style.
pub fn export_growth_csv(growth: &[GrowthTrajectory]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    let mut header = vec!["date".to_string()];
    header.extend(growth.iter().map(|g| g.style.name().to_string()));
    wtr.write_record(&header)?;

    if let Some(first) = growth.first() {
        for (i, point) in first.trend.iter().enumerate() {
            let mut record = vec![point.date.to_string()];
            record.extend(growth.iter().map(|g| format!("{:.2}", g.trend[i].capital)));
            wtr.write_record(&record)?;
        }
    }
    finish(wtr)
}

/// One row per matrix cell.
pub fn export_matrix_csv(entries: &[MatrixEntry]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "strategy",
        "style",
        "final_capital",
        "roi_percent",
        "cagr",
        "sharpe",
        "max_drawdown",
        "buy_signals",
        "sell_signals",
        "exposure",
    ])?;
    for e in entries {
        let m = &e.metrics;
        wtr.write_record([
            e.kind.as_str().to_string(),
            e.style.name().to_string(),
            format!("{:.2}", m.final_capital),
            format!("{:.4}", m.roi_percent),
            format!("{:.6}", m.cagr),
            format!("{:.4}", m.sharpe),
            format!("{:.6}", m.max_drawdown),
            m.buy_signals.to_string(),
            m.sell_signals.to_string(),
            format!("{:.4}", m.exposure),
        ])?;
    }
    finish(wtr)
}

fn finish(wtr: csv::Writer<Vec<u8>>) -> Result<String> {
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

fn fmt_value(v: f64) -> String {
    if v.is_finite() {
        format!("{v:.6}")
    } else {
        String::new()
    }
}

// ─── Artifact bundle ────────────────────────────────────────────────

/// Save the full artifact set for a single backtest run.
///
/// Creates a directory named `{symbol}_{strategy}_{timestamp}/` under
/// `output_dir` containing:
/// - `manifest.json`: the full `BacktestResult`
/// - `trajectory.csv`: bar-by-bar capital
/// - `signals.csv`: price, indicators, and signals
/// - `growth.csv`: style growth comparison (when present)
/// - `report.md`: Markdown summary
///
/// Returns the path to the created directory.
pub fn save_artifacts(result: &BacktestResult, output_dir: &Path) -> Result<PathBuf> {
    let dirname = format!(
        "{}_{}_{}",
        result.symbol,
        result.strategy.kind().as_str(),
        chrono::Local::now().format("%Y%m%d_%H%M%S")
    );
    let run_dir = output_dir.join(dirname);
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("failed to create artifact dir: {}", run_dir.display()))?;

    write(&run_dir.join("manifest.json"), &export_json(result)?)?;
    write(
        &run_dir.join("trajectory.csv"),
        &export_trajectory_csv(&result.simulation)?,
    )?;
    write(
        &run_dir.join("signals.csv"),
        &export_overlay_csv(&result.frame, &result.signals)?,
    )?;
    if !result.growth.is_empty() {
        write(&run_dir.join("growth.csv"), &export_growth_csv(&result.growth)?)?;
    }
    write(&run_dir.join("report.md"), &generate_report(result))?;

    tracing::info!(dir = %run_dir.display(), "artifacts saved");
    Ok(run_dir)
}

fn write(path: &Path, contents: &str) -> Result<()> {
    std::fs::write(path, contents).with_context(|| format!("failed to write {}", path.display()))
}

// ─── Markdown report ────────────────────────────────────────────────

/// Generate a Markdown report for a single backtest run.
pub fn generate_report(result: &BacktestResult) -> String {
    let currency = result.currency.as_deref().unwrap_or("");
    let mut md = String::with_capacity(2048);

    md.push_str("# Backtest Report\n\n");

    md.push_str("## Metadata\n\n");
    md.push_str("| Field | Value |\n");
    md.push_str("| --- | --- |\n");
    md.push_str(&format!("| Symbol | {} |\n", result.symbol));
    md.push_str(&format!(
        "| Period | {} to {} |\n",
        result.start_date, result.end_date
    ));
    md.push_str(&format!("| Strategy | {} |\n", describe_strategy(result)));
    md.push_str(&format!("| Style | {} |\n", result.style));
    if result.style_fell_back {
        md.push_str("| Style Note | unknown style requested, Moderate used |\n");
    }
    md.push_str(&format!(
        "| Initial Capital | {:.2} {currency} |\n",
        result.initial_capital
    ));
    md.push_str(&format!(
        "| Bars | {} ({} warmup) |\n",
        result.bar_count, result.warmup_bars
    ));
    md.push_str(&format!("| Dataset Hash | {} |\n", result.dataset_hash));
    if let Some(id) = &result.run_id {
        md.push_str(&format!("| Run ID | {id} |\n"));
    }
    md.push('\n');

    let m = &result.metrics;
    md.push_str("## Performance\n\n");
    md.push_str("| Metric | Value |\n");
    md.push_str("| --- | --- |\n");
    md.push_str(&format!(
        "| Final Capital | {:.2} {currency} |\n",
        m.final_capital
    ));
    md.push_str(&format!("| ROI | {:.2}% |\n", m.roi_percent));
    md.push_str(&format!("| CAGR | {:.2}% |\n", m.cagr * 100.0));
    md.push_str(&format!("| Sharpe | {:.2} |\n", m.sharpe));
    md.push_str(&format!("| Sortino | {:.2} |\n", m.sortino));
    md.push_str(&format!("| Max Drawdown | {:.2}% |\n", m.max_drawdown * 100.0));
    md.push_str(&format!(
        "| Signals | {} buy / {} sell |\n",
        m.buy_signals, m.sell_signals
    ));
    md.push_str(&format!("| Exposure | {:.1}% |\n", m.exposure * 100.0));
    md.push('\n');

    if !result.growth.is_empty() {
        md.push_str("## Style Growth\n\n");
        md.push_str("| Style | Multiplier | Growth | ROI |\n");
        md.push_str("| --- | --- | --- | --- |\n");
        for g in &result.growth {
            md.push_str(&format!(
                "| {} | {:.2}x | {:.2} | {:.2}% |\n",
                g.style, g.growth_multiplier, g.growth, g.roi_percent
            ));
        }
        md.push('\n');
    }

    md
}

fn describe_strategy(result: &BacktestResult) -> String {
    use stocklab_core::Strategy;
    match result.strategy {
        Strategy::VolatilityBand(b) => {
            format!("volatility band (window {}, k {})", b.window, b.std_multiplier)
        }
        Strategy::CrossoverMa(c) => format!(
            "MA crossover (short {}, long {})",
            c.short_window, c.long_window
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::{run_backtest, BacktestRequest};
    use chrono::NaiveDate;
    use stocklab_core::{Bar, PriceSeries, StrategyKind, Style};

    fn result() -> BacktestResult {
        let base = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let bars = (0..25)
            .map(|i| {
                let p = 50.0 + (i as f64 * 0.9).cos() * 3.0;
                Bar::new(base + chrono::Duration::days(i), p, p + 0.5, p - 0.5, p)
            })
            .collect();
        let series = PriceSeries::new("EXP", bars).unwrap();
        let request =
            BacktestRequest::from_style(StrategyKind::VolatilityBand, Style::Aggressive, 1_000.0);
        run_backtest(&series, &request).unwrap()
    }

    #[test]
    fn json_carries_schema_version_and_sections() {
        let json = export_json(&result()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["schema_version"], 1);
        assert_eq!(value["symbol"], "EXP");
        assert_eq!(value["strategy"]["type"], "volatility_band");
        assert_eq!(value["growth"].as_array().unwrap().len(), 3);
    }

    #[test]
    fn trajectory_csv_has_row_per_bar() {
        let r = result();
        let csv = export_trajectory_csv(&r.simulation).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "date,capital,position,strategy_return");
        assert_eq!(lines.len(), 26);
        assert!(lines[1].starts_with("2024-03-01,1000.00,0,"));
        assert!(lines[1].ends_with(','));
    }

    #[test]
    fn overlay_csv_lists_band_columns_and_blanks_warmup() {
        let r = result();
        let csv = export_overlay_csv(&r.frame, &r.signals).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "date,price,sma,std,upper,lower,signal");
        // window 10: the first row has no indicator values
        assert!(lines[1].ends_with(",,,,,0"), "{}", lines[1]);
    }

    #[test]
    fn growth_csv_has_column_per_style() {
        let r = result();
        let csv = export_growth_csv(&r.growth).unwrap();
        let header = csv.lines().next().unwrap();
        assert_eq!(header, "date,Aggressive,Moderate,Passive");
        assert_eq!(csv.lines().count(), 26);
    }

    #[test]
    fn report_mentions_key_figures() {
        let md = generate_report(&result());
        assert!(md.contains("# Backtest Report"));
        assert!(md.contains("| Symbol | EXP |"));
        assert!(md.contains("volatility band (window 10, k 1.5)"));
        assert!(md.contains("## Style Growth"));
    }

    #[test]
    fn save_artifacts_writes_bundle() {
        let dir = tempfile::tempdir().unwrap();
        let run_dir = save_artifacts(&result(), dir.path()).unwrap();
        for name in ["manifest.json", "trajectory.csv", "signals.csv", "growth.csv", "report.md"] {
            assert!(run_dir.join(name).exists(), "missing {name}");
        }
    }
}
