//! StockLab CLI: backtest, growth comparison, and data commands.
//!
//! Commands:
//! - `run`: execute a backtest from a TOML config file and/or flags
//! - `compare`: style growth comparison over one price series
//! - `matrix`: every strategy × style combination, in parallel
//! - `fetch`: download a ticker from Yahoo Finance into a CSV file
//! - `styles`: print the style parameter table

mod obs;

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use stocklab_core::{compare_growth, PriceSeries, Style, StrategyKind};
use stocklab_runner::export::{export_growth_csv, export_matrix_csv, save_artifacts};
use stocklab_runner::{
    filter_range, load_price_series, run_matrix, run_single_backtest, write_csv, BacktestConfig,
    BacktestResult, LoadOptions, MatrixEntry, PriceProvider, PriceSource,
    YahooProvider,
};

#[derive(Parser)]
#[command(
    name = "stocklab",
    version,
    about = "StockLab CLI: indicator strategy backtesting"
)]
struct Cli {
    /// Log level or filter directive; STOCKLAB_LOG takes precedence.
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Log output format: text or json.
    #[arg(long, global = true, default_value = "text")]
    log_format: String,

    #[command(subcommand)]
    command: Commands,
}

/// Where prices come from, plus an optional date range.
#[derive(Args, Clone, Default)]
struct SourceArgs {
    /// CSV file with Date, Open, High, Low, Close[, Adj Close] columns.
    #[arg(long, conflicts_with = "ticker")]
    csv: Option<PathBuf>,

    /// Ticker to download from Yahoo Finance.
    #[arg(long)]
    ticker: Option<String>,

    /// Start date (YYYY-MM-DD), inclusive.
    #[arg(long)]
    start: Option<NaiveDate>,

    /// End date (YYYY-MM-DD), inclusive.
    #[arg(long)]
    end: Option<NaiveDate>,
}

impl SourceArgs {
    fn source(&self) -> Option<PriceSource> {
        match (&self.csv, &self.ticker) {
            (Some(path), _) => Some(PriceSource::Csv(path.clone())),
            (None, Some(t)) => Some(PriceSource::Ticker(t.clone())),
            (None, None) => None,
        }
    }

    fn load(&self) -> Result<PriceSeries> {
        let Some(source) = self.source() else {
            bail!("one of --csv or --ticker is required");
        };
        let provider = provider_for(&source)?;
        let opts = LoadOptions {
            start: self.start,
            end: self.end,
        };
        Ok(load_price_series(&source, provider_ref(&provider), &opts)?)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a backtest from a TOML config file and/or flags.
    Run {
        /// Path to a TOML config file. Flags override its values.
        #[arg(long)]
        config: Option<PathBuf>,

        #[command(flatten)]
        source: SourceArgs,

        /// Strategy: volatility-band or crossover-ma.
        #[arg(long)]
        strategy: Option<StrategyKind>,

        /// Style: aggressive, moderate, or passive.
        #[arg(long)]
        style: Option<String>,

        /// Initial capital.
        #[arg(long)]
        capital: Option<f64>,

        /// Output directory for run artifacts.
        #[arg(long, default_value = "results")]
        output_dir: PathBuf,

        /// Print the summary only; write no artifacts.
        #[arg(long, default_value_t = false)]
        no_save: bool,

        /// Print the full result as JSON instead of the summary.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Compare scaled buy-and-hold growth across styles.
    Compare {
        #[command(flatten)]
        source: SourceArgs,

        /// Initial capital.
        #[arg(long, default_value_t = 10_000.0)]
        capital: f64,

        /// Styles to compare. Defaults to all.
        #[arg(long, value_delimiter = ',')]
        styles: Vec<String>,

        /// Write the bar-by-bar comparison to this CSV file.
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Run every strategy × style combination over one series.
    Matrix {
        #[command(flatten)]
        source: SourceArgs,

        /// Initial capital.
        #[arg(long, default_value_t = 10_000.0)]
        capital: f64,

        /// Write the matrix metrics to this CSV file.
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Download daily bars for a ticker into a CSV file.
    Fetch {
        /// Ticker symbol (e.g., AAPL, RELIANCE.NS).
        ticker: String,

        /// Start date (YYYY-MM-DD), inclusive.
        #[arg(long)]
        start: Option<NaiveDate>,

        /// End date (YYYY-MM-DD), inclusive.
        #[arg(long)]
        end: Option<NaiveDate>,

        /// Output file. Defaults to ./data/<TICKER>.csv.
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Print the style parameter table.
    Styles,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    obs::init_tracing(&cli.log_level, &cli.log_format)?;

    match cli.command {
        Commands::Run {
            config,
            source,
            strategy,
            style,
            capital,
            output_dir,
            no_save,
            json,
        } => run_backtest_cmd(RunArgs {
            config,
            source,
            strategy,
            style,
            capital,
            output_dir,
            no_save,
            json,
        }),
        Commands::Compare {
            source,
            capital,
            styles,
            output,
        } => run_compare(&source, capital, styles, output),
        Commands::Matrix {
            source,
            capital,
            output,
        } => run_matrix_cmd(&source, capital, output),
        Commands::Fetch {
            ticker,
            start,
            end,
            output,
        } => run_fetch(&ticker, start, end, output),
        Commands::Styles => {
            print_styles();
            Ok(())
        }
    }
}

struct RunArgs {
    config: Option<PathBuf>,
    source: SourceArgs,
    strategy: Option<StrategyKind>,
    style: Option<String>,
    capital: Option<f64>,
    output_dir: PathBuf,
    no_save: bool,
    json: bool,
}

fn run_backtest_cmd(args: RunArgs) -> Result<()> {
    let config = build_config(&args)?;
    config.validate()?;

    let source = config.price_source()?;
    let provider = provider_for(&source)?;
    let result = run_single_backtest(&config, provider_ref(&provider))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_summary(&result);
    }

    if !args.no_save {
        let run_dir = save_artifacts(&result, &args.output_dir)?;
        println!("Artifacts saved to: {}", run_dir.display());
    }
    Ok(())
}

/// Config file (or defaults), then command-line overrides.
fn build_config(args: &RunArgs) -> Result<BacktestConfig> {
    let mut config = match (&args.config, args.source.source()) {
        (Some(path), _) => BacktestConfig::from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        (None, Some(source)) => BacktestConfig::for_source(&source),
        (None, None) => bail!("one of --config, --csv, or --ticker is required"),
    };

    if let Some(source) = args.source.source() {
        config.data.csv = None;
        config.data.ticker = None;
        match source {
            PriceSource::Csv(path) => config.data.csv = Some(path),
            PriceSource::Ticker(t) => config.data.ticker = Some(t),
        }
    }
    if let Some(kind) = args.strategy {
        config.backtest.strategy = kind.as_str().to_string();
    }
    if let Some(style) = &args.style {
        config.backtest.style = style.clone();
    }
    if let Some(capital) = args.capital {
        config.backtest.initial_capital = capital;
    }
    if args.source.start.is_some() {
        config.backtest.start_date = args.source.start;
    }
    if args.source.end.is_some() {
        config.backtest.end_date = args.source.end;
    }
    tracing::debug!(
        strategy = %config.backtest.strategy,
        style = %config.backtest.style,
        capital = config.backtest.initial_capital,
        "config resolved"
    );
    Ok(config)
}

fn run_compare(
    source: &SourceArgs,
    capital: f64,
    styles: Vec<String>,
    output: Option<PathBuf>,
) -> Result<()> {
    let series = source.load()?;
    let styles = if styles.is_empty() {
        Style::ALL.iter().map(|s| s.name().to_string()).collect()
    } else {
        styles
    };
    let growth = compare_growth(&series, capital, &styles)?;

    println!();
    println!("=== Growth Comparison: {} ===", series.symbol());
    if let (Some(first), Some(last)) = (series.first(), series.last()) {
        println!("Period:  {} to {} ({} bars)", first.date, last.date, series.len());
    }
    println!("Capital: {capital:.2}");
    println!();
    println!("{:<12} {:>10} {:>16} {:>10}", "Style", "Multiplier", "Final", "ROI %");
    println!("{}", "-".repeat(51));
    for g in &growth {
        println!(
            "{:<12} {:>10.2} {:>16.2} {:>10.2}",
            g.style.name(),
            g.growth_multiplier,
            g.growth,
            g.roi_percent
        );
    }

    if let Some(path) = output {
        write_output(&path, &export_growth_csv(&growth)?)?;
        println!("Comparison written to: {}", path.display());
    }
    Ok(())
}

fn run_matrix_cmd(source: &SourceArgs, capital: f64, output: Option<PathBuf>) -> Result<()> {
    let series = source.load()?;
    let entries = run_matrix(&series, capital, &StrategyKind::ALL, &Style::ALL)?;
    print_matrix(series.symbol(), &entries);

    if let Some(path) = output {
        write_output(&path, &export_matrix_csv(&entries)?)?;
        println!("Matrix written to: {}", path.display());
    }
    Ok(())
}

fn run_fetch(
    ticker: &str,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    output: Option<PathBuf>,
) -> Result<()> {
    let opts = LoadOptions { start, end };
    opts.validate()?;
    let provider = YahooProvider::new()?;
    let bars = provider.fetch(ticker, opts.fetch_range())?;
    let series = filter_range(&PriceSeries::new(ticker, bars)?, start, end)?;

    let path = output.unwrap_or_else(|| PathBuf::from("data").join(format!("{ticker}.csv")));
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let file = std::fs::File::create(&path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    write_csv(&series, file)?;

    println!(
        "Fetched {} bars for {ticker} into {}",
        series.len(),
        path.display()
    );
    Ok(())
}

fn provider_for(source: &PriceSource) -> Result<Option<YahooProvider>> {
    match source {
        PriceSource::Ticker(_) => Ok(Some(YahooProvider::new()?)),
        PriceSource::Csv(_) => Ok(None),
    }
}

fn provider_ref(provider: &Option<YahooProvider>) -> Option<&dyn PriceProvider> {
    provider.as_ref().map(|p| p as &dyn PriceProvider)
}

fn write_output(path: &std::path::Path, contents: &str) -> Result<()> {
    std::fs::write(path, contents).with_context(|| format!("failed to write {}", path.display()))
}

fn print_styles() {
    println!(
        "{:<12} {:>11} {:>10} {:>9} {:>8} {:>11}",
        "Style", "Band Window", "Band K", "Short MA", "Long MA", "Growth Mult"
    );
    println!("{}", "-".repeat(66));
    for style in Style::ALL {
        let p = style.parameters();
        println!(
            "{:<12} {:>11} {:>10.2} {:>9} {:>8} {:>11.2}",
            style.name(),
            p.band_window,
            p.band_std_multiplier,
            p.short_ma_window,
            p.long_ma_window,
            p.growth_multiplier
        );
    }
}

fn print_matrix(symbol: &str, entries: &[MatrixEntry]) {
    println!();
    println!("=== Strategy Matrix: {symbol} ===");
    println!(
        "{:<16} {:<12} {:>14} {:>9} {:>8} {:>9} {:>9}",
        "Strategy", "Style", "Final", "ROI %", "Sharpe", "Max DD %", "Exposure"
    );
    println!("{}", "-".repeat(83));
    for e in entries {
        println!(
            "{:<16} {:<12} {:>14.2} {:>9.2} {:>8.3} {:>9.2} {:>8.1}%",
            e.kind.as_str(),
            e.style.name(),
            e.metrics.final_capital,
            e.metrics.roi_percent,
            e.metrics.sharpe,
            e.metrics.max_drawdown * 100.0,
            e.metrics.exposure * 100.0
        );
    }
    println!();
}

fn print_summary(result: &BacktestResult) {
    let currency = result.currency.as_deref().unwrap_or("");
    println!();
    println!("=== Backtest Result ===");
    println!("Symbol:         {}", result.symbol);
    println!("Strategy:       {}", result.strategy.kind());
    println!("Style:          {}", result.style);
    println!("Period:         {} to {}", result.start_date, result.end_date);
    println!(
        "Bars:           {} ({} warmup)",
        result.bar_count, result.warmup_bars
    );
    println!(
        "Signals:        {} buy / {} sell",
        result.metrics.buy_signals, result.metrics.sell_signals
    );
    println!();
    println!("--- Performance ---");
    println!(
        "Initial:        {:.2} {currency}",
        result.initial_capital
    );
    println!(
        "Final:          {:.2} {currency}",
        result.metrics.final_capital
    );
    println!("ROI:            {:.2}%", result.metrics.roi_percent);
    println!("CAGR:           {:.2}%", result.metrics.cagr * 100.0);
    println!("Sharpe:         {:.3}", result.metrics.sharpe);
    println!("Sortino:        {:.3}", result.metrics.sortino);
    println!(
        "Max Drawdown:   {:.2}%",
        result.metrics.max_drawdown * 100.0
    );
    println!("Exposure:       {:.1}%", result.metrics.exposure * 100.0);

    if !result.growth.is_empty() {
        println!();
        println!("--- Style Growth (buy and hold) ---");
        for g in &result.growth {
            println!(
                "{:<12} {:>14.2} {currency} ({:+.2}%)",
                g.style.name(),
                g.growth,
                g.roi_percent
            );
        }
    }
    if result.style_fell_back {
        println!();
        println!("WARNING: unknown style, Moderate parameters were used");
    }
    println!();
}
