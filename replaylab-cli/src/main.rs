//! ReplayLab CLI: run and sweep commands.
//!
//! Commands:
//! - `run`: replay one symbol from a TOML config file or from flags
//! - `sweep`: run a mean-reversion parameter grid from a TOML config file

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

use replaylab_core::strategy::{MeanRevertingParams, StrategyKind};
use replaylab_runner::export::export_sweep_csv;
use replaylab_runner::{
    run_single_backtest, run_sweep, save_artifacts, BacktestConfig, BacktestResult,
    BacktestSection, DataConfig, SweepGrid, SweepOutcome,
};

#[derive(Parser)]
#[command(name = "replaylab", about = "ReplayLab: event-driven tick replay backtester")]
struct Cli {
    /// Log at debug level (per-tick position status). `RUST_LOG` overrides.
    #[arg(short, long, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay one symbol through a strategy.
    Run {
        /// Path to a TOML config file. Excludes the data and strategy flags.
        #[arg(
            long,
            conflicts_with_all = [
                "symbol", "start", "end", "csv", "seed", "lookback",
                "buy_threshold", "sell_threshold", "qty", "buy_and_hold",
            ]
        )]
        config: Option<PathBuf>,

        /// Symbol to replay (required without --config).
        #[arg(long)]
        symbol: Option<String>,

        /// Start date (YYYY-MM-DD). Defaults to 2014-01-01.
        #[arg(long)]
        start: Option<String>,

        /// End date (YYYY-MM-DD). Defaults to 2014-12-31.
        #[arg(long)]
        end: Option<String>,

        /// CSV file or directory of `<SYMBOL>.csv` files. Synthetic data if omitted.
        #[arg(long)]
        csv: Option<PathBuf>,

        /// Seed for synthetic data.
        #[arg(long, default_value_t = 0)]
        seed: u64,

        /// Number of closes in the rolling window.
        #[arg(long, default_value_t = 20)]
        lookback: usize,

        /// Buy when the z-score falls below this.
        #[arg(long, default_value_t = -1.5, allow_hyphen_values = true)]
        buy_threshold: f64,

        /// Sell when the z-score rises above this.
        #[arg(long, default_value_t = 1.5, allow_hyphen_values = true)]
        sell_threshold: f64,

        /// Shares per order.
        #[arg(long, default_value_t = 100)]
        qty: u64,

        /// Buy once and hold instead of trading mean reversion.
        #[arg(long, default_value_t = false)]
        buy_and_hold: bool,

        /// Output directory for artifacts.
        #[arg(long, default_value = "results")]
        output_dir: PathBuf,

        /// Print the run summary as JSON.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Run a lookback × threshold grid in parallel.
    Sweep {
        /// Path to a TOML config file (the grid overrides its strategy).
        #[arg(long)]
        config: PathBuf,

        /// Comma-separated lookbacks.
        #[arg(long, value_delimiter = ',', default_values_t = [10, 20, 30])]
        lookbacks: Vec<usize>,

        /// Comma-separated buy thresholds.
        #[arg(long, value_delimiter = ',', allow_hyphen_values = true, default_values_t = [-1.0, -1.5, -2.0])]
        buy_thresholds: Vec<f64>,

        /// Comma-separated sell thresholds.
        #[arg(long, value_delimiter = ',', allow_hyphen_values = true, default_values_t = [1.0, 1.5, 2.0])]
        sell_thresholds: Vec<f64>,

        /// Write `sweep.csv` here.
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Run {
            config,
            symbol,
            start,
            end,
            csv,
            seed,
            lookback,
            buy_threshold,
            sell_threshold,
            qty,
            buy_and_hold,
            output_dir,
            json,
        } => {
            let config = match config {
                Some(path) => BacktestConfig::from_file(&path)
                    .with_context(|| format!("loading {}", path.display()))?,
                None => {
                    let Some(symbol) = symbol else {
                        bail!("one of --config or --symbol is required");
                    };
                    let strategy = if buy_and_hold {
                        StrategyKind::BuyAndHold { order_quantity: qty }
                    } else {
                        StrategyKind::MeanReverting(MeanRevertingParams {
                            lookback_intervals: lookback,
                            buy_threshold,
                            sell_threshold,
                            order_quantity: qty,
                        })
                    };
                    let data = match csv {
                        Some(path) => DataConfig::Csv { path },
                        None => DataConfig::Synthetic { seed },
                    };
                    let config = BacktestConfig {
                        backtest: BacktestSection {
                            symbol,
                            start_date: parse_date(start.as_deref(), "2014-01-01")?,
                            end_date: parse_date(end.as_deref(), "2014-12-31")?,
                        },
                        data,
                        strategy,
                    };
                    config.validate()?;
                    config
                }
            };
            run_backtest_cmd(&config, &output_dir, json)
        }
        Commands::Sweep {
            config,
            lookbacks,
            buy_thresholds,
            sell_thresholds,
            output_dir,
        } => {
            let base = BacktestConfig::from_file(&config)
                .with_context(|| format!("loading {}", config.display()))?;
            let grid = SweepGrid {
                lookbacks,
                buy_thresholds,
                sell_thresholds,
            };
            run_sweep_cmd(&base, &grid, output_dir)
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();
}

fn parse_date(raw: Option<&str>, default: &str) -> Result<NaiveDate> {
    let raw = raw.unwrap_or(default);
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").with_context(|| format!("invalid date '{raw}'"))
}

fn run_backtest_cmd(config: &BacktestConfig, output_dir: &std::path::Path, json: bool) -> Result<()> {
    let result = run_single_backtest(config)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&result.summary)?);
    } else {
        print_summary(&result);
    }

    let run_dir = save_artifacts(&result, output_dir)?;
    info!(dir = %run_dir.display(), "artifacts saved");
    Ok(())
}

fn run_sweep_cmd(base: &BacktestConfig, grid: &SweepGrid, output_dir: Option<PathBuf>) -> Result<()> {
    if grid.size() == 0 {
        bail!("sweep grid is empty");
    }
    let outcomes = run_sweep(base, grid);
    print_sweep(&outcomes);

    if let Some(dir) = output_dir {
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create {}", dir.display()))?;
        let path = dir.join("sweep.csv");
        std::fs::write(&path, export_sweep_csv(&outcomes)?)?;
        info!(path = %path.display(), "sweep table saved");
    }

    if outcomes.iter().all(|o| !o.is_ok()) {
        bail!("every sweep point failed");
    }
    Ok(())
}

fn print_summary(result: &BacktestResult) {
    let section = &result.config.backtest;
    let summary = &result.summary;
    println!();
    println!("=== Backtest Result ===");
    println!("Run:            {}", &result.run_id[..16]);
    println!("Symbol:         {}", section.symbol);
    println!("Period:         {} to {}", section.start_date, section.end_date);
    println!("Strategy:       {}", result.config.strategy.name());
    println!("Ticks:          {}", summary.ticks_processed);
    println!("Fills:          {}", summary.fill_count);
    println!("Unfilled:       {}", result.report.orders_unfilled);
    println!();
    println!("--- PnL ---");
    println!("Realized:       {:.2}", summary.total_realized_pnl);
    println!("Unrealized:     {:.2}", summary.total_unrealized_pnl);
    println!("Total:          {:.2}", summary.total_pnl());
    for position in &result.report.positions {
        println!(
            "Position:       {} net={} rpnl={:.2} upnl={:.2}",
            position.symbol(),
            position.net_quantity(),
            position.realized_pnl(),
            position.unrealized_pnl()
        );
    }
    if matches!(result.config.data, DataConfig::Synthetic { .. }) {
        println!();
        println!("WARNING: Results based on SYNTHETIC data");
    }
}

fn print_sweep(outcomes: &[SweepOutcome]) {
    println!();
    println!(
        "{:>4}  {:>8}  {:>6}  {:>6}  {:>6}  {:>12}",
        "rank", "lookback", "buy", "sell", "fills", "total_pnl"
    );
    for (i, outcome) in outcomes.iter().enumerate() {
        let (lookback, buy, sell) = match &outcome.config.strategy {
            StrategyKind::MeanReverting(p) => (p.lookback_intervals, p.buy_threshold, p.sell_threshold),
            StrategyKind::BuyAndHold { .. } => (0, 0.0, 0.0),
        };
        match (&outcome.summary, &outcome.error) {
            (Some(s), _) => println!(
                "{:>4}  {:>8}  {:>6.2}  {:>6.2}  {:>6}  {:>12.2}",
                i + 1,
                lookback,
                buy,
                sell,
                s.fill_count,
                s.total_pnl()
            ),
            (None, err) => println!(
                "{:>4}  {:>8}  {:>6.2}  {:>6.2}  error: {}",
                i + 1,
                lookback,
                buy,
                sell,
                err.as_deref().unwrap_or("unknown")
            ),
        }
    }
}
