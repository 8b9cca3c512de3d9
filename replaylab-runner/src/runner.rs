//! Backtest runner: wires config, provider, strategy and engine together.
//!
//! Two entry points:
//! - `run_single_backtest()`: builds the configured provider, then runs. Used by the CLI.
//! - `run_with_provider()`: takes an already-built provider. Used by sweeps and tests.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use replaylab_core::data::{DataError, MarketDataFeed, MarketDataStore, TickProvider};
use replaylab_core::engine::{BacktestEngine, EngineError, OrderManager, RunReport, RunSummary};

use crate::config::{BacktestConfig, ConfigError, RunId};
use crate::data_loader::load_provider;

/// Errors from the runner.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("data error: {0}")]
    Data(#[from] DataError),
    #[error("engine error: {0}")]
    Engine(#[from] EngineError),
}

/// Current schema version for persisted artifacts.
pub const SCHEMA_VERSION: u32 = 1;

/// Complete result of a single backtest run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestResult {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub run_id: RunId,
    pub config: BacktestConfig,
    pub summary: RunSummary,
    pub report: RunReport,
}

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

/// Run a single backtest from a validated config, using its `[data]` provider.
pub fn run_single_backtest(config: &BacktestConfig) -> Result<BacktestResult, RunError> {
    config.validate()?;
    let provider = load_provider(&config.data);
    run_with_provider(config, provider.as_ref())
}

/// Run a backtest against `provider`, ignoring the config's `[data]` section.
///
/// Every call owns its own feed, store, order manager and positions, so calls on
/// different threads never share engine state.
pub fn run_with_provider(
    config: &BacktestConfig,
    provider: &dyn TickProvider,
) -> Result<BacktestResult, RunError> {
    let run_id = config.run_id()?;
    let section = &config.backtest;
    info!(
        run_id = %run_id,
        symbol = %section.symbol,
        strategy = config.strategy.name(),
        start = %section.start_date,
        end = %section.end_date,
        "starting run"
    );

    let feed = MarketDataFeed::open(provider, &section.symbol, section.start_date, section.end_date)?;
    let mut engine = BacktestEngine::new(
        feed,
        MarketDataStore::new(),
        config.strategy.build(&section.symbol),
        OrderManager::new(),
    );
    let report = engine.run()?;

    Ok(BacktestResult {
        schema_version: SCHEMA_VERSION,
        run_id,
        config: config.clone(),
        summary: report.summary(),
        report,
    })
}
