//! ReplayLab Runner: backtest orchestration on top of `replaylab-core`.
//!
//! This crate provides:
//! - TOML configuration with validation and content-addressed run ids
//! - Provider selection (CSV files or synthetic data)
//! - Single-backtest runner
//! - Parallel parameter sweeps
//! - JSON/CSV artifact export

pub mod config;
pub mod data_loader;
pub mod export;
pub mod runner;
pub mod sweep;

pub use config::{BacktestConfig, BacktestSection, ConfigError, DataConfig, RunId};
pub use data_loader::load_provider;
pub use export::{load_artifacts, save_artifacts};
pub use runner::{run_single_backtest, run_with_provider, BacktestResult, RunError};
pub use sweep::{run_sweep, run_sweep_with_provider, SweepGrid, SweepOutcome};
