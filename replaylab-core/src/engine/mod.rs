//! Backtesting engine: single-pass tick loop and supporting infrastructure.
//!
//! Per tick, strictly in feed order:
//!
//! 1. Record the tick in the market data store
//! 2. Strategy `on_tick` (may submit orders)
//! 3. Match pending orders; each fill updates its position, then notifies the
//!    strategy (`on_fill`, then `on_position_update`)
//! 4. Mark every position to market and sample unrealized PnL

pub mod event_loop;
pub mod order_manager;
pub mod state;

pub use event_loop::BacktestEngine;
pub use order_manager::OrderManager;
pub use state::{FillEvent, PnlSample, PnlSeries, RunReport, RunState, RunSummary, StatusEvent};

use crate::data::{DataError, StoreError};
use crate::domain::PositionError;
use thiserror::Error;

/// Errors that end a run in the `Failed` state.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Data(#[from] DataError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Position(#[from] PositionError),

    #[error("engine already ran (state: {0:?})")]
    AlreadyRun(RunState),
}
