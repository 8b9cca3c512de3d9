//! Strategy callback protocol: consumes ticks, fills and position updates, emits
//! order requests.
//!
//! Strategies receive the market data store and the position book by shared
//! reference only, and reach the outside world only through the `OrderSink` the
//! engine hands to `on_tick`. Every callback runs to completion before the engine
//! moves on to the next pipeline step.

pub mod buy_and_hold;
pub mod mean_reverting;

pub use buy_and_hold::BuyAndHoldStrategy;
pub use mean_reverting::{z_score, MeanRevertingParams, MeanRevertingStrategy};

use crate::data::{MarketDataStore, StoreError};
use crate::domain::{Order, OrderSide, PositionBook};
use serde::{Deserialize, Serialize};

/// A request to place a market order, before the engine stamps and queues it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderRequest {
    pub symbol: String,
    pub quantity: u64,
    pub side: OrderSide,
}

/// Order-submission capability injected into `Strategy::on_tick`.
pub trait OrderSink {
    fn submit_order(&mut self, symbol: &str, quantity: u64, side: OrderSide);
}

/// Collects requests during one `on_tick` call.
#[derive(Debug, Default)]
pub struct OrderRequests {
    requests: Vec<OrderRequest>,
}

impl OrderRequests {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }

    pub fn len(&self) -> usize {
        self.requests.len()
    }

    pub fn as_slice(&self) -> &[OrderRequest] {
        &self.requests
    }

    pub fn drain(&mut self) -> impl Iterator<Item = OrderRequest> + '_ {
        self.requests.drain(..)
    }
}

impl OrderSink for OrderRequests {
    fn submit_order(&mut self, symbol: &str, quantity: u64, side: OrderSide) {
        if quantity == 0 {
            return;
        }
        self.requests.push(OrderRequest {
            symbol: symbol.to_string(),
            quantity,
            side,
        });
    }
}

/// Trait for trading strategies driven by the backtest engine.
pub trait Strategy: Send {
    /// Human-readable name (e.g., "mean_reverting").
    fn name(&self) -> &str;

    /// A new tick has been recorded in `store`. May submit any number of orders.
    fn on_tick(
        &mut self,
        store: &MarketDataStore,
        orders: &mut dyn OrderSink,
    ) -> Result<(), StoreError>;

    /// One of this strategy's orders has been filled.
    fn on_fill(&mut self, _order: &Order) {}

    /// Positions changed after a fill.
    fn on_position_update(&mut self, _positions: &PositionBook) {}
}

fn default_order_quantity() -> u64 {
    100
}

/// Serializable strategy selection, one variant per concrete strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StrategyKind {
    /// Z-score mean reversion over a rolling window of closes.
    MeanReverting(MeanRevertingParams),

    /// Buy once on the first tick and hold.
    BuyAndHold {
        #[serde(default = "default_order_quantity")]
        order_quantity: u64,
    },
}

impl Default for StrategyKind {
    fn default() -> Self {
        StrategyKind::MeanReverting(MeanRevertingParams::default())
    }
}

impl StrategyKind {
    pub fn name(&self) -> &'static str {
        match self {
            StrategyKind::MeanReverting(_) => "mean_reverting",
            StrategyKind::BuyAndHold { .. } => "buy_and_hold",
        }
    }

    pub fn order_quantity(&self) -> u64 {
        match self {
            StrategyKind::MeanReverting(p) => p.order_quantity,
            StrategyKind::BuyAndHold { order_quantity } => *order_quantity,
        }
    }

    /// Build the runtime strategy trading `symbol`.
    pub fn build(&self, symbol: &str) -> Box<dyn Strategy> {
        match self {
            StrategyKind::MeanReverting(params) => {
                Box::new(MeanRevertingStrategy::new(symbol, params.clone()))
            }
            StrategyKind::BuyAndHold { order_quantity } => {
                Box::new(BuyAndHoldStrategy::new(symbol, *order_quantity))
            }
        }
    }
}
