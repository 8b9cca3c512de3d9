//! Mean-reverting strategy: trades against extreme moves of the latest return.
//!
//! Keeps a rolling window of the last `lookback_intervals` (open, close)
//! observations of its symbol. Once the window is full, the z-score of the most
//! recent percentage return against the window's returns decides the trade:
//! below `buy_threshold` buys (unless already long), above `sell_threshold`
//! sells (unless already short). Order size is fixed.

use super::{OrderSink, Strategy};
use crate::data::{MarketDataStore, StoreError};
use crate::domain::{OrderSide, PositionBook};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeanRevertingParams {
    pub lookback_intervals: usize,
    pub buy_threshold: f64,
    pub sell_threshold: f64,
    pub order_quantity: u64,
}

impl Default for MeanRevertingParams {
    fn default() -> Self {
        Self {
            lookback_intervals: 20,
            buy_threshold: -1.5,
            sell_threshold: 1.5,
            order_quantity: 100,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Observation {
    timestamp: NaiveDateTime,
    open: f64,
    close: f64,
}

#[derive(Debug, Clone)]
pub struct MeanRevertingStrategy {
    symbol: String,
    params: MeanRevertingParams,
    window: VecDeque<Observation>,
    is_long: bool,
    is_short: bool,
}

impl MeanRevertingStrategy {
    pub fn new(symbol: impl Into<String>, params: MeanRevertingParams) -> Self {
        let capacity = params.lookback_intervals;
        Self {
            symbol: symbol.into(),
            params,
            window: VecDeque::with_capacity(capacity + 1),
            is_long: false,
            is_short: false,
        }
    }

    pub fn params(&self) -> &MeanRevertingParams {
        &self.params
    }

    pub fn window_len(&self) -> usize {
        self.window.len()
    }

    /// The retained (open, close) observations, oldest first.
    pub fn window(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.window.iter().map(|o| (o.open, o.close))
    }

    pub fn is_long(&self) -> bool {
        self.is_long
    }

    pub fn is_short(&self) -> bool {
        self.is_short
    }

    /// Current z-score of the window, `None` until it is full or when degenerate.
    pub fn signal(&self) -> Option<f64> {
        if self.window.len() < self.params.lookback_intervals {
            return None;
        }
        let closes: Vec<f64> = self.window.iter().map(|o| o.close).collect();
        z_score(&closes)
    }

    /// Append (or, for a repeated timestamp, replace) the latest observation.
    /// Returns false when the store holds nothing new for our symbol.
    fn observe(&mut self, store: &MarketDataStore) -> Result<bool, StoreError> {
        let tick = store.latest(&self.symbol)?;
        let obs = Observation {
            timestamp: tick.timestamp,
            open: tick.open_price,
            close: tick.last_price,
        };

        match self.window.back_mut() {
            Some(last) if last.timestamp == obs.timestamp => {
                let changed = last.close != obs.close;
                *last = obs;
                Ok(changed)
            }
            _ => {
                self.window.push_back(obs);
                while self.window.len() > self.params.lookback_intervals {
                    self.window.pop_front();
                }
                Ok(true)
            }
        }
    }
}

impl Strategy for MeanRevertingStrategy {
    fn name(&self) -> &str {
        "mean_reverting"
    }

    fn on_tick(
        &mut self,
        store: &MarketDataStore,
        orders: &mut dyn OrderSink,
    ) -> Result<(), StoreError> {
        if !self.observe(store)? {
            return Ok(());
        }

        let Some(z) = self.signal() else {
            return Ok(());
        };

        if z < self.params.buy_threshold {
            if !self.is_long {
                debug!(symbol = %self.symbol, z, "buy signal");
                orders.submit_order(&self.symbol, self.params.order_quantity, OrderSide::Buy);
            }
        } else if z > self.params.sell_threshold && !self.is_short {
            debug!(symbol = %self.symbol, z, "sell signal");
            orders.submit_order(&self.symbol, self.params.order_quantity, OrderSide::Sell);
        }
        Ok(())
    }

    fn on_position_update(&mut self, positions: &PositionBook) {
        if let Some(position) = positions.get(&self.symbol) {
            self.is_long = position.is_long();
            self.is_short = position.is_short();
        }
    }
}

/// Z-score of the most recent percentage return of `closes`.
///
/// Uses the sample standard deviation of all returns in the slice. Returns `None`
/// with fewer than two returns, or when the deviation is zero or not finite.
pub fn z_score(closes: &[f64]) -> Option<f64> {
    let returns: Vec<f64> = closes.windows(2).map(|w| w[1] / w[0] - 1.0).collect();
    let n = returns.len();
    if n < 2 {
        return None;
    }

    let mean = returns.iter().sum::<f64>() / n as f64;
    let variance = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
    let std_dev = variance.sqrt();
    if !std_dev.is_finite() || std_dev <= f64::EPSILON {
        return None;
    }

    let z = (returns[n - 1] - mean) / std_dev;
    z.is_finite().then_some(z)
}
