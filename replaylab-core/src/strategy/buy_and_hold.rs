//! Buy-and-hold baseline: one market buy on the first tick, then nothing.

use super::{OrderSink, Strategy};
use crate::data::{MarketDataStore, StoreError};
use crate::domain::OrderSide;

#[derive(Debug, Clone)]
pub struct BuyAndHoldStrategy {
    symbol: String,
    quantity: u64,
    submitted: bool,
}

impl BuyAndHoldStrategy {
    pub fn new(symbol: impl Into<String>, quantity: u64) -> Self {
        Self {
            symbol: symbol.into(),
            quantity,
            submitted: false,
        }
    }
}

impl Strategy for BuyAndHoldStrategy {
    fn name(&self) -> &str {
        "buy_and_hold"
    }

    fn on_tick(
        &mut self,
        store: &MarketDataStore,
        orders: &mut dyn OrderSink,
    ) -> Result<(), StoreError> {
        store.latest(&self.symbol)?;
        if !self.submitted {
            orders.submit_order(&self.symbol, self.quantity, OrderSide::Buy);
            self.submitted = true;
        }
        Ok(())
    }
}
