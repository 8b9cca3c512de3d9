//! Order manager: pending market orders and next-tick matching.
//!
//! An order submitted while processing tick `t` can only fill on a later tick of
//! the same symbol: the first tick whose timestamp is strictly greater than the
//! order's submit timestamp. Fills are unconditional, at that tick's open, for
//! the whole quantity.

use crate::domain::{Order, OrderId, OrderSide, OrderStatus, TickRecord};
use chrono::NaiveDateTime;

#[derive(Debug, Default)]
pub struct OrderManager {
    pending: Vec<Order>,
    next_id: u64,
    submitted: usize,
}

impl OrderManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a Pending order.
    pub fn submit(&mut self, order: Order) -> OrderId {
        debug_assert!(
            order.status() == OrderStatus::Pending,
            "submitted order must be Pending"
        );
        let id = order.id;
        self.next_id = self.next_id.max(id.0 + 1);
        self.submitted += 1;
        self.pending.push(order);
        id
    }

    /// Build and queue a market order with the next sequential id.
    pub fn submit_market(
        &mut self,
        symbol: &str,
        quantity: u64,
        side: OrderSide,
        submit_timestamp: NaiveDateTime,
    ) -> OrderId {
        let order = Order::market(OrderId(self.next_id), symbol, quantity, side, submit_timestamp);
        self.submit(order)
    }

    /// Fill every pending order eligible on `tick`, in submission order.
    ///
    /// Filled orders leave the pending set and are returned to the caller;
    /// everything else stays queued untouched.
    pub fn match_tick(&mut self, tick: &TickRecord) -> Vec<Order> {
        let (mut ready, waiting): (Vec<Order>, Vec<Order>) = std::mem::take(&mut self.pending)
            .into_iter()
            .partition(|o| o.symbol == tick.symbol && o.submit_timestamp < tick.timestamp);
        self.pending = waiting;

        for order in &mut ready {
            order.fill(tick.timestamp, tick.open_price);
        }
        ready
    }

    pub fn pending(&self) -> &[Order] {
        &self.pending
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Orders ever submitted.
    pub fn submitted_count(&self) -> usize {
        self.submitted
    }
}
