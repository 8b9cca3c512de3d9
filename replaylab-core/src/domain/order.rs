//! Market orders and their single Pending → Filled transition.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Largest quantity a single order may carry; positions hold signed `i64` units.
pub const MAX_ORDER_QUANTITY: u64 = i64::MAX as u64;

/// Sequential order identifier, unique within one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OrderId(pub u64);

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    /// `+1` for buys, `-1` for sells.
    pub fn sign(self) -> i64 {
        match self {
            OrderSide::Buy => 1,
            OrderSide::Sell => -1,
        }
    }

    pub fn is_buy(self) -> bool {
        self == OrderSide::Buy
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OrderSide::Buy => "BUY",
            OrderSide::Sell => "SELL",
        }
    }
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What kind of order. Only market orders exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderKind {
    /// Fill at the open of the next tick for the symbol.
    Market,
}

/// Order lifecycle states. There is no cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    Pending,
    Filled,
}

/// A single order, created by a strategy request and filled at most once.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub symbol: String,
    pub quantity: u64,
    pub side: OrderSide,
    pub kind: OrderKind,
    pub submit_timestamp: NaiveDateTime,
    status: OrderStatus,
    filled_timestamp: Option<NaiveDateTime>,
    filled_price: Option<f64>,
}

impl Order {
    /// A new Pending market order.
    pub fn market(
        id: OrderId,
        symbol: impl Into<String>,
        quantity: u64,
        side: OrderSide,
        submit_timestamp: NaiveDateTime,
    ) -> Self {
        debug_assert!(quantity > 0, "order quantity must be positive");
        Self {
            id,
            symbol: symbol.into(),
            quantity,
            side,
            kind: OrderKind::Market,
            submit_timestamp,
            status: OrderStatus::Pending,
            filled_timestamp: None,
            filled_price: None,
        }
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn is_filled(&self) -> bool {
        self.status == OrderStatus::Filled
    }

    pub fn filled_timestamp(&self) -> Option<NaiveDateTime> {
        self.filled_timestamp
    }

    pub fn filled_price(&self) -> Option<f64> {
        self.filled_price
    }

    /// Quantity with the side's sign applied, `None` above [`MAX_ORDER_QUANTITY`].
    pub fn signed_quantity(&self) -> Option<i64> {
        i64::try_from(self.quantity)
            .ok()
            .map(|q| self.side.sign() * q)
    }

    /// Pending → Filled. Only the order manager fills orders, exactly once.
    pub(crate) fn fill(&mut self, timestamp: NaiveDateTime, price: f64) {
        debug_assert!(
            self.status == OrderStatus::Pending,
            "order {} filled twice",
            self.id
        );
        self.status = OrderStatus::Filled;
        self.filled_timestamp = Some(timestamp);
        self.filled_price = Some(price);
    }
}
