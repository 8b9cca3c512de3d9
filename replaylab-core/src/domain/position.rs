//! Per-symbol position accounting: average-cost basis, realized and unrealized PnL.

use super::order::OrderSide;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PositionError {
    #[error("fill of {quantity} {symbol} overflows net quantity {net}")]
    QuantityOverflow {
        symbol: String,
        net: i64,
        quantity: u64,
    },
}

/// Net exposure and PnL for one symbol.
///
/// `average_cost` is meaningful only while `net_quantity != 0`; it is reset to the
/// fill price whenever a fill flips the sign of the position. `realized_pnl`
/// changes only on fills that reduce or reverse exposure, never on a mark.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    symbol: String,
    net_quantity: i64,
    average_cost: f64,
    realized_pnl: f64,
    unrealized_pnl: f64,
    market_value: f64,
    last_fill: Option<NaiveDateTime>,
}

impl Position {
    /// A flat position with no history.
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            net_quantity: 0,
            average_cost: 0.0,
            realized_pnl: 0.0,
            unrealized_pnl: 0.0,
            market_value: 0.0,
            last_fill: None,
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn net_quantity(&self) -> i64 {
        self.net_quantity
    }

    /// Average cost of the open exposure, `None` when flat.
    pub fn average_cost(&self) -> Option<f64> {
        (self.net_quantity != 0).then_some(self.average_cost)
    }

    pub fn realized_pnl(&self) -> f64 {
        self.realized_pnl
    }

    pub fn unrealized_pnl(&self) -> f64 {
        self.unrealized_pnl
    }

    pub fn market_value(&self) -> f64 {
        self.market_value
    }

    pub fn last_fill(&self) -> Option<NaiveDateTime> {
        self.last_fill
    }

    pub fn is_long(&self) -> bool {
        self.net_quantity > 0
    }

    pub fn is_short(&self) -> bool {
        self.net_quantity < 0
    }

    pub fn is_flat(&self) -> bool {
        self.net_quantity == 0
    }

    /// Apply one fill of `quantity` units at `price`.
    ///
    /// Same-direction fills (or fills from flat) average into the cost basis.
    /// Opposing fills realize PnL on the closed part; any residual beyond the prior
    /// exposure opens a fresh position at `price`.
    ///
    /// A fill whose quantity does not fit the signed net quantity is rejected and
    /// leaves the position untouched.
    pub fn event_fill(
        &mut self,
        timestamp: NaiveDateTime,
        side: OrderSide,
        quantity: u64,
        price: f64,
    ) -> Result<(), PositionError> {
        let overflow = || PositionError::QuantityOverflow {
            symbol: self.symbol.clone(),
            net: self.net_quantity,
            quantity,
        };
        let qty = i64::try_from(quantity).map_err(|_| overflow())?;
        let signed_qty = side.sign() * qty;
        let prior = self.net_quantity;
        let next = prior.checked_add(signed_qty).ok_or_else(overflow)?;
        self.last_fill = Some(timestamp);

        if prior == 0 || prior.signum() == signed_qty.signum() {
            let held = prior.unsigned_abs() as f64;
            let added = quantity as f64;
            self.average_cost = (self.average_cost * held + price * added) / (held + added);
            self.net_quantity = next;
            return Ok(());
        }

        let closing_qty = qty.min(prior.abs());
        self.realized_pnl += closing_qty as f64 * (price - self.average_cost) * prior.signum() as f64;
        self.net_quantity = next;

        if next == 0 {
            self.average_cost = 0.0;
        } else if next.signum() != prior.signum() {
            self.average_cost = price;
        }
        Ok(())
    }

    /// Recompute unrealized PnL and market value at `mark_price`.
    pub fn update_unrealized_pnl(&mut self, mark_price: f64) {
        let net = self.net_quantity as f64;
        self.market_value = net * mark_price;
        self.unrealized_pnl = if self.net_quantity == 0 {
            0.0
        } else {
            net * (mark_price - self.average_cost)
        };
    }
}
