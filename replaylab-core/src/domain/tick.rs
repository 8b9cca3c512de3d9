//! TickRecord: the fundamental market data unit.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Format used for trade dates in fill and status records.
pub const TRADE_DATE_FORMAT: &str = "%Y-%m-%d";

/// Snapshot of one symbol's market state at one timestamp.
///
/// Immutable once built; the store keeps only the newest one per symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickRecord {
    pub symbol: String,
    pub timestamp: NaiveDateTime,
    pub open_price: f64,
    pub last_price: f64,
    pub total_volume: u64,
}

impl TickRecord {
    pub fn new(
        symbol: impl Into<String>,
        timestamp: NaiveDateTime,
        open_price: f64,
        last_price: f64,
        total_volume: u64,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            timestamp,
            open_price,
            last_price,
            total_volume,
        }
    }

    /// Calendar date of this tick, `YYYY-MM-DD`.
    pub fn trade_date(&self) -> String {
        self.timestamp.format(TRADE_DATE_FORMAT).to_string()
    }

    /// Returns true if either price is NaN, infinite or non-positive.
    pub fn is_void(&self) -> bool {
        !(self.open_price.is_finite() && self.last_price.is_finite())
            || self.open_price <= 0.0
            || self.last_price <= 0.0
    }
}
