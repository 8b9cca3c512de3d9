//! Run lifecycle state, PnL series, per-event records, and the run report.

use crate::domain::{Order, OrderSide, Position};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Lifecycle of one run: `Idle → Running → Completed | Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunState {
    Idle,
    Running,
    Completed,
    Failed,
}

impl RunState {
    pub fn is_terminal(self) -> bool {
        matches!(self, RunState::Completed | RunState::Failed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PnlSample {
    pub timestamp: NaiveDateTime,
    pub value: f64,
}

/// Timestamp-keyed numeric series.
///
/// Samples arrive in nondecreasing timestamp order; recording at the timestamp of
/// the last sample replaces its value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PnlSeries {
    samples: Vec<PnlSample>,
}

impl PnlSeries {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, timestamp: NaiveDateTime, value: f64) {
        match self.samples.last_mut() {
            Some(last) if last.timestamp == timestamp => last.value = value,
            _ => self.samples.push(PnlSample { timestamp, value }),
        }
    }

    pub fn samples(&self) -> &[PnlSample] {
        &self.samples
    }

    pub fn last(&self) -> Option<f64> {
        self.samples.last().map(|s| s.value)
    }

    pub fn get(&self, timestamp: NaiveDateTime) -> Option<f64> {
        self.samples
            .binary_search_by_key(&timestamp, |s| s.timestamp)
            .ok()
            .map(|i| self.samples[i].value)
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Fill record: `(date, BUY|SELL, qty, symbol, price)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FillEvent {
    pub timestamp: NaiveDateTime,
    pub date: String,
    pub side: OrderSide,
    pub quantity: u64,
    pub symbol: String,
    pub price: f64,
}

impl FillEvent {
    /// Build from a filled order. Returns `None` for an order that is still pending.
    pub fn from_order(order: &Order) -> Option<Self> {
        let timestamp = order.filled_timestamp()?;
        let price = order.filled_price()?;
        Some(Self {
            timestamp,
            date: timestamp.format(crate::domain::tick::TRADE_DATE_FORMAT).to_string(),
            side: order.side,
            quantity: order.quantity,
            symbol: order.symbol.clone(),
            price,
        })
    }
}

/// Tick status record: `(date, net, value, upnl, rpnl)` for the ticked symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusEvent {
    pub timestamp: NaiveDateTime,
    pub date: String,
    pub symbol: String,
    pub net_quantity: i64,
    pub market_value: f64,
    pub unrealized_pnl: f64,
    pub realized_pnl: f64,
}

impl StatusEvent {
    pub fn from_position(timestamp: NaiveDateTime, position: &Position) -> Self {
        Self {
            timestamp,
            date: timestamp.format(crate::domain::tick::TRADE_DATE_FORMAT).to_string(),
            symbol: position.symbol().to_string(),
            net_quantity: position.net_quantity(),
            market_value: position.market_value(),
            unrealized_pnl: position.unrealized_pnl(),
            realized_pnl: position.realized_pnl(),
        }
    }
}

/// Everything observable from one completed run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub state: RunState,
    pub realized_pnl: PnlSeries,
    pub unrealized_pnl: PnlSeries,
    pub fills: Vec<FillEvent>,
    pub status: Vec<StatusEvent>,
    pub positions: Vec<Position>,
    pub ticks_processed: usize,
    pub orders_submitted: usize,
    /// Orders still pending when the feed ended.
    pub orders_unfilled: usize,
    /// The caller's stop flag ended the run before the feed was exhausted.
    pub stopped_early: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub total_realized_pnl: f64,
    pub total_unrealized_pnl: f64,
    pub fill_count: usize,
    pub ticks_processed: usize,
}

impl RunSummary {
    pub fn total_pnl(&self) -> f64 {
        self.total_realized_pnl + self.total_unrealized_pnl
    }
}

impl RunReport {
    pub fn summary(&self) -> RunSummary {
        RunSummary {
            total_realized_pnl: self.positions.iter().map(Position::realized_pnl).sum(),
            total_unrealized_pnl: self.positions.iter().map(Position::unrealized_pnl).sum(),
            fill_count: self.fills.len(),
            ticks_processed: self.ticks_processed,
        }
    }

    pub fn position(&self, symbol: &str) -> Option<&Position> {
        self.positions.iter().find(|p| p.symbol() == symbol)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::OrderId;
    use chrono::NaiveDate;

    fn ts(day: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, day)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    #[test]
    fn series_overwrites_same_timestamp() {
        let mut series = PnlSeries::new();
        series.record(ts(2), 1.0);
        series.record(ts(2), 5.0);
        series.record(ts(3), 7.0);

        assert_eq!(series.len(), 2);
        assert_eq!(series.get(ts(2)), Some(5.0));
        assert_eq!(series.get(ts(4)), None);
        assert_eq!(series.last(), Some(7.0));
    }

    #[test]
    fn fill_event_requires_filled_order() {
        let mut order = Order::market(OrderId(0), "SPY", 100, OrderSide::Sell, ts(2));
        assert!(FillEvent::from_order(&order).is_none());

        order.fill(ts(3), 99.5);
        let event = FillEvent::from_order(&order).unwrap();
        assert_eq!(event.date, "2024-01-03");
        assert_eq!(event.side, OrderSide::Sell);
        assert_eq!(event.price, 99.5);
    }

    #[test]
    fn terminal_states() {
        assert!(!RunState::Idle.is_terminal());
        assert!(!RunState::Running.is_terminal());
        assert!(RunState::Completed.is_terminal());
        assert!(RunState::Failed.is_terminal());
    }
}
