//! MarketDataStore: the most recent tick per symbol.

use crate::domain::TickRecord;
use chrono::NaiveDateTime;
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("no tick recorded yet for symbol '{0}'")]
    UnknownSymbol(String),
}

/// Point-query surface over the latest observed tick of each symbol.
///
/// No history is retained; callers that need a window keep their own.
#[derive(Debug, Clone, Default)]
pub struct MarketDataStore {
    recent: HashMap<String, TickRecord>,
}

impl MarketDataStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite the latest entry for `tick.symbol`.
    pub fn record(&mut self, tick: TickRecord) {
        self.recent.insert(tick.symbol.clone(), tick);
    }

    pub fn latest(&self, symbol: &str) -> Result<&TickRecord, StoreError> {
        self.recent
            .get(symbol)
            .ok_or_else(|| StoreError::UnknownSymbol(symbol.to_string()))
    }

    pub fn last_price(&self, symbol: &str) -> Result<f64, StoreError> {
        self.latest(symbol).map(|t| t.last_price)
    }

    pub fn open_price(&self, symbol: &str) -> Result<f64, StoreError> {
        self.latest(symbol).map(|t| t.open_price)
    }

    pub fn timestamp(&self, symbol: &str) -> Result<NaiveDateTime, StoreError> {
        self.latest(symbol).map(|t| t.timestamp)
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.recent.contains_key(symbol)
    }

    pub fn symbols(&self) -> impl Iterator<Item = &str> {
        self.recent.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn tick(day: u32, open: f64, last: f64) -> TickRecord {
        TickRecord::new(
            "SPY",
            NaiveDate::from_ymd_opt(2024, 1, day)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
            open,
            last,
            100,
        )
    }

    #[test]
    fn unknown_symbol_before_first_tick() {
        let store = MarketDataStore::new();
        assert_eq!(
            store.last_price("SPY"),
            Err(StoreError::UnknownSymbol("SPY".into()))
        );
        assert!(store.open_price("SPY").is_err());
        assert!(store.timestamp("SPY").is_err());
    }

    #[test]
    fn record_overwrites_previous_tick() {
        let mut store = MarketDataStore::new();
        store.record(tick(2, 100.0, 101.0));
        store.record(tick(3, 102.0, 99.0));

        assert_eq!(store.open_price("SPY"), Ok(102.0));
        assert_eq!(store.last_price("SPY"), Ok(99.0));
        assert_eq!(store.timestamp("SPY").unwrap().to_string(), "2024-01-03 00:00:00");
        assert_eq!(store.symbols().count(), 1);
    }
}
