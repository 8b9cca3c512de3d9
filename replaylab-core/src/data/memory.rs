//! In-memory provider for fixtures and embedding callers.

use super::provider::{in_range, DataError, RawRecord, TickProvider};
use chrono::NaiveDate;
use std::collections::HashMap;

/// Serves pre-built records per symbol.
#[derive(Debug, Clone, Default)]
pub struct InMemoryProvider {
    records: HashMap<String, Vec<RawRecord>>,
}

impl InMemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert; records are sorted by timestamp.
    pub fn with_records(mut self, symbol: impl Into<String>, mut records: Vec<RawRecord>) -> Self {
        records.sort_by_key(|r| r.timestamp);
        self.records.insert(symbol.into(), records);
        self
    }
}

impl TickProvider for InMemoryProvider {
    fn name(&self) -> &str {
        "memory"
    }

    fn fetch(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<RawRecord>, DataError> {
        let records = self
            .records
            .get(symbol)
            .ok_or_else(|| DataError::SymbolNotFound {
                symbol: symbol.to_string(),
            })?;
        Ok(records
            .iter()
            .filter(|r| in_range(r.timestamp, start, end))
            .cloned()
            .collect())
    }
}
