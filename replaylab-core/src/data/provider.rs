//! Tick provider trait and structured error types.
//!
//! The TickProvider trait abstracts over where historical records come from
//! (CSV files, in-memory fixtures, synthetic walks) so the feed can be fed by any
//! of them and mocked in tests.

use crate::domain::TickRecord;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One raw row from a provider, before it is tagged with its symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    pub timestamp: NaiveDateTime,
    pub open: f64,
    pub close: f64,
    pub volume: u64,
}

impl RawRecord {
    pub fn into_tick(self, symbol: &str) -> TickRecord {
        TickRecord::new(symbol, self.timestamp, self.open, self.close, self.volume)
    }
}

/// Structured error types for data operations.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("no data for '{symbol}' between {start} and {end}")]
    DataUnavailable {
        symbol: String,
        start: NaiveDate,
        end: NaiveDate,
    },

    #[error("symbol not found: {symbol}")]
    SymbolNotFound { symbol: String },

    #[error("feed out of order for '{symbol}': {next} after {previous}")]
    OutOfOrder {
        symbol: String,
        previous: NaiveDateTime,
        next: NaiveDateTime,
    },

    #[error("csv error: {0}")]
    Csv(String),

    #[error("i/o error: {0}")]
    Io(String),

    #[error("validation error: {0}")]
    Validation(String),
}

impl From<csv::Error> for DataError {
    fn from(e: csv::Error) -> Self {
        DataError::Csv(e.to_string())
    }
}

impl From<std::io::Error> for DataError {
    fn from(e: std::io::Error) -> Self {
        DataError::Io(e.to_string())
    }
}

/// Source of historical records for a symbol.
///
/// Returning an empty vector is allowed; the feed turns it into
/// [`DataError::DataUnavailable`].
pub trait TickProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// Records for `symbol` with dates in `[start, end]`, oldest first.
    fn fetch(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<RawRecord>, DataError>;
}

/// True if `timestamp` falls on a date inside `[start, end]`.
pub(crate) fn in_range(timestamp: NaiveDateTime, start: NaiveDate, end: NaiveDate) -> bool {
    let date = timestamp.date();
    date >= start && date <= end
}
