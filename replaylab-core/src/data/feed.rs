//! MarketDataFeed: the ordered, finite tick stream consumed by the engine.

use super::provider::{DataError, TickProvider};
use crate::domain::TickRecord;
use chrono::{NaiveDate, NaiveDateTime};
use tracing::debug;

/// Lazily yields ticks in nondecreasing timestamp order.
///
/// A feed is consumed once; restarting means opening a new one. If a timestamp
/// goes backwards, or a tick carries unusable prices, the feed yields one error
/// and then ends.
pub struct MarketDataFeed {
    ticks: Box<dyn Iterator<Item = TickRecord> + Send>,
    last_timestamp: Option<NaiveDateTime>,
    failed: bool,
}

impl MarketDataFeed {
    /// Fetch `symbol` over `[start, end]` from `provider`.
    ///
    /// Fails with [`DataError::DataUnavailable`] when the provider has no records
    /// for the range or does not know the symbol.
    pub fn open(
        provider: &dyn TickProvider,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Self, DataError> {
        let unavailable = || DataError::DataUnavailable {
            symbol: symbol.to_string(),
            start,
            end,
        };
        let records = match provider.fetch(symbol, start, end) {
            Ok(records) => records,
            Err(DataError::SymbolNotFound { .. }) => return Err(unavailable()),
            Err(e) => return Err(e),
        };
        if records.is_empty() {
            return Err(unavailable());
        }
        debug!(
            provider = provider.name(),
            symbol,
            records = records.len(),
            "feed opened"
        );

        let symbol = symbol.to_string();
        Ok(Self::from_source(
            records.into_iter().map(move |r| r.into_tick(&symbol)),
        ))
    }

    /// A feed over already-built ticks, e.g. a merged multi-symbol replay.
    pub fn from_ticks(ticks: Vec<TickRecord>) -> Self {
        Self::from_source(ticks.into_iter())
    }

    fn from_source(ticks: impl Iterator<Item = TickRecord> + Send + 'static) -> Self {
        Self {
            ticks: Box::new(ticks),
            last_timestamp: None,
            failed: false,
        }
    }
}

impl Iterator for MarketDataFeed {
    type Item = Result<TickRecord, DataError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let tick = self.ticks.next()?;

        if let Some(previous) = self.last_timestamp {
            if tick.timestamp < previous {
                self.failed = true;
                return Some(Err(DataError::OutOfOrder {
                    symbol: tick.symbol,
                    previous,
                    next: tick.timestamp,
                }));
            }
        }
        if tick.is_void() {
            self.failed = true;
            return Some(Err(DataError::Validation(format!(
                "unusable prices for '{}' at {}: open={} last={}",
                tick.symbol, tick.timestamp, tick.open_price, tick.last_price
            ))));
        }

        self.last_timestamp = Some(tick.timestamp);
        Some(Ok(tick))
    }
}
