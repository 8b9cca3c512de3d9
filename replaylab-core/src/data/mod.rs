//! Market data: providers, the ordered tick feed, and the latest-tick store.

pub mod csv_provider;
pub mod feed;
pub mod memory;
pub mod provider;
pub mod store;
pub mod synthetic;

pub use csv_provider::CsvProvider;
pub use feed::MarketDataFeed;
pub use memory::InMemoryProvider;
pub use provider::{DataError, RawRecord, TickProvider};
pub use store::{MarketDataStore, StoreError};
pub use synthetic::SyntheticProvider;
