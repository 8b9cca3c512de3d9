//! ReplayLab Core: tick replay engine, domain types, strategies, order matching, PnL ledger.
//!
//! This crate contains the heart of the backtester:
//! - Domain types (ticks, orders, positions, the per-symbol position book)
//! - Market data providers, the ordered feed, and the latest-tick store
//! - The `Strategy` callback protocol and the mean-reverting z-score strategy
//! - Next-tick market order matching
//! - The single-pass event loop producing realized/unrealized PnL series

pub mod data;
pub mod domain;
pub mod engine;
pub mod strategy;

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: values handed across sweep worker threads are Send + Sync.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        require_send::<domain::TickRecord>();
        require_sync::<domain::TickRecord>();
        require_send::<domain::Order>();
        require_sync::<domain::Order>();
        require_send::<domain::Position>();
        require_sync::<domain::Position>();
        require_send::<domain::PositionBook>();
        require_sync::<domain::PositionBook>();

        require_send::<data::MarketDataStore>();
        require_sync::<data::MarketDataStore>();
        require_send::<data::DataError>();
        require_sync::<data::DataError>();

        require_send::<strategy::StrategyKind>();
        require_sync::<strategy::StrategyKind>();
        require_send::<strategy::MeanRevertingStrategy>();

        require_send::<engine::RunReport>();
        require_sync::<engine::RunReport>();
        require_send::<engine::EngineError>();
        require_sync::<engine::EngineError>();
        require_send::<engine::BacktestEngine>();
    }

    /// Architecture contract: strategies see the store and the position book
    /// only through shared references, and talk back only through an `OrderSink`.
    #[test]
    fn strategy_trait_has_read_only_views() {
        fn _check_trait_object_builds(
            strategy: &mut dyn strategy::Strategy,
            store: &data::MarketDataStore,
            positions: &domain::PositionBook,
            sink: &mut dyn strategy::OrderSink,
        ) -> Result<(), data::StoreError> {
            strategy.on_position_update(positions);
            strategy.on_tick(store, sink)
        }
    }
}
