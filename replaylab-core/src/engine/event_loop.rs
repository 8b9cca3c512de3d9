//! Tick-by-tick event loop: the heart of the backtester.

use crate::data::{MarketDataFeed, MarketDataStore};
use crate::domain::{Order, PositionBook, TickRecord};
use crate::strategy::{OrderRequests, Strategy};

use super::order_manager::OrderManager;
use super::state::{FillEvent, PnlSeries, RunReport, RunState, StatusEvent};
use super::EngineError;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Series and records accumulated while the loop runs.
#[derive(Default)]
struct RunLog {
    realized: PnlSeries,
    unrealized: PnlSeries,
    fills: Vec<FillEvent>,
    status: Vec<StatusEvent>,
    ticks: usize,
}

/// Orchestrates one replay: feed → store → strategy → matching → positions → PnL.
///
/// All collaborators are passed in at construction. The engine is the only writer
/// of the store, the order manager and the position book for the whole run.
pub struct BacktestEngine {
    feed: MarketDataFeed,
    store: MarketDataStore,
    strategy: Box<dyn Strategy>,
    orders: OrderManager,
    positions: PositionBook,
    state: RunState,
    stop_flag: Option<Arc<AtomicBool>>,
}

impl BacktestEngine {
    pub fn new(
        feed: MarketDataFeed,
        store: MarketDataStore,
        strategy: Box<dyn Strategy>,
        orders: OrderManager,
    ) -> Self {
        Self {
            feed,
            store,
            strategy,
            orders,
            positions: PositionBook::new(),
            state: RunState::Idle,
            stop_flag: None,
        }
    }

    /// Check `flag` once per tick; when set, the run completes early.
    pub fn with_stop_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.stop_flag = Some(flag);
        self
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn positions(&self) -> &PositionBook {
        &self.positions
    }

    pub fn store(&self) -> &MarketDataStore {
        &self.store
    }

    pub fn order_manager(&self) -> &OrderManager {
        &self.orders
    }

    /// Replay the whole feed. An engine runs at most once.
    ///
    /// On error the engine is left in `Failed` and the error is returned; on
    /// success the report carries `Completed`.
    pub fn run(&mut self) -> Result<RunReport, EngineError> {
        if self.state != RunState::Idle {
            return Err(EngineError::AlreadyRun(self.state));
        }
        self.state = RunState::Running;
        info!(strategy = self.strategy.name(), "backtesting started");

        let mut log = RunLog::default();
        match self.drive(&mut log) {
            Ok(stopped_early) => {
                self.state = RunState::Completed;
                if stopped_early {
                    warn!(ticks = log.ticks, "backtest stopped before the feed was exhausted");
                }
                info!(
                    ticks = log.ticks,
                    fills = log.fills.len(),
                    realized_pnl = self.positions.total_realized_pnl(),
                    unrealized_pnl = self.positions.total_unrealized_pnl(),
                    "backtest completed"
                );
                Ok(RunReport {
                    state: self.state,
                    realized_pnl: log.realized,
                    unrealized_pnl: log.unrealized,
                    fills: log.fills,
                    status: log.status,
                    positions: self.positions.snapshot(),
                    ticks_processed: log.ticks,
                    orders_submitted: self.orders.submitted_count(),
                    orders_unfilled: self.orders.pending_len(),
                    stopped_early,
                })
            }
            Err(e) => {
                self.state = RunState::Failed;
                warn!(ticks = log.ticks, error = %e, "backtest failed");
                Err(e)
            }
        }
    }

    /// Returns true if the stop flag ended the loop.
    fn drive(&mut self, log: &mut RunLog) -> Result<bool, EngineError> {
        loop {
            if self.stop_requested() {
                return Ok(true);
            }
            let Some(next) = self.feed.next() else {
                return Ok(false);
            };
            let tick = next?;
            self.process_tick(&tick, log)?;
            log.ticks += 1;
        }
    }

    fn stop_requested(&self) -> bool {
        self.stop_flag
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }

    fn process_tick(&mut self, tick: &TickRecord, log: &mut RunLog) -> Result<(), EngineError> {
        // 1. Store
        self.store.record(tick.clone());

        // 2. Strategy
        let mut requests = OrderRequests::new();
        self.strategy.on_tick(&self.store, &mut requests)?;
        for request in requests.drain() {
            let id = self.orders.submit_market(
                &request.symbol,
                request.quantity,
                request.side,
                tick.timestamp,
            );
            info!(
                date = %tick.trade_date(),
                order = %id,
                side = %request.side,
                qty = request.quantity,
                symbol = %request.symbol,
                "received order"
            );
        }

        // 3. Matching
        for order in self.orders.match_tick(tick) {
            self.apply_fill(&order, log)?;
        }

        // 4. Mark to market
        if self.positions.is_empty() {
            return Ok(());
        }
        for position in self.positions.iter_mut() {
            let mark = self.store.last_price(position.symbol())?;
            position.update_unrealized_pnl(mark);
        }
        log.unrealized
            .record(tick.timestamp, self.positions.total_unrealized_pnl());

        if let Some(position) = self.positions.get(&tick.symbol) {
            let status = StatusEvent::from_position(tick.timestamp, position);
            debug!(
                date = %status.date,
                symbol = %status.symbol,
                net = status.net_quantity,
                value = status.market_value,
                upnl = status.unrealized_pnl,
                rpnl = status.realized_pnl,
                "position status"
            );
            log.status.push(status);
        }
        Ok(())
    }

    fn apply_fill(&mut self, order: &Order, log: &mut RunLog) -> Result<(), EngineError> {
        let Some(event) = FillEvent::from_order(order) else {
            return Ok(());
        };

        self.positions.get_or_create(&order.symbol).event_fill(
            event.timestamp,
            event.side,
            event.quantity,
            event.price,
        )?;
        log.realized
            .record(event.timestamp, self.positions.total_realized_pnl());

        info!(
            date = %event.date,
            side = %event.side,
            qty = event.quantity,
            symbol = %event.symbol,
            price = event.price,
            "filled"
        );
        log.fills.push(event);

        self.strategy.on_fill(order);
        self.strategy.on_position_update(&self.positions);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{MarketDataStore, StoreError};
    use crate::domain::OrderSide;
    use crate::strategy::OrderSink;
    use chrono::{NaiveDate, NaiveDateTime};

    fn ts(day: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, day)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    /// Buys on the first tick, sells on the third.
    struct Scripted {
        ticks_seen: usize,
        quantity: u64,
    }

    impl Strategy for Scripted {
        fn name(&self) -> &str {
            "scripted"
        }

        fn on_tick(
            &mut self,
            store: &MarketDataStore,
            orders: &mut dyn OrderSink,
        ) -> Result<(), StoreError> {
            store.latest("SPY")?;
            self.ticks_seen += 1;
            match self.ticks_seen {
                1 => orders.submit_order("SPY", self.quantity, OrderSide::Buy),
                3 => orders.submit_order("SPY", self.quantity, OrderSide::Sell),
                _ => {}
            }
            Ok(())
        }
    }

    fn engine(ticks: Vec<TickRecord>) -> BacktestEngine {
        engine_with_quantity(ticks, 100)
    }

    fn engine_with_quantity(ticks: Vec<TickRecord>, quantity: u64) -> BacktestEngine {
        BacktestEngine::new(
            MarketDataFeed::from_ticks(ticks),
            MarketDataStore::new(),
            Box::new(Scripted {
                ticks_seen: 0,
                quantity,
            }),
            OrderManager::new(),
        )
    }

    fn spy(day: u32, open: f64, last: f64) -> TickRecord {
        TickRecord::new("SPY", ts(day), open, last, 1_000)
    }

    #[test]
    fn round_trip_realizes_pnl() {
        let mut engine = engine(vec![
            spy(2, 10.0, 10.5),
            spy(3, 11.0, 11.5),
            spy(4, 12.0, 12.5),
            spy(5, 13.0, 13.0),
        ]);
        let report = engine.run().unwrap();

        assert_eq!(report.state, RunState::Completed);
        assert_eq!(engine.state(), RunState::Completed);
        assert_eq!(report.fills.len(), 2);
        assert_eq!(report.fills[0].price, 11.0);
        assert_eq!(report.fills[1].price, 13.0);

        let pos = report.position("SPY").unwrap();
        assert!(pos.is_flat());
        assert_eq!(pos.realized_pnl(), 200.0);
        assert_eq!(report.realized_pnl.get(ts(5)), Some(200.0));
        assert_eq!(report.orders_submitted, 2);
        assert_eq!(report.orders_unfilled, 0);
    }

    #[test]
    fn unrealized_series_starts_with_first_position() {
        let mut engine = engine(vec![spy(2, 10.0, 10.5), spy(3, 11.0, 11.5), spy(4, 12.0, 12.5)]);
        let report = engine.run().unwrap();

        // No position exists on the first tick.
        assert_eq!(report.unrealized_pnl.get(ts(2)), None);
        assert_eq!(report.unrealized_pnl.get(ts(3)), Some(100.0 * (11.5 - 11.0)));
        assert_eq!(report.unrealized_pnl.get(ts(4)), Some(100.0 * (12.5 - 11.0)));
        assert_eq!(report.status.len(), 2);
        assert_eq!(report.status[1].market_value, 1250.0);
    }

    #[test]
    fn second_run_is_rejected() {
        let mut engine = engine(vec![spy(2, 10.0, 10.0)]);
        engine.run().unwrap();
        assert!(matches!(
            engine.run(),
            Err(EngineError::AlreadyRun(RunState::Completed))
        ));
    }

    #[test]
    fn out_of_order_feed_fails_run() {
        let mut engine = engine(vec![spy(3, 10.0, 10.0), spy(2, 10.0, 10.0)]);
        let err = engine.run().unwrap_err();
        assert!(matches!(err, EngineError::Data(_)));
        assert_eq!(engine.state(), RunState::Failed);
    }

    #[test]
    fn unknown_symbol_fails_run() {
        let qqq = TickRecord::new("QQQ", ts(2), 1.0, 1.0, 1);
        let mut engine = engine(vec![qqq]);
        let err = engine.run().unwrap_err();
        assert!(matches!(err, EngineError::Store(StoreError::UnknownSymbol(_))));
        assert_eq!(engine.state(), RunState::Failed);
    }

    #[test]
    fn oversized_fill_fails_run() {
        let mut engine = engine_with_quantity(vec![spy(2, 10.0, 10.0), spy(3, 11.0, 11.0)], u64::MAX);
        let err = engine.run().unwrap_err();
        assert!(matches!(err, EngineError::Position(_)));
        assert_eq!(engine.state(), RunState::Failed);
        assert!(engine.positions().get("SPY").map_or(true, |p| p.is_flat()));
    }

    #[test]
    fn stop_flag_ends_run_early() {
        let flag = Arc::new(AtomicBool::new(true));
        let mut engine = engine(vec![spy(2, 10.0, 10.0), spy(3, 10.0, 10.0)])
            .with_stop_flag(Arc::clone(&flag));
        let report = engine.run().unwrap();
        assert!(report.stopped_early);
        assert_eq!(report.ticks_processed, 0);
        assert_eq!(report.state, RunState::Completed);
    }
}
