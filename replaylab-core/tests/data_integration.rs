//! Provider → feed → engine, end to end.

use chrono::NaiveDate;
use replaylab_core::data::{
    CsvProvider, DataError, MarketDataFeed, MarketDataStore, SyntheticProvider,
};
use replaylab_core::engine::{BacktestEngine, OrderManager, RunReport};
use replaylab_core::strategy::{MeanRevertingParams, StrategyKind};
use std::fs;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn run(feed: MarketDataFeed, kind: &StrategyKind, symbol: &str) -> RunReport {
    BacktestEngine::new(feed, MarketDataStore::new(), kind.build(symbol), OrderManager::new())
        .run()
        .unwrap()
}

#[test]
fn csv_newest_first_replays_oldest_first() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("AAPL.csv"),
        "date,open,close,volume\n\
         2014-01-06,12.0,12.5,100\n\
         2014-01-03,11.0,11.5,100\n\
         2014-01-02,10.0,10.5,100\n",
    )
    .unwrap();

    let provider = CsvProvider::new(dir.path());
    let feed = MarketDataFeed::open(&provider, "AAPL", date(2014, 1, 1), date(2014, 1, 31)).unwrap();
    let kind = StrategyKind::BuyAndHold { order_quantity: 10 };
    let report = run(feed, &kind, "AAPL");

    assert_eq!(report.ticks_processed, 3);
    assert_eq!(report.fills.len(), 1);
    assert_eq!(report.fills[0].date, "2014-01-03");
    assert_eq!(report.fills[0].price, 11.0);
    assert_eq!(report.unrealized_pnl.last(), Some(10.0 * (12.5 - 11.0)));
}

#[test]
fn csv_missing_symbol_is_data_unavailable() {
    let dir = tempfile::tempdir().unwrap();
    let provider = CsvProvider::new(dir.path());
    let err = MarketDataFeed::open(&provider, "MSFT", date(2014, 1, 1), date(2014, 12, 31))
        .err()
        .unwrap();
    assert!(matches!(err, DataError::DataUnavailable { .. }));
}

#[test]
fn synthetic_replay_is_deterministic() {
    let kind = StrategyKind::MeanReverting(MeanRevertingParams {
        lookback_intervals: 10,
        buy_threshold: -1.0,
        sell_threshold: 1.0,
        order_quantity: 50,
    });
    let provider = SyntheticProvider::new(42);
    let open = || MarketDataFeed::open(&provider, "SPY", date(2020, 1, 1), date(2021, 12, 31)).unwrap();

    let a = run(open(), &kind, "SPY");
    let b = run(open(), &kind, "SPY");

    assert_eq!(a.fills, b.fills);
    assert_eq!(a.realized_pnl, b.realized_pnl);
    assert_eq!(a.summary(), b.summary());
    assert!(a.ticks_processed > 500);
    // Loose thresholds over two years of noise must trade.
    assert!(!a.fills.is_empty());
}
