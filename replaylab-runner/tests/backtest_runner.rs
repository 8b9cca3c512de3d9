//! End-to-end runner tests: TOML on disk → CSV data → run → artifacts.

use std::fs;
use std::path::Path;

use replaylab_runner::export::{export_sweep_csv, import_json};
use replaylab_runner::{
    load_artifacts, run_single_backtest, run_sweep, save_artifacts, BacktestConfig, ConfigError,
    RunError, SweepGrid,
};

/// Forty weekdays alternating 100/101, then a sharp drop and a recovery.
fn write_prices(dir: &Path) {
    let start = chrono::NaiveDate::from_ymd_opt(2014, 1, 1).unwrap();
    let mut body = String::from("date,open,high,low,close,volume\n");
    let mut day = start;
    let mut i = 0;
    while i < 44 {
        day += chrono::Duration::days(1);
        if matches!(chrono::Datelike::weekday(&day), chrono::Weekday::Sat | chrono::Weekday::Sun) {
            continue;
        }
        let close = match i {
            40 => 95.0,
            41 => 96.0,
            42 => 104.0,
            43 => 103.0,
            _ if i % 2 == 0 => 100.0,
            _ => 101.0,
        };
        body.push_str(&format!("{day},{close},{close},{close},{close},1000\n"));
        i += 1;
    }
    fs::write(dir.join("AAPL.csv"), body).unwrap();
}

fn write_config(dir: &Path, data_dir: &Path) -> std::path::PathBuf {
    let toml = format!(
        r#"
[backtest]
symbol = "AAPL"
start_date = "2014-01-01"
end_date = "2014-12-31"

[data]
provider = "csv"
path = "{}"

[strategy]
type = "mean_reverting"
lookback_intervals = 20
buy_threshold = -1.5
sell_threshold = 1.5
order_quantity = 100
"#,
        data_dir.display().to_string().replace('\\', "/")
    );
    let path = dir.join("backtest.toml");
    fs::write(&path, toml).unwrap();
    path
}

#[test]
fn csv_run_trades_the_drop_and_the_spike() {
    let dir = tempfile::tempdir().unwrap();
    write_prices(dir.path());
    let config = BacktestConfig::from_file(&write_config(dir.path(), dir.path())).unwrap();

    let result = run_single_backtest(&config).unwrap();
    let fills = &result.report.fills;

    assert_eq!(result.summary.ticks_processed, 44);
    assert!(!fills.is_empty());
    // The drop at i=40 buys at the next open (96.0).
    assert_eq!(fills[0].side.as_str(), "BUY");
    assert_eq!(fills[0].price, 96.0);
}

#[test]
fn artifacts_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    write_prices(dir.path());
    let config = BacktestConfig::from_file(&write_config(dir.path(), dir.path())).unwrap();
    let result = run_single_backtest(&config).unwrap();

    let out = dir.path().join("results");
    let run_dir = save_artifacts(&result, &out).unwrap();
    assert_eq!(run_dir, out.join(&result.run_id));
    for file in ["result.json", "realized_pnl.csv", "unrealized_pnl.csv", "fills.csv"] {
        assert!(run_dir.join(file).is_file(), "missing {file}");
    }

    let fills_csv = fs::read_to_string(run_dir.join("fills.csv")).unwrap();
    assert_eq!(fills_csv.lines().count(), result.report.fills.len() + 1);

    let loaded = load_artifacts(&run_dir).unwrap();
    assert_eq!(loaded.run_id, result.run_id);
    assert_eq!(loaded.config, result.config);
    assert_eq!(loaded.report.fills, result.report.fills);
    assert_eq!(loaded.summary, result.summary);
}

#[test]
fn newer_schema_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    write_prices(dir.path());
    let config = BacktestConfig::from_file(&write_config(dir.path(), dir.path())).unwrap();
    let mut result = run_single_backtest(&config).unwrap();
    result.schema_version += 1;

    let json = serde_json::to_string(&result).unwrap();
    let err = import_json(&json).unwrap_err();
    assert!(err.to_string().contains("unsupported schema version"));
}

#[test]
fn missing_config_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = BacktestConfig::from_file(&dir.path().join("nope.toml")).unwrap_err();
    assert!(matches!(err, ConfigError::Io(_)));
}

#[test]
fn empty_date_range_fails_with_data_error() {
    let dir = tempfile::tempdir().unwrap();
    write_prices(dir.path());
    let mut config = BacktestConfig::from_file(&write_config(dir.path(), dir.path())).unwrap();
    config.backtest.start_date = chrono::NaiveDate::from_ymd_opt(2015, 1, 1).unwrap();
    config.backtest.end_date = chrono::NaiveDate::from_ymd_opt(2015, 6, 1).unwrap();

    let err = run_single_backtest(&config).unwrap_err();
    assert!(matches!(err, RunError::Data(_)));
    assert!(err.to_string().contains("no data for 'AAPL'"));
}

#[test]
fn sweep_over_csv_data() {
    let dir = tempfile::tempdir().unwrap();
    write_prices(dir.path());
    let config = BacktestConfig::from_file(&write_config(dir.path(), dir.path())).unwrap();
    let grid = SweepGrid {
        lookbacks: vec![10, 20],
        buy_thresholds: vec![-1.5, -2.0],
        sell_thresholds: vec![1.5],
    };

    let outcomes = run_sweep(&config, &grid);
    assert_eq!(outcomes.len(), 4);
    assert!(outcomes.iter().all(|o| o.is_ok()));

    let totals: Vec<f64> = outcomes.iter().filter_map(|o| o.total_pnl()).collect();
    assert!(totals.windows(2).all(|w| w[0] >= w[1]));

    let table = export_sweep_csv(&outcomes).unwrap();
    assert_eq!(table.lines().count(), 5);
    assert!(table.starts_with("rank,lookback_intervals"));
}
