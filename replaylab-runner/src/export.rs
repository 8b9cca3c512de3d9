//! Artifact export: JSON result plus CSV tapes.
//!
//! A run directory `<output>/<run_id>/` holds:
//! - `result.json`: the full `BacktestResult`, schema-versioned
//! - `realized_pnl.csv`, `unrealized_pnl.csv`: `timestamp,value`
//! - `fills.csv`: the fill tape
//!
//! Sweeps write a single `sweep.csv` ranking table.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use replaylab_core::engine::{FillEvent, PnlSeries};
use replaylab_core::strategy::StrategyKind;

use crate::runner::{BacktestResult, SCHEMA_VERSION};
use crate::sweep::SweepOutcome;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// ─── JSON ───────────────────────────────────────────────────────────

pub fn export_json(result: &BacktestResult) -> Result<String> {
    serde_json::to_string_pretty(result).context("failed to serialize BacktestResult to JSON")
}

/// Deserialize a `BacktestResult`, rejecting schema versions newer than ours.
pub fn import_json(json: &str) -> Result<BacktestResult> {
    let result: BacktestResult =
        serde_json::from_str(json).context("failed to deserialize BacktestResult from JSON")?;
    if result.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            result.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(result)
}

// ─── CSV ────────────────────────────────────────────────────────────

pub fn export_series_csv(series: &PnlSeries) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["timestamp", "value"])?;
    for sample in series.samples() {
        wtr.write_record([
            &sample.timestamp.format(TIMESTAMP_FORMAT).to_string(),
            &format!("{:.6}", sample.value),
        ])?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Columns: date, side, quantity, symbol, price.
pub fn export_fills_csv(fills: &[FillEvent]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["date", "side", "quantity", "symbol", "price"])?;
    for f in fills {
        wtr.write_record([
            f.date.as_str(),
            f.side.as_str(),
            &f.quantity.to_string(),
            &f.symbol,
            &format!("{:.6}", f.price),
        ])?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// One row per grid point, in the order given (sweeps arrive ranked).
pub fn export_sweep_csv(outcomes: &[SweepOutcome]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "rank",
        "lookback_intervals",
        "buy_threshold",
        "sell_threshold",
        "fills",
        "realized_pnl",
        "unrealized_pnl",
        "total_pnl",
        "error",
    ])?;
    for (i, o) in outcomes.iter().enumerate() {
        let rank = (i + 1).to_string();
        let (lookback, buy, sell) = match &o.config.strategy {
            StrategyKind::MeanReverting(p) => (
                p.lookback_intervals.to_string(),
                p.buy_threshold.to_string(),
                p.sell_threshold.to_string(),
            ),
            _ => Default::default(),
        };
        let (fills, realized, unrealized, total) = match &o.summary {
            Some(s) => (
                s.fill_count.to_string(),
                format!("{:.2}", s.total_realized_pnl),
                format!("{:.2}", s.total_unrealized_pnl),
                format!("{:.2}", s.total_pnl()),
            ),
            None => Default::default(),
        };
        wtr.write_record([
            rank.as_str(),
            &lookback,
            &buy,
            &sell,
            &fills,
            &realized,
            &unrealized,
            &total,
            o.error.as_deref().unwrap_or(""),
        ])?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

// ─── Artifact bundle ────────────────────────────────────────────────

/// Write the artifact set for one run under `<output_dir>/<run_id>/`.
///
/// Rerunning an identical config overwrites its directory. Returns the directory.
pub fn save_artifacts(result: &BacktestResult, output_dir: &Path) -> Result<PathBuf> {
    let run_dir = output_dir.join(&result.run_id);
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("failed to create artifact dir: {}", run_dir.display()))?;

    std::fs::write(run_dir.join("result.json"), export_json(result)?)?;
    std::fs::write(
        run_dir.join("realized_pnl.csv"),
        export_series_csv(&result.report.realized_pnl)?,
    )?;
    std::fs::write(
        run_dir.join("unrealized_pnl.csv"),
        export_series_csv(&result.report.unrealized_pnl)?,
    )?;
    std::fs::write(run_dir.join("fills.csv"), export_fills_csv(&result.report.fills)?)?;

    Ok(run_dir)
}

/// Load a `BacktestResult` from an artifact directory's result.json.
pub fn load_artifacts(dir: &Path) -> Result<BacktestResult> {
    let path = dir.join("result.json");
    let json = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    import_json(&json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use replaylab_core::domain::OrderSide;

    fn ts(day: u32) -> chrono::NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, day)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    #[test]
    fn series_csv_has_header_and_rows() {
        let mut series = PnlSeries::new();
        series.record(ts(4), 1.5);
        series.record(ts(5), -2.25);
        let csv = export_series_csv(&series).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "timestamp,value");
        assert_eq!(lines[1], "2024-03-04 00:00:00,1.500000");
        assert_eq!(lines[2], "2024-03-05 00:00:00,-2.250000");
    }

    #[test]
    fn fills_csv_uses_upper_case_sides() {
        let fills = vec![FillEvent {
            timestamp: ts(4),
            date: "2024-03-04".into(),
            side: OrderSide::Sell,
            quantity: 100,
            symbol: "AAPL".into(),
            price: 10.5,
        }];
        let csv = export_fills_csv(&fills).unwrap();
        assert!(csv.contains("2024-03-04,SELL,100,AAPL,10.500000"));
    }

    #[test]
    fn rejects_newer_schema() {
        let json = r#"{"schema_version": 99}"#;
        assert!(import_json(json).is_err());
    }
}
