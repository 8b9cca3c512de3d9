//! CSV file provider.
//!
//! Reads daily (or intraday) records from `date,open,close,volume` files. Column
//! names are matched case-insensitively through aliases (`Date`, `Open`, `Close`,
//! `Volume`, `last`), and extra columns such as `high`/`low` are ignored.

use super::provider::{in_range, DataError, RawRecord, TickProvider};
use chrono::{NaiveDate, NaiveDateTime};
use serde::Deserialize;
use std::path::{Path, PathBuf};

const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];
const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Deserialize)]
struct CsvRow {
    #[serde(alias = "Date", alias = "timestamp", alias = "Timestamp")]
    date: String,
    #[serde(alias = "Open")]
    open: f64,
    #[serde(alias = "Close", alias = "last", alias = "Last")]
    close: f64,
    #[serde(alias = "Volume", default)]
    volume: u64,
}

/// Reads `<dir>/<SYMBOL>.csv`, or a single file for any symbol.
#[derive(Debug, Clone)]
pub struct CsvProvider {
    path: PathBuf,
}

impl CsvProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn file_for(&self, symbol: &str) -> PathBuf {
        if self.path.is_dir() {
            self.path.join(format!("{symbol}.csv"))
        } else {
            self.path.clone()
        }
    }

    fn read_file(path: &Path) -> Result<Vec<RawRecord>, DataError> {
        let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_path(path)?;
        let mut records = Vec::new();
        for (line, row) in reader.deserialize::<CsvRow>().enumerate() {
            let row = row?;
            let timestamp = parse_timestamp(&row.date).ok_or_else(|| {
                DataError::Validation(format!(
                    "{}: row {}: unparseable date '{}'",
                    path.display(),
                    line + 1,
                    row.date
                ))
            })?;
            records.push(RawRecord {
                timestamp,
                open: row.open,
                close: row.close,
                volume: row.volume,
            });
        }
        Ok(records)
    }
}

impl TickProvider for CsvProvider {
    fn name(&self) -> &str {
        "csv"
    }

    fn fetch(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<RawRecord>, DataError> {
        let path = self.file_for(symbol);
        if !path.is_file() {
            return Err(DataError::SymbolNotFound {
                symbol: symbol.to_string(),
            });
        }

        let mut records = Self::read_file(&path)?;
        records.retain(|r| in_range(r.timestamp, start, end));
        // Files are often newest-first (spreadsheet exports); replay needs oldest-first.
        records.sort_by_key(|r| r.timestamp);
        Ok(records)
    }
}

/// Parse `YYYY-MM-DD` (midnight) or a full `YYYY-MM-DD HH:MM:SS` timestamp.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(raw, DATE_FORMAT)
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}
