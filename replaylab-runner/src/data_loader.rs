//! Provider selection for the runner.
//!
//! Maps the `[data]` section of a config onto a concrete `TickProvider`:
//! - `csv` → `CsvProvider` rooted at the configured path
//! - `synthetic` → `SyntheticProvider` with the configured seed
//!
//! Synthetic data is for development only; runs on it are logged as such.

use replaylab_core::data::{CsvProvider, SyntheticProvider, TickProvider};
use tracing::{info, warn};

use crate::config::DataConfig;

/// Build the provider described by `config`.
pub fn load_provider(config: &DataConfig) -> Box<dyn TickProvider> {
    match config {
        DataConfig::Csv { path } => {
            info!(path = %path.display(), "using csv provider");
            Box::new(CsvProvider::new(path))
        }
        DataConfig::Synthetic { seed } => {
            warn!(seed, "using synthetic data, results are not market results");
            Box::new(SyntheticProvider::new(*seed))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::path::PathBuf;

    #[test]
    fn synthetic_config_builds_synthetic_provider() {
        let provider = load_provider(&DataConfig::Synthetic { seed: 3 });
        assert_eq!(provider.name(), "synthetic");

        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
        assert!(!provider.fetch("SPY", start, end).unwrap().is_empty());
    }

    #[test]
    fn csv_config_builds_csv_provider() {
        let provider = load_provider(&DataConfig::Csv {
            path: PathBuf::from("does/not/exist"),
        });
        assert_eq!(provider.name(), "csv");
    }
}
