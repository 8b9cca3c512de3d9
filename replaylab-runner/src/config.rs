//! TOML backtest configuration.
//!
//! ```toml
//! [backtest]
//! symbol = "AAPL"
//! start_date = "2014-01-01"
//! end_date = "2014-12-31"
//!
//! [data]
//! provider = "csv"
//! path = "data"
//!
//! [strategy]
//! type = "mean_reverting"
//! lookback_intervals = 20
//! buy_threshold = -1.5
//! sell_threshold = 1.5
//! order_quantity = 100
//! ```
//!
//! `[data]` defaults to the synthetic provider and `[strategy]` to mean reversion
//! with default parameters.

use chrono::NaiveDate;
use replaylab_core::domain::MAX_ORDER_QUANTITY;
use replaylab_core::strategy::StrategyKind;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Content hash naming one configuration.
pub type RunId = String;

/// Fewest closes that still give two returns for a sample deviation.
pub const MIN_LOOKBACK: usize = 3;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to encode config: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestConfig {
    pub backtest: BacktestSection,
    #[serde(default)]
    pub data: DataConfig,
    #[serde(default)]
    pub strategy: StrategyKind,
}

/// What to replay: one symbol over an inclusive date range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestSection {
    pub symbol: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

/// Where ticks come from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "provider", rename_all = "snake_case")]
pub enum DataConfig {
    /// `<path>/<SYMBOL>.csv`, or `path` itself when it names a file.
    Csv { path: PathBuf },

    /// Seeded random walk.
    Synthetic {
        #[serde(default)]
        seed: u64,
    },
}

impl Default for DataConfig {
    fn default() -> Self {
        DataConfig::Synthetic { seed: 0 }
    }
}

impl BacktestConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml(input: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let input = std::fs::read_to_string(path)?;
        Self::from_toml(&input)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string(self).map_err(|e| ConfigError::Invalid(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let section = &self.backtest;
        if section.symbol.trim().is_empty() {
            return Err(ConfigError::Invalid("symbol must not be empty".into()));
        }
        if section.start_date > section.end_date {
            return Err(ConfigError::Invalid(format!(
                "start_date {} is after end_date {}",
                section.start_date, section.end_date
            )));
        }
        if self.strategy.order_quantity() == 0 {
            return Err(ConfigError::Invalid("order_quantity must be positive".into()));
        }
        if self.strategy.order_quantity() > MAX_ORDER_QUANTITY {
            return Err(ConfigError::Invalid(format!(
                "order_quantity must be at most {MAX_ORDER_QUANTITY}"
            )));
        }

        if let StrategyKind::MeanReverting(params) = &self.strategy {
            if params.lookback_intervals < MIN_LOOKBACK {
                return Err(ConfigError::Invalid(format!(
                    "lookback_intervals must be at least {MIN_LOOKBACK}, got {}",
                    params.lookback_intervals
                )));
            }
            if !params.buy_threshold.is_finite() || !params.sell_threshold.is_finite() {
                return Err(ConfigError::Invalid("thresholds must be finite".into()));
            }
            if params.buy_threshold >= params.sell_threshold {
                return Err(ConfigError::Invalid(format!(
                    "buy_threshold {} must be below sell_threshold {}",
                    params.buy_threshold, params.sell_threshold
                )));
            }
        }
        Ok(())
    }

    /// BLAKE3 of the canonical JSON encoding.
    ///
    /// Two identical configurations always share a run id.
    pub fn run_id(&self) -> Result<RunId, ConfigError> {
        let json = serde_json::to_vec(self)?;
        Ok(blake3::hash(&json).to_hex().to_string())
    }
}
