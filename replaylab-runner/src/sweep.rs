//! Parameter sweep over mean-reversion settings.
//!
//! Every grid point is an independent backtest: its own feed, store, order
//! manager and positions. Points run in parallel on the rayon pool against one
//! shared, read-only provider.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use tracing::{info, warn};

use replaylab_core::data::TickProvider;
use replaylab_core::engine::RunSummary;
use replaylab_core::strategy::{MeanRevertingParams, StrategyKind};

use crate::config::BacktestConfig;
use crate::data_loader::load_provider;
use crate::runner::run_with_provider;

/// Parameter grid specification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepGrid {
    pub lookbacks: Vec<usize>,
    pub buy_thresholds: Vec<f64>,
    pub sell_thresholds: Vec<f64>,
}

impl SweepGrid {
    /// Lookbacks 10, 20, 30 × buy -1.0, -1.5, -2.0 × sell 1.0, 1.5, 2.0.
    pub fn mean_reverting_default() -> Self {
        Self {
            lookbacks: vec![10, 20, 30],
            buy_thresholds: vec![-1.0, -1.5, -2.0],
            sell_thresholds: vec![1.0, 1.5, 2.0],
        }
    }

    /// Points in the full Cartesian product, before crossed thresholds are skipped.
    pub fn size(&self) -> usize {
        self.lookbacks.len() * self.buy_thresholds.len() * self.sell_thresholds.len()
    }

    /// One config per grid point, derived from `base`.
    ///
    /// The base's order quantity carries over (a base that is not mean-reverting
    /// starts from default parameters). Points with `buy >= sell` are skipped.
    pub fn generate_configs(&self, base: &BacktestConfig) -> Vec<BacktestConfig> {
        let template = match &base.strategy {
            StrategyKind::MeanReverting(params) => params.clone(),
            other => MeanRevertingParams {
                order_quantity: other.order_quantity(),
                ..MeanRevertingParams::default()
            },
        };

        let mut configs = Vec::with_capacity(self.size());
        for &lookback in &self.lookbacks {
            for &buy in &self.buy_thresholds {
                for &sell in &self.sell_thresholds {
                    if buy >= sell {
                        continue;
                    }
                    let mut config = base.clone();
                    config.strategy = StrategyKind::MeanReverting(MeanRevertingParams {
                        lookback_intervals: lookback,
                        buy_threshold: buy,
                        sell_threshold: sell,
                        ..template.clone()
                    });
                    configs.push(config);
                }
            }
        }
        configs
    }
}

/// Outcome of one grid point. Exactly one of `summary` and `error` is set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepOutcome {
    pub config: BacktestConfig,
    pub run_id: Option<String>,
    pub summary: Option<RunSummary>,
    pub error: Option<String>,
}

impl SweepOutcome {
    pub fn is_ok(&self) -> bool {
        self.summary.is_some()
    }

    pub fn total_pnl(&self) -> Option<f64> {
        self.summary.as_ref().map(RunSummary::total_pnl)
    }
}

/// Run every grid point derived from `base`, using the base's `[data]` provider.
///
/// Results are sorted by total PnL, best first; failed points sort last.
pub fn run_sweep(base: &BacktestConfig, grid: &SweepGrid) -> Vec<SweepOutcome> {
    let provider = load_provider(&base.data);
    run_sweep_with_provider(base, grid, provider.as_ref())
}

pub fn run_sweep_with_provider(
    base: &BacktestConfig,
    grid: &SweepGrid,
    provider: &dyn TickProvider,
) -> Vec<SweepOutcome> {
    let configs = grid.generate_configs(base);
    info!(points = configs.len(), "starting sweep");

    let mut outcomes: Vec<SweepOutcome> = configs
        .into_par_iter()
        .map(|config| run_point(config, provider))
        .collect();

    outcomes.sort_by(|a, b| match (a.total_pnl(), b.total_pnl()) {
        (Some(x), Some(y)) => y.partial_cmp(&x).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });

    let failed = outcomes.iter().filter(|o| !o.is_ok()).count();
    if failed > 0 {
        warn!(failed, total = outcomes.len(), "sweep finished with failed points");
    } else {
        info!(total = outcomes.len(), "sweep finished");
    }
    outcomes
}

fn run_point(config: BacktestConfig, provider: &dyn TickProvider) -> SweepOutcome {
    let result = config
        .validate()
        .map_err(Into::into)
        .and_then(|()| run_with_provider(&config, provider));

    match result {
        Ok(result) => SweepOutcome {
            run_id: Some(result.run_id),
            summary: Some(result.summary),
            error: None,
            config,
        },
        Err(e) => SweepOutcome {
            run_id: config.run_id().ok(),
            summary: None,
            error: Some(e.to_string()),
            config,
        },
    }
}
