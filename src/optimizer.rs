//! Parameter sweep
//!
//! Runs the simulator over many [`ParamSet`]s in parallel. Bars, indicators and
//! signals are computed once and shared read-only across workers.

use indicatif::ProgressBar;
use rayon::prelude::*;
use serde_json::Value;
use std::collections::BTreeMap;
use std::str::FromStr;
use tracing::warn;

use crate::grid::ParamSet;
use crate::indicators::IndicatorFrame;
use crate::metrics::PerformanceMetrics;
use crate::predicate::ConditionEvaluator;
use crate::signal_index::SignalIndex;
use crate::simulator::TradeSimulator;
use crate::types::Bar;

/// Optimization result for a single parameter combination
#[derive(Debug, Clone)]
pub struct OptimizationResult {
    pub overrides: BTreeMap<String, Value>,
    pub metrics: PerformanceMetrics,
}

/// Shared inputs for a sweep
pub struct Optimizer<'a> {
    bars: &'a [Bar],
    frame: &'a IndicatorFrame,
    signals: &'a SignalIndex,
}

impl<'a> Optimizer<'a> {
    pub fn new(bars: &'a [Bar], frame: &'a IndicatorFrame, signals: &'a SignalIndex) -> Self {
        Optimizer {
            bars,
            frame,
            signals,
        }
    }

    /// Simulate one combination; invalid combinations are logged and skipped
    pub fn evaluate(&self, set: &ParamSet) -> Option<OptimizationResult> {
        let simulator = match TradeSimulator::new(set.params.clone()) {
            Ok(s) => s,
            Err(e) => {
                warn!("Skipping parameter combination {:?}: {}", set.overrides, e);
                return None;
            }
        };

        let predicate = ConditionEvaluator::new(&set.params.hedge_entry_condition, self.frame);
        match simulator.run(self.bars, self.signals, &predicate) {
            Ok(result) => Some(OptimizationResult {
                overrides: set.overrides.clone(),
                metrics: PerformanceMetrics::from_result(&result, set.params.capital_per_fill),
            }),
            Err(e) => {
                warn!("Simulation failed for {:?}: {}", set.overrides, e);
                None
            }
        }
    }

    /// Run optimization with progress tracking
    pub fn optimize_with_progress(
        &self,
        sets: &[ParamSet],
        progress_bar: &ProgressBar,
    ) -> Vec<OptimizationResult> {
        tracing::info!(
            "Testing {} parameter combinations with progress tracking",
            sets.len()
        );

        sets.par_iter()
            .filter_map(|set| {
                let result = self.evaluate(set);
                progress_bar.inc(1);
                result
            })
            .collect()
    }

    /// Run optimization sequentially (no parallelism)
    pub fn optimize_sequential(&self, sets: &[ParamSet]) -> Vec<OptimizationResult> {
        tracing::info!(
            "Testing {} parameter combinations sequentially",
            sets.len()
        );

        sets.iter().filter_map(|set| self.evaluate(set)).collect()
    }
}

/// Metric used to rank sweep results
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    Profit,
    Return,
    WeightedReturn,
    WinRate,
    HedgeProfit,
}

impl SortKey {
    fn value(self, m: &PerformanceMetrics) -> f64 {
        match self {
            SortKey::Profit => m.total_profit,
            SortKey::Return => m.total_return,
            SortKey::WeightedReturn => m.weighted_return,
            SortKey::WinRate => m.win_rate,
            SortKey::HedgeProfit => m.hedge_profit,
        }
    }
}

impl FromStr for SortKey {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "profit" => Ok(SortKey::Profit),
            "return" => Ok(SortKey::Return),
            "weighted_return" => Ok(SortKey::WeightedReturn),
            "win_rate" => Ok(SortKey::WinRate),
            "hedge_profit" => Ok(SortKey::HedgeProfit),
            _ => anyhow::bail!(
                "Unknown sort key: {}. Use profit, return, weighted_return, win_rate or hedge_profit",
                s
            ),
        }
    }
}

impl std::fmt::Display for SortKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SortKey::Profit => "profit",
            SortKey::Return => "return",
            SortKey::WeightedReturn => "weighted_return",
            SortKey::WinRate => "win_rate",
            SortKey::HedgeProfit => "hedge_profit",
        };
        f.write_str(name)
    }
}

/// Sort optimization results by the given metric, best first
pub fn sort_results(results: &mut [OptimizationResult], key: SortKey) {
    results.sort_by(|a, b| {
        key.value(&b.metrics)
            .partial_cmp(&key.value(&a.metrics))
            .unwrap_or(std::cmp::Ordering::Equal)
    });
}
