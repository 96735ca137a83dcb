//! Averaging-Down Strategies
//!
//! Backtesting toolkit for averaging-down (martingale-style) entries on
//! crypto bars, with an optional short hedge overlay that sizes up as the
//! long position grows.
//!
//! The core is [`simulator::TradeSimulator`]: a single deterministic pass over
//! validated bars and precomputed entry/exit signals. Everything around it
//! (CSV loading, indicators, signal detection, metrics, parameter sweeps) feeds
//! or summarises that pass.
//!
//! ## Example
//! ```no_run
//! use averaging_strategies::{
//!     data, simulate, IndicatorEngine, IndicatorParams, LookupPolicy, SignalDetector,
//!     SimulationParams,
//! };
//!
//! fn main() -> anyhow::Result<()> {
//!     let bars = data::load_csv("data/BTCUSDT_4h.csv")?;
//!     let frame = IndicatorEngine::new(IndicatorParams::default()).compute(&bars);
//!     let signals = SignalDetector::default().detect(&bars, &frame);
//!
//!     let result = simulate(
//!         &bars,
//!         &signals,
//!         SimulationParams::default(),
//!         &|_: usize| true,
//!         LookupPolicy::NearestPrior,
//!     )?;
//!     println!("{} trades", result.trades.len());
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod data;
pub mod error;
pub mod grid;
pub mod hedge;
pub mod indicators;
pub mod ledger;
pub mod metrics;
pub mod monthly_pnl;
pub mod optimizer;
pub mod predicate;
pub mod report;
pub mod signal_index;
pub mod signals;
pub mod simulator;
pub mod types;

pub use config::Config;
pub use error::SimulationError;
pub use indicators::{IndicatorEngine, IndicatorFrame, IndicatorParams};
pub use metrics::PerformanceMetrics;
pub use monthly_pnl::MonthlyPnLMatrix;
pub use predicate::{ConditionEvaluator, EntryCondition, EntryPredicate};
pub use signal_index::{LookupPolicy, SignalIndex};
pub use signals::{SignalDetector, SignalParams};
pub use simulator::{simulate, SimulationParams, SimulationResult, TradeSimulator};
pub use types::*;
