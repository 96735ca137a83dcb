//! Performance metrics for a simulation run.
//!
//! Capital-weighted figures treat every fill as `capital_per_fill` invested, so a
//! five-fill trade counts five times as much as a single-fill one.

use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

use crate::simulator::SimulationResult;
use crate::types::{ExitReason, Side, Trade};

/// Per-side trade statistics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SideStats {
    pub trades: usize,
    pub wins: usize,
    pub win_rate: f64,
    /// Sum of per-trade returns in percent
    pub total_return: f64,
    pub invested: f64,
    pub profit: f64,
}

impl SideStats {
    fn from_trades<'a>(trades: impl Iterator<Item = &'a Trade>, capital_per_fill: f64) -> Self {
        let mut stats = SideStats::default();
        for trade in trades {
            stats.trades += 1;
            if trade.is_win() {
                stats.wins += 1;
            }
            stats.total_return += trade.return_pct;
            stats.invested += trade.invested(capital_per_fill);
            stats.profit += trade.profit(capital_per_fill);
        }
        stats.win_rate = win_rate(stats.wins, stats.trades);
        stats
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub total_trades: usize,
    pub winning_trades: usize,
    pub win_rate: f64,
    pub total_return: f64,
    pub avg_return: f64,
    /// Sample standard deviation of per-trade returns (0 with fewer than two trades)
    pub return_std_dev: f64,
    pub long: SideStats,
    pub short: SideStats,
    pub stop_loss_count: usize,
    pub expired_count: usize,
    pub avg_fills: f64,
    pub max_fills: usize,

    pub hedge_trades: usize,
    pub hedge_wins: usize,
    pub hedge_win_rate: f64,
    pub hedge_total_return: f64,
    pub hedge_invested: f64,
    pub hedge_profit: f64,

    pub primary_invested: f64,
    pub primary_profit: f64,
    pub total_profit: f64,
    /// Total profit over primary invested capital, in percent
    pub weighted_return: f64,
}

fn win_rate(wins: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        wins as f64 / total as f64 * 100.0
    }
}

impl PerformanceMetrics {
    pub fn from_result(result: &SimulationResult, capital_per_fill: f64) -> Self {
        let trades = &result.trades;
        let returns: Vec<f64> = trades.iter().map(|t| t.return_pct).collect();

        let long = SideStats::from_trades(
            trades.iter().filter(|t| t.side == Side::Long),
            capital_per_fill,
        );
        let short = SideStats::from_trades(
            trades.iter().filter(|t| t.side == Side::Short),
            capital_per_fill,
        );

        let total_trades = trades.len();
        let winning_trades = long.wins + short.wins;
        let total_return: f64 = returns.iter().sum();
        let avg_return = if total_trades > 0 {
            total_return / total_trades as f64
        } else {
            0.0
        };
        let return_std_dev = if returns.len() > 1 {
            returns.iter().copied().std_dev()
        } else {
            0.0
        };

        let total_fills: usize = trades.iter().map(|t| t.fill_count).sum();
        let avg_fills = if total_trades > 0 {
            total_fills as f64 / total_trades as f64
        } else {
            0.0
        };

        let hedges = &result.hedge_trades;
        let hedge_wins = hedges.iter().filter(|h| h.is_win()).count();
        let hedge_invested: f64 = hedges.iter().map(|h| h.invested_capital).sum();
        let hedge_profit: f64 = hedges.iter().map(|h| h.profit()).sum();

        let primary_invested = long.invested + short.invested;
        let primary_profit = long.profit + short.profit;
        let total_profit = primary_profit + hedge_profit;
        let weighted_return = if primary_invested > 0.0 {
            total_profit / primary_invested * 100.0
        } else {
            0.0
        };

        PerformanceMetrics {
            total_trades,
            winning_trades,
            win_rate: win_rate(winning_trades, total_trades),
            total_return,
            avg_return,
            return_std_dev,
            stop_loss_count: count_reason(trades, ExitReason::StopLoss),
            expired_count: count_reason(trades, ExitReason::Expired),
            avg_fills,
            max_fills: trades.iter().map(|t| t.fill_count).max().unwrap_or(0),
            long,
            short,
            hedge_trades: hedges.len(),
            hedge_wins,
            hedge_win_rate: win_rate(hedge_wins, hedges.len()),
            hedge_total_return: hedges.iter().map(|h| h.return_pct).sum(),
            hedge_invested,
            hedge_profit,
            primary_invested,
            primary_profit,
            total_profit,
            weighted_return,
        }
    }
}

fn count_reason(trades: &[Trade], reason: ExitReason) -> usize {
    trades.iter().filter(|t| t.exit_reason == reason).count()
}
