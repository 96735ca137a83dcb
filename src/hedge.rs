//! Hedge overlay
//!
//! A single short position opened on top of an averaged-down long once the
//! long's fill count reaches the activation threshold. It is never averaged;
//! larger long positions replace it (close as `upgraded`, then reopen with the
//! bigger size).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::simulator::SimulationParams;
use crate::types::{Bar, ExitReason, HedgeTrade, OpenHedge, Side};

/// Open hedge state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HedgePosition {
    pub entry_timestamp: DateTime<Utc>,
    pub entry_price: f64,
    pub invested_capital: f64,
    pub entry_index: usize,
    pub primary_fill_count: usize,
    /// Index the hedged primary position takes in the trade list once closed
    pub primary_trade: usize,
}

impl HedgePosition {
    /// Price at which the short reaches its profit target
    pub fn target_price(&self, profit_target_pct: f64) -> f64 {
        self.entry_price * (1.0 - profit_target_pct / 100.0)
    }

    /// Price at which the short hits its stop
    pub fn stop_price(&self, stop_loss_pct: f64) -> f64 {
        self.entry_price * (1.0 + stop_loss_pct.abs() / 100.0)
    }

    pub fn return_pct(&self, price: f64) -> f64 {
        Side::Short.return_pct(self.entry_price, price)
    }

    pub fn bars_held(&self, current_index: usize) -> usize {
        current_index.saturating_sub(self.entry_index)
    }

    pub fn close(
        self,
        timestamp: DateTime<Utc>,
        price: f64,
        reason: ExitReason,
    ) -> HedgeTrade {
        HedgeTrade {
            entry_timestamp: self.entry_timestamp,
            entry_price: self.entry_price,
            exit_timestamp: timestamp,
            exit_price: price,
            return_pct: self.return_pct(price),
            exit_reason: reason,
            invested_capital: self.invested_capital,
            primary_fill_count: self.primary_fill_count,
            primary_trade: Some(self.primary_trade),
        }
    }

    pub fn snapshot(&self, last_index: usize, last_close: f64) -> OpenHedge {
        OpenHedge {
            entry_timestamp: self.entry_timestamp,
            entry_price: self.entry_price,
            invested_capital: self.invested_capital,
            primary_fill_count: self.primary_fill_count,
            bars_held: self.bars_held(last_index),
            unrealized_pct: self.return_pct(last_close),
        }
    }
}

/// Hedge activation and exit rules
#[derive(Debug, Clone, Copy)]
pub struct HedgeOverlay<'a> {
    params: &'a SimulationParams,
}

impl<'a> HedgeOverlay<'a> {
    pub fn new(params: &'a SimulationParams) -> Self {
        HedgeOverlay { params }
    }

    /// Whether the long fill count calls for a (new or upgraded) hedge.
    ///
    /// The market-condition predicate is checked separately by the caller.
    pub fn should_activate(&self, fill_count: usize, hedge_open: bool) -> bool {
        let threshold = self.params.hedge_activation_threshold;
        let interval = self.params.hedge_upgrade_interval;

        if fill_count == threshold {
            !hedge_open
        } else if fill_count > threshold && interval > 0 {
            (fill_count - threshold) % interval == 0
        } else {
            false
        }
    }

    pub fn capital_for(&self, fill_count: usize) -> f64 {
        self.params.hedge_capital_fraction * fill_count as f64 * self.params.capital_per_fill
    }

    /// Open a hedge at the bar close against the position that will close as
    /// trade number `primary_trade`
    pub fn open(
        &self,
        bar: &Bar,
        bar_index: usize,
        fill_count: usize,
        primary_trade: usize,
    ) -> HedgePosition {
        HedgePosition {
            entry_timestamp: bar.timestamp,
            entry_price: bar.close,
            invested_capital: self.capital_for(fill_count),
            entry_index: bar_index,
            primary_fill_count: fill_count,
            primary_trade,
        }
    }

    /// Intrabar exit check: profit target on the low, then stop on the high,
    /// then expiry at the close. Returns the exit price and reason.
    pub fn check_exit(
        &self,
        hedge: &HedgePosition,
        bar: &Bar,
        bar_index: usize,
    ) -> Option<(f64, ExitReason)> {
        let target = hedge.target_price(self.params.hedge_profit_target_pct);
        if bar.low <= target {
            return Some((target, ExitReason::HedgeTakeProfit));
        }

        let stop = hedge.stop_price(self.params.hedge_stop_loss_pct);
        if bar.high >= stop {
            return Some((stop, ExitReason::HedgeStopLoss));
        }

        if let Some(max_hold) = self.params.hedge_max_hold_bars {
            if hedge.bars_held(bar_index) >= max_hold && hedge.return_pct(bar.close) > 0.0 {
                return Some((bar.close, ExitReason::Expired));
            }
        }

        None
    }
}
