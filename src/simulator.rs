//! Trade simulator
//!
//! Single forward pass over the bar series. Per bar, in order:
//!
//! 1. hedge exit (intrabar target/stop, then expiry)
//! 2. primary exit (stop-loss at close, then profit-only exit signal, then short expiry)
//! 3. hedge closed together with the primary
//! 4. entry when flat (long wins ties), averaging when already in a position
//! 5. hedge activation or upgrade after a long fill
//!
//! The pass is pure and deterministic: identical inputs give identical results.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::data::validate_series;
use crate::error::SimulationError;
use crate::hedge::{HedgeOverlay, HedgePosition};
use crate::ledger::{FillOutcome, Position, PositionLedger};
use crate::predicate::{EntryCondition, EntryPredicate};
use crate::signal_index::{LookupPolicy, SignalIndex};
use crate::types::{
    Bar, ExitReason, HedgeTrade, OpenHedge, OpenPosition, Side, SignalKind, SignalSet, Trade,
};

/// Simulation parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationParams {
    /// Long stop-loss as a (negative) percent return at the bar close
    pub stop_loss_long: f64,
    pub stop_loss_short: f64,
    pub capital_per_fill: f64,
    pub hedge_enabled: bool,
    pub hedge_activation_threshold: usize,
    /// Long fills between hedge upgrades; 0 disables upgrades
    pub hedge_upgrade_interval: usize,
    pub hedge_capital_fraction: f64,
    pub hedge_profit_target_pct: f64,
    /// Hedge stop distance in percent; the sign is ignored
    pub hedge_stop_loss_pct: f64,
    /// Holding limit for the hedge and for primary shorts
    pub hedge_max_hold_bars: Option<usize>,
    /// Fill cap for primary short positions
    pub hedge_max_fills: usize,
    pub hedge_entry_condition: EntryCondition,
}

impl Default for SimulationParams {
    fn default() -> Self {
        SimulationParams {
            stop_loss_long: -25.0,
            stop_loss_short: -15.0,
            capital_per_fill: 1000.0,
            hedge_enabled: false,
            hedge_activation_threshold: 2,
            hedge_upgrade_interval: 3,
            hedge_capital_fraction: 0.5,
            hedge_profit_target_pct: 8.0,
            hedge_stop_loss_pct: -15.0,
            hedge_max_hold_bars: None,
            hedge_max_fills: 4,
            hedge_entry_condition: EntryCondition::default(),
        }
    }
}

impl SimulationParams {
    pub fn stop_loss(&self, side: Side) -> f64 {
        match side {
            Side::Long => self.stop_loss_long,
            Side::Short => self.stop_loss_short,
        }
    }

    pub fn validate(&self) -> Result<(), SimulationError> {
        fn invalid(name: &'static str, reason: impl Into<String>) -> SimulationError {
            SimulationError::InvalidParameter {
                name,
                reason: reason.into(),
            }
        }

        for (name, value) in [
            ("stop_loss_long", self.stop_loss_long),
            ("stop_loss_short", self.stop_loss_short),
        ] {
            if !value.is_finite() || value >= 0.0 {
                return Err(invalid(name, format!("must be a negative percent, got {}", value)));
            }
        }

        if !self.capital_per_fill.is_finite() || self.capital_per_fill <= 0.0 {
            return Err(invalid(
                "capital_per_fill",
                format!("must be positive, got {}", self.capital_per_fill),
            ));
        }

        if self.hedge_max_fills == 0 {
            return Err(invalid("hedge_max_fills", "must be at least 1"));
        }

        if self.hedge_max_hold_bars == Some(0) {
            return Err(invalid("hedge_max_hold_bars", "must be at least 1 when set"));
        }

        if self.hedge_activation_threshold == 0 {
            return Err(invalid("hedge_activation_threshold", "must be at least 1"));
        }

        if !self.hedge_capital_fraction.is_finite() || self.hedge_capital_fraction <= 0.0 {
            return Err(invalid(
                "hedge_capital_fraction",
                format!("must be positive, got {}", self.hedge_capital_fraction),
            ));
        }

        if !(self.hedge_profit_target_pct > 0.0 && self.hedge_profit_target_pct < 100.0) {
            return Err(invalid(
                "hedge_profit_target_pct",
                format!("must be in (0, 100), got {}", self.hedge_profit_target_pct),
            ));
        }

        if !self.hedge_stop_loss_pct.is_finite() || self.hedge_stop_loss_pct == 0.0 {
            return Err(invalid(
                "hedge_stop_loss_pct",
                format!("must be a non-zero percent, got {}", self.hedge_stop_loss_pct),
            ));
        }

        Ok(())
    }
}

/// Everything a simulation produces
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimulationResult {
    pub trades: Vec<Trade>,
    pub hedge_trades: Vec<HedgeTrade>,
    pub open_position: Option<OpenPosition>,
    pub open_hedge: Option<OpenHedge>,
}

/// Walk-forward averaging-down simulator
#[derive(Debug, Clone)]
pub struct TradeSimulator {
    params: SimulationParams,
}

impl TradeSimulator {
    pub fn new(params: SimulationParams) -> Result<Self, SimulationError> {
        params.validate()?;
        Ok(TradeSimulator { params })
    }

    pub fn params(&self) -> &SimulationParams {
        &self.params
    }

    pub fn run(
        &self,
        bars: &[Bar],
        signals: &SignalIndex,
        predicate: &dyn EntryPredicate,
    ) -> Result<SimulationResult, SimulationError> {
        validate_series(bars)?;
        Ok(self.run_validated(bars, signals, predicate))
    }

    /// Simulation pass over bars that already passed [`validate_series`]
    fn run_validated(
        &self,
        bars: &[Bar],
        signals: &SignalIndex,
        predicate: &dyn EntryPredicate,
    ) -> SimulationResult {
        let params = &self.params;
        let overlay = HedgeOverlay::new(params);
        let mut ledger = PositionLedger::new(params.capital_per_fill, params.hedge_max_fills);
        let mut hedge: Option<HedgePosition> = None;
        let mut trades: Vec<Trade> = Vec::new();
        let mut hedge_trades: Vec<HedgeTrade> = Vec::new();

        for (i, bar) in bars.iter().enumerate() {
            // Hedge exit
            if let Some(open) = hedge.take() {
                match overlay.check_exit(&open, bar, i) {
                    Some((price, reason)) => {
                        let closed = open.close(bar.timestamp, price, reason);
                        debug!(
                            time = %bar.timestamp,
                            price,
                            return_pct = closed.return_pct,
                            reason = %reason,
                            "Hedge closed"
                        );
                        hedge_trades.push(closed);
                    }
                    None => hedge = Some(open),
                }
            }

            // Primary exit
            let mut closed_primary = false;
            let exit = ledger
                .position()
                .and_then(|pos| self.primary_exit(pos, bar, i, signals));
            if let Some((price, reason)) = exit {
                if let Some(pos) = ledger.close() {
                    let trade = close_trade(pos, bar, price, reason);
                    debug!(
                        side = %trade.side,
                        time = %bar.timestamp,
                        price,
                        fills = trade.fill_count,
                        return_pct = trade.return_pct,
                        reason = %reason,
                        "Position closed"
                    );
                    trades.push(trade);
                    closed_primary = true;
                }
            }

            if closed_primary {
                if let Some(open) = hedge.take() {
                    hedge_trades.push(open.close(
                        bar.timestamp,
                        bar.close,
                        ExitReason::ClosedWithPrimary,
                    ));
                }
            }

            // Entries and averaging
            let mut long_filled = false;
            if !ledger.is_open() {
                if let Some((side, event)) = signals.entry_at(bar.timestamp) {
                    if ledger.open(side, bar.timestamp, event.price, i).is_ok() {
                        debug!(side = %side, time = %bar.timestamp, price = event.price, "Position opened");
                        long_filled = side == Side::Long;
                    }
                }
            } else if let Some(side) = ledger.side() {
                if let Some(event) = signals.get(SignalKind::entry(side), bar.timestamp) {
                    match ledger.add_fill(bar.timestamp, event.price) {
                        Ok(FillOutcome::Added { fill_count }) => {
                            debug!(
                                side = %side,
                                time = %bar.timestamp,
                                price = event.price,
                                fill_count,
                                "Averaged down"
                            );
                            long_filled = side == Side::Long;
                        }
                        Ok(FillOutcome::CapReached { fill_count }) => {
                            debug!(side = %side, fill_count, "Fill cap reached, entry ignored");
                        }
                        Err(_) => {}
                    }
                }
            }

            // Hedge activation
            if params.hedge_enabled && long_filled {
                let fill_count = ledger.fill_count();
                if overlay.should_activate(fill_count, hedge.is_some()) && predicate.holds(i) {
                    if let Some(open) = hedge.take() {
                        hedge_trades.push(open.close(bar.timestamp, bar.close, ExitReason::Upgraded));
                    }
                    let opened = overlay.open(bar, i, fill_count, trades.len());
                    debug!(
                        time = %bar.timestamp,
                        price = opened.entry_price,
                        capital = opened.invested_capital,
                        fill_count,
                        "Hedge opened"
                    );
                    hedge = Some(opened);
                }
            }
        }

        unlink_open_primaries(trades.len(), &mut hedge_trades);

        let last_index = bars.len() - 1;
        let last = &bars[last_index];
        let open_position = ledger.position().map(|pos| {
            let average_price = pos.average_price();
            OpenPosition {
                side: pos.side,
                entry_timestamps: pos.fills.iter().map(|f| f.timestamp).collect(),
                entry_prices: pos.fills.iter().map(|f| f.price).collect(),
                average_price,
                fill_count: pos.fill_count(),
                bars_held: pos.bars_held(last_index),
                last_price: last.close,
                unrealized_pct: pos.side.return_pct(average_price, last.close),
            }
        });
        let open_hedge = hedge.as_ref().map(|h| h.snapshot(last_index, last.close));

        info!(
            bars = bars.len(),
            trades = trades.len(),
            hedge_trades = hedge_trades.len(),
            open_position = open_position.is_some(),
            open_hedge = open_hedge.is_some(),
            "Simulation complete"
        );

        SimulationResult {
            trades,
            hedge_trades,
            open_position,
            open_hedge,
        }
    }

    /// Exit decision for the open primary position at this bar
    fn primary_exit(
        &self,
        pos: &Position,
        bar: &Bar,
        bar_index: usize,
        signals: &SignalIndex,
    ) -> Option<(f64, ExitReason)> {
        let average = pos.average_price();
        let current = pos.side.return_pct(average, bar.close);

        if current <= self.params.stop_loss(pos.side) {
            return Some((bar.close, ExitReason::StopLoss));
        }

        if let Some(event) = signals.get(SignalKind::exit(pos.side), bar.timestamp) {
            if pos.side.return_pct(average, event.price) > 0.0 {
                return Some((event.price, ExitReason::TakeProfit));
            }
        }

        if pos.side == Side::Short {
            if let Some(max_hold) = self.params.hedge_max_hold_bars {
                if pos.bars_held(bar_index) >= max_hold && current > 0.0 {
                    return Some((bar.close, ExitReason::Expired));
                }
            }
        }

        None
    }
}

fn close_trade(pos: Position, bar: &Bar, price: f64, reason: ExitReason) -> Trade {
    let average_price = pos.average_price();
    Trade {
        side: pos.side,
        entry_timestamps: pos.fills.iter().map(|f| f.timestamp).collect(),
        entry_prices: pos.fills.iter().map(|f| f.price).collect(),
        average_price,
        fill_count: pos.fill_count(),
        exit_timestamp: bar.timestamp,
        exit_price: price,
        return_pct: pos.side.return_pct(average_price, price),
        exit_reason: reason,
    }
}

/// Hedges whose primary position is still open at the end carry no trade link
fn unlink_open_primaries(trade_count: usize, hedge_trades: &mut [HedgeTrade]) {
    for hedge in hedge_trades.iter_mut() {
        if hedge.primary_trade.is_some_and(|idx| idx >= trade_count) {
            hedge.primary_trade = None;
        }
    }
}

/// Build the signal index and run one simulation
pub fn simulate(
    bars: &[Bar],
    signals: &SignalSet,
    params: SimulationParams,
    predicate: &dyn EntryPredicate,
    policy: LookupPolicy,
) -> Result<SimulationResult, SimulationError> {
    let simulator = TradeSimulator::new(params)?;
    // The index lookup binary-searches, so bars are validated before building it
    validate_series(bars)?;
    let index = SignalIndex::build(bars, signals, policy)?;
    Ok(simulator.run_validated(bars, &index, predicate))
}
