//! RSI threshold-crossing signal detection
//!
//! Each detector is a small state machine walking the RSI column once. Events
//! are stamped with the confirmation bar's timestamp and close.

use serde::{Deserialize, Serialize};

use crate::indicators::IndicatorFrame;
use crate::types::{Bar, SignalEvent, SignalKind, SignalSet};

/// Signal thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalParams {
    /// Long entry arms below this RSI
    pub long_rsi_oversold: f64,
    /// ...and confirms at or above this RSI
    pub long_rsi_exit: f64,
    /// Only confirm long entries while the trend pair is in a golden cross
    pub use_golden_cross: bool,
    pub long_rsi_overbought: f64,
    pub long_rsi_sell: f64,
    pub short_enabled: bool,
    pub short_rsi_peak: f64,
    pub short_rsi_entry: f64,
    pub short_lookback: usize,
    pub dc_rsi_threshold: f64,
    pub short_rsi_oversold: f64,
    pub short_rsi_exit: f64,
}

impl Default for SignalParams {
    fn default() -> Self {
        SignalParams {
            long_rsi_oversold: 35.0,
            long_rsi_exit: 40.0,
            use_golden_cross: false,
            long_rsi_overbought: 80.0,
            long_rsi_sell: 55.0,
            short_enabled: false,
            short_rsi_peak: 78.0,
            short_rsi_entry: 65.0,
            short_lookback: 24,
            dc_rsi_threshold: 55.0,
            short_rsi_oversold: 35.0,
            short_rsi_exit: 45.0,
        }
    }
}

/// Produces the four ordered signal lists from bars and their indicators
#[derive(Debug, Clone, Default)]
pub struct SignalDetector {
    params: SignalParams,
}

impl SignalDetector {
    pub fn new(params: SignalParams) -> Self {
        SignalDetector { params }
    }

    pub fn detect(&self, bars: &[Bar], frame: &IndicatorFrame) -> SignalSet {
        let p = &self.params;

        let long_entry = self.arm_below_confirm_above(
            bars,
            frame,
            p.long_rsi_oversold,
            p.long_rsi_exit,
            p.use_golden_cross,
            SignalKind::LongEntry,
        );
        let long_exit = self.arm_above_confirm_below(
            bars,
            frame,
            p.long_rsi_overbought,
            p.long_rsi_sell,
            SignalKind::LongExit,
        );

        let (short_entry, short_exit) = if p.short_enabled {
            (
                self.short_entries(bars, frame),
                self.arm_below_confirm_above(
                    bars,
                    frame,
                    p.short_rsi_oversold,
                    p.short_rsi_exit,
                    false,
                    SignalKind::ShortExit,
                ),
            )
        } else {
            (Vec::new(), Vec::new())
        };

        SignalSet {
            long_entry,
            long_exit,
            short_entry,
            short_exit,
        }
    }

    /// RSI dips below `arm`, then the first bar with RSI >= `confirm` fires
    fn arm_below_confirm_above(
        &self,
        bars: &[Bar],
        frame: &IndicatorFrame,
        arm: f64,
        confirm: f64,
        require_golden_cross: bool,
        kind: SignalKind,
    ) -> Vec<SignalEvent> {
        let mut events = Vec::new();
        let mut armed = false;

        for (idx, bar) in bars.iter().enumerate() {
            let Some(rsi) = frame.rsi(idx) else {
                continue;
            };

            if rsi < arm {
                armed = true;
            } else if armed && rsi >= confirm {
                let trend_ok = !require_golden_cross || frame.golden_cross(idx).unwrap_or(false);
                if trend_ok {
                    events.push(SignalEvent::new(bar.timestamp, bar.close, kind));
                }
                armed = false;
            }
        }

        events
    }

    /// RSI rises above `arm`, then the first bar with RSI <= `confirm` fires
    fn arm_above_confirm_below(
        &self,
        bars: &[Bar],
        frame: &IndicatorFrame,
        arm: f64,
        confirm: f64,
        kind: SignalKind,
    ) -> Vec<SignalEvent> {
        let mut events = Vec::new();
        let mut armed = false;

        for (idx, bar) in bars.iter().enumerate() {
            let Some(rsi) = frame.rsi(idx) else {
                continue;
            };

            if rsi > arm {
                armed = true;
            } else if armed && rsi <= confirm {
                events.push(SignalEvent::new(bar.timestamp, bar.close, kind));
                armed = false;
            }
        }

        events
    }

    /// Golden cross: RSI peaked above `short_rsi_peak` within the lookback and
    /// now crosses down through `short_rsi_entry`. Dead cross: RSI crosses down
    /// through `dc_rsi_threshold`.
    fn short_entries(&self, bars: &[Bar], frame: &IndicatorFrame) -> Vec<SignalEvent> {
        let p = &self.params;
        let mut events = Vec::new();

        for idx in p.short_lookback.max(1)..bars.len() {
            let (Some(curr), Some(prev)) = (frame.rsi(idx), frame.rsi(idx - 1)) else {
                continue;
            };

            let crossed_down = |level: f64| prev > level && curr <= level;

            let fire = if frame.golden_cross(idx).unwrap_or(false) {
                let had_peak = (idx - p.short_lookback..idx)
                    .filter_map(|j| frame.rsi(j))
                    .any(|r| r > p.short_rsi_peak);
                had_peak && crossed_down(p.short_rsi_entry)
            } else if frame.dead_cross(idx).unwrap_or(false) {
                crossed_down(p.dc_rsi_threshold)
            } else {
                false
            };

            if fire {
                let bar = &bars[idx];
                events.push(SignalEvent::new(bar.timestamp, bar.close, SignalKind::ShortEntry));
            }
        }

        events
    }
}
