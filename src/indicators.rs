//! Technical indicators powered by the `ta` crate
//!
//! Thin wrappers that turn the streaming `ta` indicators into column vectors
//! aligned with the bar series. Warm-up positions are `None`.
//!
//! [`IndicatorEngine`] bundles the columns the signal detector and the hedge
//! entry conditions read into one [`IndicatorFrame`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use ta::indicators::{
    BollingerBands as TaBB, MovingAverageConvergenceDivergence, RelativeStrengthIndex,
    SimpleMovingAverage,
};
use ta::Next;

use crate::types::Bar;

/// Type alias for three-line indicators (upper/middle/lower, macd/signal/histogram)
pub type BandOutput = (Vec<Option<f64>>, Vec<Option<f64>>, Vec<Option<f64>>);

// =============================================================================
// Moving Averages
// =============================================================================

/// Calculate Simple Moving Average
pub fn sma(values: &[f64], period: usize) -> Vec<Option<f64>> {
    if values.is_empty() || period == 0 {
        return vec![];
    }

    let mut indicator = match SimpleMovingAverage::new(period) {
        Ok(i) => i,
        Err(_) => return vec![None; values.len()],
    };

    let mut result = Vec::with_capacity(values.len());

    for (i, &value) in values.iter().enumerate() {
        let sma_val = indicator.next(value);
        if i + 1 >= period {
            result.push(Some(sma_val));
        } else {
            result.push(None);
        }
    }

    result
}

/// Rolling mean over a column that itself has a warm-up.
///
/// A window containing any `None` yields `None`.
pub fn rolling_mean(values: &[Option<f64>], period: usize) -> Vec<Option<f64>> {
    if values.is_empty() || period == 0 {
        return vec![];
    }

    (0..values.len())
        .map(|i| {
            if i + 1 < period {
                return None;
            }
            let window = &values[i + 1 - period..=i];
            let sum: Option<f64> = window.iter().copied().sum();
            sum.map(|s| s / period as f64)
        })
        .collect()
}

/// Rolling maximum of the last `period` values
pub fn rolling_max(values: &[f64], period: usize) -> Vec<Option<f64>> {
    if values.is_empty() || period == 0 {
        return vec![];
    }

    (0..values.len())
        .map(|i| {
            if i + 1 < period {
                None
            } else {
                values[i + 1 - period..=i]
                    .iter()
                    .copied()
                    .reduce(f64::max)
            }
        })
        .collect()
}

/// Percentage distance of close below the rolling high (0 at the high, negative below)
pub fn drawdown_from_high(high: &[f64], close: &[f64], lookback: usize) -> Vec<Option<f64>> {
    rolling_max(high, lookback)
        .into_iter()
        .zip(close)
        .map(|(peak, &c)| peak.map(|p| (c - p) / p * 100.0))
        .collect()
}

// =============================================================================
// Momentum
// =============================================================================

/// Calculate Relative Strength Index
pub fn rsi(values: &[f64], period: usize) -> Vec<Option<f64>> {
    if values.is_empty() || period == 0 {
        return vec![];
    }

    let mut indicator = match RelativeStrengthIndex::new(period) {
        Ok(i) => i,
        Err(_) => return vec![None; values.len()],
    };

    let mut result = Vec::with_capacity(values.len());

    for (i, &value) in values.iter().enumerate() {
        let rsi_val = indicator.next(value);
        if i + 1 >= period {
            result.push(Some(rsi_val));
        } else {
            result.push(None);
        }
    }

    result
}

/// Calculate MACD line, signal line and histogram
pub fn macd(
    values: &[f64],
    fast_period: usize,
    slow_period: usize,
    signal_period: usize,
) -> BandOutput {
    if values.is_empty() {
        return (vec![], vec![], vec![]);
    }

    let mut indicator =
        match MovingAverageConvergenceDivergence::new(fast_period, slow_period, signal_period) {
            Ok(i) => i,
            Err(_) => {
                return (
                    vec![None; values.len()],
                    vec![None; values.len()],
                    vec![None; values.len()],
                )
            }
        };

    let warmup = slow_period;
    let mut macd_line = Vec::with_capacity(values.len());
    let mut signal_line = Vec::with_capacity(values.len());
    let mut histogram = Vec::with_capacity(values.len());

    for (i, &value) in values.iter().enumerate() {
        let macd_out = indicator.next(value);
        if i + 1 >= warmup {
            macd_line.push(Some(macd_out.macd));
            signal_line.push(Some(macd_out.signal));
            histogram.push(Some(macd_out.histogram));
        } else {
            macd_line.push(None);
            signal_line.push(None);
            histogram.push(None);
        }
    }

    (macd_line, signal_line, histogram)
}

// =============================================================================
// Volatility
// =============================================================================

/// Calculate Bollinger Bands (upper, middle, lower)
pub fn bollinger_bands(values: &[f64], period: usize, num_std: f64) -> BandOutput {
    if values.is_empty() || period == 0 {
        return (vec![], vec![], vec![]);
    }

    let mut indicator = match TaBB::new(period, num_std) {
        Ok(i) => i,
        Err(_) => {
            return (
                vec![None; values.len()],
                vec![None; values.len()],
                vec![None; values.len()],
            )
        }
    };

    let mut upper = Vec::with_capacity(values.len());
    let mut middle = Vec::with_capacity(values.len());
    let mut lower = Vec::with_capacity(values.len());

    for (i, &value) in values.iter().enumerate() {
        let bb = indicator.next(value);
        if i + 1 >= period {
            upper.push(Some(bb.upper));
            middle.push(Some(bb.average));
            lower.push(Some(bb.lower));
        } else {
            upper.push(None);
            middle.push(None);
            lower.push(None);
        }
    }

    (upper, middle, lower)
}

// =============================================================================
// Indicator Engine
// =============================================================================

/// Indicator periods
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicatorParams {
    pub rsi_period: usize,
    pub rsi_ma_period: usize,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
    pub bb_period: usize,
    pub bb_std: f64,
    pub ma_periods: Vec<usize>,
    pub drawdown_lookbacks: Vec<usize>,
    /// Fast/slow pair used for golden and dead cross
    pub trend_fast: usize,
    pub trend_slow: usize,
}

impl Default for IndicatorParams {
    fn default() -> Self {
        IndicatorParams {
            rsi_period: 14,
            rsi_ma_period: 14,
            macd_fast: 12,
            macd_slow: 26,
            macd_signal: 9,
            bb_period: 20,
            bb_std: 2.0,
            ma_periods: vec![10, 20, 30, 50, 100, 200],
            drawdown_lookbacks: vec![30, 60, 90],
            trend_fast: 100,
            trend_slow: 200,
        }
    }
}

/// Indicator columns aligned index-for-index with the bar series
#[derive(Debug, Clone, Default)]
pub struct IndicatorFrame {
    pub close: Vec<f64>,
    pub rsi: Vec<Option<f64>>,
    pub rsi_ma: Vec<Option<f64>>,
    pub macd: Vec<Option<f64>>,
    pub macd_signal: Vec<Option<f64>>,
    pub macd_hist: Vec<Option<f64>>,
    pub bb_upper: Vec<Option<f64>>,
    pub bb_middle: Vec<Option<f64>>,
    pub bb_lower: Vec<Option<f64>>,
    pub moving_averages: BTreeMap<usize, Vec<Option<f64>>>,
    pub drawdowns: BTreeMap<usize, Vec<Option<f64>>>,
    pub trend_fast: Vec<Option<f64>>,
    pub trend_slow: Vec<Option<f64>>,
}

impl IndicatorFrame {
    pub fn len(&self) -> usize {
        self.close.len()
    }

    pub fn is_empty(&self) -> bool {
        self.close.is_empty()
    }

    pub fn close(&self, idx: usize) -> Option<f64> {
        self.close.get(idx).copied()
    }

    pub fn rsi(&self, idx: usize) -> Option<f64> {
        at(&self.rsi, idx)
    }

    pub fn rsi_ma(&self, idx: usize) -> Option<f64> {
        at(&self.rsi_ma, idx)
    }

    pub fn macd(&self, idx: usize) -> Option<f64> {
        at(&self.macd, idx)
    }

    pub fn macd_signal(&self, idx: usize) -> Option<f64> {
        at(&self.macd_signal, idx)
    }

    pub fn macd_hist(&self, idx: usize) -> Option<f64> {
        at(&self.macd_hist, idx)
    }

    /// Moving average for a configured period; `None` for unknown periods
    pub fn ma(&self, period: usize, idx: usize) -> Option<f64> {
        self.moving_averages.get(&period).and_then(|col| at(col, idx))
    }

    /// Drawdown from the rolling high for a configured lookback
    pub fn drawdown(&self, lookback: usize, idx: usize) -> Option<f64> {
        self.drawdowns.get(&lookback).and_then(|col| at(col, idx))
    }

    pub fn golden_cross(&self, idx: usize) -> Option<bool> {
        Some(at(&self.trend_fast, idx)? > at(&self.trend_slow, idx)?)
    }

    pub fn dead_cross(&self, idx: usize) -> Option<bool> {
        Some(at(&self.trend_fast, idx)? < at(&self.trend_slow, idx)?)
    }
}

fn at(col: &[Option<f64>], idx: usize) -> Option<f64> {
    col.get(idx).copied().flatten()
}

/// Computes an [`IndicatorFrame`] from a bar series
#[derive(Debug, Clone, Default)]
pub struct IndicatorEngine {
    params: IndicatorParams,
}

impl IndicatorEngine {
    pub fn new(params: IndicatorParams) -> Self {
        IndicatorEngine { params }
    }

    pub fn params(&self) -> &IndicatorParams {
        &self.params
    }

    /// Ensure extra moving-average periods and drawdown lookbacks are computed,
    /// e.g. ones referenced by a hedge entry condition.
    pub fn with_requirements(mut self, ma_periods: &[usize], lookbacks: &[usize]) -> Self {
        for &p in ma_periods {
            if !self.params.ma_periods.contains(&p) {
                self.params.ma_periods.push(p);
            }
        }
        for &l in lookbacks {
            if !self.params.drawdown_lookbacks.contains(&l) {
                self.params.drawdown_lookbacks.push(l);
            }
        }
        self
    }

    pub fn compute(&self, bars: &[Bar]) -> IndicatorFrame {
        let p = &self.params;
        let close: Vec<f64> = bars.iter().map(|b| b.close).collect();
        let high: Vec<f64> = bars.iter().map(|b| b.high).collect();

        let rsi_col = rsi(&close, p.rsi_period);
        let rsi_ma = rolling_mean(&rsi_col, p.rsi_ma_period);
        let (macd_line, macd_signal, macd_hist) =
            macd(&close, p.macd_fast, p.macd_slow, p.macd_signal);
        let (bb_upper, bb_middle, bb_lower) = bollinger_bands(&close, p.bb_period, p.bb_std);

        let moving_averages = p
            .ma_periods
            .iter()
            .map(|&period| (period, sma(&close, period)))
            .collect();
        let drawdowns = p
            .drawdown_lookbacks
            .iter()
            .map(|&lookback| (lookback, drawdown_from_high(&high, &close, lookback)))
            .collect();

        IndicatorFrame {
            rsi: rsi_col,
            rsi_ma,
            macd: macd_line,
            macd_signal,
            macd_hist,
            bb_upper,
            bb_middle,
            bb_lower,
            moving_averages,
            drawdowns,
            trend_fast: sma(&close, p.trend_fast),
            trend_slow: sma(&close, p.trend_slow),
            close,
        }
    }
}
