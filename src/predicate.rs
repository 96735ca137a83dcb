//! Hedge entry conditions
//!
//! The simulator only sees an opaque [`EntryPredicate`] of the bar index. The
//! configurable form is [`EntryCondition`], evaluated against an
//! [`IndicatorFrame`] through [`ConditionEvaluator`].

use serde::{Deserialize, Serialize};

use crate::indicators::IndicatorFrame;

/// Boolean test of a bar index
pub trait EntryPredicate {
    fn holds(&self, bar_index: usize) -> bool;
}

impl<F> EntryPredicate for F
where
    F: Fn(usize) -> bool,
{
    fn holds(&self, bar_index: usize) -> bool {
        self(bar_index)
    }
}

/// Market condition gating hedge activation
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EntryCondition {
    Always,
    #[default]
    MacdBelowZero,
    MacdHistBelowZero,
    MacdBelowSignal,
    CloseBelowMa { period: usize },
    RsiBelow { threshold: f64 },
    /// RSI under its own rolling average
    RsiBelowAverage,
    /// Close at least `pct` percent under the `lookback`-bar high
    DrawdownAtLeast { lookback: usize, pct: f64 },
    DeadCross,
    All { conditions: Vec<EntryCondition> },
}

impl EntryCondition {
    /// Evaluate at `idx`. Warm-up (missing) inputs evaluate to false.
    pub fn evaluate(&self, frame: &IndicatorFrame, idx: usize) -> bool {
        self.try_evaluate(frame, idx).unwrap_or(false)
    }

    fn try_evaluate(&self, frame: &IndicatorFrame, idx: usize) -> Option<bool> {
        let result = match self {
            EntryCondition::Always => true,
            EntryCondition::MacdBelowZero => frame.macd(idx)? < 0.0,
            EntryCondition::MacdHistBelowZero => frame.macd_hist(idx)? < 0.0,
            EntryCondition::MacdBelowSignal => frame.macd(idx)? < frame.macd_signal(idx)?,
            EntryCondition::CloseBelowMa { period } => frame.close(idx)? < frame.ma(*period, idx)?,
            EntryCondition::RsiBelow { threshold } => frame.rsi(idx)? < *threshold,
            EntryCondition::RsiBelowAverage => frame.rsi(idx)? < frame.rsi_ma(idx)?,
            EntryCondition::DrawdownAtLeast { lookback, pct } => {
                frame.drawdown(*lookback, idx)? <= -pct.abs()
            }
            EntryCondition::DeadCross => frame.dead_cross(idx)?,
            EntryCondition::All { conditions } => {
                conditions.iter().all(|c| c.evaluate(frame, idx))
            }
        };
        Some(result)
    }

    /// Short human-readable label used in reports
    pub fn label(&self) -> String {
        match self {
            EntryCondition::Always => "always".to_string(),
            EntryCondition::MacdBelowZero => "MACD<0".to_string(),
            EntryCondition::MacdHistBelowZero => "MACD hist<0".to_string(),
            EntryCondition::MacdBelowSignal => "MACD<signal".to_string(),
            EntryCondition::CloseBelowMa { period } => format!("close<MA{}", period),
            EntryCondition::RsiBelow { threshold } => format!("RSI<{}", threshold),
            EntryCondition::RsiBelowAverage => "RSI<RSI_MA".to_string(),
            EntryCondition::DrawdownAtLeast { lookback, pct } => {
                format!("DD{}<=-{}%", lookback, pct.abs())
            }
            EntryCondition::DeadCross => "dead cross".to_string(),
            EntryCondition::All { conditions } => conditions
                .iter()
                .map(|c| c.label())
                .collect::<Vec<_>>()
                .join("+"),
        }
    }

    /// Moving-average periods this condition reads
    pub fn required_ma_periods(&self) -> Vec<usize> {
        match self {
            EntryCondition::CloseBelowMa { period } => vec![*period],
            EntryCondition::All { conditions } => conditions
                .iter()
                .flat_map(|c| c.required_ma_periods())
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Drawdown lookbacks this condition reads
    pub fn required_lookbacks(&self) -> Vec<usize> {
        match self {
            EntryCondition::DrawdownAtLeast { lookback, .. } => vec![*lookback],
            EntryCondition::All { conditions } => conditions
                .iter()
                .flat_map(|c| c.required_lookbacks())
                .collect(),
            _ => Vec::new(),
        }
    }
}

/// Binds an [`EntryCondition`] to a computed frame
#[derive(Debug, Clone, Copy)]
pub struct ConditionEvaluator<'a> {
    condition: &'a EntryCondition,
    frame: &'a IndicatorFrame,
}

impl<'a> ConditionEvaluator<'a> {
    pub fn new(condition: &'a EntryCondition, frame: &'a IndicatorFrame) -> Self {
        ConditionEvaluator { condition, frame }
    }
}

impl EntryPredicate for ConditionEvaluator<'_> {
    fn holds(&self, bar_index: usize) -> bool {
        self.condition.evaluate(self.frame, bar_index)
    }
}
