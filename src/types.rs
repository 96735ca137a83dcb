//! Core data types used across the backtesting system

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Validation errors for bar data
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BarValidationError {
    #[error("prices must be finite: open={open}, high={high}, low={low}, close={close}")]
    NonFinitePrice {
        open: f64,
        high: f64,
        low: f64,
        close: f64,
    },

    #[error("prices must be positive: open={open}, high={high}, low={low}, close={close}")]
    NonPositivePrice {
        open: f64,
        high: f64,
        low: f64,
        close: f64,
    },

    #[error("high ({high}) must be >= low ({low})")]
    HighLessThanLow { high: f64, low: f64 },

    #[error("open ({open}) must be between low ({low}) and high ({high})")]
    OpenOutOfRange { open: f64, low: f64, high: f64 },

    #[error("close ({close}) must be between low ({low}) and high ({high})")]
    CloseOutOfRange { close: f64, low: f64, high: f64 },

    #[error("volume ({0}) must be >= 0")]
    NegativeVolume(f64),
}

/// OHLCV bar
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Bar {
    /// Create a new bar with validation
    pub fn new(
        timestamp: DateTime<Utc>,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
    ) -> Result<Self, BarValidationError> {
        let bar = Self::new_unchecked(timestamp, open, high, low, close, volume);
        bar.validate()?;
        Ok(bar)
    }

    /// Create a bar without validation (validation happens before simulation anyway)
    pub fn new_unchecked(
        timestamp: DateTime<Utc>,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
    ) -> Self {
        Self {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// Bar where open == high == low == close
    pub fn flat(timestamp: DateTime<Utc>, price: f64) -> Self {
        Self::new_unchecked(timestamp, price, price, price, price, 0.0)
    }

    pub fn validate(&self) -> Result<(), BarValidationError> {
        let prices = [self.open, self.high, self.low, self.close];

        if prices.iter().any(|p| !p.is_finite()) {
            return Err(BarValidationError::NonFinitePrice {
                open: self.open,
                high: self.high,
                low: self.low,
                close: self.close,
            });
        }

        if prices.iter().any(|&p| p <= 0.0) {
            return Err(BarValidationError::NonPositivePrice {
                open: self.open,
                high: self.high,
                low: self.low,
                close: self.close,
            });
        }

        if self.high < self.low {
            return Err(BarValidationError::HighLessThanLow {
                high: self.high,
                low: self.low,
            });
        }

        if self.open < self.low || self.open > self.high {
            return Err(BarValidationError::OpenOutOfRange {
                open: self.open,
                low: self.low,
                high: self.high,
            });
        }

        if self.close < self.low || self.close > self.high {
            return Err(BarValidationError::CloseOutOfRange {
                close: self.close,
                low: self.low,
                high: self.high,
            });
        }

        if self.volume < 0.0 {
            return Err(BarValidationError::NegativeVolume(self.volume));
        }

        Ok(())
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }
}

/// Position direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Long,
    Short,
}

impl Side {
    /// Percentage return from `entry` to `exit`, positive when profitable for this side
    pub fn return_pct(self, entry: f64, exit: f64) -> f64 {
        let raw = (exit / entry - 1.0) * 100.0;
        match self {
            Side::Long => raw,
            Side::Short => -raw,
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Long => write!(f, "long"),
            Side::Short => write!(f, "short"),
        }
    }
}

/// Kind of externally detected signal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalKind {
    LongEntry,
    LongExit,
    ShortEntry,
    ShortExit,
}

impl SignalKind {
    pub fn entry(side: Side) -> Self {
        match side {
            Side::Long => SignalKind::LongEntry,
            Side::Short => SignalKind::ShortEntry,
        }
    }

    pub fn exit(side: Side) -> Self {
        match side {
            Side::Long => SignalKind::LongExit,
            Side::Short => SignalKind::ShortExit,
        }
    }
}

/// Timestamped entry/exit event produced by signal detection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalEvent {
    pub timestamp: DateTime<Utc>,
    pub price: f64,
    pub kind: SignalKind,
}

impl SignalEvent {
    pub fn new(timestamp: DateTime<Utc>, price: f64, kind: SignalKind) -> Self {
        Self {
            timestamp,
            price,
            kind,
        }
    }
}

/// The four ordered signal lists consumed by the simulator
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SignalSet {
    pub long_entry: Vec<SignalEvent>,
    pub long_exit: Vec<SignalEvent>,
    pub short_entry: Vec<SignalEvent>,
    pub short_exit: Vec<SignalEvent>,
}

impl SignalSet {
    pub fn len(&self) -> usize {
        self.long_entry.len() + self.long_exit.len() + self.short_entry.len() + self.short_exit.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = &SignalEvent> {
        self.long_entry
            .iter()
            .chain(&self.long_exit)
            .chain(&self.short_entry)
            .chain(&self.short_exit)
    }
}

/// One executed entry into a position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fill {
    pub timestamp: DateTime<Utc>,
    pub price: f64,
    pub capital: f64,
}

/// Why a position or hedge was closed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitReason {
    StopLoss,
    TakeProfit,
    Expired,
    ClosedWithPrimary,
    Upgraded,
    HedgeTakeProfit,
    HedgeStopLoss,
}

impl ExitReason {
    pub fn as_str(self) -> &'static str {
        match self {
            ExitReason::StopLoss => "stop_loss",
            ExitReason::TakeProfit => "take_profit",
            ExitReason::Expired => "expired",
            ExitReason::ClosedWithPrimary => "closed_with_primary",
            ExitReason::Upgraded => "upgraded",
            ExitReason::HedgeTakeProfit => "hedge_take_profit",
            ExitReason::HedgeStopLoss => "hedge_stop_loss",
        }
    }
}

impl std::fmt::Display for ExitReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Closed primary trade
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub side: Side,
    pub entry_timestamps: Vec<DateTime<Utc>>,
    pub entry_prices: Vec<f64>,
    pub average_price: f64,
    pub fill_count: usize,
    pub exit_timestamp: DateTime<Utc>,
    pub exit_price: f64,
    pub return_pct: f64,
    pub exit_reason: ExitReason,
}

impl Trade {
    pub fn is_win(&self) -> bool {
        self.return_pct > 0.0
    }

    /// Capital committed across all fills
    pub fn invested(&self, capital_per_fill: f64) -> f64 {
        self.fill_count as f64 * capital_per_fill
    }

    /// Capital-weighted profit in currency units
    pub fn profit(&self, capital_per_fill: f64) -> f64 {
        self.invested(capital_per_fill) * self.return_pct / 100.0
    }
}

/// Closed hedge (short overlay) trade
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HedgeTrade {
    pub entry_timestamp: DateTime<Utc>,
    pub entry_price: f64,
    pub exit_timestamp: DateTime<Utc>,
    pub exit_price: f64,
    pub return_pct: f64,
    pub exit_reason: ExitReason,
    pub invested_capital: f64,
    /// Primary fill count when this hedge was activated
    pub primary_fill_count: usize,
    /// Index into the primary trade list, None while the primary is still open
    pub primary_trade: Option<usize>,
}

impl HedgeTrade {
    pub fn is_win(&self) -> bool {
        self.return_pct > 0.0
    }

    pub fn profit(&self) -> f64 {
        self.invested_capital * self.return_pct / 100.0
    }
}

/// Still-open primary position at the end of the series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenPosition {
    pub side: Side,
    pub entry_timestamps: Vec<DateTime<Utc>>,
    pub entry_prices: Vec<f64>,
    pub average_price: f64,
    pub fill_count: usize,
    pub bars_held: usize,
    pub last_price: f64,
    pub unrealized_pct: f64,
}

/// Still-open hedge at the end of the series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenHedge {
    pub entry_timestamp: DateTime<Utc>,
    pub entry_price: f64,
    pub invested_capital: f64,
    pub primary_fill_count: usize,
    pub bars_held: usize,
    pub unrealized_pct: f64,
}
