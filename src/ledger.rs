//! Position ledger
//!
//! Tracks the single open primary position and its fills. Every fill commits the
//! same nominal capital, so the cost basis is the capital-weighted average
//! `Σc / Σ(c/p)` rather than the arithmetic mean of fill prices.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{Fill, Side};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("a {0} position is already open")]
    AlreadyOpen(Side),

    #[error("no position is open")]
    NotOpen,
}

/// Capital-weighted average price of a set of fills.
///
/// Returns `None` for an empty slice.
pub fn capital_weighted_average(fills: &[Fill]) -> Option<f64> {
    if fills.is_empty() {
        return None;
    }
    let capital: f64 = fills.iter().map(|f| f.capital).sum();
    let quantity: f64 = fills.iter().map(|f| f.capital / f.price).sum();
    Some(capital / quantity)
}

/// Open position state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub side: Side,
    pub fills: Vec<Fill>,
    pub opened_at: DateTime<Utc>,
    /// Bar index the position was opened on, used for holding-period checks
    pub opened_index: usize,
}

impl Position {
    pub fn fill_count(&self) -> usize {
        self.fills.len()
    }

    pub fn average_price(&self) -> f64 {
        // fills is never empty while a Position exists
        capital_weighted_average(&self.fills).unwrap_or(f64::NAN)
    }

    pub fn invested(&self) -> f64 {
        self.fills.iter().map(|f| f.capital).sum()
    }

    pub fn bars_held(&self, current_index: usize) -> usize {
        current_index.saturating_sub(self.opened_index)
    }
}

/// Outcome of an averaging attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillOutcome {
    Added { fill_count: usize },
    CapReached { fill_count: usize },
}

/// Ledger holding at most one open position
#[derive(Debug, Clone)]
pub struct PositionLedger {
    position: Option<Position>,
    capital_per_fill: f64,
    max_short_fills: usize,
}

impl PositionLedger {
    pub fn new(capital_per_fill: f64, max_short_fills: usize) -> Self {
        PositionLedger {
            position: None,
            capital_per_fill,
            max_short_fills,
        }
    }

    pub fn is_open(&self) -> bool {
        self.position.is_some()
    }

    pub fn position(&self) -> Option<&Position> {
        self.position.as_ref()
    }

    pub fn side(&self) -> Option<Side> {
        self.position.as_ref().map(|p| p.side)
    }

    pub fn fill_count(&self) -> usize {
        self.position.as_ref().map_or(0, |p| p.fills.len())
    }

    /// Open a new position with its first fill
    pub fn open(
        &mut self,
        side: Side,
        timestamp: DateTime<Utc>,
        price: f64,
        bar_index: usize,
    ) -> Result<(), LedgerError> {
        if let Some(pos) = &self.position {
            return Err(LedgerError::AlreadyOpen(pos.side));
        }
        self.position = Some(Position {
            side,
            fills: vec![Fill {
                timestamp,
                price,
                capital: self.capital_per_fill,
            }],
            opened_at: timestamp,
            opened_index: bar_index,
        });
        Ok(())
    }

    /// Average into the open position.
    ///
    /// Long positions accept unlimited fills; short positions stop accepting
    /// once `max_short_fills` is reached.
    pub fn add_fill(
        &mut self,
        timestamp: DateTime<Utc>,
        price: f64,
    ) -> Result<FillOutcome, LedgerError> {
        let capital = self.capital_per_fill;
        let max_short_fills = self.max_short_fills;
        let pos = self.position.as_mut().ok_or(LedgerError::NotOpen)?;

        if pos.side == Side::Short && pos.fills.len() >= max_short_fills {
            return Ok(FillOutcome::CapReached {
                fill_count: pos.fills.len(),
            });
        }

        pos.fills.push(Fill {
            timestamp,
            price,
            capital,
        });
        Ok(FillOutcome::Added {
            fill_count: pos.fills.len(),
        })
    }

    pub fn average_price(&self) -> Option<f64> {
        self.position
            .as_ref()
            .and_then(|p| capital_weighted_average(&p.fills))
    }

    /// Close the position, handing back its fills
    pub fn close(&mut self) -> Option<Position> {
        self.position.take()
    }
}
