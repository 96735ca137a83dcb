//! Simulation error types

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::types::{BarValidationError, SignalKind};

/// Precondition violations detected before (or while) running a simulation.
///
/// A simulation either completes with full results or fails with one of these;
/// partial results are never returned.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimulationError {
    #[error("bar series is empty")]
    EmptySeries,

    #[error("invalid bar at index {index} ({timestamp}): {source}")]
    InvalidBar {
        index: usize,
        timestamp: DateTime<Utc>,
        #[source]
        source: BarValidationError,
    },

    #[error("timestamps must be strictly increasing: bar {index} at {current} follows {previous}")]
    NonMonotonicTimestamp {
        index: usize,
        previous: DateTime<Utc>,
        current: DateTime<Utc>,
    },

    #[error("{kind:?} signal at {timestamp} has invalid price {price}")]
    InvalidSignalPrice {
        kind: SignalKind,
        timestamp: DateTime<Utc>,
        price: f64,
    },

    #[error("invalid parameter {name}: {reason}")]
    InvalidParameter { name: &'static str, reason: String },
}
