//! Timestamp-keyed signal lookup
//!
//! Signals are resolved once against the bar series so the simulator can ask
//! "is there a long exit on this bar?" in O(1). Keys are the timestamps of the
//! bars the signals resolve to, not the raw signal timestamps.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::SimulationError;
use crate::types::{Bar, SignalEvent, SignalKind, SignalSet, Side};

/// How a signal timestamp is matched to a bar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LookupPolicy {
    /// Only a bar with exactly the signal's timestamp matches
    Exact,
    /// Exact match, else the latest bar at or before the signal timestamp
    #[default]
    NearestPrior,
}

/// Resolve a timestamp to a bar index.
///
/// Exact match first; under [`LookupPolicy::NearestPrior`] falls back to the
/// latest bar strictly before `timestamp`. `None` means the signal is discarded.
/// `bars` must be sorted by timestamp.
pub fn resolve_bar_index(
    bars: &[Bar],
    timestamp: DateTime<Utc>,
    policy: LookupPolicy,
) -> Option<usize> {
    match bars.binary_search_by(|b| b.timestamp.cmp(&timestamp)) {
        Ok(idx) => Some(idx),
        Err(insert_at) => match policy {
            LookupPolicy::Exact => None,
            LookupPolicy::NearestPrior => insert_at.checked_sub(1),
        },
    }
}

/// Four timestamp → event maps, one per [`SignalKind`].
///
/// At most one event of a kind is kept per bar. When several signals of the
/// same kind resolve to the same bar, the last one in list order wins.
#[derive(Debug, Clone, Default)]
pub struct SignalIndex {
    long_entry: HashMap<DateTime<Utc>, SignalEvent>,
    long_exit: HashMap<DateTime<Utc>, SignalEvent>,
    short_entry: HashMap<DateTime<Utc>, SignalEvent>,
    short_exit: HashMap<DateTime<Utc>, SignalEvent>,
    discarded: usize,
}

impl SignalIndex {
    pub fn build(
        bars: &[Bar],
        signals: &SignalSet,
        policy: LookupPolicy,
    ) -> Result<Self, SimulationError> {
        let mut index = SignalIndex::default();

        for event in signals.iter() {
            if !event.price.is_finite() || event.price <= 0.0 {
                return Err(SimulationError::InvalidSignalPrice {
                    kind: event.kind,
                    timestamp: event.timestamp,
                    price: event.price,
                });
            }

            match resolve_bar_index(bars, event.timestamp, policy) {
                Some(idx) => {
                    let key = bars[idx].timestamp;
                    index.map_mut(event.kind).insert(key, event.clone());
                }
                None => index.discarded += 1,
            }
        }

        debug!(
            long_entry = index.long_entry.len(),
            long_exit = index.long_exit.len(),
            short_entry = index.short_entry.len(),
            short_exit = index.short_exit.len(),
            discarded = index.discarded,
            "Signal index built"
        );

        Ok(index)
    }

    fn map(&self, kind: SignalKind) -> &HashMap<DateTime<Utc>, SignalEvent> {
        match kind {
            SignalKind::LongEntry => &self.long_entry,
            SignalKind::LongExit => &self.long_exit,
            SignalKind::ShortEntry => &self.short_entry,
            SignalKind::ShortExit => &self.short_exit,
        }
    }

    fn map_mut(&mut self, kind: SignalKind) -> &mut HashMap<DateTime<Utc>, SignalEvent> {
        match kind {
            SignalKind::LongEntry => &mut self.long_entry,
            SignalKind::LongExit => &mut self.long_exit,
            SignalKind::ShortEntry => &mut self.short_entry,
            SignalKind::ShortExit => &mut self.short_exit,
        }
    }

    pub fn get(&self, kind: SignalKind, timestamp: DateTime<Utc>) -> Option<&SignalEvent> {
        self.map(kind).get(&timestamp)
    }

    /// Entry signal on this bar; long wins when both sides fire
    pub fn entry_at(&self, timestamp: DateTime<Utc>) -> Option<(Side, &SignalEvent)> {
        self.get(SignalKind::LongEntry, timestamp)
            .map(|e| (Side::Long, e))
            .or_else(|| {
                self.get(SignalKind::ShortEntry, timestamp)
                    .map(|e| (Side::Short, e))
            })
    }

    pub fn len(&self) -> usize {
        self.long_entry.len() + self.long_exit.len() + self.short_entry.len() + self.short_exit.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Signals that matched no bar
    pub fn discarded(&self) -> usize {
        self.discarded
    }
}
