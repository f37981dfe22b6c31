//! Pruning strategies that bound how much history downstream consumers see.

use super::entities::{Event, EventType};
use serde::{Deserialize, Serialize};

/// How to thin out a session's events.
///
/// Strategies only select; retained events keep their original order and
/// sequence numbers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "strategy", content = "value", rename_all = "snake_case")]
pub enum PruneStrategy {
    /// Keep only the last N events.
    KeepLast(usize),
    /// Keep only events of the listed types.
    KeepTypes(Vec<EventType>),
    /// Keep only events whose sequence is strictly below the given value.
    KeepBefore(u64),
}

impl PruneStrategy {
    pub fn retain(&self, events: &[Event]) -> Vec<Event> {
        match self {
            PruneStrategy::KeepLast(n) => {
                let start = events.len().saturating_sub(*n);
                events[start..].to_vec()
            }
            PruneStrategy::KeepTypes(types) => events
                .iter()
                .filter(|e| types.contains(&e.event_type))
                .cloned()
                .collect(),
            PruneStrategy::KeepBefore(sequence) => events
                .iter()
                .filter(|e| e.sequence < *sequence)
                .cloned()
                .collect(),
        }
    }
}
