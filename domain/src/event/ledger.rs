//! Per-session append-only ledger.

use super::entities::{Event, EventType, NewEvent};
use super::pruning::PruneStrategy;
use crate::core::ids::{EventId, SessionId};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// First sequence number assigned in every session.
pub const SEQUENCE_ORIGIN: u64 = 1;

/// Errors raised when restoring a ledger from previously stored events.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LedgerError {
    #[error("Event belongs to session {found}, expected {expected}")]
    SessionMismatch { expected: SessionId, found: SessionId },

    #[error("Sequence gap: expected {expected}, found {found}")]
    SequenceGap { expected: u64, found: u64 },
}

/// One page of events returned by [`SessionLedger::page`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventPage {
    pub events: Vec<Event>,
    /// Number of events currently retained in the session.
    pub total: usize,
    pub has_more: bool,
}

/// Result of [`SessionLedger::stage`].
#[derive(Debug, Clone, PartialEq)]
pub enum Staged {
    /// The `event_id` is already retained; nothing needs storing.
    Existing(Event),
    /// A new event holding the next sequence number, not yet committed.
    Fresh(Event),
}

/// Ordered, append-only record of a single session.
///
/// The ledger assigns `sequence` numbers starting at [`SEQUENCE_ORIGIN`] and
/// increasing by exactly one per append. Pruning drops events but never
/// renumbers the survivors; the next append continues where the counter left
/// off.
#[derive(Debug, Clone)]
pub struct SessionLedger {
    session_id: SessionId,
    events: Vec<Event>,
    next_sequence: u64,
}

impl SessionLedger {
    pub fn new(session_id: SessionId) -> Self {
        Self {
            session_id,
            events: Vec::new(),
            next_sequence: SEQUENCE_ORIGIN,
        }
    }

    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    /// Sequence number the next appended event will receive.
    pub fn next_sequence(&self) -> u64 {
        self.next_sequence
    }

    /// Append an event and return the stored copy.
    ///
    /// Appending an `event_id` that is already retained returns the stored
    /// event unchanged and consumes no sequence number.
    pub fn append(&mut self, new: NewEvent) -> Event {
        match self.stage(new) {
            Staged::Existing(event) => event,
            Staged::Fresh(event) => {
                self.next_sequence += 1;
                self.events.push(event.clone());
                event
            }
        }
    }

    /// Build the event [`append`](Self::append) would store without storing
    /// it. A [`Staged::Fresh`] event is committed with
    /// [`restore`](Self::restore), which lets a durable adapter persist it
    /// first and leave the ledger untouched when that fails.
    pub fn stage(&self, new: NewEvent) -> Staged {
        if let Some(id) = &new.event_id
            && let Some(existing) = self.find(id)
        {
            return Staged::Existing(existing.clone());
        }

        Staged::Fresh(Event {
            event_id: new.event_id.unwrap_or_else(EventId::generate),
            event_type: new.event_type,
            speaker: new.speaker,
            content: new.content,
            timestamp: new.timestamp.unwrap_or_else(Utc::now),
            session_id: self.session_id.clone(),
            sequence: self.next_sequence,
            meta: new.meta,
        })
    }

    /// Re-insert an event that was previously assigned a sequence number,
    /// e.g. when replaying a durable log on startup.
    pub fn restore(&mut self, event: Event) -> Result<(), LedgerError> {
        if event.session_id != self.session_id {
            return Err(LedgerError::SessionMismatch {
                expected: self.session_id.clone(),
                found: event.session_id,
            });
        }
        if event.sequence != self.next_sequence {
            return Err(LedgerError::SequenceGap {
                expected: self.next_sequence,
                found: event.sequence,
            });
        }
        self.next_sequence += 1;
        self.events.push(event);
        Ok(())
    }

    pub fn find(&self, event_id: &EventId) -> Option<&Event> {
        self.events.iter().rev().find(|e| &e.event_id == event_id)
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn page(&self, offset: usize, limit: usize) -> EventPage {
        let total = self.events.len();
        let events: Vec<Event> = self.events.iter().skip(offset).take(limit).cloned().collect();
        let has_more = offset.saturating_add(events.len()) < total;
        EventPage {
            events,
            total,
            has_more,
        }
    }

    /// Events of the given types in ascending order. With a `limit`, only
    /// the most recent `limit` matches are returned.
    pub fn by_type(&self, types: &[EventType], limit: Option<usize>) -> Vec<Event> {
        let matching = self.events.iter().filter(|e| types.contains(&e.event_type));
        match limit {
            Some(n) => {
                let mut recent: Vec<Event> = matching.rev().take(n).cloned().collect();
                recent.reverse();
                recent
            }
            None => matching.cloned().collect(),
        }
    }

    /// The last `n` events in ascending order.
    pub fn latest(&self, n: usize) -> Vec<Event> {
        let start = self.events.len().saturating_sub(n);
        self.events[start..].to_vec()
    }

    /// Events with a sequence strictly greater than `sequence`.
    pub fn after(&self, sequence: u64) -> Vec<Event> {
        let start = self.events.partition_point(|e| e.sequence <= sequence);
        self.events[start..].to_vec()
    }

    /// Drop events not kept by `strategy`; returns how many were removed.
    pub fn prune(&mut self, strategy: &PruneStrategy) -> usize {
        let before = self.events.len();
        self.events = strategy.retain(&self.events);
        before - self.events.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ids::AgentId;
    use crate::event::entities::Speaker;

    fn ledger_with(n: usize) -> SessionLedger {
        let mut ledger = SessionLedger::new(SessionId::new("s1"));
        for i in 0..n {
            ledger.append(NewEvent::speech(AgentId::new("alice"), format!("msg {i}")));
        }
        ledger
    }

    #[test]
    fn test_sequences_are_contiguous_from_origin() {
        let ledger = ledger_with(5);
        let sequences: Vec<u64> = ledger.events().iter().map(|e| e.sequence).collect();
        assert_eq!(sequences, vec![1, 2, 3, 4, 5]);
        assert_eq!(ledger.next_sequence(), 6);
    }

    #[test]
    fn test_append_is_idempotent_on_event_id() {
        let mut ledger = ledger_with(1);
        let id = EventId::new("fixed");
        let first =
            ledger.append(NewEvent::speech(AgentId::new("bob"), "once").with_id(id.clone()));
        let second =
            ledger.append(NewEvent::speech(AgentId::new("bob"), "twice").with_id(id.clone()));
        assert_eq!(first, second);
        assert_eq!(ledger.len(), 2);
        assert_eq!(ledger.next_sequence(), 3);
    }

    #[test]
    fn test_page() {
        let ledger = ledger_with(5);
        let page = ledger.page(1, 2);
        assert_eq!(page.total, 5);
        assert!(page.has_more);
        assert_eq!(page.events[0].sequence, 2);
        assert_eq!(page.events[1].sequence, 3);

        let last = ledger.page(4, 10);
        assert_eq!(last.events.len(), 1);
        assert!(!last.has_more);

        let beyond = ledger.page(10, 10);
        assert!(beyond.events.is_empty());
        assert!(!beyond.has_more);
    }

    #[test]
    fn test_by_type_with_limit_returns_most_recent_ascending() {
        let mut ledger = SessionLedger::new(SessionId::new("s1"));
        ledger.append(NewEvent::speech(AgentId::new("a"), "1"));
        ledger.append(NewEvent::vote_end(AgentId::new("a")));
        ledger.append(NewEvent::speech(AgentId::new("b"), "2"));
        ledger.append(NewEvent::speech(AgentId::new("c"), "3"));

        let speeches = ledger.by_type(&[EventType::Speech], Some(2));
        let seqs: Vec<u64> = speeches.iter().map(|e| e.sequence).collect();
        assert_eq!(seqs, vec![3, 4]);

        let all = ledger.by_type(&[EventType::Speech, EventType::Vote], None);
        assert_eq!(all.len(), 4);
    }

    #[test]
    fn test_latest_and_after() {
        let ledger = ledger_with(5);
        let latest: Vec<u64> = ledger.latest(2).iter().map(|e| e.sequence).collect();
        assert_eq!(latest, vec![4, 5]);
        assert_eq!(ledger.latest(50).len(), 5);

        let after: Vec<u64> = ledger.after(3).iter().map(|e| e.sequence).collect();
        assert_eq!(after, vec![4, 5]);
        assert!(ledger.after(5).is_empty());
    }

    #[test]
    fn test_empty_reads_are_empty_not_missing() {
        let ledger = SessionLedger::new(SessionId::new("empty"));
        assert!(ledger.events().is_empty());
        assert!(ledger.latest(3).is_empty());
        assert!(ledger.after(0).is_empty());
        assert!(ledger.by_type(&[EventType::Speech], None).is_empty());
    }

    #[test]
    fn test_prune_keeps_numbering_and_next_append_continues() {
        let mut ledger = ledger_with(5);
        let removed = ledger.prune(&PruneStrategy::KeepLast(2));
        assert_eq!(removed, 3);
        let seqs: Vec<u64> = ledger.events().iter().map(|e| e.sequence).collect();
        assert_eq!(seqs, vec![4, 5]);

        let next = ledger.append(NewEvent::new(EventType::System, Speaker::System, "after prune"));
        assert_eq!(next.sequence, 6);
    }

    #[test]
    fn test_restore_rejects_gaps_and_foreign_sessions() {
        let source = ledger_with(3);
        let mut restored = SessionLedger::new(SessionId::new("s1"));
        restored.restore(source.events()[0].clone()).unwrap();
        assert_eq!(
            restored.restore(source.events()[2].clone()),
            Err(LedgerError::SequenceGap {
                expected: 2,
                found: 3
            })
        );

        let mut other = SessionLedger::new(SessionId::new("s2"));
        assert!(matches!(
            other.restore(source.events()[0].clone()),
            Err(LedgerError::SessionMismatch { .. })
        ));
    }

    #[test]
    fn test_stage_does_not_consume_a_sequence_until_restored() {
        let mut ledger = ledger_with(2);
        let new = NewEvent::new(EventType::System, Speaker::System, "x");
        let Staged::Fresh(staged) = ledger.stage(new) else {
            panic!("expected a fresh event");
        };
        assert_eq!(staged.sequence, 3);
        assert_eq!(ledger.next_sequence(), 3);
        assert_eq!(ledger.len(), 2);

        ledger.restore(staged.clone()).unwrap();
        assert_eq!(ledger.events().last(), Some(&staged));

        let again = NewEvent::new(EventType::System, Speaker::System, "x")
            .with_id(staged.event_id.clone());
        assert_eq!(ledger.stage(again), Staged::Existing(staged));
    }
}
