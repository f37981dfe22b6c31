//! Event log port
//!
//! The append-only, per-session ledger every discussion writes to.
//! Appends to one session are serialized by the discussion loop; appends to
//! different sessions may run concurrently.

use agora_domain::event::LedgerError;
use agora_domain::{Event, EventPage, EventType, NewEvent, PruneStrategy, SessionId};
use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EventLogError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Corrupt log: {0}")]
    Corrupt(#[from] LedgerError),
}

#[async_trait]
pub trait EventLog: Send + Sync {
    /// Assign the next sequence number and store the event.
    ///
    /// Unknown or cleared sessions are created on first append.
    async fn append(&self, session_id: &SessionId, event: NewEvent) -> Result<Event, EventLogError>;

    /// All retained events, ascending.
    async fn get_events(&self, session_id: &SessionId) -> Result<Vec<Event>, EventLogError>;

    async fn get_events_paginated(
        &self,
        session_id: &SessionId,
        offset: usize,
        limit: usize,
    ) -> Result<EventPage, EventLogError>;

    /// Events of the given types, ascending; with a limit, the most recent
    /// `limit` matches.
    async fn get_events_by_type(
        &self,
        session_id: &SessionId,
        types: &[EventType],
        limit: Option<usize>,
    ) -> Result<Vec<Event>, EventLogError>;

    /// The `n` most recent events, ascending.
    async fn get_latest_events(
        &self,
        session_id: &SessionId,
        n: usize,
    ) -> Result<Vec<Event>, EventLogError>;

    /// Events with `sequence > after`, ascending.
    async fn get_events_after(
        &self,
        session_id: &SessionId,
        after: u64,
    ) -> Result<Vec<Event>, EventLogError>;

    /// Drop events per `strategy`; returns how many were removed.
    async fn prune(
        &self,
        session_id: &SessionId,
        strategy: &PruneStrategy,
    ) -> Result<usize, EventLogError>;

    /// Forget a session entirely. The next append restarts at sequence 1.
    async fn clear(&self, session_id: &SessionId) -> Result<(), EventLogError>;
}
