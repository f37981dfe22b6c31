//! In-process event log.

use agora_application::{EventLog, EventLogError};
use agora_domain::event::Staged;
use agora_domain::{Event, EventPage, EventType, NewEvent, PruneStrategy, SessionId, SessionLedger};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Event log holding one [`SessionLedger`] per session.
///
/// Sessions are created on first append; reads of unknown sessions return
/// empty results.
#[derive(Default)]
pub struct InMemoryEventLog {
    ledgers: RwLock<HashMap<SessionId, SessionLedger>>,
}

impl InMemoryEventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn session_ids(&self) -> Result<Vec<SessionId>, EventLogError> {
        let mut ids: Vec<SessionId> = self.read()?.keys().cloned().collect();
        ids.sort();
        Ok(ids)
    }

    /// Append through `persist`, which sees a new event before it is
    /// committed. If `persist` fails the ledger is left untouched, so an
    /// unknown session is not created and no sequence number is consumed.
    /// A repeated `event_id` returns the stored event without calling it.
    pub(crate) fn append_with(
        &self,
        session_id: &SessionId,
        event: NewEvent,
        persist: impl FnOnce(&Event) -> Result<(), EventLogError>,
    ) -> Result<Event, EventLogError> {
        let mut ledgers = self.write()?;
        let staged = match ledgers.get(session_id) {
            Some(ledger) => ledger.stage(event),
            None => SessionLedger::new(session_id.clone()).stage(event),
        };
        match staged {
            Staged::Existing(stored) => Ok(stored),
            Staged::Fresh(stored) => {
                persist(&stored)?;
                ledgers
                    .entry(session_id.clone())
                    .or_insert_with(|| SessionLedger::new(session_id.clone()))
                    .restore(stored.clone())?;
                Ok(stored)
            }
        }
    }

    pub(crate) fn insert_ledger(&self, ledger: SessionLedger) -> Result<(), EventLogError> {
        self.write()?.insert(ledger.session_id().clone(), ledger);
        Ok(())
    }

    pub(crate) fn remove(&self, session_id: &SessionId) -> Result<(), EventLogError> {
        self.write()?.remove(session_id);
        Ok(())
    }

    fn read(
        &self,
    ) -> Result<RwLockReadGuard<'_, HashMap<SessionId, SessionLedger>>, EventLogError> {
        self.ledgers
            .read()
            .map_err(|_| EventLogError::Storage("event log lock poisoned".into()))
    }

    fn write(
        &self,
    ) -> Result<RwLockWriteGuard<'_, HashMap<SessionId, SessionLedger>>, EventLogError> {
        self.ledgers
            .write()
            .map_err(|_| EventLogError::Storage("event log lock poisoned".into()))
    }

    fn with_ledger<T>(
        &self,
        session_id: &SessionId,
        f: impl FnOnce(&SessionLedger) -> T,
        empty: impl FnOnce() -> T,
    ) -> Result<T, EventLogError> {
        Ok(self.read()?.get(session_id).map_or_else(empty, f))
    }
}

#[async_trait]
impl EventLog for InMemoryEventLog {
    async fn append(
        &self,
        session_id: &SessionId,
        event: NewEvent,
    ) -> Result<Event, EventLogError> {
        self.append_with(session_id, event, |_| Ok(()))
    }

    async fn get_events(&self, session_id: &SessionId) -> Result<Vec<Event>, EventLogError> {
        self.with_ledger(session_id, |l| l.events().to_vec(), Vec::new)
    }

    async fn get_events_paginated(
        &self,
        session_id: &SessionId,
        offset: usize,
        limit: usize,
    ) -> Result<EventPage, EventLogError> {
        self.with_ledger(
            session_id,
            |l| l.page(offset, limit),
            || EventPage {
                events: Vec::new(),
                total: 0,
                has_more: false,
            },
        )
    }

    async fn get_events_by_type(
        &self,
        session_id: &SessionId,
        types: &[EventType],
        limit: Option<usize>,
    ) -> Result<Vec<Event>, EventLogError> {
        self.with_ledger(session_id, |l| l.by_type(types, limit), Vec::new)
    }

    async fn get_latest_events(
        &self,
        session_id: &SessionId,
        n: usize,
    ) -> Result<Vec<Event>, EventLogError> {
        self.with_ledger(session_id, |l| l.latest(n), Vec::new)
    }

    async fn get_events_after(
        &self,
        session_id: &SessionId,
        after: u64,
    ) -> Result<Vec<Event>, EventLogError> {
        self.with_ledger(session_id, |l| l.after(after), Vec::new)
    }

    async fn prune(
        &self,
        session_id: &SessionId,
        strategy: &PruneStrategy,
    ) -> Result<usize, EventLogError> {
        Ok(self
            .write()?
            .get_mut(session_id)
            .map(|l| l.prune(strategy))
            .unwrap_or(0))
    }

    async fn clear(&self, session_id: &SessionId) -> Result<(), EventLogError> {
        self.remove(session_id)
    }
}
