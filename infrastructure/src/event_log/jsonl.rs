//! Durable event log mirrored to JSONL files.
//!
//! Each session is written to `<dir>/<session>.events.jsonl` (the id
//! percent-encoded where it is not file-name safe), one [`Event`]
//! per line in sequence order. The file is the full append history: pruning
//! only affects what reads return, clearing deletes the file.

use super::in_memory::InMemoryEventLog;
use agora_application::{EventLog, EventLogError};
use agora_domain::{Event, EventPage, EventType, NewEvent, PruneStrategy, SessionId, SessionLedger};
use async_trait::async_trait;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, info, warn};

const FILE_SUFFIX: &str = ".events.jsonl";

/// JSONL-backed event log.
///
/// An append is written and flushed before it is committed to the
/// in-memory view, so reads never return an event the file does not hold.
pub struct JsonlEventLog {
    dir: PathBuf,
    memory: InMemoryEventLog,
    writers: Mutex<HashMap<SessionId, BufWriter<File>>>,
}

impl JsonlEventLog {
    /// Open `dir`, creating it if needed, and replay every session file in it.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, EventLogError> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir)?;

        let memory = InMemoryEventLog::new();
        let mut replayed = 0;
        for entry in std::fs::read_dir(&dir)? {
            let path = entry?.path();
            let is_log = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.ends_with(FILE_SUFFIX));
            if !is_log {
                continue;
            }
            if let Some(ledger) = Self::replay(&path)? {
                debug!(
                    session_id = %ledger.session_id(),
                    events = ledger.len(),
                    "Replayed session"
                );
                memory.insert_ledger(ledger)?;
                replayed += 1;
            }
        }
        info!(dir = %dir.display(), sessions = replayed, "Event log opened");

        Ok(Self {
            dir,
            memory,
            writers: Mutex::new(HashMap::new()),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file backing `session_id`.
    pub fn session_path(&self, session_id: &SessionId) -> PathBuf {
        self.dir.join(format!("{}{FILE_SUFFIX}", file_stem(session_id)))
    }

    fn replay(path: &Path) -> Result<Option<SessionLedger>, EventLogError> {
        let reader = BufReader::new(File::open(path)?);
        let mut ledger: Option<SessionLedger> = None;
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let event: Event = serde_json::from_str(&line)?;
            ledger
                .get_or_insert_with(|| SessionLedger::new(event.session_id.clone()))
                .restore(event)?;
        }
        Ok(ledger)
    }

    /// Write one event line and flush it. On failure the writer is dropped
    /// with its buffer discarded and the file is truncated back to its last
    /// complete line, so the next append starts clean.
    fn write_line(
        &self,
        writers: &mut HashMap<SessionId, BufWriter<File>>,
        event: &Event,
    ) -> Result<(), EventLogError> {
        let mut line = serde_json::to_string(event)?;
        line.push('\n');

        let session_id = &event.session_id;
        let writer = match writers.entry(session_id.clone()) {
            Entry::Occupied(e) => e.into_mut(),
            Entry::Vacant(e) => {
                let file = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(self.session_path(session_id))?;
                e.insert(BufWriter::new(file))
            }
        };
        let committed_len = writer.get_ref().metadata()?.len();

        if let Err(e) = writer.write_all(line.as_bytes()).and_then(|()| writer.flush()) {
            if let Some(writer) = writers.remove(session_id) {
                let (file, _unwritten) = writer.into_parts();
                if let Err(truncate) = file.set_len(committed_len) {
                    warn!(
                        session_id = %session_id,
                        error = %truncate,
                        "Could not truncate partial event line"
                    );
                }
            }
            return Err(e.into());
        }
        Ok(())
    }

    fn lock_writers(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, HashMap<SessionId, BufWriter<File>>>, EventLogError> {
        self.writers
            .lock()
            .map_err(|_| EventLogError::Storage("event log writer lock poisoned".into()))
    }
}

/// Session ids become file names. Bytes outside `[A-Za-z0-9._-]` are
/// percent-encoded, so distinct ids never share a file.
fn file_stem(session_id: &SessionId) -> String {
    let mut stem = String::with_capacity(session_id.as_str().len());
    for byte in session_id.as_str().bytes() {
        if byte.is_ascii_alphanumeric() || matches!(byte, b'.' | b'_' | b'-') {
            stem.push(char::from(byte));
        } else {
            stem.push_str(&format!("%{byte:02X}"));
        }
    }
    stem
}

#[async_trait]
impl EventLog for JsonlEventLog {
    async fn append(
        &self,
        session_id: &SessionId,
        event: NewEvent,
    ) -> Result<Event, EventLogError> {
        // the writer lock orders file lines exactly like sequence numbers
        let mut writers = self.lock_writers()?;
        self.memory
            .append_with(session_id, event, |stored| self.write_line(&mut writers, stored))
    }

    async fn get_events(&self, session_id: &SessionId) -> Result<Vec<Event>, EventLogError> {
        self.memory.get_events(session_id).await
    }

    async fn get_events_paginated(
        &self,
        session_id: &SessionId,
        offset: usize,
        limit: usize,
    ) -> Result<EventPage, EventLogError> {
        self.memory.get_events_paginated(session_id, offset, limit).await
    }

    async fn get_events_by_type(
        &self,
        session_id: &SessionId,
        types: &[EventType],
        limit: Option<usize>,
    ) -> Result<Vec<Event>, EventLogError> {
        self.memory.get_events_by_type(session_id, types, limit).await
    }

    async fn get_latest_events(
        &self,
        session_id: &SessionId,
        n: usize,
    ) -> Result<Vec<Event>, EventLogError> {
        self.memory.get_latest_events(session_id, n).await
    }

    async fn get_events_after(
        &self,
        session_id: &SessionId,
        after: u64,
    ) -> Result<Vec<Event>, EventLogError> {
        self.memory.get_events_after(session_id, after).await
    }

    async fn prune(
        &self,
        session_id: &SessionId,
        strategy: &PruneStrategy,
    ) -> Result<usize, EventLogError> {
        self.memory.prune(session_id, strategy).await
    }

    async fn clear(&self, session_id: &SessionId) -> Result<(), EventLogError> {
        let mut writers = self.lock_writers()?;
        writers.remove(session_id);
        self.memory.remove(session_id)?;
        match std::fs::remove_file(self.session_path(session_id)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

impl Drop for JsonlEventLog {
    fn drop(&mut self) {
        if let Ok(mut writers) = self.writers.lock() {
            for writer in writers.values_mut() {
                let _ = writer.flush();
            }
        }
    }
}
