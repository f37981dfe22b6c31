//! Event log adapters
//!
//! - [`InMemoryEventLog`]: per-session ledgers kept in process memory
//! - [`JsonlEventLog`]: the same ledgers mirrored to one JSONL file per
//!   session, replayed on [`JsonlEventLog::open`]

mod in_memory;
mod jsonl;

pub use in_memory::InMemoryEventLog;
pub use jsonl::JsonlEventLog;
