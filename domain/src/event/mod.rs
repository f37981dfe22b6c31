//! Event log domain.
//!
//! Every action in a discussion is recorded as an immutable [`Event`] in a
//! per-session [`SessionLedger`]. The ledger is the only channel through which
//! information crosses agent boundaries, and its `sequence` numbers are the
//! sole ordering authority within a session.
//!
//! ```text
//! NewEvent ──append──▶ SessionLedger ──▶ Event { sequence: 1, 2, 3, ... }
//!                            │
//!                            ├── page / by_type / latest / after   (reads)
//!                            └── prune(PruneStrategy)              (never renumbers)
//! ```

pub mod entities;
pub mod ledger;
pub mod pruning;

pub use entities::{Event, EventContent, EventMeta, EventType, NewEvent, Speaker, SystemKind};
pub use ledger::{EventPage, LedgerError, SEQUENCE_ORIGIN, SessionLedger, Staged};
pub use pruning::PruneStrategy;
