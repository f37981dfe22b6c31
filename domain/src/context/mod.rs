//! What an agent is allowed to see.
//!
//! [`AgentVisibleContext`] is the only input an agent prompt may be built
//! from besides the agent's own persona and memory. It is derived solely
//! from the public event log, after [`redaction`] removed anything that
//! looks like private reasoning.

pub mod redaction;
pub mod visible;

pub use redaction::{
    CondensedEvent, condense_events, contains_internal_thought_marker, strip_internal_thoughts,
};
pub use visible::{
    AgentVisibleContext, ParticipantInfo, PhaseDescriptor, VisibleEvent, relative_time,
};
