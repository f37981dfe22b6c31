//! Agent domain: who a participant is and what it privately remembers.
//!
//! # Information boundary
//!
//! ```text
//!  AgentPersona ─┐
//!                ├─▶ prompt ◀── AgentVisibleContext (shared, from the event log)
//!  AgentPrivate ─┘
//!  Context (own memory only)
//! ```
//!
//! An agent's [`AgentPrivateContext`](memory::AgentPrivateContext) never leaves
//! its executor. What crosses the boundary is the public part of
//! [`IntentOutput`](output::IntentOutput) / [`SpeechOutput`](output::SpeechOutput),
//! recorded as events.

pub mod intent;
pub mod memory;
pub mod output;
pub mod persona;

pub use intent::{Intent, IntentKind, MAX_URGENCY, MIN_URGENCY, clamp_urgency};
pub use memory::{AgentPrivateContext, MemoryCategory, MemoryEntry, MemoryLimits, ShortTermMemory};
pub use output::{
    IntentOutput, OutputParseError, SpeechOutput, Tone, parse_intent_output, parse_speech_output,
};
pub use persona::{AgentPersona, SpeakingStyle};
