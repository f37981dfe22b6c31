//! Domain layer for agora
//!
//! Pure types and pure logic of a moderated multi-agent discussion. No I/O,
//! no async, no knowledge of LLM backends or storage.
//!
//! # Core Concepts
//!
//! ## Event log
//!
//! Every action in a session is an immutable [`Event`] with a strictly
//! increasing `sequence`. The log is the only channel through which
//! information crosses agent boundaries.
//!
//! ## Isolation
//!
//! An agent builds prompts from its [`AgentPersona`], its own
//! [`AgentPrivateContext`] and an [`AgentVisibleContext`]. Private
//! reasoning never reaches the log.
//!
//! ## Moderation
//!
//! [`ModeratorController::decide`] turns (state, intents, recent events)
//! into exactly one [`Decision`]. It is a pure function.

pub mod agent;
pub mod context;
pub mod core;
pub mod event;
pub mod moderator;
pub mod parsing;
pub mod prompt;
pub mod scenario;
pub mod session;

pub use agent::{
    AgentPersona, AgentPrivateContext, Intent, IntentKind, IntentOutput, MemoryCategory,
    MemoryEntry, MemoryLimits, OutputParseError, ShortTermMemory, SpeakingStyle, SpeechOutput, Tone,
};
pub use context::{
    AgentVisibleContext, CondensedEvent, ParticipantInfo, PhaseDescriptor, VisibleEvent,
};
pub use core::{
    error::DomainError,
    ids::{AgentId, EventId, SessionId},
    output_format::OutputFormat,
};
pub use event::{
    Event, EventContent, EventMeta, EventPage, EventType, NewEvent, PruneStrategy, SEQUENCE_ORIGIN,
    SessionLedger, Speaker, SystemKind,
};
pub use moderator::{Decision, DecisionError, EndReason, ModeratorController, ModeratorState};
pub use prompt::{AgentPromptTemplate, ModeratorPromptTemplate};
pub use scenario::{EndConditions, PhaseConfig, PhaseType, ScenarioConfig};
pub use session::{
    ChatMessage, Completion, CompletionOptions, FinishReason, Role, StreamEvent, TokenUsage,
};
