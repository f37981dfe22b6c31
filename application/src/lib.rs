//! Application layer for agora
//!
//! This crate contains use cases, port definitions, and application configuration.
//! It depends only on the domain layer.

pub mod config;
pub mod ports;
pub mod use_cases;

// Re-export commonly used types
pub use config::DiscussionParams;
pub use ports::{
    event_log::{EventLog, EventLogError},
    launcher::{DiscussionLauncher, LaunchError},
    llm_client::{GatewayError, LlmClient, StreamHandle},
    progress::{DiscussionProgressNotifier, NoProgress},
};
pub use use_cases::agent_executor::{AgentError, AgentExecutor, GeneratedSpeech};
pub use use_cases::agent_service::{AgentExecutorService, AgentServiceError, CollectedIntent};
pub use use_cases::launcher::SessionLauncher;
pub use use_cases::moderator_language::{LanguageError, ModeratorLanguageGenerator};
pub use use_cases::run_discussion::{
    DiscussionOutcome, FailedStep, ParticipantSpec, RunDiscussionError, RunDiscussionInput,
    RunDiscussionUseCase,
};
