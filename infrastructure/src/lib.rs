//! Infrastructure layer for agora
//!
//! This crate contains adapters that implement the ports defined
//! in the application layer: event log storage, LLM clients and
//! configuration file loading.

pub mod config;
pub mod event_log;
pub mod providers;

// Re-export commonly used types
pub use config::{
    ConfigLoader, ConfigValidationError, FileAgentConfig, FileConfig, FileDiscussionConfig,
    FileLoggingConfig, FileMemoryConfig, FileOutputConfig, FileProviderConfig, ProviderKind,
};
pub use event_log::{InMemoryEventLog, JsonlEventLog};
#[cfg(feature = "http-provider")]
pub use providers::OpenAiCompatibleClient;
pub use providers::ScriptedLlmClient;
