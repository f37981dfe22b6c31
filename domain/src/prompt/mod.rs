//! Prompt domain
//!
//! Templates that turn personas, visible context and structured moderator
//! inputs into chat messages.

pub mod agent;
pub mod moderator;

pub use agent::AgentPromptTemplate;
pub use moderator::ModeratorPromptTemplate;
