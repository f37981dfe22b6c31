//! LLM conversation primitives shared by every client adapter.

pub mod entities;
pub mod stream;

pub use entities::{ChatMessage, Completion, CompletionOptions, FinishReason, Role, TokenUsage};
pub use stream::StreamEvent;
