//! LLM client adapters
//!
//! - [`OpenAiCompatibleClient`]: any `/chat/completions` endpoint (feature
//!   `http-provider`)
//! - [`ScriptedLlmClient`]: offline canned responses for dry runs

#[cfg(feature = "http-provider")]
mod openai;
mod scripted;

#[cfg(feature = "http-provider")]
pub use openai::OpenAiCompatibleClient;
pub use scripted::ScriptedLlmClient;
