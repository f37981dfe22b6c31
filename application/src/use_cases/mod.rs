//! Use cases
//!
//! Application-level operations that orchestrate domain logic.

pub mod agent_executor;
pub mod agent_service;
pub mod launcher;
pub mod moderator_language;
pub mod run_discussion;
pub(crate) mod shared;
