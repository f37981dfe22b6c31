//! Port definitions (interfaces for external adapters)
//!
//! Ports define the contracts that infrastructure and presentation adapters
//! must implement.

pub mod event_log;
pub mod launcher;
pub mod llm_client;
pub mod progress;
