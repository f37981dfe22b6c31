//! Domain error types

use thiserror::Error;

/// Domain-level errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    #[error("Invalid scenario: {0}")]
    InvalidScenario(String),

    #[error("Invalid persona: {0}")]
    InvalidPersona(String),

    #[error("Duplicate agent id: {0}")]
    DuplicateAgent(String),

    #[error("Operation cancelled")]
    Cancelled,
}

impl DomainError {
    /// Check if this error represents a cancellation
    pub fn is_cancelled(&self) -> bool {
        matches!(self, DomainError::Cancelled)
    }
}
