//! Identifiers for sessions, agents and events.

use serde::{Deserialize, Serialize};

macro_rules! string_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self::new(s)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_id!(
    /// Identifier of one discussion session.
    ///
    /// Every event, ledger and moderator state is scoped to exactly one session.
    SessionId
);

string_id!(
    /// Identifier of a discussion participant.
    ///
    /// `"moderator"` and `"system"` are reserved speaker names and are
    /// rejected by persona validation.
    AgentId
);

string_id!(
    /// Unique identifier of a recorded event.
    EventId
);

impl SessionId {
    /// Generates a fresh random session id.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

impl EventId {
    /// Generates a fresh random event id.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

impl AgentId {
    /// Whether this id collides with a reserved speaker name.
    pub fn is_reserved(&self) -> bool {
        matches!(self.0.as_str(), "moderator" | "system")
    }
}
