//! Static participant identity.

use crate::core::error::DomainError;
use crate::core::ids::AgentId;
use serde::{Deserialize, Serialize};

/// How a participant tends to express itself.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpeakingStyle {
    #[default]
    Concise,
    Elaborate,
    Aggressive,
    Diplomatic,
    Analytical,
    Emotional,
}

impl SpeakingStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            SpeakingStyle::Concise => "concise",
            SpeakingStyle::Elaborate => "elaborate",
            SpeakingStyle::Aggressive => "aggressive",
            SpeakingStyle::Diplomatic => "diplomatic",
            SpeakingStyle::Analytical => "analytical",
            SpeakingStyle::Emotional => "emotional",
        }
    }

    /// One-line instruction used in prompts.
    pub fn guidance(&self) -> &'static str {
        match self {
            SpeakingStyle::Concise => "Keep it short and to the point.",
            SpeakingStyle::Elaborate => "Develop your points fully, with examples.",
            SpeakingStyle::Aggressive => "Be forceful and press your position hard.",
            SpeakingStyle::Diplomatic => "Seek common ground and acknowledge others.",
            SpeakingStyle::Analytical => "Reason step by step and cite evidence.",
            SpeakingStyle::Emotional => "Speak from conviction and personal stakes.",
        }
    }
}

impl std::fmt::Display for SpeakingStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SpeakingStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "concise" => Ok(SpeakingStyle::Concise),
            "elaborate" => Ok(SpeakingStyle::Elaborate),
            "aggressive" => Ok(SpeakingStyle::Aggressive),
            "diplomatic" => Ok(SpeakingStyle::Diplomatic),
            "analytical" => Ok(SpeakingStyle::Analytical),
            "emotional" => Ok(SpeakingStyle::Emotional),
            other => Err(format!("unknown speaking style: {other}")),
        }
    }
}

/// Static identity and style profile of one participant.
///
/// Immutable once a session starts; executors hold it by value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentPersona {
    pub id: AgentId,
    pub name: String,
    pub role: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stance: Option<String>,
    #[serde(default)]
    pub style: SpeakingStyle,
    #[serde(default)]
    pub expertise: Vec<String>,
    #[serde(default)]
    pub traits: Vec<String>,
}

impl AgentPersona {
    pub fn new(id: impl Into<AgentId>, name: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            role: role.into(),
            description: String::new(),
            stance: None,
            style: SpeakingStyle::default(),
            expertise: Vec::new(),
            traits: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_stance(mut self, stance: impl Into<String>) -> Self {
        self.stance = Some(stance.into());
        self
    }

    pub fn with_style(mut self, style: SpeakingStyle) -> Self {
        self.style = style;
        self
    }

    pub fn with_expertise(mut self, tag: impl Into<String>) -> Self {
        self.expertise.push(tag.into());
        self
    }

    pub fn with_trait(mut self, tag: impl Into<String>) -> Self {
        self.traits.push(tag.into());
        self
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if self.id.as_str().trim().is_empty() {
            return Err(DomainError::InvalidPersona("agent id cannot be empty".into()));
        }
        if self.id.is_reserved() {
            return Err(DomainError::InvalidPersona(format!(
                "agent id '{}' is reserved",
                self.id
            )));
        }
        if self.name.trim().is_empty() {
            return Err(DomainError::InvalidPersona(format!(
                "agent '{}' has an empty display name",
                self.id
            )));
        }
        Ok(())
    }
}
