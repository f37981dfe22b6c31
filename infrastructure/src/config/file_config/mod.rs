//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! They are deserialized directly and use domain types where appropriate.

mod agents;
mod discussion;
mod output;
mod provider;

pub use agents::FileAgentConfig;
pub use discussion::{FileDiscussionConfig, FileMemoryConfig};
pub use output::{FileLoggingConfig, FileOutputConfig};
pub use provider::{FileProviderConfig, ProviderKind};

use agora_application::{DiscussionParams, ParticipantSpec};
use agora_domain::{DomainError, ScenarioConfig};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

/// Configuration validation errors
#[derive(Debug, Error)]
pub enum ConfigValidationError {
    #[error("{0} cannot be 0")]
    InvalidTimeout(&'static str),

    #[error("{0}: model name cannot be empty")]
    EmptyModelName(String),

    #[error("{field} must be greater than 0")]
    ZeroLimit { field: &'static str },

    #[error("duplicate agent id '{0}'")]
    DuplicateAgent(String),

    #[error(transparent)]
    Domain(#[from] DomainError),
}

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// LLM backend settings
    pub provider: FileProviderConfig,
    /// Loop control
    pub discussion: FileDiscussionConfig,
    /// Per-agent short-term memory bounds
    pub memory: FileMemoryConfig,
    /// Phases, budgets and end conditions
    pub scenario: ScenarioConfig,
    /// Participants
    pub agents: Vec<FileAgentConfig>,
    /// Output settings
    pub output: FileOutputConfig,
    /// Log file settings
    pub logging: FileLoggingConfig,
}

impl FileConfig {
    /// Validate the entire configuration.
    ///
    /// An empty `[[agents]]` list is valid here; the CLI rejects it only when
    /// a discussion is actually started.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.provider.timeout_seconds == 0 {
            return Err(ConfigValidationError::InvalidTimeout("provider.timeout_seconds"));
        }
        let timeouts = [
            ("discussion.intent_timeout_seconds", self.discussion.intent_timeout_seconds),
            ("discussion.speech_timeout_seconds", self.discussion.speech_timeout_seconds),
            ("discussion.moderator_timeout_seconds", self.discussion.moderator_timeout_seconds),
        ];
        if let Some((field, _)) = timeouts.iter().find(|(_, secs)| *secs == 0) {
            return Err(ConfigValidationError::InvalidTimeout(*field));
        }

        if self.discussion.default_model.trim().is_empty() {
            return Err(ConfigValidationError::EmptyModelName("discussion.default_model".into()));
        }
        if self.discussion.moderator_model.as_deref().is_some_and(|m| m.trim().is_empty()) {
            return Err(ConfigValidationError::EmptyModelName("discussion.moderator_model".into()));
        }

        let limits = [
            ("discussion.visible_window", self.discussion.visible_window),
            ("discussion.decision_window", self.discussion.decision_window),
            ("discussion.max_speech_chars", self.discussion.max_speech_chars),
            ("memory.max_entries", self.memory.max_entries),
            ("memory.max_tokens", self.memory.max_tokens),
        ];
        if let Some((field, _)) = limits.iter().find(|(_, v)| *v == 0) {
            return Err(ConfigValidationError::ZeroLimit { field: *field });
        }

        self.scenario.validate()?;

        let mut seen = HashSet::new();
        for agent in &self.agents {
            agent.to_persona().validate()?;
            if agent.model.as_deref().is_some_and(|m| m.trim().is_empty()) {
                return Err(ConfigValidationError::EmptyModelName(format!(
                    "agents.{}.model",
                    agent.id
                )));
            }
            if !seen.insert(agent.id.as_str()) {
                return Err(ConfigValidationError::DuplicateAgent(agent.id.clone()));
            }
        }
        Ok(())
    }

    pub fn discussion_params(&self) -> DiscussionParams {
        self.discussion.to_params(&self.memory)
    }

    /// The scenario with `[discussion] topic` filled in when the scenario
    /// has none.
    pub fn scenario(&self) -> ScenarioConfig {
        match (&self.discussion.topic, self.scenario.topic.trim().is_empty()) {
            (Some(topic), true) => self.scenario.clone().with_topic(topic.clone()),
            _ => self.scenario.clone(),
        }
    }

    pub fn participants(&self) -> Vec<ParticipantSpec> {
        self.agents.iter().map(FileAgentConfig::to_participant).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agora_domain::{OutputFormat, PhaseType};

    #[test]
    fn test_deserialize_full_config() {
        let toml_str = r#"
[provider]
kind = "scripted"
timeout_seconds = 30

[discussion]
topic = "Should the city ban cars downtown?"
default_model = "llama3"
visible_window = 12

[memory]
max_entries = 10

[scenario]
name = "debate"
max_total_rounds = 12
summary_every = 0

[[scenario.phases]]
id = "debate"
name = "Debate"
type = "debate"
max_rounds = 8

[scenario.end_conditions]
end_vote_ratio = 0.66

[[agents]]
id = "ann"
name = "Ann"
role = "shop owner"

[[agents]]
id = "ben"
name = "Ben"
role = "cyclist"
model = "gpt-4o"

[output]
format = "summary"
color = false
"#;

        let config: FileConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.provider.kind, ProviderKind::Scripted);
        assert_eq!(config.provider.timeout_seconds, 30);
        assert_eq!(config.discussion.visible_window, 12);
        assert_eq!(config.memory.max_entries, 10);
        assert_eq!(config.scenario.phases.len(), 1);
        assert_eq!(config.scenario.phases[0].phase_type, PhaseType::Debate);
        assert_eq!(config.scenario.end_conditions.end_vote_ratio, 0.66);
        assert_eq!(config.scenario.end_conditions.stall_rounds, 2);
        assert_eq!(config.agents.len(), 2);
        assert_eq!(config.output.format, Some(OutputFormat::Summary));
        assert!(!config.output.color);
        assert!(config.validate().is_ok());

        assert_eq!(config.scenario().topic, "Should the city ban cars downtown?");
        let participants = config.participants();
        assert_eq!(participants[1].model.as_deref(), Some("gpt-4o"));
        assert_eq!(config.discussion_params().default_model, "llama3");
    }

    #[test]
    fn test_deserialize_partial_config() {
        let config: FileConfig = toml::from_str("[discussion]\nmax_speech_chars = 300\n").unwrap();
        assert_eq!(config.discussion.max_speech_chars, 300);
        // Defaults should apply
        assert_eq!(config.scenario, ScenarioConfig::default());
        assert!(config.agents.is_empty());
        assert!(config.output.color);
    }

    #[test]
    fn test_validate_valid_config() {
        assert!(FileConfig::default().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = FileConfig::default();
        config.discussion.speech_timeout_seconds = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigValidationError::InvalidTimeout("discussion.speech_timeout_seconds"))
        ));

        let mut config = FileConfig::default();
        config.discussion.default_model = " ".into();
        assert!(matches!(config.validate(), Err(ConfigValidationError::EmptyModelName(_))));

        let mut config = FileConfig::default();
        config.scenario.phases.clear();
        assert!(matches!(config.validate(), Err(ConfigValidationError::Domain(_))));

        let agent: FileAgentConfig =
            toml::from_str("id = \"ann\"\nname = \"Ann\"\nrole = \"x\"\n").unwrap();
        let mut config = FileConfig::default();
        config.agents = vec![agent.clone(), agent];
        assert!(matches!(config.validate(), Err(ConfigValidationError::DuplicateAgent(_))));

        let reserved: FileAgentConfig =
            toml::from_str("id = \"system\"\nname = \"Sys\"\nrole = \"x\"\n").unwrap();
        let mut config = FileConfig::default();
        config.agents = vec![reserved];
        assert!(matches!(config.validate(), Err(ConfigValidationError::Domain(_))));
    }
}
