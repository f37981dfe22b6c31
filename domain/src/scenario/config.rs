//! Scenario and phase configuration.
//!
//! Supplied by an external loader and never mutated by the engine.

use crate::core::error::DomainError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Behavioral rules of a phase.
///
/// | Type | Turn taking |
/// |------|-------------|
/// | `Opening` | round robin, every agent is called once |
/// | `Discussion` | intent arbitration |
/// | `Debate` | intent arbitration, challenging questions when idle |
/// | `Closing` | round robin, every agent is called once |
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PhaseType {
    Opening,
    #[default]
    Discussion,
    Debate,
    Closing,
}

impl PhaseType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PhaseType::Opening => "opening",
            PhaseType::Discussion => "discussion",
            PhaseType::Debate => "debate",
            PhaseType::Closing => "closing",
        }
    }

    pub fn is_round_robin(&self) -> bool {
        matches!(self, PhaseType::Opening | PhaseType::Closing)
    }
}

impl std::fmt::Display for PhaseType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseConfig {
    pub id: String,
    pub name: String,
    #[serde(default, rename = "type")]
    pub phase_type: PhaseType,
    pub max_rounds: u32,
    #[serde(default)]
    pub description: String,
    /// Record a phase summary before leaving this phase.
    #[serde(default)]
    pub summarize_on_exit: bool,
}

impl PhaseConfig {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        phase_type: PhaseType,
        max_rounds: u32,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            phase_type,
            max_rounds,
            description: String::new(),
            summarize_on_exit: false,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn summarized(mut self) -> Self {
        self.summarize_on_exit = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EndConditions {
    /// Wall-clock budget measured on recorded event timestamps.
    pub max_duration_secs: Option<u64>,
    /// The discussion ends once strictly more than this share of agents
    /// voted to end during the current phase.
    pub end_vote_ratio: f64,
    /// Consecutive idle rounds tolerated before the phase is abandoned.
    pub stall_rounds: u32,
}

impl Default for EndConditions {
    fn default() -> Self {
        Self {
            max_duration_secs: None,
            end_vote_ratio: 0.5,
            stall_rounds: 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioConfig {
    pub name: String,
    pub topic: String,
    pub phases: Vec<PhaseConfig>,
    /// Global round limit across all phases.
    pub max_total_rounds: u32,
    /// Force a summary after this many speeches; `0` disables the cadence.
    pub summary_every: u32,
    pub end_conditions: EndConditions,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            name: "roundtable".to_string(),
            topic: String::new(),
            phases: vec![
                PhaseConfig::new("opening", "Opening statements", PhaseType::Opening, 6)
                    .with_description("Each participant states their initial position."),
                PhaseConfig::new("discussion", "Open discussion", PhaseType::Discussion, 10)
                    .with_description("Participants respond to each other and refine positions.")
                    .summarized(),
                PhaseConfig::new("closing", "Closing statements", PhaseType::Closing, 6)
                    .with_description("Each participant gives a final position."),
            ],
            max_total_rounds: 30,
            summary_every: 6,
            end_conditions: EndConditions::default(),
        }
    }
}

impl ScenarioConfig {
    pub fn with_topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = topic.into();
        self
    }

    pub fn phase(&self, index: usize) -> Option<&PhaseConfig> {
        self.phases.get(index)
    }

    pub fn phase_index(&self, id: &str) -> Option<usize> {
        self.phases.iter().position(|p| p.id == id)
    }

    pub fn next_phase(&self, index: usize) -> Option<&PhaseConfig> {
        self.phases.get(index + 1)
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if self.phases.is_empty() {
            return Err(DomainError::InvalidScenario("at least one phase is required".into()));
        }
        if self.max_total_rounds == 0 {
            return Err(DomainError::InvalidScenario("max_total_rounds cannot be 0".into()));
        }
        let ratio = self.end_conditions.end_vote_ratio;
        if !(0.0..1.0).contains(&ratio) {
            return Err(DomainError::InvalidScenario(format!(
                "end_vote_ratio must be in [0, 1), got {ratio}"
            )));
        }
        let mut seen = HashSet::new();
        for phase in &self.phases {
            if phase.id.trim().is_empty() {
                return Err(DomainError::InvalidScenario("phase id cannot be empty".into()));
            }
            if !seen.insert(phase.id.as_str()) {
                return Err(DomainError::InvalidScenario(format!(
                    "duplicate phase id '{}'",
                    phase.id
                )));
            }
            if phase.max_rounds == 0 {
                return Err(DomainError::InvalidScenario(format!(
                    "phase '{}' has max_rounds = 0",
                    phase.id
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_scenario_is_valid() {
        let scenario = ScenarioConfig::default();
        assert!(scenario.validate().is_ok());
        assert_eq!(scenario.phase_index("discussion"), Some(1));
        assert_eq!(scenario.next_phase(1).map(|p| p.id.as_str()), Some("closing"));
        assert!(scenario.next_phase(2).is_none());
    }

    #[test]
    fn test_validation_failures() {
        let mut empty = ScenarioConfig::default();
        empty.phases.clear();
        assert!(empty.validate().is_err());

        let mut dup = ScenarioConfig::default();
        dup.phases[1].id = "opening".into();
        assert!(dup.validate().is_err());

        let mut zero = ScenarioConfig::default();
        zero.phases[0].max_rounds = 0;
        assert!(zero.validate().is_err());

        let mut ratio = ScenarioConfig::default();
        ratio.end_conditions.end_vote_ratio = 1.0;
        assert!(ratio.validate().is_err());
    }

    #[test]
    fn test_phase_type_field_renamed() {
        let phase: PhaseConfig =
            serde_json::from_str(r#"{"id":"d","name":"Debate","type":"debate","max_rounds":3}"#)
                .unwrap();
        assert_eq!(phase.phase_type, PhaseType::Debate);
        assert!(!phase.summarize_on_exit);
    }
}
