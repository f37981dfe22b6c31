//! Participant definitions from TOML (`[[agents]]` array)

use agora_application::ParticipantSpec;
use agora_domain::{AgentPersona, SpeakingStyle};
use serde::{Deserialize, Serialize};

/// One participant as written in the config file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileAgentConfig {
    pub id: String,
    pub name: String,
    pub role: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub stance: Option<String>,
    #[serde(default)]
    pub style: SpeakingStyle,
    #[serde(default)]
    pub expertise: Vec<String>,
    #[serde(default)]
    pub traits: Vec<String>,
    /// Private goal, never shown to other participants
    #[serde(default)]
    pub goal: String,
    /// Overrides `[discussion] default_model`
    #[serde(default)]
    pub model: Option<String>,
}

impl FileAgentConfig {
    pub fn to_persona(&self) -> AgentPersona {
        AgentPersona {
            id: self.id.as_str().into(),
            name: self.name.clone(),
            role: self.role.clone(),
            description: self.description.clone(),
            stance: self.stance.clone(),
            style: self.style,
            expertise: self.expertise.clone(),
            traits: self.traits.clone(),
        }
    }

    pub fn to_participant(&self) -> ParticipantSpec {
        let spec = ParticipantSpec::new(self.to_persona()).with_goal(self.goal.clone());
        match &self.model {
            Some(model) if !model.trim().is_empty() => spec.with_model(model.clone()),
            _ => spec,
        }
    }
}
