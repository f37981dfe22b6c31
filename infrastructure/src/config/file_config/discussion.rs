//! Discussion loop settings from TOML (`[discussion]` and `[memory]` sections)

use agora_application::DiscussionParams;
use agora_domain::MemoryLimits;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Raw discussion configuration from TOML
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileDiscussionConfig {
    /// Topic used when none is given on the command line
    pub topic: Option<String>,
    pub default_model: String,
    pub moderator_model: Option<String>,
    pub temperature: Option<f32>,
    /// Public events shown to agents each round
    pub visible_window: usize,
    /// Recent events handed to the moderator controller
    pub decision_window: usize,
    pub max_speech_chars: usize,
    /// Extra iterations allowed beyond `max_total_rounds`
    pub round_ceiling_slack: u32,
    pub intent_timeout_seconds: u64,
    pub speech_timeout_seconds: u64,
    pub moderator_timeout_seconds: u64,
}

impl Default for FileDiscussionConfig {
    fn default() -> Self {
        let params = DiscussionParams::default();
        Self {
            topic: None,
            default_model: params.default_model,
            moderator_model: params.moderator_model,
            temperature: params.temperature,
            visible_window: params.visible_window,
            decision_window: params.decision_window,
            max_speech_chars: params.max_speech_chars,
            round_ceiling_slack: params.round_ceiling_slack,
            intent_timeout_seconds: params.intent_timeout.as_secs(),
            speech_timeout_seconds: params.speech_timeout.as_secs(),
            moderator_timeout_seconds: params.moderator_timeout.as_secs(),
        }
    }
}

/// Raw memory configuration from TOML
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileMemoryConfig {
    pub max_entries: usize,
    pub max_tokens: usize,
    /// Memory entries rendered into each prompt
    pub in_prompt: usize,
}

impl Default for FileMemoryConfig {
    fn default() -> Self {
        let limits = MemoryLimits::default();
        Self {
            max_entries: limits.max_entries,
            max_tokens: limits.max_tokens,
            in_prompt: DiscussionParams::default().memory_in_prompt,
        }
    }
}

impl FileDiscussionConfig {
    /// Convert to loop parameters, combined with the `[memory]` section.
    pub fn to_params(&self, memory: &FileMemoryConfig) -> DiscussionParams {
        DiscussionParams {
            default_model: self.default_model.clone(),
            moderator_model: self.moderator_model.clone(),
            temperature: self.temperature,
            visible_window: self.visible_window,
            decision_window: self.decision_window,
            max_speech_chars: self.max_speech_chars,
            round_ceiling_slack: self.round_ceiling_slack,
            intent_timeout: Duration::from_secs(self.intent_timeout_seconds),
            speech_timeout: Duration::from_secs(self.speech_timeout_seconds),
            moderator_timeout: Duration::from_secs(self.moderator_timeout_seconds),
            memory: MemoryLimits {
                max_entries: memory.max_entries,
                max_tokens: memory.max_tokens,
            },
            memory_in_prompt: memory.in_prompt,
            ..DiscussionParams::default()
        }
    }
}
