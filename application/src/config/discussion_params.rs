//! Discussion parameters: loop control.
//!
//! [`DiscussionParams`] groups the static knobs of
//! [`RunDiscussionUseCase`](crate::use_cases::run_discussion::RunDiscussionUseCase).
//! Scheduling policy lives in the scenario; these are execution concerns.

use agora_domain::MemoryLimits;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscussionParams {
    /// Model used for agents without their own model and for the moderator.
    pub default_model: String,
    /// Model used by the moderator language generator, if different.
    pub moderator_model: Option<String>,
    pub temperature: Option<f32>,
    /// Public events shown to agents each round.
    pub visible_window: usize,
    /// Recent events handed to the controller each round.
    pub decision_window: usize,
    /// Characters per event in agent prompts.
    pub visible_event_chars: usize,
    /// Characters per event in moderator summaries.
    pub condensed_event_chars: usize,
    /// Events fed into the final summary.
    pub final_summary_events: usize,
    pub max_speech_chars: usize,
    /// Extra loop iterations tolerated beyond `max_total_rounds`.
    pub round_ceiling_slack: u32,
    pub intent_timeout: Duration,
    pub speech_timeout: Duration,
    pub moderator_timeout: Duration,
    pub memory: MemoryLimits,
    /// Memory entries rendered into each agent prompt.
    pub memory_in_prompt: usize,
}

impl Default for DiscussionParams {
    fn default() -> Self {
        Self {
            default_model: "gpt-4o-mini".to_string(),
            moderator_model: None,
            temperature: Some(0.8),
            visible_window: 20,
            decision_window: 50,
            visible_event_chars: 600,
            condensed_event_chars: 400,
            final_summary_events: 60,
            max_speech_chars: 800,
            round_ceiling_slack: 5,
            intent_timeout: Duration::from_secs(60),
            speech_timeout: Duration::from_secs(120),
            moderator_timeout: Duration::from_secs(120),
            memory: MemoryLimits::default(),
            memory_in_prompt: agora_domain::prompt::agent::MEMORY_IN_PROMPT,
        }
    }
}

impl DiscussionParams {
    // ==================== Builder Methods ====================

    pub fn with_default_model(mut self, model: impl Into<String>) -> Self {
        self.default_model = model.into();
        self
    }

    pub fn with_moderator_model(mut self, model: impl Into<String>) -> Self {
        self.moderator_model = Some(model.into());
        self
    }

    pub fn with_max_speech_chars(mut self, max: usize) -> Self {
        self.max_speech_chars = max;
        self
    }

    pub fn with_round_ceiling_slack(mut self, slack: u32) -> Self {
        self.round_ceiling_slack = slack;
        self
    }

    pub fn with_intent_timeout(mut self, timeout: Duration) -> Self {
        self.intent_timeout = timeout;
        self
    }

    pub fn with_memory(mut self, memory: MemoryLimits) -> Self {
        self.memory = memory;
        self
    }

    pub fn moderator_model(&self) -> &str {
        self.moderator_model.as_deref().unwrap_or(&self.default_model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_moderator_model_falls_back_to_default() {
        let params = DiscussionParams::default().with_default_model("local-7b");
        assert_eq!(params.moderator_model(), "local-7b");
        assert_eq!(params.with_moderator_model("big").moderator_model(), "big");
    }

    #[test]
    fn test_builders() {
        let params = DiscussionParams::default()
            .with_max_speech_chars(120)
            .with_round_ceiling_slack(0)
            .with_intent_timeout(Duration::from_millis(50));
        assert_eq!(params.max_speech_chars, 120);
        assert_eq!(params.round_ceiling_slack, 0);
        assert_eq!(params.intent_timeout, Duration::from_millis(50));
    }
}
