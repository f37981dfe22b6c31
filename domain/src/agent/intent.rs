//! Intents: an agent's request to speak, distinct from the speech itself.

use crate::core::ids::AgentId;
use serde::{Deserialize, Serialize};

pub const MIN_URGENCY: u8 = 1;
pub const MAX_URGENCY: u8 = 5;

/// Clamp any integer into the urgency range `[1, 5]`.
pub fn clamp_urgency(value: i64) -> u8 {
    value.clamp(MIN_URGENCY as i64, MAX_URGENCY as i64) as u8
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntentKind {
    Speak,
    Interrupt,
    Question,
    Respond,
    #[default]
    Pass,
}

impl IntentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            IntentKind::Speak => "speak",
            IntentKind::Interrupt => "interrupt",
            IntentKind::Question => "question",
            IntentKind::Respond => "respond",
            IntentKind::Pass => "pass",
        }
    }

    /// Parse leniently: anything outside the closed set becomes `Pass`.
    pub fn parse_lenient(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "speak" => IntentKind::Speak,
            "interrupt" => IntentKind::Interrupt,
            "question" => IntentKind::Question,
            "respond" => IntentKind::Respond,
            _ => IntentKind::Pass,
        }
    }
}

impl std::fmt::Display for IntentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A request to speak, as seen by the moderator controller.
///
/// `submission_order` is the agent's position in the collected batch and is
/// the final tie-break key during arbitration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Intent {
    pub agent_id: AgentId,
    pub kind: IntentKind,
    pub urgency: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<AgentId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    #[serde(default)]
    pub submission_order: usize,
}

impl Intent {
    pub fn new(agent_id: impl Into<AgentId>, kind: IntentKind, urgency: i64) -> Self {
        Self {
            agent_id: agent_id.into(),
            kind,
            urgency: clamp_urgency(urgency),
            target: None,
            topic: None,
            submission_order: 0,
        }
    }

    /// The safe default used when an agent fails to produce an intent.
    pub fn pass(agent_id: impl Into<AgentId>) -> Self {
        Self::new(agent_id, IntentKind::Pass, MIN_URGENCY as i64)
    }

    pub fn is_pass(&self) -> bool {
        self.kind == IntentKind::Pass
    }

    pub fn with_target(mut self, target: impl Into<AgentId>) -> Self {
        self.target = Some(target.into());
        self
    }

    pub fn with_topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = Some(topic.into());
        self
    }

    pub fn with_submission_order(mut self, order: usize) -> Self {
        self.submission_order = order;
        self
    }
}
