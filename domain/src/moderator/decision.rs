//! The controller's output vocabulary.

use crate::core::ids::AgentId;
use serde::{Deserialize, Serialize};

/// Why a discussion ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndReason {
    AlreadyEnded,
    MaxRounds,
    MaxDuration,
    EndVote,
    PhasesComplete,
    Stalled,
}

impl EndReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            EndReason::AlreadyEnded => "already_ended",
            EndReason::MaxRounds => "max_rounds",
            EndReason::MaxDuration => "max_duration",
            EndReason::EndVote => "end_vote",
            EndReason::PhasesComplete => "phases_complete",
            EndReason::Stalled => "stalled",
        }
    }
}

impl std::fmt::Display for EndReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Exactly one next action per round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Decision {
    /// The arbitration winner may speak.
    AllowSpeech { agent_id: AgentId },
    /// The moderator calls on an agent who did not ask to speak.
    CallAgent { agent_id: AgentId, reason: String },
    ForceSummary,
    SwitchPhase { next_phase_id: String },
    PromptQuestion,
    EndDiscussion { reason: EndReason },
    Wait,
}

impl Decision {
    pub fn kind(&self) -> &'static str {
        match self {
            Decision::AllowSpeech { .. } => "allow_speech",
            Decision::CallAgent { .. } => "call_agent",
            Decision::ForceSummary => "force_summary",
            Decision::SwitchPhase { .. } => "switch_phase",
            Decision::PromptQuestion => "prompt_question",
            Decision::EndDiscussion { .. } => "end_discussion",
            Decision::Wait => "wait",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Decision::EndDiscussion { .. })
    }
}

impl std::fmt::Display for Decision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Decision::AllowSpeech { agent_id } => write!(f, "allow_speech({agent_id})"),
            Decision::CallAgent { agent_id, reason } => {
                write!(f, "call_agent({agent_id}: {reason})")
            }
            Decision::SwitchPhase { next_phase_id } => write!(f, "switch_phase({next_phase_id})"),
            Decision::EndDiscussion { reason } => write!(f, "end_discussion({reason})"),
            other => f.write_str(other.kind()),
        }
    }
}
