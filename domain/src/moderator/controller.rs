//! Pure decision function of the moderator.

use super::decision::{Decision, EndReason};
use super::state::ModeratorState;
use crate::agent::intent::Intent;
use crate::core::ids::AgentId;
use crate::event::Event;
use crate::scenario::{PhaseConfig, ScenarioConfig};
use std::cmp::Reverse;
use std::collections::BTreeSet;
use thiserror::Error;

/// The state handed to the controller cannot be reasoned about.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecisionError {
    #[error("scenario has no phases")]
    EmptyScenario,

    #[error("roster is empty")]
    EmptyRoster,

    #[error("phase index {index} out of range ({count} phases)")]
    PhaseOutOfRange { index: usize, count: usize },

    #[error("unknown phase '{0}'")]
    UnknownPhase(String),
}

/// Decides who acts next. Holds only the read-only scenario.
#[derive(Debug, Clone)]
pub struct ModeratorController {
    scenario: ScenarioConfig,
}

impl ModeratorController {
    pub fn new(scenario: ScenarioConfig) -> Self {
        Self { scenario }
    }

    pub fn scenario(&self) -> &ScenarioConfig {
        &self.scenario
    }

    pub fn initial_state(
        &self,
        roster: Vec<AgentId>,
        started_at: chrono::DateTime<chrono::Utc>,
    ) -> ModeratorState {
        ModeratorState::new(&self.scenario, roster, started_at)
    }

    pub fn current_phase<'a>(
        &'a self,
        state: &ModeratorState,
    ) -> Result<&'a PhaseConfig, DecisionError> {
        if self.scenario.phases.is_empty() {
            return Err(DecisionError::EmptyScenario);
        }
        self.scenario
            .phase(state.phase_index)
            .ok_or(DecisionError::PhaseOutOfRange {
                index: state.phase_index,
                count: self.scenario.phases.len(),
            })
    }

    /// Pick exactly one next action.
    ///
    /// Rules are evaluated in a fixed order: ended flag, global round
    /// budget, duration, end vote, phase round budget, round-robin phases,
    /// summary cadence, intent arbitration, then idle handling.
    /// Identical inputs always produce identical output.
    pub fn decide(
        &self,
        state: &ModeratorState,
        intents: &[Intent],
        recent_events: &[Event],
    ) -> Result<Decision, DecisionError> {
        let phase = self.current_phase(state)?;
        if state.roster.is_empty() {
            return Err(DecisionError::EmptyRoster);
        }

        if state.ended {
            return Ok(end(EndReason::AlreadyEnded));
        }
        if state.global_round >= self.scenario.max_total_rounds {
            return Ok(end(EndReason::MaxRounds));
        }
        if self.duration_exceeded(state, recent_events) {
            return Ok(end(EndReason::MaxDuration));
        }
        if self.end_vote_passed(state, recent_events) {
            return Ok(end(EndReason::EndVote));
        }
        if state.phase_round >= phase.max_rounds {
            return Ok(self.leave_phase(state, EndReason::PhasesComplete));
        }

        if phase.phase_type.is_round_robin() {
            let reason = match phase.phase_type {
                crate::scenario::PhaseType::Opening => "opening statement",
                _ => "closing statement",
            };
            return Ok(match state.silent_agents().next() {
                Some(agent) => Decision::CallAgent {
                    agent_id: agent.clone(),
                    reason: reason.to_string(),
                },
                None => self.leave_phase(state, EndReason::PhasesComplete),
            });
        }

        if self.scenario.summary_every > 0
            && state.speeches_since_summary >= self.scenario.summary_every
        {
            return Ok(Decision::ForceSummary);
        }

        if let Some(winner) = arbitrate(state, intents) {
            return Ok(Decision::AllowSpeech {
                agent_id: winner.agent_id.clone(),
            });
        }

        if let Some(agent) = state.silent_agents().next() {
            return Ok(Decision::CallAgent {
                agent_id: agent.clone(),
                reason: "has not spoken yet".to_string(),
            });
        }
        if !state.question_asked {
            return Ok(Decision::PromptQuestion);
        }
        if state.idle_rounds >= self.scenario.end_conditions.stall_rounds {
            return Ok(self.leave_phase(state, EndReason::Stalled));
        }
        Ok(Decision::Wait)
    }

    fn leave_phase(&self, state: &ModeratorState, last_phase_reason: EndReason) -> Decision {
        match self.scenario.next_phase(state.phase_index) {
            Some(next) => Decision::SwitchPhase {
                next_phase_id: next.id.clone(),
            },
            None => end(last_phase_reason),
        }
    }

    fn duration_exceeded(&self, state: &ModeratorState, recent_events: &[Event]) -> bool {
        let Some(limit) = self.scenario.end_conditions.max_duration_secs else {
            return false;
        };
        recent_events
            .iter()
            .map(|e| e.timestamp)
            .max()
            .is_some_and(|latest| (latest - state.started_at).num_seconds() >= limit as i64)
    }

    fn end_vote_passed(&self, state: &ModeratorState, recent_events: &[Event]) -> bool {
        let voters: BTreeSet<&AgentId> = recent_events
            .iter()
            .filter(|e| e.is_end_vote() && e.phase_id() == Some(state.phase_id.as_str()))
            .filter_map(|e| e.speaker.agent())
            .filter(|a| state.roster.contains(a))
            .collect();
        if voters.is_empty() {
            return false;
        }
        let ratio = voters.len() as f64 / state.roster.len() as f64;
        ratio > self.scenario.end_conditions.end_vote_ratio
    }

    pub fn update_state_after_speech(&self, state: &mut ModeratorState, agent: &AgentId) {
        state.record_speech(agent);
    }

    /// A called agent either spoke or failed to; either way it is not
    /// called again in this phase.
    pub fn update_state_after_call(
        &self,
        state: &mut ModeratorState,
        agent: &AgentId,
        spoke: bool,
    ) {
        state.called_this_phase.insert(agent.clone());
        if spoke {
            state.record_speech(agent);
        } else {
            state.record_idle();
        }
    }

    pub fn update_state_after_idle(&self, state: &mut ModeratorState) {
        state.record_idle();
    }

    /// Applied whether or not the summary text could be produced.
    pub fn update_state_after_summary(&self, state: &mut ModeratorState) {
        state.advance_round();
        state.speeches_since_summary = 0;
    }

    /// Applied whether or not the question text could be produced.
    pub fn update_state_after_question(&self, state: &mut ModeratorState) {
        state.record_idle();
        state.question_asked = true;
    }

    pub fn update_state_after_phase_switch(
        &self,
        state: &mut ModeratorState,
        next_phase_id: &str,
    ) -> Result<(), DecisionError> {
        let index = self
            .scenario
            .phase_index(next_phase_id)
            .ok_or_else(|| DecisionError::UnknownPhase(next_phase_id.to_string()))?;
        let phase_type = self.scenario.phases[index].phase_type;
        state.enter_phase(index, next_phase_id.to_string(), phase_type);
        Ok(())
    }

    pub fn update_state_after_end(&self, state: &mut ModeratorState, reason: EndReason) {
        state.ended = true;
        if state.end_reason.is_none() {
            state.end_reason = Some(reason);
        }
    }
}

fn end(reason: EndReason) -> Decision {
    Decision::EndDiscussion { reason }
}

/// Highest urgency wins; ties go to whoever spoke least in this phase, then
/// to the earliest submission.
fn arbitrate<'a>(state: &ModeratorState, intents: &'a [Intent]) -> Option<&'a Intent> {
    intents
        .iter()
        .filter(|i| !i.is_pass() && state.roster.contains(&i.agent_id))
        .min_by_key(|i| (Reverse(i.urgency), state.speech_count(&i.agent_id), i.submission_order))
}
