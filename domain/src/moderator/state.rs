//! Per-session moderator bookkeeping.
//!
//! Fields are readable by anyone but only mutated through the
//! `update_state_after_*` helpers on
//! [`ModeratorController`](super::ModeratorController).

use super::decision::EndReason;
use crate::core::ids::AgentId;
use crate::scenario::{PhaseType, ScenarioConfig};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModeratorState {
    pub(crate) phase_index: usize,
    pub(crate) phase_id: String,
    pub(crate) phase_type: PhaseType,
    pub(crate) global_round: u32,
    pub(crate) phase_round: u32,
    pub(crate) roster: Vec<AgentId>,
    pub(crate) speech_counts: BTreeMap<AgentId, u32>,
    pub(crate) last_spoke_round: BTreeMap<AgentId, u32>,
    pub(crate) called_this_phase: BTreeSet<AgentId>,
    pub(crate) speeches_since_summary: u32,
    pub(crate) idle_rounds: u32,
    pub(crate) question_asked: bool,
    pub(crate) started_at: DateTime<Utc>,
    pub(crate) ended: bool,
    pub(crate) end_reason: Option<EndReason>,
}

impl ModeratorState {
    /// State at the first round of the first phase.
    ///
    /// An empty scenario or roster is accepted here and rejected by
    /// `decide`.
    pub fn new(scenario: &ScenarioConfig, roster: Vec<AgentId>, started_at: DateTime<Utc>) -> Self {
        let (phase_id, phase_type) = scenario
            .phase(0)
            .map(|p| (p.id.clone(), p.phase_type))
            .unwrap_or_default();
        Self {
            phase_index: 0,
            phase_id,
            phase_type,
            global_round: 0,
            phase_round: 0,
            roster,
            speech_counts: BTreeMap::new(),
            last_spoke_round: BTreeMap::new(),
            called_this_phase: BTreeSet::new(),
            speeches_since_summary: 0,
            idle_rounds: 0,
            question_asked: false,
            started_at,
            ended: false,
            end_reason: None,
        }
    }

    pub fn phase_index(&self) -> usize {
        self.phase_index
    }

    pub fn phase_id(&self) -> &str {
        &self.phase_id
    }

    pub fn phase_type(&self) -> PhaseType {
        self.phase_type
    }

    pub fn global_round(&self) -> u32 {
        self.global_round
    }

    pub fn phase_round(&self) -> u32 {
        self.phase_round
    }

    pub fn roster(&self) -> &[AgentId] {
        &self.roster
    }

    /// Speeches by `agent` in the current phase.
    pub fn speech_count(&self, agent: &AgentId) -> u32 {
        self.speech_counts.get(agent).copied().unwrap_or(0)
    }

    pub fn last_spoke_round(&self, agent: &AgentId) -> Option<u32> {
        self.last_spoke_round.get(agent).copied()
    }

    pub fn was_called(&self, agent: &AgentId) -> bool {
        self.called_this_phase.contains(agent)
    }

    pub fn speeches_since_summary(&self) -> u32 {
        self.speeches_since_summary
    }

    pub fn idle_rounds(&self) -> u32 {
        self.idle_rounds
    }

    /// Whether a guiding question was asked during the current idle streak.
    pub fn question_asked(&self) -> bool {
        self.question_asked
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn is_ended(&self) -> bool {
        self.ended
    }

    pub fn end_reason(&self) -> Option<EndReason> {
        self.end_reason
    }

    /// Agents that neither spoke nor were called in this phase, roster order.
    pub fn silent_agents(&self) -> impl Iterator<Item = &AgentId> {
        self.roster
            .iter()
            .filter(|a| self.speech_count(a) == 0 && !self.was_called(a))
    }

    pub(crate) fn advance_round(&mut self) {
        self.global_round += 1;
        self.phase_round += 1;
    }

    pub(crate) fn record_speech(&mut self, agent: &AgentId) {
        self.advance_round();
        *self.speech_counts.entry(agent.clone()).or_insert(0) += 1;
        self.last_spoke_round.insert(agent.clone(), self.global_round);
        self.speeches_since_summary += 1;
        self.idle_rounds = 0;
        self.question_asked = false;
    }

    pub(crate) fn record_idle(&mut self) {
        self.advance_round();
        self.idle_rounds += 1;
    }

    pub(crate) fn enter_phase(&mut self, index: usize, id: String, phase_type: PhaseType) {
        self.global_round += 1;
        self.phase_index = index;
        self.phase_id = id;
        self.phase_type = phase_type;
        self.phase_round = 0;
        self.speech_counts.clear();
        self.called_this_phase.clear();
        self.speeches_since_summary = 0;
        self.idle_rounds = 0;
        self.question_asked = false;
    }
}
