//! Run Discussion use case
//!
//! Drives one session from start to end:
//!
//! ```text
//! start ─▶ session_started ─▶ outline + opening remarks
//!   │
//!   ▼
//! ┌─ round ──────────────────────────────────────────────────────┐
//! │ visible snapshot ─▶ intents (fan-out) ─▶ INTENT / VOTE events │
//! │   ─▶ recent events ─▶ decide ─▶ execute ─▶ append ─▶ update   │
//! └──────────────────────────────────────────────────────────────┘
//!   │ EndDiscussion or hard ceiling
//!   ▼
//! final summary ─▶ closing remarks ─▶ discussion_ended
//! ```
//!
//! Appends within a session are strictly sequential; the state update for a
//! step is applied only after its events are committed.

use crate::config::DiscussionParams;
use crate::ports::event_log::{EventLog, EventLogError};
use crate::ports::llm_client::LlmClient;
use crate::ports::progress::{DiscussionProgressNotifier, NoProgress};
use crate::use_cases::agent_executor::AgentExecutor;
use crate::use_cases::agent_service::{AgentExecutorService, AgentServiceError};
use crate::use_cases::moderator_language::{LanguageError, ModeratorLanguageGenerator};
use agora_domain::context::condense_events;
use agora_domain::moderator::{
    DiscussionOutline, GuidingQuestionInput, QuestionType, RemarksInput, SummaryInput,
};
use agora_domain::{
    AgentId, AgentPersona, AgentVisibleContext, CompletionOptions, Decision, DecisionError,
    DomainError, EndReason, Event, EventContent, EventMeta, EventType, Intent, ModeratorController,
    ModeratorState, NewEvent, ParticipantInfo, PhaseConfig, PhaseDescriptor, PhaseType,
    ScenarioConfig, SessionId, Speaker, SystemKind,
};
use chrono::Utc;
use serde::Serialize;
use serde_json::json;
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Errors that stop a discussion
#[derive(Error, Debug)]
pub enum RunDiscussionError {
    #[error("No participants configured")]
    NoParticipants,

    #[error("Invalid configuration: {0}")]
    Invalid(#[from] DomainError),

    #[error("Moderator decision failed: {0}")]
    Decision(#[from] DecisionError),

    #[error("Event log error: {0}")]
    EventLog(#[from] EventLogError),

    #[error("Agent error: {0}")]
    Agent(AgentServiceError),

    #[error("Operation cancelled")]
    Cancelled,
}

impl RunDiscussionError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, RunDiscussionError::Cancelled)
    }
}

impl From<AgentServiceError> for RunDiscussionError {
    fn from(e: AgentServiceError) -> Self {
        if e.is_cancelled() {
            RunDiscussionError::Cancelled
        } else {
            RunDiscussionError::Agent(e)
        }
    }
}

/// One participant and how to run it.
#[derive(Debug, Clone)]
pub struct ParticipantSpec {
    pub persona: AgentPersona,
    pub goal: String,
    /// Overrides [`DiscussionParams::default_model`].
    pub model: Option<String>,
}

impl ParticipantSpec {
    pub fn new(persona: AgentPersona) -> Self {
        Self {
            persona,
            goal: String::new(),
            model: None,
        }
    }

    pub fn with_goal(mut self, goal: impl Into<String>) -> Self {
        self.goal = goal.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }
}

/// Input for the RunDiscussion use case
#[derive(Debug, Clone)]
pub struct RunDiscussionInput {
    pub session_id: SessionId,
    pub topic: String,
    pub scenario: ScenarioConfig,
    pub participants: Vec<ParticipantSpec>,
}

impl RunDiscussionInput {
    pub fn new(
        topic: impl Into<String>,
        scenario: ScenarioConfig,
        participants: Vec<ParticipantSpec>,
    ) -> Self {
        Self {
            session_id: SessionId::generate(),
            topic: topic.into(),
            scenario,
            participants,
        }
    }

    pub fn with_session_id(mut self, session_id: SessionId) -> Self {
        self.session_id = session_id;
        self
    }
}

/// A step that failed without stopping the discussion.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailedStep {
    pub round: u32,
    pub step: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<AgentId>,
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiscussionOutcome {
    pub session_id: SessionId,
    pub rounds: u32,
    pub end_reason: EndReason,
    pub events_recorded: usize,
    pub final_summary: Option<String>,
    pub consensus: Vec<String>,
    pub divergence: Vec<String>,
    pub failed_steps: Vec<FailedStep>,
}

/// Use case for running a moderated discussion
pub struct RunDiscussionUseCase {
    client: Arc<dyn LlmClient>,
    event_log: Arc<dyn EventLog>,
    params: DiscussionParams,
}

impl RunDiscussionUseCase {
    pub fn new(client: Arc<dyn LlmClient>, event_log: Arc<dyn EventLog>) -> Self {
        Self {
            client,
            event_log,
            params: DiscussionParams::default(),
        }
    }

    pub fn with_params(mut self, params: DiscussionParams) -> Self {
        self.params = params;
        self
    }

    pub fn params(&self) -> &DiscussionParams {
        &self.params
    }

    pub fn event_log(&self) -> &Arc<dyn EventLog> {
        &self.event_log
    }

    /// Execute the use case with default (no-op) progress and no cancellation
    pub async fn execute(
        &self,
        input: RunDiscussionInput,
    ) -> Result<DiscussionOutcome, RunDiscussionError> {
        self.execute_with(input, &NoProgress, CancellationToken::new()).await
    }

    /// Execute the use case with progress callbacks and a cancellation token
    pub async fn execute_with(
        &self,
        input: RunDiscussionInput,
        progress: &dyn DiscussionProgressNotifier,
        token: CancellationToken,
    ) -> Result<DiscussionOutcome, RunDiscussionError> {
        validate(&input)?;
        let run = DiscussionRun::new(self, input, progress, token)?;
        run.run().await
    }

    fn agent_options(&self, model: Option<&str>) -> CompletionOptions {
        let options = CompletionOptions::new(model.unwrap_or(&self.params.default_model));
        match self.params.temperature {
            Some(t) => options.with_temperature(t),
            None => options,
        }
    }
}

fn validate(input: &RunDiscussionInput) -> Result<(), RunDiscussionError> {
    if input.participants.is_empty() {
        return Err(RunDiscussionError::NoParticipants);
    }
    input.scenario.validate()?;
    if input.topic.trim().is_empty() && input.scenario.topic.trim().is_empty() {
        return Err(DomainError::InvalidScenario("topic cannot be empty".into()).into());
    }
    let mut seen = HashSet::new();
    for participant in &input.participants {
        participant.persona.validate()?;
        if !seen.insert(participant.persona.id.clone()) {
            return Err(DomainError::DuplicateAgent(participant.persona.id.to_string()).into());
        }
    }
    Ok(())
}

/// Mutable state of one running session.
struct DiscussionRun<'a> {
    use_case: &'a RunDiscussionUseCase,
    progress: &'a dyn DiscussionProgressNotifier,
    token: CancellationToken,
    session_id: SessionId,
    topic: String,
    controller: ModeratorController,
    state: ModeratorState,
    agents: AgentExecutorService,
    language: ModeratorLanguageGenerator,
    participants: Vec<ParticipantInfo>,
    outline: DiscussionOutline,
    consensus: Vec<String>,
    divergence: Vec<String>,
    failed_steps: Vec<FailedStep>,
    events_recorded: usize,
    phase_start_sequence: u64,
    last_summary_sequence: u64,
}

impl<'a> DiscussionRun<'a> {
    fn new(
        use_case: &'a RunDiscussionUseCase,
        input: RunDiscussionInput,
        progress: &'a dyn DiscussionProgressNotifier,
        token: CancellationToken,
    ) -> Result<Self, RunDiscussionError> {
        let params = &use_case.params;
        let mut agents = AgentExecutorService::new(input.session_id.clone())
            .with_intent_timeout(params.intent_timeout);
        let mut participants = Vec::with_capacity(input.participants.len());
        for spec in input.participants {
            participants.push(ParticipantInfo::from(&spec.persona));
            let options = use_case.agent_options(spec.model.as_deref());
            let executor = AgentExecutor::new(spec.persona, Arc::clone(&use_case.client), options)
                .with_goal(spec.goal)
                .with_memory_limits(params.memory)
                .with_max_speech_chars(params.max_speech_chars)
                .with_memory_in_prompt(params.memory_in_prompt)
                .with_speech_timeout(params.speech_timeout);
            agents.create(executor)?;
        }

        let language = ModeratorLanguageGenerator::new(
            Arc::clone(&use_case.client),
            use_case.agent_options(Some(params.moderator_model())),
        )
        .with_timeout(params.moderator_timeout);

        let topic = if input.topic.trim().is_empty() {
            input.scenario.topic.clone()
        } else {
            input.topic
        };
        let controller = ModeratorController::new(input.scenario);
        let state = controller.initial_state(agents.roster(), Utc::now());

        Ok(Self {
            use_case,
            progress,
            token,
            session_id: input.session_id,
            topic,
            controller,
            state,
            agents,
            language,
            participants,
            outline: DiscussionOutline::default(),
            consensus: Vec::new(),
            divergence: Vec::new(),
            failed_steps: Vec::new(),
            events_recorded: 0,
            phase_start_sequence: 0,
            last_summary_sequence: 0,
        })
    }

    fn params(&self) -> &'a DiscussionParams {
        &self.use_case.params
    }

    fn log(&self) -> &'a dyn EventLog {
        self.use_case.event_log.as_ref()
    }

    fn check_cancelled(&self) -> Result<(), RunDiscussionError> {
        if self.token.is_cancelled() {
            return Err(RunDiscussionError::Cancelled);
        }
        Ok(())
    }

    async fn run(mut self) -> Result<DiscussionOutcome, RunDiscussionError> {
        self.check_cancelled()?;
        info!(
            session_id = %self.session_id,
            topic = %self.topic,
            participants = self.participants.len(),
            "Discussion starting"
        );
        self.progress
            .on_session_start(&self.session_id, &self.topic, self.state.roster());

        self.open().await?;

        let ceiling =
            self.controller.scenario().max_total_rounds + self.params().round_ceiling_slack;
        let mut iterations = 0;
        let reason = loop {
            if iterations >= ceiling {
                warn!(session_id = %self.session_id, ceiling, "Round ceiling reached");
                break EndReason::MaxRounds;
            }
            iterations += 1;
            self.check_cancelled()?;
            if let Some(reason) = self.round().await? {
                break reason;
            }
        };

        self.finish(reason).await
    }

    async fn open(&mut self) -> Result<(), RunDiscussionError> {
        let phases = self.controller.scenario().phases.clone();
        let roster: Vec<&str> = self.state.roster().iter().map(AgentId::as_str).collect();
        let started = NewEvent::system(
            SystemKind::SessionStarted,
            Speaker::System,
            json!({
                "topic": self.topic,
                "scenario": self.controller.scenario().name,
                "participants": roster,
            }),
        );
        self.record(started).await?;

        match self.language.generate_outline(&self.topic, &phases, &self.token).await {
            Ok(outline) => self.outline = outline,
            Err(e) => self.language_failed("outline", e)?,
        }

        let input = RemarksInput {
            topic: self.topic.clone(),
            participants: self.participants.clone(),
            phase_names: phases.iter().map(|p| p.name.clone()).collect(),
            summary: None,
        };
        match self.language.generate_opening_remarks(&input, &self.token).await {
            Ok(text) => {
                let payload = json!({ "text": text, "outline": self.outline });
                let event =
                    NewEvent::system(SystemKind::OpeningRemarks, Speaker::Moderator, payload);
                self.record(event).await?;
            }
            Err(e) => self.language_failed("opening remarks", e)?,
        }

        if let Some(first) = phases.first() {
            info!(session_id = %self.session_id, phase = %first.id, "Phase started");
            self.progress.on_phase_start(first);
        }
        Ok(())
    }

    /// One round. Returns the end reason once the controller ends the
    /// discussion.
    async fn round(&mut self) -> Result<Option<EndReason>, RunDiscussionError> {
        let phase = self.controller.current_phase(&self.state)?.clone();
        let round = self.state.global_round() + 1;
        self.progress.on_round_start(round);

        let recent = self
            .log()
            .get_latest_events(&self.session_id, self.params().decision_window)
            .await?;
        let visible = self.visible(&phase, &recent);

        let collected = self.agents.generate_intents(&visible, &self.token).await?;
        let mut intents = Vec::with_capacity(collected.len());
        for (order, c) in collected.iter().enumerate() {
            let intent = c.to_intent(order);
            if !intent.is_pass() {
                self.record(NewEvent::intent(&intent)).await?;
            }
            if c.output.vote_end {
                self.record(NewEvent::vote_end(c.agent_id.clone())).await?;
            }
            intents.push(intent);
        }
        let wanting: Vec<Intent> = intents.iter().filter(|i| !i.is_pass()).cloned().collect();
        self.progress.on_intents(&wanting);

        let recent = self
            .log()
            .get_latest_events(&self.session_id, self.params().decision_window)
            .await?;
        let decision = self.controller.decide(&self.state, &intents, &recent)?;
        debug!(session_id = %self.session_id, round, decision = %decision, "Moderator decided");
        self.progress.on_decision(&decision);

        match decision {
            Decision::AllowSpeech { agent_id } => {
                let topic = intents
                    .iter()
                    .find(|i| i.agent_id == agent_id)
                    .and_then(|i| i.topic.clone());
                if self.speak(&agent_id, &visible, topic.as_deref()).await? {
                    self.controller.update_state_after_speech(&mut self.state, &agent_id);
                } else {
                    self.controller.update_state_after_idle(&mut self.state);
                }
            }
            Decision::CallAgent { agent_id, reason } => {
                let called = visible.with_call(reason);
                let spoke = self.speak(&agent_id, &called, None).await?;
                self.controller
                    .update_state_after_call(&mut self.state, &agent_id, spoke);
            }
            Decision::ForceSummary => {
                self.summarize_phase(&phase).await?;
                self.controller.update_state_after_summary(&mut self.state);
            }
            Decision::PromptQuestion => {
                self.ask_question(&phase, &recent).await?;
                self.controller.update_state_after_question(&mut self.state);
            }
            Decision::SwitchPhase { next_phase_id } => {
                self.switch_phase(&phase, &next_phase_id).await?;
            }
            Decision::EndDiscussion { reason } => return Ok(Some(reason)),
            Decision::Wait => self.controller.update_state_after_idle(&mut self.state),
        }
        Ok(None)
    }

    fn visible(&self, phase: &PhaseConfig, recent: &[Event]) -> AgentVisibleContext {
        let params = self.params();
        AgentVisibleContext::build(
            self.topic.clone(),
            PhaseDescriptor::from_config(phase, self.state.phase_round()),
            recent,
            params.visible_window,
            params.visible_event_chars,
            Utc::now(),
        )
        .with_participants(self.participants.clone())
    }

    /// Returns whether a SPEECH event was recorded.
    async fn speak(
        &mut self,
        agent_id: &AgentId,
        visible: &AgentVisibleContext,
        topic: Option<&str>,
    ) -> Result<bool, RunDiscussionError> {
        match self.agents.generate_speech(agent_id, visible, topic, &self.token).await {
            Ok(generated) => {
                let speech = generated.speech;
                let content = EventContent::Structured(json!({
                    "text": speech.content,
                    "tone": speech.tone.as_str(),
                    "addressed_to": speech.addressed_to.as_ref().map(AgentId::as_str),
                }));
                let mut meta = self.meta();
                if let Some(usage) = generated.token_usage {
                    meta = meta.with_token_cost(usage.total());
                }
                let event =
                    NewEvent::new(EventType::Speech, Speaker::Agent(agent_id.clone()), content)
                        .with_meta(meta);
                self.record(event).await?;
                Ok(true)
            }
            Err(e) if e.is_cancelled() => Err(RunDiscussionError::Cancelled),
            Err(e) => {
                self.step_failed("speech", Some(agent_id), e.to_string());
                Ok(false)
            }
        }
    }

    async fn summarize_phase(
        &mut self,
        phase: &PhaseConfig,
    ) -> Result<Option<String>, RunDiscussionError> {
        let since = self.phase_start_sequence.max(self.last_summary_sequence);
        let events = self.log().get_events_after(&self.session_id, since).await?;
        self.summarize(phase.name.clone(), &events, false).await
    }

    async fn summarize(
        &mut self,
        phase_name: String,
        events: &[Event],
        is_final: bool,
    ) -> Result<Option<String>, RunDiscussionError> {
        let input = SummaryInput {
            topic: self.topic.clone(),
            phase_name,
            events: condense_events(events, self.params().condensed_event_chars),
            consensus: self.consensus.clone(),
            divergence: self.divergence.clone(),
            is_final,
        };
        match self.language.generate_summary(&input, &self.token).await {
            Ok(summary) => {
                self.consensus = summary.consensus.clone();
                self.divergence = summary.divergence.clone();
                let mut payload = summary.to_payload();
                payload["scope"] = json!(if is_final { "final" } else { "phase" });
                let event = self.record(NewEvent::summary(payload)).await?;
                self.last_summary_sequence = event.sequence;
                Ok(Some(summary.text))
            }
            Err(e) => {
                self.language_failed("summary", e)?;
                Ok(None)
            }
        }
    }

    async fn ask_question(
        &mut self,
        phase: &PhaseConfig,
        recent: &[Event],
    ) -> Result<(), RunDiscussionError> {
        let roster = self.state.roster();
        let fewest = roster.iter().map(|a| self.state.speech_count(a)).min().unwrap_or(0);
        let quiet_agents: Vec<AgentId> = roster
            .iter()
            .filter(|a| self.state.speech_count(a) == fewest)
            .cloned()
            .collect();
        let preferred_type = if phase.phase_type == PhaseType::Debate {
            QuestionType::Challenge
        } else if quiet_agents.len() < roster.len() {
            QuestionType::Directed
        } else {
            QuestionType::Open
        };

        let start = recent.len().saturating_sub(self.params().visible_window);
        let input = GuidingQuestionInput {
            topic: self.topic.clone(),
            phase: PhaseDescriptor::from_config(phase, self.state.phase_round()),
            recent_events: condense_events(&recent[start..], self.params().condensed_event_chars),
            quiet_agents,
            preferred_type,
        };
        match self.language.generate_guiding_question(&input, &self.token).await {
            Ok(question) => {
                let event = NewEvent::system(
                    SystemKind::GuidingQuestion,
                    Speaker::Moderator,
                    question.to_payload(),
                );
                self.record(event).await?;
                Ok(())
            }
            Err(e) => self.language_failed("guiding question", e),
        }
    }

    async fn switch_phase(
        &mut self,
        current: &PhaseConfig,
        next_phase_id: &str,
    ) -> Result<(), RunDiscussionError> {
        if current.summarize_on_exit {
            self.summarize_phase(current).await?;
        }

        let key_points = self
            .outline
            .for_phase(next_phase_id)
            .map(|o| o.key_points.clone())
            .unwrap_or_default();
        let next_name = self
            .controller
            .scenario()
            .phase_index(next_phase_id)
            .and_then(|i| self.controller.scenario().phase(i))
            .map(|p| p.name.clone())
            .ok_or_else(|| DecisionError::UnknownPhase(next_phase_id.to_string()))?;
        let payload = json!({
            "from": current.id,
            "to": next_phase_id,
            "name": next_name,
            "key_points": key_points,
        });
        let event = self
            .record(NewEvent::system(SystemKind::PhaseSwitched, Speaker::Moderator, payload))
            .await?;

        self.controller
            .update_state_after_phase_switch(&mut self.state, next_phase_id)?;
        self.phase_start_sequence = event.sequence;
        info!(
            session_id = %self.session_id,
            from = %current.id,
            to = %next_phase_id,
            "Phase switched"
        );
        if let Some(next) = self.controller.scenario().phase(self.state.phase_index()) {
            self.progress.on_phase_start(next);
        }
        Ok(())
    }

    async fn finish(mut self, reason: EndReason) -> Result<DiscussionOutcome, RunDiscussionError> {
        let events = self
            .log()
            .get_latest_events(&self.session_id, self.params().final_summary_events)
            .await?;
        let final_summary = self.summarize("all phases".to_string(), &events, true).await?;

        let input = RemarksInput {
            topic: self.topic.clone(),
            participants: self.participants.clone(),
            phase_names: self.controller.scenario().phases.iter().map(|p| p.name.clone()).collect(),
            summary: final_summary.clone(),
        };
        match self.language.generate_closing_remarks(&input, &self.token).await {
            Ok(text) => {
                let event = NewEvent::system(
                    SystemKind::ClosingRemarks,
                    Speaker::Moderator,
                    json!({ "text": text }),
                );
                self.record(event).await?;
            }
            Err(e) => self.language_failed("closing remarks", e)?,
        }

        let ended = NewEvent::system(
            SystemKind::DiscussionEnded,
            Speaker::System,
            json!({ "reason": reason.as_str(), "rounds": self.state.global_round() }),
        );
        self.record(ended).await?;
        self.controller.update_state_after_end(&mut self.state, reason);

        info!(
            session_id = %self.session_id,
            reason = %reason,
            rounds = self.state.global_round(),
            failed_steps = self.failed_steps.len(),
            "Discussion ended"
        );
        self.progress
            .on_session_end(&self.session_id, reason, self.state.global_round());

        Ok(DiscussionOutcome {
            session_id: self.session_id,
            rounds: self.state.global_round(),
            end_reason: reason,
            events_recorded: self.events_recorded,
            final_summary,
            consensus: self.consensus,
            divergence: self.divergence,
            failed_steps: self.failed_steps,
        })
    }

    fn meta(&self) -> EventMeta {
        EventMeta::for_round(self.state.phase_id(), self.state.global_round())
    }

    /// Append an event, tagging it with the current phase and round.
    async fn record(&mut self, event: NewEvent) -> Result<Event, RunDiscussionError> {
        let event = match event.meta {
            Some(_) => event,
            None => {
                let meta = self.meta();
                event.with_meta(meta)
            }
        };
        let stored = self.log().append(&self.session_id, event).await?;
        self.events_recorded += 1;
        self.agents.observe(&stored);
        self.progress.on_event(&stored);
        Ok(stored)
    }

    fn language_failed(
        &mut self,
        step: &str,
        error: LanguageError,
    ) -> Result<(), RunDiscussionError> {
        if error.is_cancelled() {
            return Err(RunDiscussionError::Cancelled);
        }
        self.step_failed(step, None, error.to_string());
        Ok(())
    }

    fn step_failed(&mut self, step: &str, agent_id: Option<&AgentId>, error: String) {
        warn!(
            session_id = %self.session_id,
            agent_id = agent_id.map(AgentId::as_str).unwrap_or("moderator"),
            step,
            error = %error,
            "Step failed"
        );
        self.progress.on_step_failed(step, agent_id, &error);
        self.failed_steps.push(FailedStep {
            round: self.state.global_round() + 1,
            step: step.to_string(),
            agent_id: agent_id.cloned(),
            error,
        });
    }
}
