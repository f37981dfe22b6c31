//! Agent Executor Service
//!
//! Arena of the executors taking part in one session. Lookups go through an
//! id → index map; iteration order is the roster order.

use crate::ports::llm_client::GatewayError;
use crate::use_cases::agent_executor::{AgentError, AgentExecutor, GeneratedSpeech};
use agora_domain::{
    AgentId, AgentVisibleContext, Event, Intent, IntentKind, IntentOutput, SessionId,
};
use futures::future::join_all;
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AgentServiceError {
    #[error("Agent '{0}' is already registered")]
    Duplicate(AgentId),

    #[error("Unknown agent '{0}'")]
    Unknown(AgentId),

    #[error(transparent)]
    Agent(#[from] AgentError),
}

impl AgentServiceError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, AgentServiceError::Agent(e) if e.is_cancelled())
    }
}

/// One agent's answer for a round, after failure substitution.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectedIntent {
    pub agent_id: AgentId,
    pub output: IntentOutput,
    /// Set when the agent failed and `output` is the substituted pass.
    pub error: Option<String>,
}

impl CollectedIntent {
    pub fn to_intent(&self, submission_order: usize) -> Intent {
        let urgency = self.output.urgency as i64;
        let mut intent = Intent::new(self.agent_id.clone(), self.output.intent, urgency)
            .with_submission_order(submission_order);
        intent.target = self.output.target.clone();
        intent.topic = self.output.topic.clone();
        intent
    }
}

pub struct AgentExecutorService {
    session_id: SessionId,
    executors: Vec<AgentExecutor>,
    index: HashMap<AgentId, usize>,
    intent_timeout: Duration,
}

impl AgentExecutorService {
    pub fn new(session_id: SessionId) -> Self {
        Self {
            session_id,
            executors: Vec::new(),
            index: HashMap::new(),
            intent_timeout: Duration::from_secs(60),
        }
    }

    pub fn with_intent_timeout(mut self, timeout: Duration) -> Self {
        self.intent_timeout = timeout;
        self
    }

    pub fn create(&mut self, executor: AgentExecutor) -> Result<(), AgentServiceError> {
        let id = executor.id().clone();
        if self.index.contains_key(&id) {
            return Err(AgentServiceError::Duplicate(id));
        }
        self.index.insert(id, self.executors.len());
        self.executors.push(executor);
        Ok(())
    }

    pub fn get(&self, agent_id: &AgentId) -> Option<&AgentExecutor> {
        self.index.get(agent_id).map(|&i| &self.executors[i])
    }

    pub fn get_mut(&mut self, agent_id: &AgentId) -> Option<&mut AgentExecutor> {
        self.index.get(agent_id).map(|&i| &mut self.executors[i])
    }

    pub fn remove(&mut self, agent_id: &AgentId) -> Option<AgentExecutor> {
        let i = self.index.remove(agent_id)?;
        let removed = self.executors.remove(i);
        for slot in self.index.values_mut() {
            if *slot > i {
                *slot -= 1;
            }
        }
        Some(removed)
    }

    pub fn clear(&mut self) {
        self.executors.clear();
        self.index.clear();
    }

    pub fn len(&self) -> usize {
        self.executors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.executors.is_empty()
    }

    pub fn roster(&self) -> Vec<AgentId> {
        self.executors.iter().map(|e| e.id().clone()).collect()
    }

    /// Ask every agent for an intent concurrently.
    ///
    /// Results come back in roster order. A failed or timed-out agent is
    /// recorded as `pass` with urgency 1. Only cancellation is an error.
    pub async fn generate_intents(
        &mut self,
        visible: &AgentVisibleContext,
        token: &CancellationToken,
    ) -> Result<Vec<CollectedIntent>, AgentServiceError> {
        let timeout = self.intent_timeout;
        let results = join_all(self.executors.iter_mut().map(|executor| async move {
            let result = executor.generate_intent(visible, timeout, token).await;
            (executor.id().clone(), result)
        }))
        .await;

        if token.is_cancelled() {
            return Err(AgentError::Gateway(GatewayError::Cancelled).into());
        }

        let collected = results
            .into_iter()
            .map(|(agent_id, result)| match result {
                Ok(output) => CollectedIntent {
                    agent_id,
                    output,
                    error: None,
                },
                Err(e) => {
                    warn!(
                        session_id = %self.session_id,
                        agent_id = %agent_id,
                        error = %e,
                        "Intent failed, defaulting to pass"
                    );
                    CollectedIntent {
                        agent_id,
                        output: IntentOutput::pass(),
                        error: Some(e.to_string()),
                    }
                }
            })
            .collect::<Vec<_>>();
        let wanting_to_speak = collected
            .iter()
            .filter(|c| c.output.intent != IntentKind::Pass)
            .count();
        debug!(session_id = %self.session_id, wanting_to_speak, "Intents collected");
        Ok(collected)
    }

    pub async fn generate_speech(
        &mut self,
        agent_id: &AgentId,
        visible: &AgentVisibleContext,
        intended_topic: Option<&str>,
        token: &CancellationToken,
    ) -> Result<GeneratedSpeech, AgentServiceError> {
        let executor = self
            .get_mut(agent_id)
            .ok_or_else(|| AgentServiceError::Unknown(agent_id.clone()))?;
        Ok(executor.generate_speech(visible, intended_topic, token).await?)
    }

    /// Let every agent note a public event in its own memory.
    pub fn observe(&mut self, event: &Event) {
        for executor in &mut self.executors {
            executor.observe(event);
        }
    }
}
