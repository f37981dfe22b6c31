//! Agent Executor
//!
//! One executor per participant and session. It owns the participant's
//! private memory and is the only component that calls a model on the
//! participant's behalf. It proposes (intent) and speaks (speech) but never
//! decides whether it may speak.

use crate::ports::llm_client::{GatewayError, LlmClient};
use crate::use_cases::shared::complete_cancellable;
use agora_domain::agent::{parse_intent_output, parse_speech_output};
use agora_domain::core::string::truncate_chars;
use agora_domain::{
    AgentId, AgentPersona, AgentPrivateContext, AgentPromptTemplate, AgentVisibleContext,
    CompletionOptions, Event, EventType, IntentOutput, MemoryCategory, MemoryLimits,
    OutputParseError, ShortTermMemory, Speaker, SpeechOutput, TokenUsage,
};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

const INTENT_IMPORTANCE: f64 = 0.3;
const SPEECH_IMPORTANCE: f64 = 0.8;
const OBSERVATION_IMPORTANCE: f64 = 0.2;
const OBSERVATION_CHARS: usize = 240;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AgentError {
    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),

    #[error("Invalid output: {0}")]
    Parse(#[from] OutputParseError),
}

impl AgentError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, AgentError::Gateway(e) if e.is_cancelled())
    }
}

/// A speech together with the cost of producing it.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedSpeech {
    pub speech: SpeechOutput,
    pub token_usage: Option<TokenUsage>,
}

pub struct AgentExecutor {
    persona: AgentPersona,
    client: Arc<dyn LlmClient>,
    options: CompletionOptions,
    private: AgentPrivateContext,
    max_speech_chars: usize,
    memory_in_prompt: usize,
    speech_timeout: Duration,
}

impl AgentExecutor {
    pub fn new(
        persona: AgentPersona,
        client: Arc<dyn LlmClient>,
        options: CompletionOptions,
    ) -> Self {
        Self {
            persona,
            client,
            options,
            private: AgentPrivateContext::new(MemoryLimits::default(), ""),
            max_speech_chars: 800,
            memory_in_prompt: agora_domain::prompt::agent::MEMORY_IN_PROMPT,
            speech_timeout: Duration::from_secs(120),
        }
    }

    pub fn with_memory_limits(mut self, limits: MemoryLimits) -> Self {
        self.private = AgentPrivateContext::new(limits, self.private.goal.clone());
        self
    }

    pub fn with_goal(mut self, goal: impl Into<String>) -> Self {
        self.private.goal = goal.into();
        self
    }

    pub fn with_max_speech_chars(mut self, max: usize) -> Self {
        self.max_speech_chars = max;
        self
    }

    pub fn with_memory_in_prompt(mut self, n: usize) -> Self {
        self.memory_in_prompt = n;
        self
    }

    pub fn with_speech_timeout(mut self, timeout: Duration) -> Self {
        self.speech_timeout = timeout;
        self
    }

    pub fn id(&self) -> &AgentId {
        &self.persona.id
    }

    pub fn persona(&self) -> &AgentPersona {
        &self.persona
    }

    pub fn memory(&self) -> &ShortTermMemory {
        &self.private.memory
    }

    /// Ask the model whether this agent wants to speak.
    ///
    /// `timeout` bounds the model call; the caller decides what a failure
    /// means.
    pub async fn generate_intent(
        &mut self,
        visible: &AgentVisibleContext,
        timeout: Duration,
        token: &CancellationToken,
    ) -> Result<IntentOutput, AgentError> {
        let messages = AgentPromptTemplate::intent(
            &self.persona,
            &self.private.goal,
            visible,
            self.private.memory.recent(self.memory_in_prompt),
        );
        let options = self.options.clone().json();
        let completion =
            complete_cancellable(self.client.as_ref(), &messages, &options, timeout, token)
                .await?;
        let output = parse_intent_output(&completion.content)?;

        let mut note = format!("I chose to {} (urgency {})", output.intent, output.urgency);
        if let Some(topic) = &output.topic {
            note.push_str(&format!(" about {topic}"));
        }
        if let Some(reasoning) = &output.reasoning {
            note.push_str(&format!(". Reasoning: {reasoning}"));
        }
        self.private.remember(note, INTENT_IMPORTANCE, MemoryCategory::Action);
        debug!(
            agent_id = %self.persona.id,
            intent = %output.intent,
            urgency = output.urgency,
            "Intent generated"
        );
        Ok(output)
    }

    /// Produce a speech after the moderator gave this agent the floor.
    pub async fn generate_speech(
        &mut self,
        visible: &AgentVisibleContext,
        intended_topic: Option<&str>,
        token: &CancellationToken,
    ) -> Result<GeneratedSpeech, AgentError> {
        let messages = AgentPromptTemplate::speech(
            &self.persona,
            &self.private.goal,
            visible,
            self.private.memory.recent(self.memory_in_prompt),
            intended_topic,
            self.max_speech_chars,
        );
        let options = self.options.clone().json();
        let completion = complete_cancellable(
            self.client.as_ref(),
            &messages,
            &options,
            self.speech_timeout,
            token,
        )
        .await?;
        let speech = match parse_speech_output(&completion.content, self.max_speech_chars) {
            Ok(speech) => speech,
            Err(e) => {
                warn!(agent_id = %self.persona.id, error = %e, "Speech output rejected");
                return Err(e.into());
            }
        };

        let mut note = format!("I said: {}", speech.content);
        if let Some(thought) = &speech.inner_thought {
            note.push_str(&format!(" (privately: {thought})"));
        }
        self.private.remember(note, SPEECH_IMPORTANCE, MemoryCategory::Action);
        Ok(GeneratedSpeech {
            speech,
            token_usage: completion.token_usage,
        })
    }

    /// Note a public event from someone else as a low-importance observation.
    pub fn observe(&mut self, event: &Event) {
        if event.speaker.agent() == Some(&self.persona.id) || event.speaker == Speaker::System {
            return;
        }
        if !matches!(event.event_type, EventType::Speech | EventType::Summary | EventType::System) {
            return;
        }
        let text = event.content.as_text();
        if text.trim().is_empty() {
            return;
        }
        let note = format!("{} said: {}", event.speaker, truncate_chars(&text, OBSERVATION_CHARS));
        self.private.remember(note, OBSERVATION_IMPORTANCE, MemoryCategory::Observation);
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use agora_domain::{
        ChatMessage, Completion, IntentKind, PhaseConfig, PhaseDescriptor, PhaseType, Tone,
    };
    use async_trait::async_trait;
    use chrono::Utc;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replays canned responses and records every prompt it receives.
    pub(crate) struct ScriptedClient {
        responses: Mutex<VecDeque<Result<String, GatewayError>>>,
        pub(crate) prompts: Mutex<Vec<Vec<ChatMessage>>>,
    }

    impl ScriptedClient {
        pub(crate) fn new(responses: Vec<Result<String, GatewayError>>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                prompts: Mutex::new(Vec::new()),
            }
        }

        pub(crate) fn last_user_prompt(&self) -> String {
            self.prompts
                .lock()
                .unwrap()
                .last()
                .and_then(|m| m.last())
                .map(|m| m.content.clone())
                .unwrap_or_default()
        }
    }

    #[async_trait]
    impl LlmClient for ScriptedClient {
        async fn complete(
            &self,
            messages: &[ChatMessage],
            _options: &CompletionOptions,
        ) -> Result<Completion, GatewayError> {
            self.prompts.lock().unwrap().push(messages.to_vec());
            match self.responses.lock().unwrap().pop_front() {
                Some(Ok(text)) => Ok(Completion::text(text)),
                Some(Err(e)) => Err(e),
                None => Err(GatewayError::Other("script exhausted".into())),
            }
        }
    }

    pub(crate) fn visible() -> AgentVisibleContext {
        let phase = PhaseDescriptor::from_config(
            &PhaseConfig::new("discussion", "Discussion", PhaseType::Discussion, 5),
            0,
        );
        AgentVisibleContext::build("Remote work", phase, &[], 10, 300, Utc::now())
    }

    fn executor(client: Arc<ScriptedClient>) -> AgentExecutor {
        AgentExecutor::new(
            AgentPersona::new("alice", "Alice", "manager"),
            client,
            CompletionOptions::new("test-model"),
        )
    }

    #[tokio::test]
    async fn test_intent_is_clamped_and_remembered() {
        let client = Arc::new(ScriptedClient::new(vec![Ok(
            r#"{"intent":"shout","urgency":11,"reasoning":"they ignore me"}"#.into(),
        )]));
        let mut agent = executor(client);
        let output = agent
            .generate_intent(&visible(), Duration::from_secs(5), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(output.intent, IntentKind::Pass);
        assert_eq!(output.urgency, 5);
        assert_eq!(agent.memory().len(), 1);
        let entry = &agent.memory().entries()[0];
        assert_eq!(entry.importance, 0.3);
        assert_eq!(entry.category, MemoryCategory::Action);
        assert!(entry.content.contains("they ignore me"));
    }

    #[tokio::test]
    async fn test_malformed_intent_is_an_error() {
        let client = Arc::new(ScriptedClient::new(vec![Ok("I would like to speak".into())]));
        let mut agent = executor(client);
        let err = agent
            .generate_intent(&visible(), Duration::from_secs(5), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, AgentError::Parse(OutputParseError::MalformedJson { .. })));
        assert!(agent.memory().is_empty());
    }

    #[tokio::test]
    async fn test_speech_is_stripped_truncated_and_remembered() {
        let client = Arc::new(ScriptedClient::new(vec![Ok(
            r#"{"content":"<thinking>bluff</thinking>We must act now, before costs rise further.","tone":"furious","inner_thought":"I am unsure"}"#
                .into(),
        )]));
        let mut agent = executor(client).with_max_speech_chars(20);
        let generated = agent
            .generate_speech(&visible(), Some("costs"), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(generated.speech.content.chars().count(), 20);
        assert!(!generated.speech.content.contains("thinking"));
        assert_eq!(generated.speech.tone, Tone::Calm);
        let entry = &agent.memory().entries()[0];
        assert_eq!(entry.importance, 0.8);
        assert!(entry.content.contains("I am unsure"));
    }

    #[tokio::test]
    async fn test_gateway_failure_propagates() {
        let client = Arc::new(ScriptedClient::new(vec![Err(GatewayError::Timeout)]));
        let mut agent = executor(client);
        let err = agent
            .generate_speech(&visible(), None, &CancellationToken::new())
            .await
            .unwrap_err();
        assert_eq!(err, AgentError::Gateway(GatewayError::Timeout));
        assert!(!err.is_cancelled());
    }

    #[test]
    fn test_observe_skips_own_and_bookkeeping_events() {
        use agora_domain::{NewEvent, SessionId, SessionLedger};

        let mut agent = executor(Arc::new(ScriptedClient::new(Vec::new())));
        let mut ledger = SessionLedger::new(SessionId::new("s"));
        let own = ledger.append(NewEvent::speech(AgentId::new("alice"), "mine"));
        let vote = ledger.append(NewEvent::vote_end(AgentId::new("bob")));
        let other = ledger.append(NewEvent::speech(AgentId::new("bob"), "theirs"));

        agent.observe(&own);
        agent.observe(&vote);
        agent.observe(&other);
        assert_eq!(agent.memory().len(), 1);
        assert_eq!(agent.memory().entries()[0].content, "bob said: theirs");
        assert_eq!(agent.memory().entries()[0].category, MemoryCategory::Observation);
    }
}
