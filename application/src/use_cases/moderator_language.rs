//! Moderator Language Generator
//!
//! Produces the text of moderator-authored artifacts. Works only on the
//! structured inputs it is handed: no event log access, no agent state.

use crate::ports::llm_client::{GatewayError, LlmClient};
use crate::use_cases::shared::complete_cancellable;
use agora_domain::moderator::{
    DiscussionOutline, GuidingQuestion, GuidingQuestionInput, RemarksInput, SummaryInput,
    SummaryOutput, parse_guiding_question, parse_outline, parse_remarks, parse_summary,
};
use agora_domain::{ChatMessage, CompletionOptions, ModeratorPromptTemplate, PhaseConfig};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LanguageError {
    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),

    #[error("Empty {0} from moderator model")]
    Empty(&'static str),
}

impl LanguageError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, LanguageError::Gateway(e) if e.is_cancelled())
    }
}

pub struct ModeratorLanguageGenerator {
    client: Arc<dyn LlmClient>,
    options: CompletionOptions,
    timeout: Duration,
}

impl ModeratorLanguageGenerator {
    pub fn new(client: Arc<dyn LlmClient>, options: CompletionOptions) -> Self {
        Self {
            client,
            options,
            timeout: Duration::from_secs(120),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    async fn ask(
        &self,
        messages: Vec<ChatMessage>,
        token: &CancellationToken,
    ) -> Result<String, LanguageError> {
        let options = self.options.clone().json();
        let completion =
            complete_cancellable(self.client.as_ref(), &messages, &options, self.timeout, token)
                .await?;
        Ok(completion.content)
    }

    /// Per-phase key points and questions. Unparseable output yields an
    /// empty outline.
    pub async fn generate_outline(
        &self,
        topic: &str,
        phases: &[PhaseConfig],
        token: &CancellationToken,
    ) -> Result<DiscussionOutline, LanguageError> {
        let text = self.ask(ModeratorPromptTemplate::outline(topic, phases), token).await?;
        let outline = parse_outline(&text, phases);
        if outline.is_empty() {
            warn!("Outline response unusable, continuing without outline");
        }
        Ok(outline)
    }

    pub async fn generate_guiding_question(
        &self,
        input: &GuidingQuestionInput,
        token: &CancellationToken,
    ) -> Result<GuidingQuestion, LanguageError> {
        let text = self.ask(ModeratorPromptTemplate::guiding_question(input), token).await?;
        let question = parse_guiding_question(&text, input.preferred_type)
            .ok_or(LanguageError::Empty("question"))?;
        debug!(question_type = question.question_type.as_str(), "Guiding question generated");
        Ok(question)
    }

    pub async fn generate_summary(
        &self,
        input: &SummaryInput,
        token: &CancellationToken,
    ) -> Result<SummaryOutput, LanguageError> {
        let text = self.ask(ModeratorPromptTemplate::summary(input), token).await?;
        parse_summary(&text, input).ok_or(LanguageError::Empty("summary"))
    }

    pub async fn generate_opening_remarks(
        &self,
        input: &RemarksInput,
        token: &CancellationToken,
    ) -> Result<String, LanguageError> {
        let text = self.ask(ModeratorPromptTemplate::opening_remarks(input), token).await?;
        parse_remarks(&text).ok_or(LanguageError::Empty("opening remarks"))
    }

    pub async fn generate_closing_remarks(
        &self,
        input: &RemarksInput,
        token: &CancellationToken,
    ) -> Result<String, LanguageError> {
        let text = self.ask(ModeratorPromptTemplate::closing_remarks(input), token).await?;
        parse_remarks(&text).ok_or(LanguageError::Empty("closing remarks"))
    }
}
