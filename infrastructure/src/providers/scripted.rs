//! Offline client answering every prompt kind with canned JSON.
//!
//! Used for `--dry-run` and for wiring tests: it never touches the network,
//! yet every response parses, so a whole discussion runs end to end.

use agora_application::{GatewayError, LlmClient};
use agora_domain::{ChatMessage, Completion, CompletionOptions, ModeratorPromptTemplate, TokenUsage};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::trace;

const TONES: [&str; 4] = ["calm", "assertive", "skeptical", "conciliatory"];

/// Deterministic offline [`LlmClient`].
///
/// Queued responses are returned first, in order. After that the reply is
/// derived from the prompt: moderator prompts get outline/question/summary/
/// remarks objects, intent prompts get a speak or pass decision, speech
/// prompts get a short statement signed with the agent's name.
#[derive(Default)]
pub struct ScriptedLlmClient {
    queued: Mutex<VecDeque<String>>,
    calls: AtomicUsize,
}

impl ScriptedLlmClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue raw responses returned before any scripted reply.
    pub fn with_responses<I, S>(self, responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if let Ok(mut queued) = self.queued.lock() {
            queued.extend(responses.into_iter().map(Into::into));
        }
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn next_queued(&self) -> Option<String> {
        self.queued.lock().ok()?.pop_front()
    }

    fn moderator_reply(user: &str) -> String {
        if user.starts_with("Prepare an outline") {
            r#"{"phases":[]}"#.to_string()
        } else if user.contains("Ask one short question") {
            r#"{"question":"Which argument would change your mind, and why?","type":"open","target":null}"#
                .to_string()
        } else if user.starts_with("Topic:") {
            r#"{"summary":"Participants stated their positions and responded to each other.","highlights":[],"consensus":[],"divergence":[]}"#
                .to_string()
        } else if user.starts_with("Close") {
            r#"{"remarks":"Thank you all. The discussion is closed."}"#.to_string()
        } else {
            r#"{"remarks":"Welcome. Let us begin."}"#.to_string()
        }
    }

    fn agent_reply(system: &str, user: &str, call: usize) -> String {
        let name = agent_name(system).unwrap_or("Participant");
        if user.contains("\"vote_end\"") {
            // rotate who wants the floor so every agent eventually speaks
            let turn = (call + name.len()) % 3;
            if turn == 0 {
                r#"{"intent":"pass","urgency":1,"vote_end":false}"#.to_string()
            } else {
                format!(r#"{{"intent":"speak","urgency":{},"vote_end":false}}"#, turn + 2)
            }
        } else {
            let tone = TONES[call % TONES.len()];
            serde_json::json!({
                "content": format!("{name} restates their view and adds point {call}."),
                "tone": tone,
                "addressed_to": null,
            })
            .to_string()
        }
    }
}

fn agent_name(system: &str) -> Option<&str> {
    system.strip_prefix("You are ")?.split(',').next()
}

fn estimate_tokens(text: &str) -> u32 {
    u32::try_from(text.len() / 4).unwrap_or(u32::MAX)
}

#[async_trait]
impl LlmClient for ScriptedLlmClient {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(
        &self,
        messages: &[ChatMessage],
        options: &CompletionOptions,
    ) -> Result<Completion, GatewayError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        let system = messages.first().map(|m| m.content.as_str()).unwrap_or_default();
        let user = messages.last().map(|m| m.content.as_str()).unwrap_or_default();

        let text = match self.next_queued() {
            Some(text) => text,
            None if system == ModeratorPromptTemplate::system() => Self::moderator_reply(user),
            None => Self::agent_reply(system, user, call),
        };
        trace!(model = %options.model, call, "Scripted completion");

        let prompt_tokens = messages.iter().map(|m| estimate_tokens(&m.content)).sum();
        let completion_tokens = estimate_tokens(&text);
        Ok(Completion::text(text).with_usage(TokenUsage {
            prompt_tokens,
            completion_tokens,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn moderator(user: &str) -> Vec<ChatMessage> {
        vec![ChatMessage::system(ModeratorPromptTemplate::system()), ChatMessage::user(user)]
    }

    #[tokio::test]
    async fn test_queued_responses_come_first() {
        let client = ScriptedLlmClient::new().with_responses(["first", "second"]);
        let options = CompletionOptions::new("m");
        let messages = moderator("Prepare an outline for a discussion on: x");

        assert_eq!(client.complete(&messages, &options).await.unwrap().content, "first");
        assert_eq!(client.complete(&messages, &options).await.unwrap().content, "second");
        let scripted = client.complete(&messages, &options).await.unwrap();
        assert_eq!(scripted.content, r#"{"phases":[]}"#);
        assert_eq!(client.calls(), 3);
    }

    #[tokio::test]
    async fn test_moderator_replies_are_json() {
        let client = ScriptedLlmClient::new();
        let options = CompletionOptions::new("m");
        for user in [
            "Topic: x\n\nSummarize the whole discussion.",
            "Topic: x\nPhase: p\n\nAsk one short question that gets the discussion going again.",
            "Open a discussion on: x",
            "Close the discussion on: x",
        ] {
            let completion = client.complete(&moderator(user), &options).await.unwrap();
            let value: serde_json::Value = serde_json::from_str(&completion.content).unwrap();
            assert!(value.is_object());
        }
    }

    #[tokio::test]
    async fn test_agent_replies() {
        let client = ScriptedLlmClient::new();
        let options = CompletionOptions::new("m");
        let system = ChatMessage::system(
            "You are Ann, taking part in a moderated group discussion as economist.",
        );

        let intent = client
            .complete(&[system.clone(), ChatMessage::user(r#"{ "vote_end": false }"#)], &options)
            .await
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&intent.content).unwrap();
        assert!(value["intent"] == "speak" || value["intent"] == "pass");

        let speech = client
            .complete(&[system, ChatMessage::user("Say something.")], &options)
            .await
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&speech.content).unwrap();
        assert!(value["content"].as_str().unwrap().starts_with("Ann "));
        assert!(speech.token_usage.is_some());
    }
}
