//! LLM client port
//!
//! Defines the interface for communicating with chat-completion backends.

use agora_domain::{ChatMessage, Completion, CompletionOptions, StreamEvent};
use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

/// Errors that can occur during LLM calls
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GatewayError {
    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Model not available: {0}")]
    ModelNotAvailable(String),

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Timeout")]
    Timeout,

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Other error: {0}")]
    Other(String),
}

impl GatewayError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, GatewayError::Cancelled)
    }
}

/// Client for one chat-completion backend.
///
/// Implementations (adapters) live in the infrastructure layer. The model is
/// chosen per request through [`CompletionOptions::model`].
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Human-readable backend name for logs.
    fn name(&self) -> &str {
        "llm"
    }

    async fn complete(
        &self,
        messages: &[ChatMessage],
        options: &CompletionOptions,
    ) -> Result<Completion, GatewayError>;

    /// Streaming variant.
    ///
    /// Default implementation calls `complete()` and wraps the result in a
    /// single `Completed` event.
    async fn complete_streaming(
        &self,
        messages: &[ChatMessage],
        options: &CompletionOptions,
    ) -> Result<StreamHandle, GatewayError> {
        let completion = self.complete(messages, options).await?;
        let (tx, rx) = mpsc::channel(1);
        // receiver may already be gone
        let _ = tx.send(StreamEvent::Completed(completion)).await;
        Ok(StreamHandle::new(rx))
    }
}

/// Handle for receiving streaming events from an LLM call.
pub struct StreamHandle {
    pub receiver: mpsc::Receiver<StreamEvent>,
}

impl StreamHandle {
    pub fn new(receiver: mpsc::Receiver<StreamEvent>) -> Self {
        Self { receiver }
    }

    /// Consume the stream into a single completion.
    ///
    /// Deltas are concatenated; a `Completed` event with non-empty content
    /// wins over the accumulated deltas only when no delta arrived.
    pub async fn collect(mut self) -> Result<Completion, GatewayError> {
        let mut full_text = String::new();
        while let Some(event) = self.receiver.recv().await {
            match event {
                StreamEvent::Delta(chunk) => full_text.push_str(&chunk),
                StreamEvent::Completed(mut completion) => {
                    if !full_text.is_empty() {
                        completion.content = full_text;
                    }
                    return Ok(completion);
                }
                StreamEvent::Error(e) => return Err(GatewayError::RequestFailed(e)),
            }
        }
        // channel closed without Completed
        Ok(Completion::text(full_text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Echo;

    #[async_trait]
    impl LlmClient for Echo {
        async fn complete(
            &self,
            messages: &[ChatMessage],
            _options: &CompletionOptions,
        ) -> Result<Completion, GatewayError> {
            Ok(Completion::text(messages.last().map(|m| m.content.clone()).unwrap_or_default()))
        }
    }

    #[tokio::test]
    async fn test_default_streaming_wraps_complete() {
        let handle = Echo
            .complete_streaming(&[ChatMessage::user("hello")], &CompletionOptions::new("m"))
            .await
            .unwrap();
        assert_eq!(handle.collect().await.unwrap().content, "hello");
    }

    #[tokio::test]
    async fn test_collect_concatenates_deltas() {
        let (tx, rx) = mpsc::channel(4);
        tx.send(StreamEvent::Delta("Hel".into())).await.unwrap();
        tx.send(StreamEvent::Delta("lo".into())).await.unwrap();
        tx.send(StreamEvent::Completed(Completion::text(""))).await.unwrap();
        assert_eq!(StreamHandle::new(rx).collect().await.unwrap().content, "Hello");
    }

    #[tokio::test]
    async fn test_collect_error_event() {
        let (tx, rx) = mpsc::channel(1);
        tx.send(StreamEvent::Error("boom".into())).await.unwrap();
        let err = StreamHandle::new(rx).collect().await.unwrap_err();
        assert_eq!(err, GatewayError::RequestFailed("boom".into()));
        assert!(!err.is_cancelled());
    }
}
