//! Shared utilities for use cases.
//!
//! Cancellation checking and the cancellable, time-bounded LLM call used by
//! agents and the moderator language generator.

use crate::ports::llm_client::{GatewayError, LlmClient};
use agora_domain::{ChatMessage, Completion, CompletionOptions};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Returns `Err(GatewayError::Cancelled)` once the token is cancelled.
pub(crate) fn check_cancelled(token: &CancellationToken) -> Result<(), GatewayError> {
    if token.is_cancelled() {
        return Err(GatewayError::Cancelled);
    }
    Ok(())
}

/// Call the client, racing cancellation and a timeout.
pub(crate) async fn complete_cancellable(
    client: &dyn LlmClient,
    messages: &[ChatMessage],
    options: &CompletionOptions,
    timeout: Duration,
    token: &CancellationToken,
) -> Result<Completion, GatewayError> {
    check_cancelled(token)?;
    tokio::select! {
        biased;
        _ = token.cancelled() => Err(GatewayError::Cancelled),
        result = tokio::time::timeout(timeout, client.complete(messages, options)) => {
            match result {
                Ok(completion) => completion,
                Err(_) => Err(GatewayError::Timeout),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct Slow;

    #[async_trait]
    impl LlmClient for Slow {
        async fn complete(
            &self,
            _m: &[ChatMessage],
            _o: &CompletionOptions,
        ) -> Result<Completion, GatewayError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(Completion::text("late"))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_maps_to_gateway_timeout() {
        let token = CancellationToken::new();
        let options = CompletionOptions::new("m");
        let err = complete_cancellable(&Slow, &[], &options, Duration::from_secs(1), &token)
            .await
            .unwrap_err();
        assert_eq!(err, GatewayError::Timeout);
    }

    #[tokio::test]
    async fn test_cancelled_token_short_circuits() {
        let token = CancellationToken::new();
        token.cancel();
        let options = CompletionOptions::new("m");
        let err = complete_cancellable(&Slow, &[], &options, Duration::from_secs(1), &token)
            .await
            .unwrap_err();
        assert!(err.is_cancelled());
    }
}
