//! OpenAI-compatible chat-completion client.

use crate::config::FileProviderConfig;
use agora_application::{GatewayError, LlmClient};
use agora_domain::{ChatMessage, Completion, CompletionOptions, FinishReason, TokenUsage};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
}

/// Client for OpenAI and API-compatible servers (vLLM, Ollama, LM Studio, ...).
pub struct OpenAiCompatibleClient {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
    max_tokens: Option<u32>,
}

impl OpenAiCompatibleClient {
    pub fn new(config: &FileProviderConfig) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| GatewayError::ConnectionError(e.to_string()))?;
        Ok(Self {
            client,
            endpoint: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
            api_key: config.resolve_api_key(),
            max_tokens: config.max_tokens,
        })
    }

    fn request<'a>(
        &self,
        messages: &'a [ChatMessage],
        options: &'a CompletionOptions,
    ) -> ChatRequest<'a> {
        ChatRequest {
            model: &options.model,
            messages,
            temperature: options.temperature,
            max_tokens: options.max_tokens.or(self.max_tokens),
            response_format: options.json_mode.then_some(ResponseFormat { kind: "json_object" }),
        }
    }
}

fn into_completion(response: ChatResponse) -> Result<Completion, GatewayError> {
    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| GatewayError::InvalidResponse("response has no choices".into()))?;
    let mut completion = Completion::text(choice.message.content.unwrap_or_default());
    if let Some(reason) = choice.finish_reason {
        completion.finish_reason = FinishReason::parse(&reason);
    }
    if let Some(usage) = response.usage {
        completion = completion.with_usage(TokenUsage {
            prompt_tokens: usage.prompt_tokens,
            completion_tokens: usage.completion_tokens,
        });
    }
    Ok(completion)
}

fn map_send_error(e: reqwest::Error) -> GatewayError {
    if e.is_timeout() {
        GatewayError::Timeout
    } else if e.is_connect() {
        GatewayError::ConnectionError(e.to_string())
    } else {
        GatewayError::RequestFailed(e.to_string())
    }
}

#[async_trait]
impl LlmClient for OpenAiCompatibleClient {
    fn name(&self) -> &str {
        "openai-compatible"
    }

    async fn complete(
        &self,
        messages: &[ChatMessage],
        options: &CompletionOptions,
    ) -> Result<Completion, GatewayError> {
        let mut request = self.client.post(&self.endpoint).json(&self.request(messages, options));
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(map_send_error)?;
        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(GatewayError::ModelNotAvailable(options.model.clone()));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::RequestFailed(format!("API error ({status}): {body}")));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::InvalidResponse(e.to_string()))?;
        let completion = into_completion(parsed)?;
        debug!(
            model = %options.model,
            tokens = completion.token_usage.map(|u| u.total()).unwrap_or(0),
            "Completion received"
        );
        Ok(completion)
    }
}
