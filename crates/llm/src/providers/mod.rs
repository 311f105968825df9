//! Provider implementations.
//!
//! Both supported providers speak the OpenAI chat-completions wire format, so
//! the request/response structs and the error normalization live here and the
//! per-provider modules contribute endpoints and defaults.

mod groq;
mod openai;

pub use groq::GroqClient;
pub use openai::OpenAiClient;

use crate::client::{CompletionRequest, CompletionResponse, TokenUsage};
use mizan_core::{EngineError, EngineResult, ProviderErrorKind};
use serde::{Deserialize, Serialize};

/// Chat-completions API request body.
#[derive(Debug, Serialize)]
pub(crate) struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct ChatMessage {
    role: String,
    content: String,
}

/// Chat-completions API response body.
#[derive(Debug, Deserialize)]
pub(crate) struct ChatResponse {
    #[serde(default)]
    model: Option<String>,
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize, Default)]
pub(crate) struct ChatUsage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
}

impl ChatRequest {
    fn from_completion(request: &CompletionRequest) -> Self {
        let mut messages = Vec::with_capacity(2);
        if let Some(ref system) = request.system {
            messages.push(ChatMessage {
                role: "system".to_string(),
                content: system.clone(),
            });
        }
        messages.push(ChatMessage {
            role: "user".to_string(),
            content: request.prompt.clone(),
        });

        Self {
            model: request.model.clone(),
            messages,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        }
    }
}

/// POST a chat-completions request and normalize the outcome.
pub(crate) async fn post_chat(
    client: &reqwest::Client,
    url: &str,
    api_key: &str,
    provider: &'static str,
    request: &CompletionRequest,
) -> EngineResult<CompletionResponse> {
    tracing::debug!(provider, model = %request.model, "Sending completion request");

    let body = ChatRequest::from_completion(request);
    let response = client
        .post(url)
        .bearer_auth(api_key)
        .json(&body)
        .send()
        .await
        .map_err(|e| map_transport_error(provider, e))?;

    let status = response.status();
    if !status.is_success() {
        let detail = response
            .text()
            .await
            .unwrap_or_else(|_| "no response body".to_string());
        return Err(map_status_error(provider, status, &detail));
    }

    let chat: ChatResponse = response
        .json()
        .await
        .map_err(|e| map_transport_error(provider, e))?;

    let choice = chat.choices.into_iter().next().ok_or_else(|| {
        EngineError::provider(
            ProviderErrorKind::Unavailable,
            format!("{} returned no choices", provider),
        )
    })?;

    let usage = chat.usage.unwrap_or_default();
    tracing::debug!(provider, "Received completion");

    Ok(CompletionResponse {
        text: choice.message.content,
        model: chat.model.unwrap_or_else(|| request.model.clone()),
        usage: TokenUsage::new(usage.prompt_tokens, usage.completion_tokens),
    })
}

/// Map a transport-level failure onto the provider error taxonomy.
pub(crate) fn map_transport_error(provider: &'static str, err: reqwest::Error) -> EngineError {
    let kind = if err.is_timeout() {
        ProviderErrorKind::Timeout
    } else {
        ProviderErrorKind::Unavailable
    };
    EngineError::provider(kind, format!("{} request failed: {}", provider, err))
}

/// Map a non-success HTTP status onto the provider error taxonomy.
pub(crate) fn map_status_error(
    provider: &'static str,
    status: reqwest::StatusCode,
    detail: &str,
) -> EngineError {
    let kind = match status.as_u16() {
        401 | 403 => ProviderErrorKind::Auth,
        429 => ProviderErrorKind::RateLimit,
        408 => ProviderErrorKind::Timeout,
        _ => ProviderErrorKind::Unavailable,
    };
    EngineError::provider(kind, format!("{} API error ({}): {}", provider, status, detail))
}
