//! Groq provider implementation.
//!
//! Groq exposes an OpenAI-compatible chat-completions API:
//! https://console.groq.com/docs/api-reference

use crate::client::{CompletionBackend, CompletionRequest, CompletionResponse};
use crate::providers::post_chat;
use mizan_core::EngineResult;

const DEFAULT_BASE_URL: &str = "https://api.groq.com/openai/v1";

/// Groq completion client.
pub struct GroqClient {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl GroqClient {
    /// Create a client against the public Groq endpoint.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    /// Create a client with a custom base URL.
    pub fn with_base_url(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait::async_trait]
impl CompletionBackend for GroqClient {
    fn provider_name(&self) -> &'static str {
        "groq"
    }

    async fn complete(&self, request: &CompletionRequest) -> EngineResult<CompletionResponse> {
        let url = format!("{}/chat/completions", self.base_url);
        post_chat(&self.client, &url, &self.api_key, "groq", request).await
    }
}
