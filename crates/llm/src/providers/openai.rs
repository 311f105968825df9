//! OpenAI provider implementation.
//!
//! Chat-completions API: https://platform.openai.com/docs/api-reference/chat

use crate::client::{CompletionBackend, CompletionRequest, CompletionResponse};
use crate::providers::post_chat;
use mizan_core::EngineResult;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// OpenAI completion client.
pub struct OpenAiClient {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl OpenAiClient {
    /// Create a client against the public OpenAI endpoint.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    /// Create a client with a custom base URL (proxies, compatible servers).
    pub fn with_base_url(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait::async_trait]
impl CompletionBackend for OpenAiClient {
    fn provider_name(&self) -> &'static str {
        "openai"
    }

    async fn complete(&self, request: &CompletionRequest) -> EngineResult<CompletionResponse> {
        let url = format!("{}/chat/completions", self.base_url);
        post_chat(&self.client, &url, &self.api_key, "openai", request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openai_client_creation() {
        let client = OpenAiClient::new("key");
        assert_eq!(client.provider_name(), "openai");
        assert_eq!(client.base_url, DEFAULT_BASE_URL);
    }
}
