//! Completion backend factory.
//!
//! Resolves the configured provider name to a concrete client. Selection
//! happens once at configuration load; the orchestrator never mixes
//! providers within a request.

use crate::client::CompletionBackend;
use crate::providers::{GroqClient, OpenAiClient};
use crate::types::ProviderKind;
use mizan_core::{EngineError, EngineResult};
use std::sync::Arc;

/// Create a completion backend for the given provider.
///
/// # Errors
/// Returns `EngineError::Config` when the provider requires an API key and
/// none was supplied.
pub fn create_backend(
    kind: ProviderKind,
    api_key: Option<&str>,
    endpoint: Option<&str>,
) -> EngineResult<Arc<dyn CompletionBackend>> {
    let api_key = api_key.ok_or_else(|| {
        EngineError::Config(format!(
            "Provider '{}' requires an API key (set MIZAN_API_KEY or {}_API_KEY)",
            kind.as_str(),
            kind.as_str().to_uppercase()
        ))
    })?;

    let backend: Arc<dyn CompletionBackend> = match kind {
        ProviderKind::Groq => match endpoint {
            Some(url) => Arc::new(GroqClient::with_base_url(api_key, url)),
            None => Arc::new(GroqClient::new(api_key)),
        },
        ProviderKind::OpenAi => match endpoint {
            Some(url) => Arc::new(OpenAiClient::with_base_url(api_key, url)),
            None => Arc::new(OpenAiClient::new(api_key)),
        },
    };

    tracing::info!(provider = backend.provider_name(), "Created completion backend");
    Ok(backend)
}

/// Create a backend from a configured provider name.
pub fn create_backend_by_name(
    provider: &str,
    api_key: Option<&str>,
    endpoint: Option<&str>,
) -> EngineResult<Arc<dyn CompletionBackend>> {
    let kind = ProviderKind::parse(provider)
        .ok_or_else(|| EngineError::Config(format!("Unknown provider: {}", provider)))?;
    create_backend(kind, api_key, endpoint)
}
