//! Command handlers for the Mizan CLI.

pub mod ask;
pub mod chat;
pub mod history;

pub use ask::AskCommand;
pub use chat::ChatCommand;
pub use history::HistoryCommand;

use mizan_core::{config::EngineConfig, EngineError, EngineResult};
use mizan_engine::{AnswerEngine, ConversationHistory, ConversationMemory, RetrievalPolicy};
use mizan_llm::{create_backend, GatewayConfig, ProviderGateway, ProviderKind};
use mizan_prompt::{ComposerConfig, PromptComposer};
use mizan_retrieval::HttpChunkStore;
use std::sync::Arc;
use std::time::Duration;

/// Wire an [`AnswerEngine`] from the loaded configuration.
pub(crate) fn build_engine(config: &EngineConfig) -> EngineResult<AnswerEngine> {
    let kind = ProviderKind::parse(&config.provider)
        .ok_or_else(|| EngineError::Config(format!("Unknown provider: {}", config.provider)))?;
    let api_key = config.resolve_api_key();
    let backend = create_backend(kind, api_key.as_deref(), config.endpoint.as_deref())?;

    let (model, fallback) = resolve_models(config, kind);
    let mut gateway_config = GatewayConfig::new(model)
        .with_temperature(config.temperature)
        .with_timeout(Duration::from_secs(config.timeout_secs));
    if let Some(fallback) = fallback {
        gateway_config = gateway_config.with_fallback_model(fallback);
    }
    let gateway = ProviderGateway::new(backend, gateway_config);

    // Every chunk returned as a source must also reach the model
    let composer = PromptComposer::new(ComposerConfig {
        max_chunks: config.max_sources,
        budget_chars: config.prompt_budget,
    })?;

    let store = Arc::new(HttpChunkStore::new(&config.chunk_store_url)?);
    let memory = ConversationMemory::new(config.memory.window_size, config.memory.enabled);

    let mut engine = AnswerEngine::new(store, gateway, composer, memory)
        .with_retrieval_policy(RetrievalPolicy {
            top_k: config.top_k,
            max_sources: config.max_sources,
            min_score: config.min_score,
        });

    if let Some(db_path) = &config.history_db {
        engine = engine.with_history(ConversationHistory::open(db_path)?);
    }

    Ok(engine)
}

/// Fill unset model choices from the provider's defaults, so switching
/// providers without naming a model picks a model that provider serves.
/// An explicitly empty fallback disables the retry.
pub(crate) fn resolve_models(config: &EngineConfig, kind: ProviderKind) -> (String, Option<String>) {
    let model = config
        .model
        .clone()
        .unwrap_or_else(|| kind.default_model().to_string());
    let fallback = match config.fallback_model.as_deref() {
        None => Some(kind.default_fallback_model().to_string()),
        Some("") => None,
        Some(explicit) => Some(explicit.to_string()),
    };
    (model, fallback)
}

/// Open the configured history database directly, without a full engine.
pub(crate) fn open_history(config: &EngineConfig) -> EngineResult<Option<ConversationHistory>> {
    config
        .history_db
        .as_ref()
        .map(ConversationHistory::open)
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unset_models_use_provider_defaults() {
        let config = EngineConfig::default();
        let (model, fallback) = resolve_models(&config, ProviderKind::Groq);
        assert_eq!(model, "llama-3.3-70b-versatile");
        assert_eq!(fallback.as_deref(), Some("llama-3.1-8b-instant"));

        let (model, fallback) = resolve_models(&config, ProviderKind::OpenAi);
        assert_eq!(model, "gpt-4o-mini");
        assert_eq!(fallback.as_deref(), Some("gpt-3.5-turbo"));
    }

    #[test]
    fn test_explicit_models_win() {
        let mut config = EngineConfig::default();
        config.model = Some("llama-3.1-70b".to_string());
        config.fallback_model = Some("llama-guard".to_string());

        let (model, fallback) = resolve_models(&config, ProviderKind::Groq);
        assert_eq!(model, "llama-3.1-70b");
        assert_eq!(fallback.as_deref(), Some("llama-guard"));
    }

    #[test]
    fn test_empty_fallback_disables_retry() {
        let mut config = EngineConfig::default();
        config.fallback_model = Some(String::new());

        let (_, fallback) = resolve_models(&config, ProviderKind::Groq);
        assert_eq!(fallback, None);
    }
}
