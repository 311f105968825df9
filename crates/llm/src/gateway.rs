//! Provider gateway: timeout enforcement and model fallback.
//!
//! The gateway owns the completion policy around a backend: it enforces a
//! client-side timeout on every call and, on rate-limit or unavailability,
//! retries exactly once with a configured fallback model on the same
//! provider. Fallback never crosses providers.

use crate::client::{CompletionBackend, CompletionRequest, CompletionResponse};
use mizan_core::{EngineError, EngineResult, ProviderErrorKind};
use std::sync::Arc;
use std::time::Duration;

/// Completion policy for a gateway.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Primary model identifier
    pub model: String,

    /// Optional fallback model, tried at most once per request
    pub fallback_model: Option<String>,

    /// Sampling temperature passed to the backend
    pub temperature: f32,

    /// Maximum completion tokens
    pub max_tokens: Option<u32>,

    /// Client-side timeout per attempt
    pub timeout: Duration,
}

impl GatewayConfig {
    /// Create a config with defaults matching the engine configuration.
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            fallback_model: None,
            temperature: 0.3,
            max_tokens: Some(2048),
            timeout: Duration::from_secs(30),
        }
    }

    pub fn with_fallback_model(mut self, model: impl Into<String>) -> Self {
        self.fallback_model = Some(model.into());
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Gateway over a single completion backend.
pub struct ProviderGateway {
    backend: Arc<dyn CompletionBackend>,
    config: GatewayConfig,
}

impl ProviderGateway {
    pub fn new(backend: Arc<dyn CompletionBackend>, config: GatewayConfig) -> Self {
        Self { backend, config }
    }

    /// Provider name of the wrapped backend.
    pub fn provider_name(&self) -> &'static str {
        self.backend.provider_name()
    }

    /// Complete a prompt, applying timeout and single-fallback policy.
    ///
    /// Dropping the returned future cancels the in-flight provider call.
    pub async fn complete(
        &self,
        prompt: &str,
        system: Option<&str>,
    ) -> EngineResult<CompletionResponse> {
        let primary = self.attempt(&self.config.model, prompt, system).await;

        let err = match primary {
            Ok(response) => return Ok(response),
            Err(err) => err,
        };

        let retryable = matches!(
            err.provider_kind(),
            Some(ProviderErrorKind::RateLimit | ProviderErrorKind::Unavailable)
        );

        if let (true, Some(fallback)) = (retryable, self.config.fallback_model.as_deref()) {
            tracing::warn!(
                provider = self.backend.provider_name(),
                model = %self.config.model,
                fallback,
                error = %err,
                "Primary model failed, attempting fallback"
            );
            match self.attempt(fallback, prompt, system).await {
                Ok(response) => return Ok(response),
                Err(fallback_err) => {
                    tracing::warn!(error = %fallback_err, "Fallback model also failed");
                    // Surface the primary failure; the fallback was best-effort.
                    return Err(err);
                }
            }
        }

        Err(err)
    }

    async fn attempt(
        &self,
        model: &str,
        prompt: &str,
        system: Option<&str>,
    ) -> EngineResult<CompletionResponse> {
        let mut request =
            CompletionRequest::new(prompt, model).with_temperature(self.config.temperature);
        if let Some(max_tokens) = self.config.max_tokens {
            request = request.with_max_tokens(max_tokens);
        }
        if let Some(system) = system {
            request = request.with_system(system);
        }

        match tokio::time::timeout(self.config.timeout, self.backend.complete(&request)).await {
            Ok(result) => result,
            Err(_) => Err(EngineError::provider(
                ProviderErrorKind::Timeout,
                format!(
                    "{} did not respond within {:?}",
                    self.backend.provider_name(),
                    self.config.timeout
                ),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Backend that fails the first `failures` calls with the given kind.
    struct FlakyBackend {
        calls: AtomicUsize,
        failures: usize,
        kind: ProviderErrorKind,
    }

    impl FlakyBackend {
        fn new(failures: usize, kind: ProviderErrorKind) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                failures,
                kind,
            }
        }
    }

    #[async_trait::async_trait]
    impl CompletionBackend for FlakyBackend {
        fn provider_name(&self) -> &'static str {
            "mock"
        }

        async fn complete(
            &self,
            request: &CompletionRequest,
        ) -> EngineResult<CompletionResponse> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures {
                return Err(EngineError::provider(self.kind, "induced failure"));
            }
            Ok(CompletionResponse {
                text: format!("answer from {}", request.model),
                model: request.model.clone(),
                usage: Default::default(),
            })
        }
    }

    fn gateway_with(backend: Arc<FlakyBackend>) -> ProviderGateway {
        ProviderGateway::new(
            backend,
            GatewayConfig::new("primary").with_fallback_model("secondary"),
        )
    }

    #[tokio::test]
    async fn test_success_without_fallback() {
        let backend = Arc::new(FlakyBackend::new(0, ProviderErrorKind::RateLimit));
        let gateway = gateway_with(backend.clone());

        let response = gateway.complete("q", None).await.unwrap();
        assert_eq!(response.model, "primary");
        assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_rate_limit_triggers_single_fallback() {
        let backend = Arc::new(FlakyBackend::new(1, ProviderErrorKind::RateLimit));
        let gateway = gateway_with(backend.clone());

        let response = gateway.complete("q", None).await.unwrap();
        assert_eq!(response.model, "secondary");
        assert_eq!(backend.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_fallback_failure_surfaces_primary_error() {
        let backend = Arc::new(FlakyBackend::new(2, ProviderErrorKind::RateLimit));
        let gateway = gateway_with(backend.clone());

        let err = gateway.complete("q", None).await.unwrap_err();
        assert_eq!(err.provider_kind(), Some(ProviderErrorKind::RateLimit));
        // Exactly one fallback attempt, never more
        assert_eq!(backend.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_auth_error_does_not_fall_back() {
        let backend = Arc::new(FlakyBackend::new(1, ProviderErrorKind::Auth));
        let gateway = gateway_with(backend.clone());

        let err = gateway.complete("q", None).await.unwrap_err();
        assert_eq!(err.provider_kind(), Some(ProviderErrorKind::Auth));
        assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_no_fallback_configured() {
        let backend = Arc::new(FlakyBackend::new(1, ProviderErrorKind::Unavailable));
        let gateway = ProviderGateway::new(backend.clone(), GatewayConfig::new("primary"));

        let err = gateway.complete("q", None).await.unwrap_err();
        assert_eq!(err.provider_kind(), Some(ProviderErrorKind::Unavailable));
        assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
    }

    /// Backend that never completes, for timeout coverage.
    struct HangingBackend;

    #[async_trait::async_trait]
    impl CompletionBackend for HangingBackend {
        fn provider_name(&self) -> &'static str {
            "mock"
        }

        async fn complete(
            &self,
            _request: &CompletionRequest,
        ) -> EngineResult<CompletionResponse> {
            futures::future::pending().await
        }
    }

    #[tokio::test]
    async fn test_timeout_maps_to_timeout_kind() {
        let gateway = ProviderGateway::new(
            Arc::new(HangingBackend),
            GatewayConfig::new("primary").with_timeout(Duration::from_millis(10)),
        );

        let err = gateway.complete("q", None).await.unwrap_err();
        assert_eq!(err.provider_kind(), Some(ProviderErrorKind::Timeout));
    }
}
