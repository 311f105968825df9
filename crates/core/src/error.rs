//! Error types for the Mizan answering engine.
//!
//! This module defines a unified error enum covering every error category in
//! the request pipeline: configuration, retrieval, provider, parsing, and
//! history persistence.

use thiserror::Error;

/// Category of a provider failure, surfaced to callers unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderErrorKind {
    /// Missing or rejected credentials
    Auth,

    /// Provider rate limit hit
    RateLimit,

    /// Client-side or provider-side timeout
    Timeout,

    /// Provider unreachable or returned a server error
    Unavailable,
}

impl std::fmt::Display for ProviderErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Auth => "auth",
            Self::RateLimit => "rate_limit",
            Self::Timeout => "timeout",
            Self::Unavailable => "unavailable",
        };
        f.write_str(s)
    }
}

/// Unified error type for the engine.
///
/// All fallible functions return `EngineResult<T>`. We never panic; errors
/// are represented and propagated.
#[derive(Error, Debug)]
pub enum EngineError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Chunk store unreachable or returned an error. Non-fatal at the
    /// orchestrator level: the request degrades to an LLM-only answer.
    #[error("Retrieval unavailable: {0}")]
    RetrievalUnavailable(String),

    /// LLM provider failure, fatal to the request
    #[error("Provider error ({kind}): {message}")]
    Provider {
        kind: ProviderErrorKind,
        message: String,
    },

    /// Raw model output was empty, the only hard parser failure
    #[error("Parse error: empty input")]
    EmptyInput,

    /// Conversation history persistence errors. Never fails a request.
    #[error("History error: {0}")]
    History(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

impl EngineError {
    /// Construct a provider error of the given kind.
    pub fn provider(kind: ProviderErrorKind, message: impl Into<String>) -> Self {
        Self::Provider {
            kind,
            message: message.into(),
        }
    }

    /// The provider error kind, if this is a provider error.
    pub fn provider_kind(&self) -> Option<ProviderErrorKind> {
        match self {
            Self::Provider { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for EngineError {
    fn from(err: serde_json::Error) -> Self {
        EngineError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for EngineError {
    fn from(err: serde_yaml::Error) -> Self {
        EngineError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with EngineError.
pub type EngineResult<T> = Result<T, EngineError>;
