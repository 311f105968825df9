//! LLM provider integration for the Mizan engine.
//!
//! Wraps interchangeable text-completion backends behind a single call
//! contract. Exactly one provider is live per request, selected once from
//! configuration; the gateway adds client-side timeouts and a single
//! same-provider model fallback on rate-limit or unavailability.
//!
//! # Providers
//! - **Groq**: OpenAI-compatible chat completions (default)
//! - **OpenAI**: chat completions
//!
//! # Example
//! ```no_run
//! use mizan_llm::{create_backend, GatewayConfig, ProviderGateway, ProviderKind};
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let backend = create_backend(ProviderKind::Groq, Some("key"), None)?;
//! let gateway = ProviderGateway::new(
//!     backend,
//!     GatewayConfig::new("llama-3.3-70b-versatile").with_timeout(Duration::from_secs(30)),
//! );
//! let response = gateway.complete("Hello", None).await?;
//! println!("{}", response.text);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod factory;
pub mod gateway;
pub mod providers;
pub mod types;

// Re-export main types
pub use client::{CompletionBackend, CompletionRequest, CompletionResponse, TokenUsage};
pub use factory::{create_backend, create_backend_by_name};
pub use gateway::{GatewayConfig, ProviderGateway};
pub use types::ProviderKind;
