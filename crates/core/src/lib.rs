//! Mizan Core Library
//!
//! Foundational utilities shared by every crate in the workspace:
//! - Error handling (`EngineError`, `EngineResult`)
//! - Logging infrastructure
//! - Configuration management
//! - Shared conversation types

pub mod config;
pub mod error;
pub mod logging;
pub mod types;

// Re-export commonly used types
pub use config::EngineConfig;
pub use error::{EngineError, EngineResult, ProviderErrorKind};
pub use types::{ConversationTurn, Role};
