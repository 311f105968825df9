//! Conversation orchestration engine.
//!
//! Composes the chunk store, prompt composer, provider gateway, response
//! parser, and bounded conversation memory into the end-to-end answer
//! pipeline: retrieve, compose, generate, parse, persist. Callers receive a
//! complete [`StructuredAnswer`] or a single typed error, never a partial
//! answer.

pub mod greeting;
pub mod history;
pub mod memory;
pub mod orchestrator;
pub mod parser;
pub mod types;

pub use history::{ConversationHistory, ConversationSummary, StoredMessage};
pub use memory::ConversationMemory;
pub use orchestrator::{AnswerEngine, RequestPhase, RetrievalPolicy};
pub use parser::parse_answer;
pub use types::{
    AnswerRequest, AnswerResponse, Citation, KeyTerm, MemoryStats, StructuredAnswer,
};
