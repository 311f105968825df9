//! Chunk store search contract.

use crate::types::Chunk;
use mizan_core::EngineResult;

/// Trait for chunk stores.
///
/// A store answers similarity queries over an already-indexed corpus.
/// Embedding the query is the store's concern; the engine only passes the
/// natural-language text. Failures surface as
/// `EngineError::RetrievalUnavailable`, which the orchestrator treats as
/// non-fatal.
#[async_trait::async_trait]
pub trait ChunkStore: Send + Sync {
    /// Return up to `top_k` chunks nearest the query.
    ///
    /// Cancellation-safe: dropping the future aborts any in-flight request.
    async fn search(&self, query: &str, top_k: usize) -> EngineResult<Vec<Chunk>>;
}
