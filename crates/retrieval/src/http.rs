//! HTTP chunk store client.
//!
//! Talks to a chunk-store service exposing `POST /search` with a JSON body
//! `{"query": ..., "topK": ...}` and a `{"chunks": [...]}` response. The
//! service wraps the actual vector index and the query-embedding model.

use crate::store::ChunkStore;
use crate::types::Chunk;
use mizan_core::{EngineError, EngineResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Serialize)]
struct SearchRequest<'a> {
    query: &'a str,
    #[serde(rename = "topK")]
    top_k: usize,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    chunks: Vec<Chunk>,
}

/// Chunk store backed by an HTTP search service.
pub struct HttpChunkStore {
    base_url: String,
    client: reqwest::Client,
}

impl HttpChunkStore {
    /// Create a store client for the given base URL.
    ///
    /// Retrieval gets a short fixed timeout: a slow store should degrade the
    /// request to an LLM-only answer, not stall it.
    pub fn new(base_url: impl Into<String>) -> EngineResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| EngineError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            base_url: base_url.into(),
            client,
        })
    }
}

#[async_trait::async_trait]
impl ChunkStore for HttpChunkStore {
    async fn search(&self, query: &str, top_k: usize) -> EngineResult<Vec<Chunk>> {
        let url = format!("{}/search", self.base_url.trim_end_matches('/'));
        tracing::debug!(%url, top_k, "Querying chunk store");

        let response = self
            .client
            .post(&url)
            .json(&SearchRequest { query, top_k })
            .send()
            .await
            .map_err(|e| {
                EngineError::RetrievalUnavailable(format!("chunk store request failed: {}", e))
            })?;

        if !response.status().is_success() {
            return Err(EngineError::RetrievalUnavailable(format!(
                "chunk store returned {}",
                response.status()
            )));
        }

        let body: SearchResponse = response.json().await.map_err(|e| {
            EngineError::RetrievalUnavailable(format!("invalid chunk store response: {}", e))
        })?;

        tracing::debug!(count = body.chunks.len(), "Chunk store returned results");
        Ok(body.chunks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_request_serialization() {
        let request = SearchRequest {
            query: "what is murabaha",
            top_k: 10,
        };
        let json = serde_json::to_string(&request).unwrap();
        assert!(json.contains("\"topK\":10"));
        assert!(json.contains("murabaha"));
    }

    #[tokio::test]
    async fn test_unreachable_store_maps_to_retrieval_unavailable() {
        // Nothing listens on this port
        let store = HttpChunkStore::new("http://127.0.0.1:1").unwrap();
        match store.search("q", 5).await {
            Err(EngineError::RetrievalUnavailable(_)) => {}
            other => panic!("Expected RetrievalUnavailable, got {:?}", other.map(|_| ())),
        }
    }
}
