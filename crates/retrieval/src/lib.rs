//! Chunk store client for the Mizan engine.
//!
//! The vector index itself is an external collaborator; this crate defines
//! the chunk data model, the `ChunkStore` search contract, an HTTP client
//! against a chunk-store service, and the ranking/deduplication applied to
//! raw search results before context assembly.

pub mod http;
pub mod ranking;
pub mod store;
pub mod types;

pub use http::HttpChunkStore;
pub use ranking::rank_chunks;
pub use store::ChunkStore;
pub use types::Chunk;
