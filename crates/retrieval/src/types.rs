//! Chunk data model.

use serde::{Deserialize, Serialize};

/// A retrieved span of source-document text.
///
/// Owned by the chunk store; immutable once retrieved. `score` is a cosine
/// similarity in [0, 1], higher meaning more relevant to the query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    /// Stable chunk identifier
    pub id: String,

    /// Chunk text content
    pub text: String,

    /// Page number in the source document
    pub page: u32,

    /// Source document filename
    #[serde(rename = "sourceFile")]
    pub source_file: String,

    /// Similarity score, 0.0 - 1.0
    #[serde(default)]
    pub score: f32,
}
