//! Ranking and deduplication of raw search results.

use crate::types::Chunk;

/// Rank chunks for context assembly.
///
/// - Orders by descending score; ties keep the original retrieval order
///   (stable sort).
/// - Drops chunks below `min_score`.
/// - Deduplicates by `(source_file, page, id)`, keeping the first (highest
///   ranked) occurrence.
/// - Caps the result at `limit`.
pub fn rank_chunks(chunks: Vec<Chunk>, limit: usize, min_score: f32) -> Vec<Chunk> {
    let mut ranked: Vec<Chunk> = chunks
        .into_iter()
        .filter(|c| c.score >= min_score)
        .collect();

    // Vec::sort_by is stable, so equal scores preserve retrieval order
    ranked.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));

    let mut seen: Vec<(String, u32, String)> = Vec::with_capacity(ranked.len());
    ranked.retain(|chunk| {
        let key = (chunk.source_file.clone(), chunk.page, chunk.id.clone());
        if seen.contains(&key) {
            false
        } else {
            seen.push(key);
            true
        }
    });

    ranked.truncate(limit);
    ranked
}
