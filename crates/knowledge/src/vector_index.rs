//! Vector index abstraction for knowledge chunks.
//!
//! Defines a trait for provider-agnostic similarity search.

use crate::types::{IndexStats, IndexedChunk};
use faqbot_core::AppResult;

/// Trait for vector index backends.
///
/// Indexes are immutable once built; callers share them behind an `Arc`.
pub trait VectorIndex: Send + Sync {
    /// Search for the top-k most similar chunks to the query embedding.
    ///
    /// Returns chunks ordered by descending similarity score.
    fn search(&self, query_embedding: &[f32], top_k: usize) -> AppResult<Vec<(IndexedChunk, f32)>>;

    /// Get statistics about the index.
    fn stats(&self) -> IndexStats;
}
