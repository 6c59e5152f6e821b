//! Vector index trait and the distance-to-score contract.
//!
//! The mapping from cosine distance to a presentable similarity score is an
//! explicit, independently tested pure function rather than an
//! implementation detail of any one backend. Swapping in a backend with a
//! different similarity metric only requires making its adapter expose
//! distances compatible with [`similarity_from_distance`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::document::{Chunk, SearchResult};
use crate::error::Result;

/// An entry stored in a vector index: embedding, text, and provenance.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IndexEntry {
    /// Stable identifier derived from the chunk id (`chunk_{chunk_id}`).
    pub id: String,
    /// The embedding vector for `content`.
    pub embedding: Vec<f32>,
    /// The chunk text.
    pub content: String,
    /// The name of the source document.
    pub doc_name: String,
    /// Page number, or 0 when pages do not apply.
    pub page: u32,
    /// The chunk's ingestion-batch id.
    pub chunk_id: u64,
}

impl IndexEntry {
    /// Build an entry from a chunk and its embedding.
    pub fn new(chunk: Chunk, embedding: Vec<f32>) -> Self {
        Self {
            id: format!("chunk_{}", chunk.chunk_id),
            embedding,
            content: chunk.content,
            doc_name: chunk.doc_name,
            page: chunk.page,
            chunk_id: chunk.chunk_id,
        }
    }
}

/// A query hit: an entry paired with its cosine distance to the query.
///
/// Distance is in `[0, 2]`, ascending = more similar.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredEntry {
    /// The stored entry.
    pub entry: IndexEntry,
    /// Cosine distance between the query embedding and the entry's.
    pub distance: f32,
}

/// A storage backend for embeddings with nearest-neighbor search.
///
/// Backends manage one collection of [`IndexEntry`]s. Entries persist until
/// explicitly cleared or overwritten; query results are produced fresh per
/// call and never cached.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Upsert entries. Idempotent on `id`: an entry whose id already exists
    /// is replaced. Returns the number of entries written.
    async fn upsert(&self, entries: Vec<IndexEntry>) -> Result<usize>;

    /// Return up to `k` nearest entries by cosine distance, ascending
    /// (closest first). An empty index yields an empty result, not an error.
    async fn query(&self, embedding: &[f32], k: usize) -> Result<Vec<ScoredEntry>>;

    /// Remove all entries. Idempotent; succeeds even if already empty.
    async fn clear(&self) -> Result<()>;

    /// Number of entries currently stored.
    async fn count(&self) -> Result<usize>;
}

/// Map a cosine distance in `[0, 2]` to a similarity score in `[0, 1]`.
///
/// Identical vectors (distance 0) map to 1.0, maximally dissimilar vectors
/// (distance 2) map to 0.0.
pub fn similarity_from_distance(distance: f32) -> f32 {
    1.0 - distance / 2.0
}

/// Round a score to 4 decimal digits for stable external presentation.
pub fn round_score(score: f32) -> f32 {
    ((f64::from(score) * 10_000.0).round() / 10_000.0) as f32
}

impl From<ScoredEntry> for SearchResult {
    fn from(scored: ScoredEntry) -> Self {
        SearchResult {
            content: scored.entry.content,
            doc_name: scored.entry.doc_name,
            chunk_id: scored.entry.chunk_id,
            page: scored.entry.page,
            score: round_score(similarity_from_distance(scored.distance)),
        }
    }
}
