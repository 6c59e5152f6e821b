//! In-memory vector index using cosine distance.
//!
//! [`InMemoryIndex`] keeps entries in insertion order behind a
//! `tokio::sync::RwLock`. It is suitable for development and testing, and
//! doubles as the reference implementation of the [`VectorIndex`] contract:
//! ascending-distance ordering with ties resolved by insertion order.

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::{RagError, Result};
use crate::vectorstore::{IndexEntry, ScoredEntry, VectorIndex};

/// An in-memory [`VectorIndex`] with a fixed dimensionality.
///
/// Entries are stored in insertion order; upserting an existing id replaces
/// the entry in place without moving it.
#[derive(Debug)]
pub struct InMemoryIndex {
    dimensions: usize,
    entries: RwLock<Vec<IndexEntry>>,
}

impl InMemoryIndex {
    /// Create an empty index that accepts embeddings of `dimensions`
    /// components.
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions, entries: RwLock::new(Vec::new()) }
    }

    fn check_dimensions(&self, embedding: &[f32]) -> Result<()> {
        if embedding.len() != self.dimensions {
            return Err(RagError::DimensionMismatch {
                expected: self.dimensions,
                got: embedding.len(),
            });
        }
        Ok(())
    }
}

/// Cosine distance between two vectors, in `[0, 2]`.
///
/// A zero-magnitude vector is treated as orthogonal to everything
/// (distance 1.0).
fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 1.0;
    }
    1.0 - dot / (norm_a * norm_b)
}

#[async_trait]
impl VectorIndex for InMemoryIndex {
    async fn upsert(&self, entries: Vec<IndexEntry>) -> Result<usize> {
        for entry in &entries {
            self.check_dimensions(&entry.embedding)?;
        }

        let count = entries.len();
        let mut stored = self.entries.write().await;
        for entry in entries {
            match stored.iter().position(|e| e.id == entry.id) {
                Some(position) => stored[position] = entry,
                None => stored.push(entry),
            }
        }
        Ok(count)
    }

    async fn query(&self, embedding: &[f32], k: usize) -> Result<Vec<ScoredEntry>> {
        self.check_dimensions(embedding)?;

        let stored = self.entries.read().await;
        let mut scored: Vec<ScoredEntry> = stored
            .iter()
            .map(|entry| ScoredEntry {
                entry: entry.clone(),
                distance: cosine_distance(&entry.embedding, embedding),
            })
            .collect();

        // Stable sort: equal distances keep insertion order.
        scored.sort_by(|a, b| {
            a.distance.partial_cmp(&b.distance).unwrap_or(std::cmp::Ordering::Equal)
        });
        scored.truncate(k);
        Ok(scored)
    }

    async fn clear(&self) -> Result<()> {
        self.entries.write().await.clear();
        Ok(())
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.entries.read().await.len())
    }
}
