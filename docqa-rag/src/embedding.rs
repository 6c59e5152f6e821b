//! Embedding provider trait for generating vector embeddings from text.

use async_trait::async_trait;

use crate::error::Result;

/// A provider that generates vector embeddings from text input.
///
/// Implementations wrap specific embedding backends behind a unified async
/// interface. The default [`embed_batch`](EmbeddingProvider::embed_batch)
/// implementation calls [`embed`](EmbeddingProvider::embed) sequentially;
/// backends that support native batching should override it.
///
/// Guarantees every implementation must uphold: batch output length equals
/// input length, order is preserved, and every embedding has
/// [`dimensions()`](EmbeddingProvider::dimensions) components. A failed
/// call surfaces as [`RagError::EmbeddingUnavailable`](crate::error::RagError);
/// callers must never substitute a zero vector.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Generate an embedding vector for a single text input.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Generate embedding vectors for a batch of text inputs.
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let mut results = Vec::with_capacity(texts.len());
        for text in texts {
            results.push(self.embed(text).await?);
        }
        Ok(results)
    }

    /// Return the dimensionality of embeddings produced by this provider.
    ///
    /// Constant for the lifetime of the provider; the vector index it feeds
    /// must be created with the same dimensionality.
    fn dimensions(&self) -> usize;
}
