//! Error types for the `docqa-rag` crate.

use thiserror::Error;

/// Errors that can occur in retrieval and reranking operations.
///
/// Every failure surfaces as a distinct, inspectable kind so callers can
/// choose how to render it. An empty index is deliberately *not* an error:
/// [`RagEngine::retrieve`](crate::engine::RagEngine::retrieve) returns an
/// empty result set instead.
#[derive(Debug, Error)]
pub enum RagError {
    /// A configuration validation error. Fatal at startup, never retried.
    #[error("configuration error: {0}")]
    Config(String),

    /// The embedding collaborator could not be reached or failed to encode.
    ///
    /// Callers must not substitute a zero vector for a failed embedding.
    #[error("embedding unavailable ({provider}): {message}")]
    EmbeddingUnavailable {
        /// The embedding provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// The vector index backend is unreachable or rejected an operation.
    #[error("vector index unavailable ({backend}): {message}")]
    IndexUnavailable {
        /// The index backend that produced the error.
        backend: String,
        /// A description of the failure.
        message: String,
    },

    /// An embedding's dimensionality does not match the index's.
    #[error("embedding dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch {
        /// The dimensionality the index was created with.
        expected: usize,
        /// The dimensionality of the offending embedding.
        got: usize,
    },

    /// The pairwise relevance collaborator failed.
    ///
    /// A mid-batch failure fails the whole rerank call; the engine never
    /// silently falls back to the un-reranked order.
    #[error("reranker unavailable ({scorer}): {message}")]
    RerankUnavailable {
        /// The pairwise scorer that produced the error.
        scorer: String,
        /// A description of the failure.
        message: String,
    },

    /// The generative language model collaborator failed.
    #[error("generation failed ({provider}): {message}")]
    Generation {
        /// The generator that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },
}

/// A convenience result type for retrieval operations.
pub type Result<T> = std::result::Result<T, RagError>;
