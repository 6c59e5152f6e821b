//! Configuration for the retrieval and reranking engine.

use serde::{Deserialize, Serialize};

use crate::error::{RagError, Result};
use crate::reranker::ScoreCalibration;

/// Configuration parameters for the engine.
///
/// Values only — behavior lives in the components that consume them.
/// Construct via [`RagConfig::builder()`] to get fail-fast validation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RagConfig {
    /// Maximum chunk size in characters.
    pub chunk_size: usize,
    /// Number of overlapping characters between consecutive chunks.
    pub chunk_overlap: usize,
    /// Default number of results returned by plain retrieval.
    pub top_k: usize,
    /// Number of candidates retrieved before reranking (two-stage retrieval).
    pub rerank_candidates: usize,
    /// Number of results kept after reranking.
    pub rerank_top_k: usize,
    /// Identifier of the embedding model.
    pub embedding_model: String,
    /// Identifier of the pairwise relevance model.
    pub reranker_model: String,
    /// Name of the vector index collection.
    pub collection: String,
    /// Normalization constants for raw cross-encoder scores.
    pub score_calibration: ScoreCalibration,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            chunk_size: 512,
            chunk_overlap: 50,
            top_k: 5,
            rerank_candidates: 20,
            rerank_top_k: 5,
            embedding_model: "all-minilm".to_string(),
            reranker_model: "cross-encoder/ms-marco-MiniLM-L-6-v2".to_string(),
            collection: "documents".to_string(),
            score_calibration: ScoreCalibration::default(),
        }
    }
}

impl RagConfig {
    /// Create a new builder for constructing a [`RagConfig`].
    pub fn builder() -> RagConfigBuilder {
        RagConfigBuilder::default()
    }

    /// Validate that the configured values are consistent.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Config`] if:
    /// - `chunk_size == 0`
    /// - `chunk_overlap >= chunk_size`
    /// - `top_k == 0` or `rerank_top_k == 0`
    /// - `rerank_candidates < rerank_top_k`
    /// - the score calibration scale is not positive
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(RagError::Config("chunk_size must be greater than zero".to_string()));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(RagError::Config(format!(
                "chunk_overlap ({}) must be less than chunk_size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        if self.top_k == 0 {
            return Err(RagError::Config("top_k must be greater than zero".to_string()));
        }
        if self.rerank_top_k == 0 {
            return Err(RagError::Config("rerank_top_k must be greater than zero".to_string()));
        }
        if self.rerank_candidates < self.rerank_top_k {
            return Err(RagError::Config(format!(
                "rerank_candidates ({}) must be at least rerank_top_k ({})",
                self.rerank_candidates, self.rerank_top_k
            )));
        }
        if self.score_calibration.scale <= 0.0 {
            return Err(RagError::Config("score calibration scale must be positive".to_string()));
        }
        Ok(())
    }
}

/// Builder for constructing a validated [`RagConfig`].
#[derive(Debug, Clone, Default)]
pub struct RagConfigBuilder {
    config: RagConfig,
}

impl RagConfigBuilder {
    /// Set the maximum chunk size in characters.
    pub fn chunk_size(mut self, size: usize) -> Self {
        self.config.chunk_size = size;
        self
    }

    /// Set the overlap between consecutive chunks in characters.
    pub fn chunk_overlap(mut self, overlap: usize) -> Self {
        self.config.chunk_overlap = overlap;
        self
    }

    /// Set the default number of results returned by plain retrieval.
    pub fn top_k(mut self, k: usize) -> Self {
        self.config.top_k = k;
        self
    }

    /// Set the number of candidates retrieved before reranking.
    pub fn rerank_candidates(mut self, candidates: usize) -> Self {
        self.config.rerank_candidates = candidates;
        self
    }

    /// Set the number of results kept after reranking.
    pub fn rerank_top_k(mut self, k: usize) -> Self {
        self.config.rerank_top_k = k;
        self
    }

    /// Set the embedding model identifier.
    pub fn embedding_model(mut self, model: impl Into<String>) -> Self {
        self.config.embedding_model = model.into();
        self
    }

    /// Set the pairwise relevance model identifier.
    pub fn reranker_model(mut self, model: impl Into<String>) -> Self {
        self.config.reranker_model = model.into();
        self
    }

    /// Set the vector index collection name.
    pub fn collection(mut self, collection: impl Into<String>) -> Self {
        self.config.collection = collection.into();
        self
    }

    /// Set the normalization constants for raw cross-encoder scores.
    pub fn score_calibration(mut self, calibration: ScoreCalibration) -> Self {
        self.config.score_calibration = calibration;
        self
    }

    /// Build the [`RagConfig`], validating that parameters are consistent.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Config`] on the first inconsistent value; see
    /// [`RagConfig::validate`].
    pub fn build(self) -> Result<RagConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
