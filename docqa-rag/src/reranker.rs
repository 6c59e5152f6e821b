//! Pairwise rescoring of retrieved candidates.
//!
//! Two-stage retrieval: a larger candidate set is fetched cheaply by vector
//! similarity, then [`CrossEncoderReranker`] rescores each candidate with a
//! pairwise relevance collaborator that sees the query and the candidate
//! text together, and keeps the best `final_k`.

use std::cmp::Ordering;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::document::SearchResult;
use crate::error::{RagError, Result};
use crate::vectorstore::round_score;

/// A collaborator that scores a `(query, document)` pair jointly.
///
/// Raw scores are model-dependent (assume roughly `[-10, 10]`, higher =
/// more relevant); [`ScoreCalibration`] maps them into `[0, 1]`.
#[async_trait]
pub trait PairwiseScorer: Send + Sync {
    /// Score a single `(query, document)` pair.
    async fn score(&self, query: &str, document: &str) -> Result<f32>;

    /// Score `query` against every document, order preserved.
    ///
    /// The default implementation scores sequentially; backends with native
    /// batch endpoints should override it. Any single failure fails the
    /// whole batch.
    async fn score_batch(&self, query: &str, documents: &[&str]) -> Result<Vec<f32>> {
        let mut scores = Vec::with_capacity(documents.len());
        for document in documents {
            scores.push(self.score(query, document).await?);
        }
        Ok(scores)
    }
}

/// Normalization constants for raw cross-encoder scores.
///
/// `normalized = clamp((raw + offset) / scale, 0, 1)`. The defaults assume
/// output centered near 0 with a roughly ±5 spread — a calibration tied to
/// the configured model, which is why this is configuration rather than a
/// hardcoded transform.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ScoreCalibration {
    /// Added to the raw score before scaling.
    pub offset: f32,
    /// Divisor applied after the offset. Must be positive.
    pub scale: f32,
}

impl Default for ScoreCalibration {
    fn default() -> Self {
        Self { offset: 5.0, scale: 10.0 }
    }
}

impl ScoreCalibration {
    /// Map a raw collaborator score into `[0, 1]`.
    ///
    /// Deterministic and stateless: identical raw scores always yield
    /// identical normalized scores.
    pub fn normalize(&self, raw: f32) -> f32 {
        ((raw + self.offset) / self.scale).clamp(0.0, 1.0)
    }
}

/// Rescores a candidate list with a [`PairwiseScorer`] and keeps the top
/// `final_k`.
pub struct CrossEncoderReranker {
    scorer: Arc<dyn PairwiseScorer>,
    calibration: ScoreCalibration,
}

impl CrossEncoderReranker {
    /// Create a reranker with the default [`ScoreCalibration`].
    pub fn new(scorer: Arc<dyn PairwiseScorer>) -> Self {
        Self { scorer, calibration: ScoreCalibration::default() }
    }

    /// Replace the score calibration.
    pub fn with_calibration(mut self, calibration: ScoreCalibration) -> Self {
        self.calibration = calibration;
        self
    }

    /// Rescore `candidates` against `query` and keep the best `final_k`.
    ///
    /// When `candidates.len() <= final_k` the input is returned unchanged —
    /// original scores and order included — because rescoring fewer items
    /// than requested would present a misleadingly "refined" score. The
    /// scorer is not called at all in that case.
    ///
    /// Otherwise every candidate is scored, normalized via the calibration,
    /// rounded to 4 decimal digits, stably re-sorted by descending score
    /// (equal scores keep their prior order), and truncated to `final_k`.
    /// Provenance fields pass through untouched; only `score` changes.
    ///
    /// # Errors
    ///
    /// A scorer failure mid-batch fails the whole call with
    /// [`RagError::RerankUnavailable`]; the un-reranked order is never
    /// silently substituted.
    pub async fn rerank(
        &self,
        query: &str,
        candidates: Vec<SearchResult>,
        final_k: usize,
    ) -> Result<Vec<SearchResult>> {
        if candidates.len() <= final_k {
            return Ok(candidates);
        }

        let documents: Vec<&str> = candidates.iter().map(|c| c.content.as_str()).collect();
        let raw_scores = self.scorer.score_batch(query, &documents).await?;
        if raw_scores.len() != candidates.len() {
            return Err(RagError::RerankUnavailable {
                scorer: "pairwise".to_string(),
                message: format!(
                    "scorer returned {} scores for {} candidates",
                    raw_scores.len(),
                    candidates.len()
                ),
            });
        }

        let mut rescored: Vec<SearchResult> = candidates
            .into_iter()
            .zip(raw_scores)
            .map(|(mut candidate, raw)| {
                candidate.score = round_score(self.calibration.normalize(raw));
                candidate
            })
            .collect();

        // Stable sort: equal scores keep the order they arrived in.
        rescored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
        rescored.truncate(final_k);

        debug!(kept = rescored.len(), "reranked candidates");
        Ok(rescored)
    }
}

/// Diagnostic comparison of an original and a reranked candidate list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RankComparison {
    /// Number of chunk ids present in both lists.
    pub overlap: usize,
    /// Length of the reranked list.
    pub total: usize,
    /// The first three chunk ids of the original list.
    pub original_top: Vec<u64>,
    /// The first three chunk ids of the reranked list.
    pub reranked_top: Vec<u64>,
    /// Mean of `|new_rank - old_rank|` over ids present in both lists.
    /// 0.0 when the lists share no ids.
    pub mean_rank_displacement: f64,
}

/// Compare an original candidate list against its reranked version.
///
/// Ids present in only one list are excluded from the displacement average,
/// not treated as zero or infinite displacement.
pub fn compare_rankings(original: &[SearchResult], reranked: &[SearchResult]) -> RankComparison {
    let original_ids: Vec<u64> = original.iter().map(|r| r.chunk_id).collect();
    let reranked_ids: Vec<u64> = reranked.iter().map(|r| r.chunk_id).collect();

    let mut displacements = Vec::new();
    for (new_rank, chunk_id) in reranked_ids.iter().enumerate() {
        if let Some(old_rank) = original_ids.iter().position(|id| id == chunk_id) {
            displacements.push((new_rank as f64 - old_rank as f64).abs());
        }
    }

    let mean_rank_displacement = if displacements.is_empty() {
        0.0
    } else {
        displacements.iter().sum::<f64>() / displacements.len() as f64
    };

    RankComparison {
        overlap: displacements.len(),
        total: reranked_ids.len(),
        original_top: original_ids.iter().take(3).copied().collect(),
        reranked_top: reranked_ids.iter().take(3).copied().collect(),
        mean_rank_displacement,
    }
}
