//! Pairwise scorer backed by a text-embeddings-inference `/rerank` endpoint.
//!
//! This module is only available when the `tei` feature is enabled.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::error::{RagError, Result};
use crate::reranker::PairwiseScorer;

/// The default text-embeddings-inference server URL.
const DEFAULT_TEI_URL: &str = "http://localhost:8080";

fn scorer_failed(message: String) -> RagError {
    RagError::RerankUnavailable { scorer: "tei".to_string(), message }
}

/// A [`PairwiseScorer`] backed by a [text-embeddings-inference] server
/// running a cross-encoder model.
///
/// Requests raw logit scores (roughly `[-10, 10]` for the ms-marco
/// cross-encoders) so the engine-level
/// [`ScoreCalibration`](crate::reranker::ScoreCalibration) applies
/// unchanged. The server returns hits sorted by score; the adapter restores
/// input order from the response indices.
///
/// [text-embeddings-inference]: https://github.com/huggingface/text-embeddings-inference
pub struct TeiScorer {
    client: reqwest::Client,
    base_url: String,
}

impl Default for TeiScorer {
    fn default() -> Self {
        Self::new(DEFAULT_TEI_URL)
    }
}

impl TeiScorer {
    /// Create a scorer against the given server URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self { client: reqwest::Client::new(), base_url: base_url.into() }
    }

    fn rerank_url(&self) -> String {
        format!("{}/rerank", self.base_url)
    }
}

#[derive(Serialize)]
struct RerankRequest<'a> {
    query: &'a str,
    texts: &'a [&'a str],
    raw_scores: bool,
}

#[derive(Deserialize)]
struct RerankHit {
    index: usize,
    score: f32,
}

#[async_trait]
impl PairwiseScorer for TeiScorer {
    async fn score(&self, query: &str, document: &str) -> Result<f32> {
        self.score_batch(query, &[document])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| scorer_failed("server returned an empty response".to_string()))
    }

    async fn score_batch(&self, query: &str, documents: &[&str]) -> Result<Vec<f32>> {
        if documents.is_empty() {
            return Ok(Vec::new());
        }

        debug!(batch_size = documents.len(), "scoring candidate batch");

        let request = RerankRequest { query, texts: documents, raw_scores: true };
        let response = self
            .client
            .post(self.rerank_url())
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "tei rerank request failed");
                scorer_failed(format!("request failed: {e}"))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!(%status, "tei rerank returned an error");
            return Err(scorer_failed(format!("server returned {status}: {body}")));
        }

        let hits: Vec<RerankHit> = response
            .json()
            .await
            .map_err(|e| scorer_failed(format!("failed to parse response: {e}")))?;

        // The server sorts hits by score; put them back in input order.
        let mut scores: Vec<Option<f32>> = vec![None; documents.len()];
        for hit in hits {
            if let Some(slot) = scores.get_mut(hit.index) {
                *slot = Some(hit.score);
            }
        }

        scores
            .into_iter()
            .enumerate()
            .map(|(index, score)| {
                score.ok_or_else(|| {
                    scorer_failed(format!("response is missing a score for candidate {index}"))
                })
            })
            .collect()
    }
}
