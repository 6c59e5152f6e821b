//! Reranker short-circuit, normalization, ordering, and failure tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use docqa_rag::document::SearchResult;
use docqa_rag::error::{RagError, Result};
use docqa_rag::reranker::{
    compare_rankings, CrossEncoderReranker, PairwiseScorer, ScoreCalibration,
};

fn result(chunk_id: u64, content: &str, score: f32) -> SearchResult {
    SearchResult {
        content: content.to_string(),
        doc_name: "doc.txt".to_string(),
        chunk_id,
        page: 0,
        score,
    }
}

/// Scores each document from a fixed table; counts calls.
struct TableScorer {
    scores: HashMap<String, f32>,
    calls: AtomicUsize,
}

impl TableScorer {
    fn new(scores: &[(&str, f32)]) -> Arc<Self> {
        Arc::new(Self {
            scores: scores.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl PairwiseScorer for TableScorer {
    async fn score(&self, _query: &str, document: &str) -> Result<f32> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        Ok(*self.scores.get(document).unwrap_or(&0.0))
    }
}

/// Fails on the nth call to exercise mid-batch failure.
struct FailingScorer {
    fail_at: usize,
    calls: AtomicUsize,
}

#[async_trait]
impl PairwiseScorer for FailingScorer {
    async fn score(&self, _query: &str, _document: &str) -> Result<f32> {
        let call = self.calls.fetch_add(1, Ordering::Relaxed) + 1;
        if call >= self.fail_at {
            return Err(RagError::RerankUnavailable {
                scorer: "mock".to_string(),
                message: "connection reset".to_string(),
            });
        }
        Ok(0.0)
    }
}

#[tokio::test]
async fn short_circuit_returns_candidates_unchanged() {
    let scorer = TableScorer::new(&[]);
    let reranker = CrossEncoderReranker::new(scorer.clone());

    let candidates = vec![result(0, "a", 0.9), result(1, "b", 0.8), result(2, "c", 0.7)];
    let reranked = reranker.rerank("query", candidates.clone(), 3).await.unwrap();

    assert_eq!(reranked, candidates);
    assert_eq!(scorer.calls.load(Ordering::Relaxed), 0, "scorer must not be called");
}

#[tokio::test]
async fn rescoring_normalizes_sorts_and_truncates() {
    let scorer = TableScorer::new(&[("a", 2.0), ("b", -1.0), ("c", 7.0), ("d", -9.0)]);
    let reranker = CrossEncoderReranker::new(scorer);

    let candidates = vec![
        result(0, "a", 0.9),
        result(1, "b", 0.8),
        result(2, "c", 0.7),
        result(3, "d", 0.6),
    ];
    let reranked = reranker.rerank("query", candidates, 2).await.unwrap();

    // c clamps to 1.0, a normalizes to 0.7.
    assert_eq!(reranked.len(), 2);
    assert_eq!(reranked[0].chunk_id, 2);
    assert_eq!(reranked[0].score, 1.0);
    assert_eq!(reranked[1].chunk_id, 0);
    assert_eq!(reranked[1].score, 0.7);

    // Provenance passes through untouched.
    assert_eq!(reranked[0].content, "c");
    assert_eq!(reranked[0].doc_name, "doc.txt");
}

#[tokio::test]
async fn negative_scores_clamp_to_zero() {
    let scorer = TableScorer::new(&[("a", -9.0), ("b", -7.5), ("c", 0.0)]);
    let reranker = CrossEncoderReranker::new(scorer);

    let candidates = vec![result(0, "a", 0.9), result(1, "b", 0.8), result(2, "c", 0.7)];
    let reranked = reranker.rerank("query", candidates, 2).await.unwrap();

    assert_eq!(reranked[0].chunk_id, 2);
    assert_eq!(reranked[0].score, 0.5);
    assert_eq!(reranked[1].score, 0.0);
}

#[tokio::test]
async fn equal_scores_preserve_incoming_order() {
    let scorer = TableScorer::new(&[("a", 3.0), ("b", 3.0), ("c", 3.0)]);
    let reranker = CrossEncoderReranker::new(scorer);

    let candidates = vec![result(5, "a", 0.9), result(9, "b", 0.8), result(2, "c", 0.7)];
    let reranked = reranker.rerank("query", candidates, 2).await.unwrap();

    let order: Vec<u64> = reranked.iter().map(|r| r.chunk_id).collect();
    assert_eq!(order, vec![5, 9]);
}

#[tokio::test]
async fn custom_calibration_is_applied() {
    let scorer = TableScorer::new(&[("a", 0.25), ("b", 3.0), ("c", -1.0)]);
    let reranker = CrossEncoderReranker::new(scorer)
        .with_calibration(ScoreCalibration { offset: 0.0, scale: 1.0 });

    let candidates = vec![result(0, "a", 0.9), result(1, "b", 0.8), result(2, "c", 0.7)];
    let reranked = reranker.rerank("query", candidates, 2).await.unwrap();

    assert_eq!(reranked[0].chunk_id, 1);
    assert_eq!(reranked[0].score, 1.0); // 3.0 clamps to 1.0
    assert_eq!(reranked[1].chunk_id, 0);
    assert_eq!(reranked[1].score, 0.25);
}

#[tokio::test]
async fn scores_are_rounded_to_four_digits() {
    let scorer = TableScorer::new(&[("a", 1.2341), ("b", -5.0), ("c", -5.0)]);
    let reranker = CrossEncoderReranker::new(scorer);

    let candidates = vec![result(0, "a", 0.9), result(1, "b", 0.8), result(2, "c", 0.7)];
    let reranked = reranker.rerank("query", candidates, 1).await.unwrap();

    assert!((reranked[0].score - 0.6234).abs() < 1e-6);
}

#[tokio::test]
async fn mid_batch_failure_fails_the_whole_call() {
    let scorer = Arc::new(FailingScorer { fail_at: 2, calls: AtomicUsize::new(0) });
    let reranker = CrossEncoderReranker::new(scorer);

    let candidates = vec![result(0, "a", 0.9), result(1, "b", 0.8), result(2, "c", 0.7)];
    let outcome = reranker.rerank("query", candidates, 2).await;

    assert!(matches!(outcome, Err(RagError::RerankUnavailable { .. })));
}

#[tokio::test]
async fn reranking_its_own_output_is_stable() {
    let scorer = TableScorer::new(&[("a", 4.0), ("b", 2.0), ("c", 1.0), ("d", -2.0)]);
    let reranker = CrossEncoderReranker::new(scorer);

    let candidates = vec![
        result(0, "a", 0.9),
        result(1, "b", 0.8),
        result(2, "c", 0.7),
        result(3, "d", 0.6),
    ];
    let once = reranker.rerank("query", candidates, 3).await.unwrap();
    let twice = reranker.rerank("query", once.clone(), 3).await.unwrap();

    assert_eq!(once, twice);
}

#[test]
fn compare_rankings_reports_exact_displacements() {
    let original = vec![
        result(1, "a", 0.9),
        result(2, "b", 0.8),
        result(3, "c", 0.7),
        result(4, "d", 0.6),
        result(5, "e", 0.5),
    ];
    let reranked = vec![result(3, "c", 0.95), result(1, "a", 0.9), result(5, "e", 0.4)];

    let comparison = compare_rankings(&original, &reranked);

    assert_eq!(comparison.overlap, 3);
    assert_eq!(comparison.total, 3);
    assert_eq!(comparison.original_top, vec![1, 2, 3]);
    assert_eq!(comparison.reranked_top, vec![3, 1, 5]);
    // Displacements: |0-2| + |1-0| + |2-4| over 3 ids.
    assert!((comparison.mean_rank_displacement - 5.0 / 3.0).abs() < 1e-12);
}

#[test]
fn compare_rankings_ignores_ids_missing_from_one_list() {
    let original = vec![result(1, "a", 0.9), result(2, "b", 0.8)];
    let reranked = vec![result(7, "x", 0.9), result(8, "y", 0.8)];

    let comparison = compare_rankings(&original, &reranked);

    assert_eq!(comparison.overlap, 0);
    assert_eq!(comparison.mean_rank_displacement, 0.0);
}
