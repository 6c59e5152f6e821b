//! Engine orchestrator.
//!
//! [`RagEngine`] coordinates the full ingest-and-query workflow by composing
//! an [`EmbeddingProvider`], a [`VectorIndex`], a [`Chunker`], and optional
//! [`PairwiseScorer`] and [`Generator`] collaborators.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use docqa_rag::{RagConfig, RagEngine, InMemoryIndex};
//!
//! let engine = RagEngine::builder()
//!     .config(RagConfig::default())
//!     .embedding_provider(Arc::new(my_embedder))
//!     .vector_index(Arc::new(InMemoryIndex::new(384)))
//!     .build()?;
//!
//! engine.ingest(&documents, true).await?;
//! let results = engine.retrieve("what is the return policy?", 5).await?;
//! ```

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{error, info};

use crate::chunking::Chunker;
use crate::config::RagConfig;
use crate::context::{assemble_context, build_prompt, snippet, SNIPPET_LENGTH};
use crate::document::{Answer, Citation, Document, IndexStats, IngestReport, SearchResult};
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::generator::Generator;
use crate::reranker::{CrossEncoderReranker, PairwiseScorer};
use crate::vectorstore::{IndexEntry, VectorIndex};

/// Fixed answer rendered when a question arrives before any ingestion.
pub const NO_DOCUMENTS_ANSWER: &str =
    "I don't know - no documents have been ingested yet. Ingest documents before asking questions.";

/// The retrieval and reranking engine.
///
/// Request-parallel, stage-sequential: each query runs one pipeline
/// (embed → index query → optional rerank → assemble) while independent
/// requests may execute concurrently against the shared collaborators.
/// Ingestion holds an exclusive section over the collection so a concurrent
/// query never observes a partially-cleared index.
pub struct RagEngine {
    config: RagConfig,
    chunker: Chunker,
    embedder: Arc<dyn EmbeddingProvider>,
    index: Arc<dyn VectorIndex>,
    reranker: Option<CrossEncoderReranker>,
    generator: Option<Arc<dyn Generator>>,
    collection_lock: RwLock<()>,
}

impl RagEngine {
    /// Create a new [`RagEngineBuilder`].
    pub fn builder() -> RagEngineBuilder {
        RagEngineBuilder::default()
    }

    /// Return a reference to the engine configuration.
    pub fn config(&self) -> &RagConfig {
        &self.config
    }

    /// Ingest documents: chunk → embed → index, as one exclusive section.
    ///
    /// With `replace` set, the index is cleared first; the clear and the
    /// subsequent upsert cannot interleave with concurrent queries or other
    /// ingestion runs. Chunk ids restart at 0 for each run, so re-ingesting
    /// the same corpus overwrites entries in place.
    ///
    /// # Errors
    ///
    /// Propagates embedding and index failures immediately; a failed run is
    /// never retried internally, since a retry could duplicate partially
    /// applied writes.
    pub async fn ingest(&self, documents: &[Document], replace: bool) -> Result<IngestReport> {
        let _exclusive = self.collection_lock.write().await;

        if replace {
            self.index.clear().await.inspect_err(|e| error!(error = %e, "clear failed"))?;
        }

        let chunks = self.chunker.chunk(documents);
        if chunks.is_empty() {
            info!(documents = documents.len(), chunks = 0, "ingested documents (no content)");
            return Ok(IngestReport { documents: documents.len(), chunks: 0, indexed: 0 });
        }

        let texts: Vec<&str> = chunks.iter().map(|c| c.content.as_str()).collect();
        let embeddings = self
            .embedder
            .embed_batch(&texts)
            .await
            .inspect_err(|e| error!(error = %e, "embedding failed during ingestion"))?;
        if embeddings.len() != chunks.len() {
            return Err(RagError::EmbeddingUnavailable {
                provider: self.config.embedding_model.clone(),
                message: format!(
                    "expected {} embeddings, got {}",
                    chunks.len(),
                    embeddings.len()
                ),
            });
        }

        let chunk_count = chunks.len();
        let entries: Vec<IndexEntry> = chunks
            .into_iter()
            .zip(embeddings)
            .map(|(chunk, embedding)| IndexEntry::new(chunk, embedding))
            .collect();

        let indexed = self
            .index
            .upsert(entries)
            .await
            .inspect_err(|e| error!(error = %e, "upsert failed during ingestion"))?;

        info!(documents = documents.len(), chunks = chunk_count, indexed, "ingested documents");
        Ok(IngestReport { documents: documents.len(), chunks: chunk_count, indexed })
    }

    /// Retrieve the `k` most relevant chunks for `query`.
    ///
    /// Results are sorted by descending score (ascending index distance);
    /// ties preserve the index's native order. An empty index yields an
    /// empty vector — the caller's signal to report "no documents ingested"
    /// rather than an error.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Config`] for `k == 0`; embedding and index
    /// failures propagate as their own kinds.
    pub async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<SearchResult>> {
        if k == 0 {
            return Err(RagError::Config("k must be at least 1".to_string()));
        }

        let _shared = self.collection_lock.read().await;

        let embedding = self
            .embedder
            .embed(query)
            .await
            .inspect_err(|e| error!(error = %e, "embedding failed during query"))?;
        let scored = self
            .index
            .query(&embedding, k)
            .await
            .inspect_err(|e| error!(error = %e, "vector index query failed"))?;

        Ok(scored.into_iter().map(SearchResult::from).collect())
    }

    /// Two-stage retrieval: fetch `rerank_candidates` by vector similarity,
    /// then rerank down to `rerank_top_k` with the pairwise scorer.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Config`] if no pairwise scorer was wired in;
    /// scorer failures propagate as [`RagError::RerankUnavailable`].
    pub async fn retrieve_reranked(&self, query: &str) -> Result<Vec<SearchResult>> {
        let reranker = self.reranker.as_ref().ok_or_else(|| {
            RagError::Config("no pairwise scorer configured for reranking".to_string())
        })?;

        let candidates = self.retrieve(query, self.config.rerank_candidates).await?;
        reranker.rerank(query, candidates, self.config.rerank_top_k).await
    }

    /// Answer a question from the `top_k` retrieved chunks.
    pub async fn ask(&self, question: &str) -> Result<Answer> {
        let results = self.retrieve(question, self.config.top_k).await?;
        self.answer_from(question, results).await
    }

    /// Answer a question from two-stage (reranked) retrieval.
    pub async fn ask_reranked(&self, question: &str) -> Result<Answer> {
        let results = self.retrieve_reranked(question).await?;
        self.answer_from(question, results).await
    }

    async fn answer_from(&self, question: &str, results: Vec<SearchResult>) -> Result<Answer> {
        if results.is_empty() {
            return Ok(Answer { answer: NO_DOCUMENTS_ANSWER.to_string(), citations: Vec::new() });
        }

        let generator = self
            .generator
            .as_ref()
            .ok_or_else(|| RagError::Config("no generator configured".to_string()))?;

        let context = assemble_context(&results);
        let prompt = build_prompt(&context, question);
        let answer = generator
            .complete(&prompt)
            .await
            .inspect_err(|e| error!(error = %e, "generation failed"))?;

        let citations = results
            .iter()
            .map(|result| Citation {
                doc_name: result.doc_name.clone(),
                chunk_id: result.chunk_id,
                score: result.score,
                snippet: snippet(&result.content, SNIPPET_LENGTH),
            })
            .collect();

        info!(citations = results.len(), "answered question");
        Ok(Answer { answer, citations })
    }

    /// Snapshot the index contents.
    pub async fn stats(&self) -> Result<IndexStats> {
        let _shared = self.collection_lock.read().await;
        let entries = self.index.count().await?;
        Ok(IndexStats { collection: self.config.collection.clone(), entries })
    }

    /// Remove every entry from the index.
    pub async fn clear(&self) -> Result<()> {
        let _exclusive = self.collection_lock.write().await;
        self.index.clear().await
    }
}

/// Builder for constructing a [`RagEngine`].
///
/// The configuration, embedding provider, and vector index are required;
/// the pairwise scorer and generator are optional. The configuration is
/// validated at [`build()`](RagEngineBuilder::build), so an invalid
/// chunking or retrieval setup fails at startup rather than per call.
#[derive(Default)]
pub struct RagEngineBuilder {
    config: Option<RagConfig>,
    embedder: Option<Arc<dyn EmbeddingProvider>>,
    index: Option<Arc<dyn VectorIndex>>,
    scorer: Option<Arc<dyn PairwiseScorer>>,
    generator: Option<Arc<dyn Generator>>,
}

impl RagEngineBuilder {
    /// Set the engine configuration.
    pub fn config(mut self, config: RagConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the embedding provider.
    pub fn embedding_provider(mut self, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedder = Some(embedder);
        self
    }

    /// Set the vector index backend.
    pub fn vector_index(mut self, index: Arc<dyn VectorIndex>) -> Self {
        self.index = Some(index);
        self
    }

    /// Set the optional pairwise scorer used for two-stage retrieval.
    ///
    /// The reranker it feeds is calibrated with the configuration's
    /// [`score_calibration`](RagConfig::score_calibration).
    pub fn pairwise_scorer(mut self, scorer: Arc<dyn PairwiseScorer>) -> Self {
        self.scorer = Some(scorer);
        self
    }

    /// Set the optional generator used by `ask`/`ask_reranked`.
    pub fn generator(mut self, generator: Arc<dyn Generator>) -> Self {
        self.generator = Some(generator);
        self
    }

    /// Build the [`RagEngine`], validating configuration and required
    /// collaborators.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Config`] if a required field is missing or the
    /// configuration is inconsistent.
    pub fn build(self) -> Result<RagEngine> {
        let config =
            self.config.ok_or_else(|| RagError::Config("config is required".to_string()))?;
        config.validate()?;
        let embedder = self
            .embedder
            .ok_or_else(|| RagError::Config("embedding_provider is required".to_string()))?;
        let index =
            self.index.ok_or_else(|| RagError::Config("vector_index is required".to_string()))?;

        let chunker = Chunker::new(config.chunk_size, config.chunk_overlap);
        let reranker = self
            .scorer
            .map(|s| CrossEncoderReranker::new(s).with_calibration(config.score_calibration));

        Ok(RagEngine {
            config,
            chunker,
            embedder,
            index,
            reranker,
            generator: self.generator,
            collection_lock: RwLock::new(()),
        })
    }
}
