//! Retrieval and reranking engine for question answering over private
//! document corpora.
//!
//! The pipeline turns raw documents into searchable units, finds candidates
//! for a query by vector similarity, and optionally refines the candidate
//! set with a pairwise relevance model before handing the final set to a
//! generator:
//!
//! ```text
//! documents → Chunker → Embedding → VectorIndex        (ingest)
//! query → Embedding → VectorIndex → [rerank] → context (query)
//! ```
//!
//! The models and the index backend are collaborators behind traits:
//! [`EmbeddingProvider`], [`VectorIndex`], [`PairwiseScorer`], and
//! [`Generator`]. [`RagEngine`] composes them; [`InMemoryIndex`] is the
//! built-in backend for development and tests. Adapters for Ollama,
//! Qdrant, and text-embeddings-inference are available behind the
//! `ollama`, `qdrant`, and `tei` features.

pub mod chunking;
pub mod config;
pub mod context;
pub mod document;
pub mod embedding;
pub mod engine;
pub mod error;
pub mod generator;
pub mod inmemory;
pub mod reranker;
pub mod vectorstore;

#[cfg(feature = "ollama")]
pub mod ollama;
#[cfg(feature = "qdrant")]
pub mod qdrant;
#[cfg(feature = "tei")]
pub mod tei;

pub use chunking::Chunker;
pub use config::{RagConfig, RagConfigBuilder};
pub use context::{assemble_context, build_prompt, snippet, NO_CONTEXT_SENTINEL};
pub use document::{Answer, Chunk, Citation, Document, IndexStats, IngestReport, SearchResult};
pub use embedding::EmbeddingProvider;
pub use engine::{RagEngine, RagEngineBuilder, NO_DOCUMENTS_ANSWER};
pub use error::{RagError, Result};
pub use generator::Generator;
pub use inmemory::InMemoryIndex;
pub use reranker::{
    compare_rankings, CrossEncoderReranker, PairwiseScorer, RankComparison, ScoreCalibration,
};
pub use vectorstore::{
    round_score, similarity_from_distance, IndexEntry, ScoredEntry, VectorIndex,
};
