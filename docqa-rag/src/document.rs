//! Data types for documents, chunks, and retrieval results.

use serde::{Deserialize, Serialize};

/// A source document supplied by an external loader.
///
/// `page == 0` denotes "no page concept" (e.g. plain text files).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Document {
    /// The text content of the document.
    pub content: String,
    /// The name of the source document (typically a file name).
    pub doc_name: String,
    /// Page number within the source, or 0 when pages do not apply.
    pub page: u32,
}

impl Document {
    /// Create a new document.
    pub fn new(content: impl Into<String>, doc_name: impl Into<String>, page: u32) -> Self {
        Self { content: content.into(), doc_name: doc_name.into(), page }
    }
}

/// A bounded-length segment of a [`Document`], the atomic unit of retrieval.
///
/// `chunk_id` is assigned from a single shared counter per chunking call,
/// so ids are unique across the whole ingestion batch and ordered by
/// document-then-position.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Chunk {
    /// The text content of the chunk.
    pub content: String,
    /// The name of the source document.
    pub doc_name: String,
    /// Page number inherited from the source document.
    pub page: u32,
    /// Position of this chunk in the ingestion batch.
    pub chunk_id: u64,
}

/// A retrieved chunk paired with a relevance score in `[0, 1]`.
///
/// Produced fresh per query and discarded after the response is built.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchResult {
    /// The chunk text.
    pub content: String,
    /// The name of the source document.
    pub doc_name: String,
    /// The chunk's ingestion-batch id.
    pub chunk_id: u64,
    /// Page number, or 0 when pages do not apply.
    pub page: u32,
    /// Relevance score in `[0, 1]`, rounded to 4 decimal digits.
    pub score: f32,
}

/// A citation attached to a generated answer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Citation {
    /// The name of the source document.
    pub doc_name: String,
    /// The cited chunk's id.
    pub chunk_id: u64,
    /// The relevance score of the cited chunk.
    pub score: f32,
    /// A short preview of the chunk content.
    pub snippet: String,
}

/// The complete response to a question: an answer plus its citations.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Answer {
    /// The generated answer text.
    pub answer: String,
    /// The chunks the answer was grounded on.
    pub citations: Vec<Citation>,
}

/// Counts from one ingestion run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct IngestReport {
    /// Number of documents processed.
    pub documents: usize,
    /// Number of chunks produced.
    pub chunks: usize,
    /// Number of entries written to the vector index.
    pub indexed: usize,
}

/// A snapshot of the vector index's contents.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IndexStats {
    /// The configured collection name.
    pub collection: String,
    /// Number of entries currently stored.
    pub entries: usize,
}
