//! Document chunking.
//!
//! [`Chunker`] splits normalized document text into overlapping,
//! bounded-length segments. Boundaries are attempted in priority order —
//! paragraph break, line break, word boundary, then a character-level
//! fallback — choosing the coarsest boundary that keeps each piece within
//! the configured size. The character fallback guarantees a valid split
//! always exists.

use tracing::debug;

use crate::document::{Chunk, Document};

/// Boundary separators tried from coarsest to finest. Whatever remains
/// oversized after the last one is split at character granularity.
const SEPARATORS: [&str; 3] = ["\n\n", "\n", " "];

/// Splits documents into overlapping chunks with a shared id counter.
///
/// Sizes are measured in characters (Unicode scalar values), not bytes.
/// Construct from an already-validated [`RagConfig`](crate::config::RagConfig):
/// `max_size > 0` and `overlap < max_size` are enforced there, at startup.
#[derive(Debug, Clone)]
pub struct Chunker {
    max_size: usize,
    overlap: usize,
}

impl Chunker {
    /// Create a new `Chunker`.
    ///
    /// # Arguments
    ///
    /// * `max_size` — maximum number of characters per chunk
    /// * `overlap` — number of trailing characters shared with the next chunk
    pub fn new(max_size: usize, overlap: usize) -> Self {
        Self { max_size, overlap }
    }

    /// Split documents into chunks.
    ///
    /// Every chunk inherits `doc_name`/`page` from its source document and
    /// receives the next id from a single counter shared across the whole
    /// call, so ids are unique and increasing in document-then-position
    /// order. Empty documents produce zero chunks.
    pub fn chunk(&self, documents: &[Document]) -> Vec<Chunk> {
        let mut chunks = Vec::new();
        let mut next_id: u64 = 0;

        for document in documents {
            if document.content.is_empty() {
                continue;
            }

            let pieces = split_pieces(&document.content, self.max_size, &SEPARATORS);
            for content in self.merge_pieces(pieces) {
                chunks.push(Chunk {
                    content,
                    doc_name: document.doc_name.clone(),
                    page: document.page,
                    chunk_id: next_id,
                });
                next_id += 1;
            }
        }

        debug!(
            document_count = documents.len(),
            chunk_count = chunks.len(),
            max_size = self.max_size,
            overlap = self.overlap,
            "chunked documents"
        );

        chunks
    }

    /// Greedily merge boundary-aligned pieces into chunks of at most
    /// `max_size` characters, seeding each new chunk with up to `overlap`
    /// trailing characters of the previous one.
    fn merge_pieces(&self, pieces: Vec<String>) -> Vec<String> {
        let mut merged = Vec::new();
        let mut current = String::new();
        let mut current_len = 0usize;

        for piece in pieces {
            let piece_len = char_len(&piece);
            if current_len > 0 && current_len + piece_len > self.max_size {
                // The overlap is capped so the seeded chunk stays in bounds.
                let keep = self.overlap.min(self.max_size.saturating_sub(piece_len));
                let tail = tail_chars(&current, keep).to_string();
                merged.push(current);
                current = tail;
                current_len = keep;
            }
            current.push_str(&piece);
            current_len += piece_len;
        }

        if !current.is_empty() {
            merged.push(current);
        }

        merged
    }
}

/// Recursively split `text` into pieces of at most `max_size` characters,
/// using the coarsest separator that applies. Separators stay attached to
/// the preceding piece so no input character is dropped.
fn split_pieces(text: &str, max_size: usize, separators: &[&str]) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }
    if char_len(text) <= max_size {
        return vec![text.to_string()];
    }

    let Some((separator, finer)) = separators.split_first() else {
        return split_chars(text, max_size);
    };

    let segments = split_keeping_separator(text, separator);
    if segments.len() <= 1 {
        // Separator absent at this level — try the next finer one.
        return split_pieces(text, max_size, finer);
    }

    let mut pieces = Vec::new();
    for segment in segments {
        if char_len(segment) <= max_size {
            pieces.push(segment.to_string());
        } else {
            pieces.extend(split_pieces(segment, max_size, finer));
        }
    }
    pieces
}

/// Split text at a separator while keeping the separator attached to the
/// preceding segment.
fn split_keeping_separator<'a>(text: &'a str, separator: &str) -> Vec<&'a str> {
    let mut result = Vec::new();
    let mut start = 0;

    while let Some(pos) = text[start..].find(separator) {
        let end = start + pos + separator.len();
        result.push(&text[start..end]);
        start = end;
    }

    if start < text.len() {
        result.push(&text[start..]);
    }

    result
}

/// Character-level fallback: fixed windows of `max_size` characters.
fn split_chars(text: &str, max_size: usize) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut current = String::new();
    let mut count = 0;

    for ch in text.chars() {
        current.push(ch);
        count += 1;
        if count == max_size {
            pieces.push(std::mem::take(&mut current));
            count = 0;
        }
    }

    if !current.is_empty() {
        pieces.push(current);
    }

    pieces
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// The last `n` characters of `text` as a subslice.
fn tail_chars(text: &str, n: usize) -> &str {
    if n == 0 {
        return "";
    }
    let total = char_len(text);
    if n >= total {
        return text;
    }
    match text.char_indices().nth(total - n) {
        Some((byte_index, _)) => &text[byte_index..],
        None => text,
    }
}
