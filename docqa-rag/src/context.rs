//! Prompt context assembly and citation snippets.

use crate::document::SearchResult;

/// Fixed sentinel returned when there is no context to assemble.
///
/// Never an empty string, so downstream prompt construction always has a
/// well-formed placeholder.
pub const NO_CONTEXT_SENTINEL: &str = "No relevant documents found.";

/// Delimiter between context blocks. Chosen so it cannot plausibly occur
/// inside a chunk's content.
const BLOCK_SEPARATOR: &str = "\n\n---\n\n";

/// Maximum snippet length for citation display, in characters.
pub const SNIPPET_LENGTH: usize = 150;

/// Format results into a context string for the answer prompt.
///
/// Each result is rendered as a labeled block so a generated answer can be
/// traced back to its source:
///
/// ```text
/// [Source: policy.txt, Page: 2]
/// Products can be returned within 30 days...
/// ```
///
/// The page label is omitted when `page == 0`. Order is preserved exactly
/// as received; the assembler never re-sorts.
pub fn assemble_context(results: &[SearchResult]) -> String {
    if results.is_empty() {
        return NO_CONTEXT_SENTINEL.to_string();
    }

    results
        .iter()
        .map(|result| {
            let mut label = format!("[Source: {}", result.doc_name);
            if result.page > 0 {
                label.push_str(&format!(", Page: {}", result.page));
            }
            label.push(']');
            format!("{label}\n{}", result.content)
        })
        .collect::<Vec<_>>()
        .join(BLOCK_SEPARATOR)
}

/// Truncate chunk content for citation display.
///
/// Content longer than `max_length` characters is cut at the last word
/// boundary at or after 70% of `max_length` (or hard at `max_length` when
/// no such boundary exists) and suffixed with an ellipsis marker. Used only
/// for citations, never for the prompt context itself.
pub fn snippet(content: &str, max_length: usize) -> String {
    let chars: Vec<char> = content.chars().collect();
    if chars.len() <= max_length {
        return content.to_string();
    }

    let cutoff = max_length * 7 / 10;
    let keep = match chars[..max_length].iter().rposition(|c| *c == ' ') {
        Some(position) if position > cutoff => position,
        _ => max_length,
    };

    let mut truncated: String = chars[..keep].iter().collect();
    truncated.push_str("...");
    truncated
}

/// Build the generation prompt from assembled context and the question.
///
/// The instructions ground the generator: answer only from the given
/// context, and say "I don't know" when the context is insufficient.
pub fn build_prompt(context: &str, question: &str) -> String {
    format!(
        "You are a helpful assistant that answers questions based on the provided context.\n\
         \n\
         INSTRUCTIONS:\n\
         1. Answer the question using ONLY the information in the context below\n\
         2. If the context doesn't contain enough information to answer, say \"I don't know based on the available documents\"\n\
         3. Be concise and direct in your answers\n\
         4. Do not make up information that isn't in the context\n\
         \n\
         CONTEXT:\n\
         {context}\n\
         \n\
         QUESTION: {question}\n\
         \n\
         ANSWER:"
    )
}
