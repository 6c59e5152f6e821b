//! Context assembly, snippet, and prompt template tests.

use docqa_rag::context::{assemble_context, build_prompt, snippet, NO_CONTEXT_SENTINEL};
use docqa_rag::document::SearchResult;

fn result(doc_name: &str, page: u32, content: &str) -> SearchResult {
    SearchResult {
        content: content.to_string(),
        doc_name: doc_name.to_string(),
        chunk_id: 0,
        page,
        score: 0.9,
    }
}

#[test]
fn empty_results_yield_the_sentinel() {
    let context = assemble_context(&[]);
    assert_eq!(context, NO_CONTEXT_SENTINEL);
    assert!(!context.is_empty());
}

#[test]
fn blocks_are_labeled_and_page_zero_is_omitted() {
    let results = vec![
        result("notes.txt", 0, "first block"),
        result("manual.pdf", 2, "second block"),
    ];

    let context = assemble_context(&results);

    assert_eq!(
        context,
        "[Source: notes.txt]\nfirst block\n\n---\n\n[Source: manual.pdf, Page: 2]\nsecond block"
    );
}

#[test]
fn order_is_preserved_exactly() {
    let results = vec![
        result("b.txt", 0, "zzz"),
        result("a.txt", 0, "aaa"),
        result("c.txt", 0, "mmm"),
    ];

    let context = assemble_context(&results);

    let b = context.find("b.txt").unwrap();
    let a = context.find("a.txt").unwrap();
    let c = context.find("c.txt").unwrap();
    assert!(b < a && a < c, "assembler must not re-sort");
}

#[test]
fn short_content_passes_through_snippet() {
    assert_eq!(snippet("short and sweet", 150), "short and sweet");
}

#[test]
fn long_content_is_cut_at_a_word_boundary() {
    let content = "word ".repeat(40); // 200 characters
    let cut = snippet(&content, 150);

    assert!(cut.ends_with("word..."));
    assert_eq!(cut.chars().count(), 149 + 3);
}

#[test]
fn unbroken_content_is_cut_hard() {
    let content = "a".repeat(200);
    let cut = snippet(&content, 150);

    assert_eq!(cut.chars().count(), 153);
    assert!(cut.ends_with("..."));
}

#[test]
fn early_word_boundary_is_ignored() {
    // The only space falls before 70% of the limit, so the cut is hard.
    let content = format!("ab {}", "x".repeat(200));
    let cut = snippet(&content, 150);

    assert_eq!(cut.chars().count(), 153);
}

#[test]
fn snippet_is_char_safe_on_multibyte_content() {
    let content = "é".repeat(200);
    let cut = snippet(&content, 150);

    assert_eq!(cut.chars().count(), 153);
}

#[test]
fn prompt_embeds_context_and_question_with_grounding_rules() {
    let prompt = build_prompt("[Source: a.txt]\nsome context", "what is this?");

    assert!(prompt.contains("CONTEXT:\n[Source: a.txt]\nsome context"));
    assert!(prompt.contains("QUESTION: what is this?"));
    assert!(prompt.contains("ONLY the information in the context"));
    assert!(prompt.contains("I don't know based on the available documents"));
    assert!(prompt.ends_with("ANSWER:"));
}
