//! Chunker boundary, bound, coverage, and id-assignment tests.

use docqa_rag::chunking::Chunker;
use docqa_rag::document::Document;
use proptest::prelude::*;

fn char_len(text: &str) -> usize {
    text.chars().count()
}

#[test]
fn document_smaller_than_max_size_is_one_chunk() {
    let chunker = Chunker::new(100, 10);
    let docs = vec![Document::new("a short document", "notes.txt", 0)];

    let chunks = chunker.chunk(&docs);

    assert_eq!(chunks.len(), 1);
    assert_eq!(chunks[0].content, "a short document");
    assert_eq!(chunks[0].doc_name, "notes.txt");
    assert_eq!(chunks[0].page, 0);
    assert_eq!(chunks[0].chunk_id, 0);
}

#[test]
fn empty_document_produces_zero_chunks() {
    let chunker = Chunker::new(100, 10);
    let docs = vec![Document::new("", "empty.txt", 0)];

    assert!(chunker.chunk(&docs).is_empty());
}

#[test]
fn paragraph_boundary_is_preferred() {
    let chunker = Chunker::new(20, 0);
    let docs = vec![Document::new("aaaa bbbb cccc\n\ndddd eeee ffff", "doc.txt", 0)];

    let chunks = chunker.chunk(&docs);

    assert_eq!(chunks.len(), 2);
    assert_eq!(chunks[0].content, "aaaa bbbb cccc\n\n");
    assert_eq!(chunks[1].content, "dddd eeee ffff");
}

#[test]
fn word_boundaries_with_overlap() {
    let chunker = Chunker::new(10, 3);
    let docs = vec![Document::new("aaaa bbbb cccc dddd eeee", "doc.txt", 0)];

    let chunks: Vec<String> = chunker.chunk(&docs).into_iter().map(|c| c.content).collect();

    assert_eq!(chunks, vec!["aaaa bbbb ", "bb cccc ", "cc dddd ", "dd eeee"]);
}

#[test]
fn unbroken_text_falls_back_to_character_splits() {
    let chunker = Chunker::new(8, 2);
    let docs = vec![Document::new("abcdefghijklmnopqrst", "doc.txt", 0)];

    let chunks = chunker.chunk(&docs);

    assert!(chunks.len() > 1);
    for chunk in &chunks {
        assert!(char_len(&chunk.content) <= 8);
    }
    assert!(chunks[0].content.starts_with("abcdefgh"));
}

#[test]
fn multibyte_text_is_split_on_character_boundaries() {
    let chunker = Chunker::new(10, 2);
    let docs = vec![Document::new("héllo wörld émojis 😀😀😀 more wörds here", "utf8.txt", 0)];

    let chunks = chunker.chunk(&docs);

    assert!(!chunks.is_empty());
    for chunk in &chunks {
        assert!(char_len(&chunk.content) <= 10);
    }
}

#[test]
fn ids_are_shared_across_documents_and_inherit_metadata() {
    let chunker = Chunker::new(10, 0);
    let docs = vec![
        Document::new("aaaa bbbb cccc", "first.txt", 0),
        Document::new("", "empty.txt", 0),
        Document::new("dddd eeee ffff", "second.pdf", 3),
    ];

    let chunks = chunker.chunk(&docs);

    for (position, chunk) in chunks.iter().enumerate() {
        assert_eq!(chunk.chunk_id, position as u64);
    }
    assert!(chunks.iter().any(|c| c.doc_name == "first.txt" && c.page == 0));
    assert!(chunks.iter().any(|c| c.doc_name == "second.pdf" && c.page == 3));
    assert!(chunks.iter().all(|c| c.doc_name != "empty.txt"));
}

/// Reconstruct the source text from chunks produced with a known overlap:
/// words are unique, so the largest suffix/prefix match is the real one.
fn reconstruct(chunks: &[String], overlap: usize) -> String {
    let mut text = chunks[0].clone();
    for chunk in &chunks[1..] {
        let chunk_chars: Vec<char> = chunk.chars().collect();
        let mut matched = 0;
        for take in (0..=overlap.min(chunk_chars.len())).rev() {
            let prefix: String = chunk_chars[..take].iter().collect();
            if text.ends_with(&prefix) {
                matched = take;
                break;
            }
        }
        let rest: String = chunk_chars[matched..].iter().collect();
        text.push_str(&rest);
    }
    text
}

#[test]
fn chunks_cover_the_whole_document() {
    let content: String =
        (0..150).map(|i| format!("word{i:03}")).collect::<Vec<_>>().join(" ");
    let chunker = Chunker::new(50, 10);
    let docs = vec![Document::new(content.clone(), "doc.txt", 0)];

    let chunks: Vec<String> = chunker.chunk(&docs).into_iter().map(|c| c.content).collect();

    assert!(chunks.len() > 1);
    assert_eq!(reconstruct(&chunks, 10), content);
}

#[test]
fn ingestion_scenario_prose_and_paged_document() {
    // doc_a: ~1200 characters of prose; doc_b: a 3-page extracted text.
    let doc_a: String = (0..150).map(|i| format!("word{i:03}")).collect::<Vec<_>>().join(" ");
    assert!(doc_a.len() >= 1100);

    let page = |n: u32| {
        let body: String =
            (0..75).map(|i| format!("p{n}term{i:03}")).collect::<Vec<_>>().join(" ");
        Document::new(body, "manual.pdf", n)
    };

    let docs =
        vec![Document::new(doc_a, "doc_a.txt", 0), page(1), page(2), page(3)];
    let chunker = Chunker::new(500, 50);

    let chunks = chunker.chunk(&docs);

    let from_a = chunks.iter().filter(|c| c.doc_name == "doc_a.txt").count();
    assert!(from_a >= 3, "expected at least 3 chunks from doc_a, got {from_a}");

    for n in 1..=3 {
        assert!(
            chunks.iter().any(|c| c.doc_name == "manual.pdf" && c.page == n),
            "no chunk for page {n}"
        );
    }

    let ids: Vec<u64> = chunks.iter().map(|c| c.chunk_id).collect();
    for window in ids.windows(2) {
        assert!(window[0] < window[1], "ids not strictly increasing");
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn every_chunk_respects_the_size_bound(
        content in "[a-z \\n]{0,300}",
        max_size in 1usize..50,
        overlap_seed in 0usize..50,
    ) {
        let overlap = overlap_seed % max_size;
        let chunker = Chunker::new(max_size, overlap);
        let docs = vec![Document::new(content, "doc.txt", 0)];

        for chunk in chunker.chunk(&docs) {
            prop_assert!(!chunk.content.is_empty());
            prop_assert!(
                char_len(&chunk.content) <= max_size,
                "chunk of {} chars exceeds max_size {}",
                char_len(&chunk.content),
                max_size,
            );
        }
    }

    #[test]
    fn chunk_ids_are_unique_and_increasing(
        first in "[a-z \\n]{0,200}",
        second in "[a-z \\n]{0,200}",
        max_size in 1usize..40,
    ) {
        let chunker = Chunker::new(max_size, 0);
        let docs = vec![
            Document::new(first, "first.txt", 0),
            Document::new(second, "second.txt", 0),
        ];

        let chunks = chunker.chunk(&docs);
        for (position, chunk) in chunks.iter().enumerate() {
            prop_assert_eq!(chunk.chunk_id, position as u64);
        }
    }

    #[test]
    fn every_chunk_is_a_substring_of_its_document(
        content in "[a-z \\n]{0,300}",
        max_size in 1usize..50,
        overlap_seed in 0usize..50,
    ) {
        let overlap = overlap_seed % max_size;
        let chunker = Chunker::new(max_size, overlap);
        let docs = vec![Document::new(content.clone(), "doc.txt", 0)];

        for chunk in chunker.chunk(&docs) {
            prop_assert!(
                content.contains(&chunk.content),
                "chunk {:?} is not a substring of the document",
                chunk.content,
            );
        }
    }
}
