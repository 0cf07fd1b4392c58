//! Tests for the recursive chunker: sizing, ordering, overlap, and metadata.

use std::collections::HashMap;

use agent_rag::chunking::{Chunker, RecursiveChunker};
use agent_rag::document::{Document, META_CHUNK_ID, META_PARENT_DOC_ID, META_TOTAL_CHUNKS};
use agent_rag::processor::DocumentProcessor;

fn text_document(content: &str) -> Document {
    DocumentProcessor::new().process_text(content, None)
}

#[test]
fn short_document_yields_single_identical_chunk() {
    let doc = text_document("a short note that fits in one chunk");
    let chunks = RecursiveChunker::new(1000, 200).chunk(&doc);

    assert_eq!(chunks.len(), 1);
    assert_eq!(chunks[0].content, doc.content);
    assert_eq!(chunks[0].metadata.get("chunk_index").map(String::as_str), Some("0"));
    assert_eq!(chunks[0].metadata.get(META_TOTAL_CHUNKS).map(String::as_str), Some("1"));
}

#[test]
fn empty_document_yields_no_chunks() {
    let doc = Document::new("", HashMap::new());
    let chunks = RecursiveChunker::new(100, 10).chunk(&doc);
    assert!(chunks.is_empty());
}

#[test]
fn chunk_indices_are_sequential_and_gap_free() {
    let content = "word ".repeat(200);
    let doc = text_document(&content);
    let chunks = RecursiveChunker::new(100, 20).chunk(&doc);

    assert!(chunks.len() > 1);
    let total = chunks.len().to_string();
    for (i, chunk) in chunks.iter().enumerate() {
        assert_eq!(chunk.chunk_index(), Some(i));
        assert_eq!(chunk.metadata.get(META_TOTAL_CHUNKS), Some(&total));
        assert_eq!(chunk.id, format!("{}_{i}", chunk.parent_doc_id));
        assert_eq!(chunk.metadata.get(META_CHUNK_ID), Some(&chunk.id));
    }
}

#[test]
fn chunks_inherit_parent_metadata() {
    let mut metadata = HashMap::new();
    metadata.insert("topic".to_string(), "testing".to_string());
    let doc = DocumentProcessor::new().process_text("word ".repeat(100), Some(&metadata));
    let doc_id = doc.doc_id().unwrap().to_string();

    let chunks = RecursiveChunker::new(80, 10).chunk(&doc);
    assert!(chunks.len() > 1);
    for chunk in &chunks {
        assert_eq!(chunk.metadata.get("topic").map(String::as_str), Some("testing"));
        assert_eq!(chunk.metadata.get(META_PARENT_DOC_ID), Some(&doc_id));
        assert_eq!(chunk.parent_doc_id, doc_id);
    }
}

#[test]
fn consecutive_chunks_overlap_on_separator_boundaries() {
    // Uniform 5-character pieces make the overlap land exactly on the
    // configured budget: each chunk carries the previous chunk's last
    // 10 characters as its prefix.
    let content = "aaaa ".repeat(12);
    let doc = text_document(&content);
    let chunks = RecursiveChunker::new(20, 10).chunk(&doc);

    assert!(chunks.len() >= 2);
    for pair in chunks.windows(2) {
        let tail: String =
            pair[0].content.chars().skip(pair[0].content.chars().count() - 10).collect();
        assert!(
            pair[1].content.starts_with(&tail),
            "chunk {:?} does not begin with the previous tail {tail:?}",
            pair[1].content
        );
    }
}

#[test]
fn every_chunk_respects_the_size_limit() {
    let content = "some words in a line.\n".repeat(50);
    let doc = text_document(&content);
    let chunks = RecursiveChunker::new(64, 16).chunk(&doc);

    assert!(chunks.len() > 1);
    for chunk in &chunks {
        assert!(chunk.content.chars().count() <= 64, "oversized chunk: {:?}", chunk.content);
    }
}

#[test]
fn unbreakable_text_is_hard_cut() {
    let content = "a".repeat(25);
    let doc = text_document(&content);
    let chunks = RecursiveChunker::new(10, 3).chunk(&doc);

    let lengths: Vec<usize> = chunks.iter().map(|c| c.content.chars().count()).collect();
    assert_eq!(lengths, vec![10, 10, 5]);

    let reassembled: String = chunks.iter().map(|c| c.content.as_str()).collect();
    assert_eq!(reassembled, content);
}

#[test]
fn hard_cut_respects_utf8_boundaries() {
    let content = "é".repeat(25);
    let doc = text_document(&content);
    let chunks = RecursiveChunker::new(10, 2).chunk(&doc);

    assert!(!chunks.is_empty());
    for chunk in &chunks {
        assert!(chunk.content.chars().count() <= 10);
        assert!(chunk.content.chars().all(|c| c == 'é'));
    }
}

#[test]
fn paragraph_breaks_are_preferred_over_mid_text_cuts() {
    let content = format!("{}\n\n{}", "alpha ".repeat(10).trim(), "beta ".repeat(10).trim());
    let doc = text_document(&content);
    let chunks = RecursiveChunker::new(70, 0).chunk(&doc);

    assert_eq!(chunks.len(), 2);
    assert!(chunks[0].content.contains("alpha"));
    assert!(!chunks[0].content.contains("beta"));
    assert!(chunks[1].content.contains("beta"));
}
