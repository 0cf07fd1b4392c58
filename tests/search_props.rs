//! Property tests for chunk packing, the hashing embedder, and search
//! ordering over the flat backend.

use std::collections::HashMap;

use agent_rag::chunking::{Chunker, RecursiveChunker};
use agent_rag::{
    Chunk, Document, EmbeddingProvider, FlatBackend, HashingEmbeddingProvider, VectorBackend,
};
use proptest::prelude::*;

fn arb_text() -> impl Strategy<Value = String> {
    // Words, newlines, and paragraph breaks in realistic proportion.
    proptest::collection::vec(
        prop_oneof![
            5 => "[a-z]{1,12}",
            2 => Just(" ".to_string()),
            1 => Just("\n".to_string()),
            1 => Just("\n\n".to_string()),
        ],
        1..120,
    )
    .prop_map(|parts| parts.concat())
    .prop_filter("content must not be empty", |t| !t.is_empty())
}

proptest! {
    #[test]
    fn chunks_are_bounded_ordered_substrings(
        text in arb_text(),
        chunk_size in 8usize..80,
        overlap_fraction in 0usize..50,
    ) {
        let overlap = chunk_size * overlap_fraction / 100;
        let doc = Document::new(text.clone(), HashMap::new());
        let chunks = RecursiveChunker::new(chunk_size, overlap).chunk(&doc);

        prop_assert!(!chunks.is_empty());
        prop_assert!(text.starts_with(&chunks[0].content));
        prop_assert!(text.ends_with(&chunks.last().unwrap().content));

        let mut search_from = 0;
        for (i, chunk) in chunks.iter().enumerate() {
            prop_assert!(!chunk.content.is_empty());
            prop_assert!(chunk.content.chars().count() <= chunk_size);
            prop_assert_eq!(chunk.chunk_index(), Some(i));

            // Chunks are contiguous slices of the source, in document
            // order; overlap means the next match may start before the
            // previous chunk's end but never before its start.
            let found = text[search_from..]
                .find(&chunk.content)
                .map(|pos| search_from + pos);
            prop_assert!(found.is_some(), "chunk {:?} not found in source", chunk.content);
            search_from = found.unwrap();
        }
    }

    #[test]
    fn hashing_embedder_is_deterministic_and_normalized(text in "[a-z ]{1,64}") {
        let provider = HashingEmbeddingProvider::new();
        let first = block_on_embed(&provider, &text);
        let second = block_on_embed(&provider, &text);

        prop_assert_eq!(first.len(), provider.dimensions());
        prop_assert_eq!(&first, &second);

        let norm: f32 = first.iter().map(|x| x * x).sum::<f32>().sqrt();
        if text.chars().any(|c| c.is_alphanumeric()) {
            prop_assert!((norm - 1.0).abs() < 1e-4, "norm was {norm}");
        } else {
            prop_assert_eq!(norm, 0.0);
        }
    }

    #[test]
    fn flat_search_is_ordered_and_bounded(
        entries in proptest::collection::vec(
            proptest::collection::vec(-1.0f32..1.0, 8),
            1..24,
        ),
        query in proptest::collection::vec(-1.0f32..1.0, 8),
        top_k in 1usize..8,
    ) {
        let dir = tempfile::TempDir::new().unwrap();
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();

        runtime.block_on(async {
            let backend = FlatBackend::open(dir.path(), "props").await.unwrap();
            let chunks: Vec<Chunk> = entries
                .iter()
                .enumerate()
                .map(|(i, embedding)| Chunk {
                    id: format!("doc_{i}"),
                    content: format!("entry {i}"),
                    embedding: embedding.clone(),
                    metadata: HashMap::new(),
                    parent_doc_id: "doc".to_string(),
                })
                .collect();
            backend.upsert(&chunks).await.unwrap();

            let results = backend.search(&query, top_k, None).await.unwrap();
            assert!(results.len() <= top_k);
            assert_eq!(results.len(), top_k.min(entries.len()));
            for pair in results.windows(2) {
                assert!(pair[0].score >= pair[1].score);
            }
            for result in &results {
                assert!(result.score.is_finite());
                assert!(result.score.abs() <= 1.0001);
            }
        });
    }
}

fn block_on_embed(provider: &HashingEmbeddingProvider, text: &str) -> Vec<f32> {
    let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
    runtime.block_on(provider.embed(text)).unwrap()
}
