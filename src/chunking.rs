//! Document chunking.
//!
//! This module provides the [`Chunker`] trait and [`RecursiveChunker`],
//! which splits text on the coarsest separator that fits and packs the
//! resulting pieces into overlapping chunks.

use crate::document::{
    Chunk, Document, META_CHUNK_ID, META_CHUNK_INDEX, META_PARENT_DOC_ID, META_TOTAL_CHUNKS,
};
use crate::processor::content_hash;

/// Default separator preference, coarse to fine. The empty string means a
/// hard character cut.
pub const DEFAULT_SEPARATORS: [&str; 4] = ["\n\n", "\n", " ", ""];

/// A strategy for splitting documents into chunks.
///
/// Implementations produce [`Chunk`]s with content and metadata but no
/// embeddings; embeddings are attached later by the ingestion path.
pub trait Chunker: Send + Sync {
    /// Split a document into chunks.
    ///
    /// Returns an empty `Vec` if the document has empty content. Chunks are
    /// emitted in left-to-right document order with a 0-based, gap-free
    /// `chunk_index`, and carry `chunk_id`, `total_chunks`, and
    /// `parent_doc_id` metadata in addition to the parent's metadata.
    fn chunk(&self, document: &Document) -> Vec<Chunk>;
}

/// Splits text recursively on preferred separators with overlap.
///
/// The splitter tries each separator in order, splitting any piece that
/// still exceeds `chunk_size` with the next finer separator, and hard-cuts
/// as a last resort. Pieces are then packed greedily into chunks of at most
/// `chunk_size` characters, with up to `chunk_overlap` characters carried
/// from the tail of one chunk into the head of the next.
///
/// A document at or under `chunk_size` characters produces exactly one
/// chunk equal to its content.
#[derive(Debug, Clone)]
pub struct RecursiveChunker {
    chunk_size: usize,
    chunk_overlap: usize,
    separators: Vec<String>,
}

impl RecursiveChunker {
    /// Create a new `RecursiveChunker` with the default separators.
    ///
    /// # Arguments
    ///
    /// * `chunk_size` — maximum number of characters per chunk
    /// * `chunk_overlap` — number of overlapping characters between consecutive chunks
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        Self {
            chunk_size,
            chunk_overlap,
            separators: DEFAULT_SEPARATORS.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Replace the separator preference list, coarse to fine.
    ///
    /// An empty string acts as a hard character cut and is always honored
    /// as the implicit last resort even if omitted here.
    pub fn with_separators(mut self, separators: Vec<String>) -> Self {
        self.separators = separators;
        self
    }

    /// Split `text` into pieces of at most `chunk_size` characters using the
    /// coarsest separator that applies, recursing into finer separators for
    /// oversized pieces.
    fn split_pieces(&self, text: &str, separators: &[String]) -> Vec<String> {
        if char_len(text) <= self.chunk_size {
            return vec![text.to_string()];
        }

        let Some(separator) = separators.first() else {
            return hard_cut(text, self.chunk_size);
        };
        if separator.is_empty() {
            return hard_cut(text, self.chunk_size);
        }

        let segments = split_keeping_separator(text, separator);
        if segments.len() <= 1 {
            return self.split_pieces(text, &separators[1..]);
        }

        let mut pieces = Vec::new();
        for segment in segments {
            if char_len(segment) <= self.chunk_size {
                pieces.push(segment.to_string());
            } else {
                pieces.extend(self.split_pieces(segment, &separators[1..]));
            }
        }
        pieces
    }

    /// Pack pieces into chunks of at most `chunk_size` characters, carrying
    /// up to `chunk_overlap` trailing characters into the next chunk.
    fn merge_pieces(&self, pieces: Vec<String>) -> Vec<String> {
        let mut chunks = Vec::new();
        let mut window: Vec<String> = Vec::new();
        let mut window_len = 0usize;

        for piece in pieces {
            let piece_len = char_len(&piece);

            if !window.is_empty() && window_len + piece_len > self.chunk_size {
                chunks.push(window.concat());

                // Shrink the window to the overlap budget, and further if
                // the incoming piece would not fit beside it.
                while window_len > self.chunk_overlap
                    || (window_len + piece_len > self.chunk_size && window_len > 0)
                {
                    let removed = window.remove(0);
                    window_len -= char_len(&removed);
                }
            }

            window_len += piece_len;
            window.push(piece);
        }

        if !window.is_empty() {
            chunks.push(window.concat());
        }

        chunks
    }
}

impl Chunker for RecursiveChunker {
    fn chunk(&self, document: &Document) -> Vec<Chunk> {
        if document.content.is_empty() {
            return Vec::new();
        }

        let parent_doc_id = document
            .doc_id()
            .map(str::to_string)
            .unwrap_or_else(|| content_hash(&document.content));

        let texts = if char_len(&document.content) <= self.chunk_size {
            vec![document.content.clone()]
        } else {
            let pieces = self.split_pieces(&document.content, &self.separators);
            self.merge_pieces(pieces)
        };

        let total = texts.len();
        texts
            .into_iter()
            .enumerate()
            .map(|(i, content)| {
                let chunk_id = format!("{parent_doc_id}_{i}");
                let mut metadata = document.metadata.clone();
                metadata.insert(META_CHUNK_ID.to_string(), chunk_id.clone());
                metadata.insert(META_CHUNK_INDEX.to_string(), i.to_string());
                metadata.insert(META_TOTAL_CHUNKS.to_string(), total.to_string());
                metadata.insert(META_PARENT_DOC_ID.to_string(), parent_doc_id.clone());
                Chunk {
                    id: chunk_id,
                    content,
                    embedding: Vec::new(),
                    metadata,
                    parent_doc_id: parent_doc_id.clone(),
                }
            })
            .collect()
    }
}

/// Character count of `text` (not byte length).
fn char_len(text: &str) -> usize {
    text.chars().count()
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

/// Cut text into consecutive runs of at most `chunk_size` characters,
/// respecting UTF-8 boundaries.
fn hard_cut(text: &str, chunk_size: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    chars.chunks(chunk_size).map(|run| run.iter().collect()).collect()
}
