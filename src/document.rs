//! Data types for documents, chunks, and search results.

use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Metadata key for the content-derived document identifier.
pub const META_DOC_ID: &str = "doc_id";
/// Metadata key for the originating source (file path or `"text_input"`).
pub const META_SOURCE: &str = "source";
/// Metadata key for a chunk's identifier (`{doc_id}_{index}`).
pub const META_CHUNK_ID: &str = "chunk_id";
/// Metadata key for a chunk's 0-based position within its document.
pub const META_CHUNK_INDEX: &str = "chunk_index";
/// Metadata key for the number of chunks produced from the parent document.
pub const META_TOTAL_CHUNKS: &str = "total_chunks";
/// Metadata key for a chunk's parent document identifier.
pub const META_PARENT_DOC_ID: &str = "parent_doc_id";

/// A unit of ingested content with its metadata.
///
/// Every document in circulation has non-empty `content` and a populated
/// `doc_id` metadata entry (a content-derived hash). Documents are created
/// by the [`DocumentProcessor`](crate::processor::DocumentProcessor) and
/// never mutated after creation, apart from metadata augmentation before
/// chunking.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Document {
    /// The text content of the document.
    pub content: String,
    /// Key-value metadata. Numeric values are carried in decimal string form.
    pub metadata: HashMap<String, String>,
}

impl Document {
    /// Create a document from content and metadata.
    pub fn new(content: impl Into<String>, metadata: HashMap<String, String>) -> Self {
        Self { content: content.into(), metadata }
    }

    /// The content-derived document identifier, if stamped.
    pub fn doc_id(&self) -> Option<&str> {
        self.metadata.get(META_DOC_ID).map(String::as_str)
    }

    /// The originating source, if stamped.
    pub fn source(&self) -> Option<&str> {
        self.metadata.get(META_SOURCE).map(String::as_str)
    }
}

/// A bounded segment of a [`Document`] with its vector embedding.
///
/// Chunk IDs are `{parent_doc_id}_{chunk_index}`. Metadata inherits all
/// parent document fields plus `chunk_id`, `chunk_index`, `total_chunks`,
/// and `parent_doc_id`. Chunkers emit chunks with an empty embedding; the
/// [`VectorStore`](crate::store::VectorStore) attaches embeddings during
/// ingestion.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Chunk {
    /// Unique identifier for the chunk.
    pub id: String,
    /// The text content of the chunk.
    pub content: String,
    /// The vector embedding for this chunk's content.
    pub embedding: Vec<f32>,
    /// Metadata inherited from the parent document plus chunk-specific fields.
    pub metadata: HashMap<String, String>,
    /// The ID of the parent [`Document`].
    pub parent_doc_id: String,
}

impl Chunk {
    /// The chunk's 0-based position within its parent document, if stamped.
    pub fn chunk_index(&self) -> Option<usize> {
        self.metadata.get(META_CHUNK_INDEX).and_then(|v| v.parse().ok())
    }
}

/// A retrieved [`Chunk`] paired with a relevance score (higher is closer).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    /// The retrieved chunk.
    pub chunk: Chunk,
    /// Cosine similarity between the query and the chunk.
    pub score: f32,
}

/// A snapshot of a collection's identity and size.
///
/// `document_count` is queried live from the backend and is `None` when it
/// cannot be determined.
#[derive(Debug, Clone)]
pub struct CollectionInfo {
    /// The backend currently serving the collection.
    pub backend: crate::backend::BackendKind,
    /// The collection name.
    pub collection_name: String,
    /// Root directory holding the persisted backend subdirectories.
    pub persist_directory: PathBuf,
    /// Identifier of the embedding model used by the collection.
    pub embedding_model: String,
    /// Best-effort number of stored chunks.
    pub document_count: Option<usize>,
}
