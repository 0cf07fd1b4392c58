//! Storage backend abstraction for the vector store.
//!
//! Exactly two backends exist: [`SqliteBackend`](crate::sqlite::SqliteBackend)
//! (metadata-filterable, supports deletion by id) and
//! [`FlatBackend`](crate::flat::FlatBackend) (index-only, bulk search over a
//! snapshot file). Backend selection is a closed two-way choice made at
//! store construction; the fallback path may switch to the other kind, but
//! this is never an open plugin point.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::document::{Chunk, SearchResult};
use crate::error::{RagError, Result};

/// The two interchangeable storage backend kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Metadata-filterable backend over an embedded SQLite database.
    Sqlite,
    /// Index-only backend over a JSON snapshot file.
    Flat,
}

impl BackendKind {
    /// The alternate kind, used by the one-way fallback path.
    pub fn other(self) -> Self {
        match self {
            Self::Sqlite => Self::Flat,
            Self::Flat => Self::Sqlite,
        }
    }

    /// Subdirectory name under the persist root for this backend's state.
    pub(crate) fn subdir(self) -> &'static str {
        match self {
            Self::Sqlite => "sqlite",
            Self::Flat => "flat",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sqlite => write!(f, "sqlite"),
            Self::Flat => write!(f, "flat"),
        }
    }
}

impl FromStr for BackendKind {
    type Err = RagError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sqlite" => Ok(Self::Sqlite),
            "flat" => Ok(Self::Flat),
            other => Err(RagError::ConfigError(format!(
                "unsupported backend type '{other}' (expected 'sqlite' or 'flat')"
            ))),
        }
    }
}

/// Persistence and nearest-neighbor search over embedded chunks.
///
/// Backends store [`Chunk`]s with their embeddings and serve brute-force
/// cosine similarity search. Capability differences between the two kinds
/// are surfaced through [`supports_filter`](VectorBackend::supports_filter)
/// and [`supports_delete`](VectorBackend::supports_delete) so the store can
/// post-filter or report deletion as unsupported instead of failing.
#[async_trait]
pub trait VectorBackend: Send + Sync {
    /// Which of the two kinds this backend is.
    fn kind(&self) -> BackendKind;

    /// Whether metadata filters are pushed down into the backend's search.
    fn supports_filter(&self) -> bool;

    /// Whether deletion by chunk id is structurally supported.
    fn supports_delete(&self) -> bool;

    /// Insert or replace chunks. Chunks must have embeddings attached.
    async fn upsert(&self, chunks: &[Chunk]) -> Result<()>;

    /// Delete chunks by id.
    async fn delete(&self, ids: &[String]) -> Result<()>;

    /// Return up to `top_k` chunks nearest to `embedding` by cosine
    /// similarity, descending. Backends that support filtering apply
    /// `filter` natively; others ignore it (the store post-filters).
    async fn search(
        &self,
        embedding: &[f32],
        top_k: usize,
        filter: Option<&HashMap<String, String>>,
    ) -> Result<Vec<SearchResult>>;

    /// Number of stored chunks.
    async fn count(&self) -> Result<usize>;

    /// Destroy all stored entries, leaving an empty collection behind.
    /// Idempotent.
    async fn clear(&self) -> Result<()>;
}

/// Compute cosine similarity between two vectors.
///
/// Returns 0.0 if either vector has zero magnitude or the lengths differ.
pub(crate) fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

/// Whether a chunk's metadata satisfies every key/value pair of the filter
/// (exact-match AND semantics).
pub(crate) fn matches_filter(chunk: &Chunk, filter: &HashMap<String, String>) -> bool {
    filter.iter().all(|(key, value)| chunk.metadata.get(key) == Some(value))
}
