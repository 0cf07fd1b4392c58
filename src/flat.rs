//! Index-only vector backend persisted as a JSON snapshot file.
//!
//! The whole collection lives in memory and is rewritten to
//! `<persist>/flat/<collection>.json` after every mutation, the way a saved
//! index file is reloaded wholesale on open. The backend supports bulk
//! upsert and brute-force cosine search only: no metadata filter pushdown
//! and no deletion by id.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::debug;

use crate::backend::{BackendKind, VectorBackend, cosine_similarity};
use crate::document::{Chunk, SearchResult};
use crate::error::{RagError, Result};

/// Bumped whenever the snapshot layout changes.
const SNAPSHOT_VERSION: u32 = 1;

#[derive(Serialize, Deserialize)]
struct Snapshot {
    version: u32,
    entries: Vec<Chunk>,
}

/// The index-only [`VectorBackend`] over a snapshot file.
pub struct FlatBackend {
    entries: RwLock<HashMap<String, Chunk>>,
    snapshot_path: PathBuf,
}

impl FlatBackend {
    /// Open (or create) the collection snapshot under `persist_root`.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::SchemaMismatch`] when an existing snapshot cannot
    /// be deserialized or records an incompatible version, and
    /// [`RagError::VectorStoreError`] for any other failure.
    pub async fn open(persist_root: &Path, collection: &str) -> Result<Self> {
        let dir = persist_root.join(BackendKind::Flat.subdir());
        tokio::fs::create_dir_all(&dir).await.map_err(|e| RagError::VectorStoreError {
            backend: "flat".to_string(),
            message: format!("cannot create persist directory: {e}"),
        })?;

        let snapshot_path = dir.join(format!("{collection}.json"));
        let mut entries = HashMap::new();

        if snapshot_path.exists() {
            let raw =
                tokio::fs::read_to_string(&snapshot_path).await.map_err(|e| {
                    RagError::VectorStoreError {
                        backend: "flat".to_string(),
                        message: format!("cannot read snapshot: {e}"),
                    }
                })?;
            let snapshot: Snapshot =
                serde_json::from_str(&raw).map_err(|e| RagError::SchemaMismatch {
                    backend: "flat".to_string(),
                    message: format!("snapshot is not readable: {e}"),
                })?;
            if snapshot.version != SNAPSHOT_VERSION {
                return Err(RagError::SchemaMismatch {
                    backend: "flat".to_string(),
                    message: format!(
                        "snapshot version {}, expected {SNAPSHOT_VERSION}",
                        snapshot.version
                    ),
                });
            }
            entries =
                snapshot.entries.into_iter().map(|chunk| (chunk.id.clone(), chunk)).collect();
            debug!(path = %snapshot_path.display(), count = entries.len(), "loaded flat snapshot");
        }

        Ok(Self { entries: RwLock::new(entries), snapshot_path })
    }

    /// Path of the collection's snapshot file.
    pub fn snapshot_path(&self) -> &Path {
        &self.snapshot_path
    }

    async fn save(&self, entries: &HashMap<String, Chunk>) -> Result<()> {
        let snapshot =
            Snapshot { version: SNAPSHOT_VERSION, entries: entries.values().cloned().collect() };
        let raw = serde_json::to_string(&snapshot)?;
        tokio::fs::write(&self.snapshot_path, raw).await.map_err(|e| {
            RagError::VectorStoreError {
                backend: "flat".to_string(),
                message: format!("cannot write snapshot: {e}"),
            }
        })?;
        Ok(())
    }
}

#[async_trait]
impl VectorBackend for FlatBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Flat
    }

    fn supports_filter(&self) -> bool {
        false
    }

    fn supports_delete(&self) -> bool {
        false
    }

    async fn upsert(&self, chunks: &[Chunk]) -> Result<()> {
        if chunks.is_empty() {
            return Ok(());
        }

        let mut entries = self.entries.write().await;
        for chunk in chunks {
            entries.insert(chunk.id.clone(), chunk.clone());
        }
        self.save(&entries).await?;

        debug!(count = chunks.len(), "upserted chunks into flat index");
        Ok(())
    }

    async fn delete(&self, _ids: &[String]) -> Result<()> {
        Err(RagError::VectorStoreError {
            backend: "flat".to_string(),
            message: "deletion by id is not supported by the flat index".to_string(),
        })
    }

    async fn search(
        &self,
        embedding: &[f32],
        top_k: usize,
        _filter: Option<&HashMap<String, String>>,
    ) -> Result<Vec<SearchResult>> {
        let entries = self.entries.read().await;
        let mut scored: Vec<SearchResult> = entries
            .values()
            .map(|chunk| SearchResult {
                score: cosine_similarity(embedding, &chunk.embedding),
                chunk: chunk.clone(),
            })
            .collect();

        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(top_k);
        Ok(scored)
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.entries.read().await.len())
    }

    async fn clear(&self) -> Result<()> {
        let mut entries = self.entries.write().await;
        entries.clear();
        self.save(&entries).await?;
        debug!("cleared flat collection");
        Ok(())
    }
}
