//! The vector store: chunking, embedding, persistence, and search.
//!
//! [`VectorStore`] owns the whole ingestion path (chunk → embed → persist)
//! and similarity search over one collection. It opens the preferred
//! backend at construction and applies the fallback policy when that
//! fails: a recognized corrupt/incompatible persisted state is reset and
//! retried once; any other failure switches permanently to the alternate
//! backend kind for the lifetime of the store.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{error, info, warn};

use crate::backend::{BackendKind, VectorBackend, matches_filter};
use crate::chunking::{Chunker, RecursiveChunker};
use crate::config::RagConfig;
use crate::document::{Chunk, CollectionInfo, Document, SearchResult};
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::flat::FlatBackend;
use crate::sqlite::SqliteBackend;

/// Embeds, persists, and searches chunks for a single collection.
///
/// # Example
///
/// ```rust,ignore
/// use std::sync::Arc;
/// use agent_rag::{HashingEmbeddingProvider, RagConfig, VectorStore};
///
/// let config = RagConfig::default();
/// let store = VectorStore::open(config, Arc::new(HashingEmbeddingProvider::new())).await?;
/// let ids = store.add_documents(&documents).await?;
/// let hits = store.similarity_search("how do I configure X?", 5, None).await;
/// ```
pub struct VectorStore {
    config: RagConfig,
    backend: Box<dyn VectorBackend>,
    embedder: Arc<dyn EmbeddingProvider>,
    chunker: Box<dyn Chunker>,
}

impl VectorStore {
    /// Open a store for the configured collection, applying the backend
    /// fallback policy.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::InitializationError`] only when both backend
    /// kinds fail to open — the subsystem is then unusable.
    pub async fn open(config: RagConfig, embedder: Arc<dyn EmbeddingProvider>) -> Result<Self> {
        let backend = Self::open_with_fallback(&config).await?;
        info!(backend = %backend.kind(), collection = %config.collection_name, "vector store ready");

        let chunker = Box::new(RecursiveChunker::new(config.chunk_size, config.chunk_overlap));
        Ok(Self { config, backend, embedder, chunker })
    }

    /// Replace the chunker used on the ingestion path.
    pub fn with_chunker(mut self, chunker: Box<dyn Chunker>) -> Self {
        self.chunker = chunker;
        self
    }

    async fn open_with_fallback(config: &RagConfig) -> Result<Box<dyn VectorBackend>> {
        let preferred = config.backend;

        let first_error = match Self::open_backend(config, preferred).await {
            Ok(backend) => return Ok(backend),
            Err(e) => e,
        };

        if matches!(first_error, RagError::SchemaMismatch { .. }) {
            warn!(
                backend = %preferred,
                error = %first_error,
                "persisted state incompatible, resetting and retrying"
            );
            let dir = config.persist_directory.join(preferred.subdir());
            let reset = match tokio::fs::remove_dir_all(&dir).await {
                Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e),
                _ => Ok(()),
            };
            match reset {
                Ok(()) => {
                    if let Ok(backend) = Self::open_backend(config, preferred).await {
                        return Ok(backend);
                    }
                    warn!(backend = %preferred, "retry after reset failed");
                }
                Err(e) => {
                    warn!(backend = %preferred, error = %e, "could not reset persisted directory");
                }
            }
        } else {
            warn!(backend = %preferred, error = %first_error, "backend failed to initialize");
        }

        let fallback = preferred.other();
        warn!(from = %preferred, to = %fallback, "switching to fallback backend");
        Self::open_backend(config, fallback).await.map_err(|e| {
            error!(backend = %fallback, error = %e, "fallback backend failed to initialize");
            RagError::InitializationError(format!(
                "preferred backend '{preferred}' failed ({first_error}) and fallback '{fallback}' failed ({e})"
            ))
        })
    }

    async fn open_backend(config: &RagConfig, kind: BackendKind) -> Result<Box<dyn VectorBackend>> {
        let root = &config.persist_directory;
        let collection = &config.collection_name;
        Ok(match kind {
            BackendKind::Sqlite => Box::new(SqliteBackend::open(root, collection).await?),
            BackendKind::Flat => Box::new(FlatBackend::open(root, collection).await?),
        })
    }

    /// The store configuration.
    pub fn config(&self) -> &RagConfig {
        &self.config
    }

    /// The backend kind actually serving the collection, which may differ
    /// from the configured preference after a fallback.
    pub fn backend_kind(&self) -> BackendKind {
        self.backend.kind()
    }

    /// Chunk, embed, and persist documents, returning the assigned chunk ids.
    ///
    /// An empty input is a no-op yielding an empty list. Embedding or
    /// persistence failures propagate: a partial add must not be silently
    /// swallowed, and the state of partial writes is backend-defined.
    pub async fn add_documents(&self, documents: &[Document]) -> Result<Vec<String>> {
        if documents.is_empty() {
            warn!("no documents provided");
            return Ok(Vec::new());
        }

        let mut chunks: Vec<Chunk> = Vec::new();
        for document in documents {
            chunks.extend(self.chunker.chunk(document));
        }
        if chunks.is_empty() {
            return Ok(Vec::new());
        }

        let texts: Vec<&str> = chunks.iter().map(|c| c.content.as_str()).collect();
        let embeddings = self.embedder.embed_batch(&texts).await?;
        for (chunk, embedding) in chunks.iter_mut().zip(embeddings) {
            chunk.embedding = embedding;
        }

        self.backend.upsert(&chunks).await?;

        info!(chunk_count = chunks.len(), document_count = documents.len(), "added documents");
        Ok(chunks.into_iter().map(|c| c.id).collect())
    }

    /// Return up to `k` chunks nearest to `query`.
    ///
    /// Query-time failures are logged and collapse into an empty result:
    /// callers cannot distinguish "no matches" from "search failed" at this
    /// layer. With a metadata filter on a backend without native filtering,
    /// the unfiltered top-`k` is post-filtered and fewer than `k` results
    /// may come back.
    pub async fn similarity_search(
        &self,
        query: &str,
        k: usize,
        filter: Option<&HashMap<String, String>>,
    ) -> Vec<Chunk> {
        self.similarity_search_with_score(query, k, filter)
            .await
            .into_iter()
            .map(|r| r.chunk)
            .collect()
    }

    /// Like [`similarity_search`](Self::similarity_search), with each
    /// chunk's relevance score (cosine similarity, higher is closer).
    pub async fn similarity_search_with_score(
        &self,
        query: &str,
        k: usize,
        filter: Option<&HashMap<String, String>>,
    ) -> Vec<SearchResult> {
        match self.try_search(query, k, filter).await {
            Ok(results) => {
                info!(result_count = results.len(), "similarity search completed");
                results
            }
            Err(e) => {
                error!(error = %e, "similarity search failed");
                Vec::new()
            }
        }
    }

    async fn try_search(
        &self,
        query: &str,
        k: usize,
        filter: Option<&HashMap<String, String>>,
    ) -> Result<Vec<SearchResult>> {
        let embedding = self.embedder.embed(query).await?;
        let mut results = self.backend.search(&embedding, k, filter).await?;

        if !self.backend.supports_filter() {
            if let Some(filter) = filter.filter(|f| !f.is_empty()) {
                results.retain(|r| matches_filter(&r.chunk, filter));
            }
        }

        Ok(results)
    }

    /// Delete chunks by id.
    ///
    /// Returns `false` without raising when the backend does not support
    /// deletion by id (the index-only backend), or when deletion fails.
    pub async fn delete_documents(&self, chunk_ids: &[String]) -> bool {
        if !self.backend.supports_delete() {
            warn!(backend = %self.backend.kind(), "backend does not support deletion by id");
            return false;
        }
        match self.backend.delete(chunk_ids).await {
            Ok(()) => {
                info!(count = chunk_ids.len(), "deleted chunks");
                true
            }
            Err(e) => {
                error!(error = %e, "failed to delete chunks");
                false
            }
        }
    }

    /// Identity and best-effort size of the collection.
    ///
    /// The count is `None` when the backend cannot report it; this never
    /// fails.
    pub async fn collection_info(&self) -> CollectionInfo {
        let document_count = match self.backend.count().await {
            Ok(count) => Some(count),
            Err(e) => {
                warn!(error = %e, "could not determine document count");
                None
            }
        };

        CollectionInfo {
            backend: self.backend.kind(),
            collection_name: self.config.collection_name.clone(),
            persist_directory: self.config.persist_directory.clone(),
            embedding_model: self.embedder.model_id().to_string(),
            document_count,
        }
    }

    /// Destroy all persisted entries, leaving an empty collection of the
    /// same backend and name. Idempotent; returns `false` on failure.
    pub async fn clear_collection(&self) -> bool {
        match self.backend.clear().await {
            Ok(()) => {
                info!("collection cleared");
                true
            }
            Err(e) => {
                error!(error = %e, "failed to clear collection");
                false
            }
        }
    }
}
