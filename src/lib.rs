//! Retrieval-augmented knowledge base tools for AI agents.
//!
//! This crate implements the retrieval core an agent harness calls as
//! tools: document ingestion (files, directories, raw text), overlapping
//! chunking, embedding, dual-backend vector storage with automatic
//! fallback, and similarity search rendered as human-readable reports.
//!
//! # Architecture
//!
//! - [`DocumentProcessor`] normalizes sources into [`Document`]s with
//!   content-derived identifiers and source metadata.
//! - [`RecursiveChunker`] splits documents into overlapping [`Chunk`]s.
//! - [`VectorStore`] embeds, persists, and searches chunks over one of two
//!   interchangeable backends: a metadata-filterable SQLite database or an
//!   index-only JSON snapshot, with a one-way fallback when the preferred
//!   backend cannot open.
//! - [`RetrievalTool`] and [`ManagementTool`] are string-in/string-out
//!   facades for the agent loop; [`RagSearchTool`] and [`RagManageTool`]
//!   expose them through the typed [`Tool`] boundary.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use agent_rag::{
//!     HashingEmbeddingProvider, ManagementTool, RagConfig, RetrievalTool, RetrieveRequest,
//!     VectorStore,
//! };
//!
//! let config = RagConfig::builder()
//!     .persist_directory("./data/vector_store")
//!     .collection_name("agent_docs")
//!     .build()?;
//! let store = VectorStore::open(config, Arc::new(HashingEmbeddingProvider::new())).await?;
//!
//! let rag = Arc::new(RetrievalTool::new(Arc::new(store)));
//! rag.add_text("RAG combines retrieval with generation.", None).await;
//! let report = rag.retrieve(&RetrieveRequest::new("what is RAG?")).await;
//! ```
//!
//! # Features
//!
//! - `remote` — OpenAI-compatible HTTP embedding provider (`reqwest`)
//! - `pdf` — PDF ingestion support (`pdf-extract`)

pub mod backend;
pub mod chunking;
pub mod config;
pub mod document;
pub mod embedding;
pub mod error;
pub mod flat;
pub mod manage;
pub mod processor;
#[cfg(feature = "remote")]
pub mod remote;
pub mod retrieval;
pub mod sqlite;
pub mod store;
pub mod tool;

pub use backend::{BackendKind, VectorBackend};
pub use chunking::{Chunker, RecursiveChunker};
pub use config::{RagConfig, RagConfigBuilder};
pub use document::{Chunk, CollectionInfo, Document, SearchResult};
pub use embedding::{EmbeddingProvider, HashingEmbeddingProvider};
pub use error::{RagError, Result};
pub use flat::FlatBackend;
pub use manage::{ManageRequest, ManagementTool};
pub use processor::DocumentProcessor;
#[cfg(feature = "remote")]
pub use remote::RemoteEmbeddingProvider;
pub use retrieval::{RetrievalTool, RetrieveRequest};
pub use sqlite::SqliteBackend;
pub use store::VectorStore;
pub use tool::{RagManageTool, RagSearchTool, Tool};
