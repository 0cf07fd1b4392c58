//! Error types for the `agent-rag` crate.

use thiserror::Error;

/// Errors that can occur in RAG operations.
#[derive(Debug, Error)]
pub enum RagError {
    /// An error occurred during embedding generation.
    #[error("Embedding error ({provider}): {message}")]
    EmbeddingError {
        /// The embedding provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// An error occurred in a vector storage backend.
    #[error("Vector store error ({backend}): {message}")]
    VectorStoreError {
        /// The backend that produced the error.
        backend: String,
        /// A description of the failure.
        message: String,
    },

    /// A backend's persisted state is incompatible with the current schema.
    ///
    /// Distinguished from [`RagError::VectorStoreError`] so the fallback
    /// policy can reset the persisted directory and retry.
    #[error("Schema mismatch ({backend}): {message}")]
    SchemaMismatch {
        /// The backend whose persisted state is incompatible.
        backend: String,
        /// A description of the mismatch.
        message: String,
    },

    /// Neither the preferred nor the fallback backend could be opened.
    #[error("Vector store initialization failed: {0}")]
    InitializationError(String),

    /// An error occurred while loading or validating a document.
    #[error("Document error: {0}")]
    DocumentError(String),

    /// A configuration validation error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Malformed arguments passed to an agent-facing tool.
    #[error("Tool error: {0}")]
    ToolError(String),

    /// An underlying I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An underlying SQLite failure.
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// A serialization or deserialization failure.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// A convenience result type for RAG operations.
pub type Result<T> = std::result::Result<T, RagError>;
