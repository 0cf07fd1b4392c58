//! Metadata-filterable vector backend over an embedded SQLite database.
//!
//! Chunks are rows in a `chunks` table with their metadata stored as a JSON
//! column and their embedding as a little-endian `f32` blob. Metadata
//! filters are pushed down with `json_extract` predicates; similarity is
//! computed in-process over the filtered candidate rows.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use rusqlite::{Connection, OptionalExtension, params, params_from_iter};
use tokio::sync::Mutex;
use tracing::debug;

use crate::backend::{BackendKind, VectorBackend, cosine_similarity};
use crate::document::{Chunk, SearchResult};
use crate::error::{RagError, Result};

/// Bumped whenever the table layout changes; a persisted database recording
/// a different version is treated as a schema mismatch.
const SCHEMA_VERSION: i64 = 1;

const CREATE_TABLES: &str = r#"
CREATE TABLE IF NOT EXISTS chunks (
    id            TEXT PRIMARY KEY,
    parent_doc_id TEXT NOT NULL,
    content       TEXT NOT NULL,
    metadata      TEXT NOT NULL,
    embedding     BLOB NOT NULL,
    dimensions    INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS meta (
    key   TEXT PRIMARY KEY,
    value TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_chunks_parent ON chunks(parent_doc_id);
"#;

/// The metadata-filterable [`VectorBackend`] over SQLite.
///
/// One database file per collection lives at
/// `<persist>/sqlite/<collection>.db`.
pub struct SqliteBackend {
    conn: Mutex<Connection>,
    db_path: PathBuf,
}

impl SqliteBackend {
    /// Open (or create) the collection database under `persist_root`.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::SchemaMismatch`] when the persisted file is not a
    /// database or records an incompatible schema version, and
    /// [`RagError::VectorStoreError`] for any other failure. The store's
    /// fallback policy keys off this distinction.
    pub async fn open(persist_root: &Path, collection: &str) -> Result<Self> {
        let dir = persist_root.join(BackendKind::Sqlite.subdir());
        tokio::fs::create_dir_all(&dir).await.map_err(|e| RagError::VectorStoreError {
            backend: "sqlite".to_string(),
            message: format!("cannot create persist directory: {e}"),
        })?;

        let db_path = dir.join(format!("{collection}.db"));
        let conn = Connection::open(&db_path).map_err(classify)?;

        conn.execute_batch(CREATE_TABLES).map_err(classify)?;

        let recorded: Option<String> = conn
            .query_row("SELECT value FROM meta WHERE key = 'schema_version'", [], |row| {
                row.get(0)
            })
            .optional()
            .map_err(classify)?;

        match recorded {
            None => {
                conn.execute(
                    "INSERT OR REPLACE INTO meta (key, value) VALUES ('schema_version', ?1)",
                    params![SCHEMA_VERSION.to_string()],
                )
                .map_err(classify)?;
            }
            Some(version) if version.parse::<i64>() != Ok(SCHEMA_VERSION) => {
                return Err(RagError::SchemaMismatch {
                    backend: "sqlite".to_string(),
                    message: format!(
                        "persisted schema version {version}, expected {SCHEMA_VERSION}"
                    ),
                });
            }
            Some(_) => {}
        }

        debug!(path = %db_path.display(), "opened sqlite collection");
        Ok(Self { conn: Mutex::new(conn), db_path })
    }

    /// Path of the collection's database file.
    pub fn db_path(&self) -> &Path {
        &self.db_path
    }
}

#[async_trait]
impl VectorBackend for SqliteBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Sqlite
    }

    fn supports_filter(&self) -> bool {
        true
    }

    fn supports_delete(&self) -> bool {
        true
    }

    async fn upsert(&self, chunks: &[Chunk]) -> Result<()> {
        if chunks.is_empty() {
            return Ok(());
        }

        let mut conn = self.conn.lock().await;
        let tx = conn.transaction()?;
        for chunk in chunks {
            let metadata_json = serde_json::to_string(&chunk.metadata)?;
            tx.execute(
                "INSERT OR REPLACE INTO chunks
                 (id, parent_doc_id, content, metadata, embedding, dimensions)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    chunk.id,
                    chunk.parent_doc_id,
                    chunk.content,
                    metadata_json,
                    embedding_to_blob(&chunk.embedding),
                    chunk.embedding.len() as i64,
                ],
            )?;
        }
        tx.commit()?;

        debug!(count = chunks.len(), "upserted chunks into sqlite");
        Ok(())
    }

    async fn delete(&self, ids: &[String]) -> Result<()> {
        if ids.is_empty() {
            return Ok(());
        }

        let mut conn = self.conn.lock().await;
        let tx = conn.transaction()?;
        for id in ids {
            tx.execute("DELETE FROM chunks WHERE id = ?1", params![id])?;
        }
        tx.commit()?;

        debug!(count = ids.len(), "deleted chunks from sqlite");
        Ok(())
    }

    async fn search(
        &self,
        embedding: &[f32],
        top_k: usize,
        filter: Option<&HashMap<String, String>>,
    ) -> Result<Vec<SearchResult>> {
        let mut sql =
            String::from("SELECT id, parent_doc_id, content, metadata, embedding FROM chunks");
        let mut bound: Vec<String> = Vec::new();

        if let Some(filter) = filter.filter(|f| !f.is_empty()) {
            let mut clauses = Vec::with_capacity(filter.len());
            for (key, value) in filter {
                clauses.push("json_extract(metadata, ?) = ?");
                bound.push(format!("$.\"{key}\""));
                bound.push(value.clone());
            }
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }

        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(bound.iter()), |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, Vec<u8>>(4)?,
            ))
        })?;

        let mut scored = Vec::new();
        for row in rows {
            let (id, parent_doc_id, content, metadata_json, blob) = row?;
            let metadata: HashMap<String, String> = serde_json::from_str(&metadata_json)?;
            let stored = blob_to_embedding(&blob);
            let score = cosine_similarity(embedding, &stored);
            scored.push(SearchResult {
                chunk: Chunk { id, content, embedding: stored, metadata, parent_doc_id },
                score,
            });
        }

        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(top_k);
        Ok(scored)
    }

    async fn count(&self) -> Result<usize> {
        let conn = self.conn.lock().await;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM chunks", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    async fn clear(&self) -> Result<()> {
        let conn = self.conn.lock().await;
        conn.execute("DELETE FROM chunks", [])?;
        debug!("cleared sqlite collection");
        Ok(())
    }
}

/// Map a SQLite failure onto the crate error taxonomy, recognizing the
/// corrupt/incompatible persisted-state conditions the fallback policy
/// resets on.
fn classify(e: rusqlite::Error) -> RagError {
    let message = e.to_string();
    let lowered = message.to_lowercase();
    if lowered.contains("not a database")
        || lowered.contains("malformed")
        || lowered.contains("no such column")
        || lowered.contains("no such table")
    {
        RagError::SchemaMismatch { backend: "sqlite".to_string(), message }
    } else {
        RagError::VectorStoreError { backend: "sqlite".to_string(), message }
    }
}

fn embedding_to_blob(embedding: &[f32]) -> Vec<u8> {
    embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
}

fn blob_to_embedding(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}
