//! Retrieval facade: semantic search plus knowledge base ingestion.
//!
//! [`RetrievalTool`] is a string-in/string-out facade over the
//! [`VectorStore`] and [`DocumentProcessor`]. Every operation renders a
//! human-readable report or a sentence beginning with `Error:` — failures
//! are never raised past this boundary.
//!
//! Two input grammars feed the same retrieval operation: the structured
//! [`RetrieveRequest`] and a legacy pipe-delimited string
//! (`"query|k:3|with_scores:true|filter:a=1,b=2"`). Both converge on
//! [`RetrievalTool::retrieve`].

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::error;

use crate::document::{META_CHUNK_INDEX, META_SOURCE, META_TOTAL_CHUNKS, SearchResult};
use crate::processor::DocumentProcessor;
use crate::store::VectorStore;

/// Characters of chunk content shown per result before truncation.
const PREVIEW_CHARS: usize = 300;

/// A structured retrieval request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RetrieveRequest {
    /// The search query.
    pub query: String,
    /// Number of results to return. When unset, the store's configured
    /// `top_k` applies.
    #[serde(default)]
    pub k: Option<usize>,
    /// Include relevance scores in the rendered results.
    #[serde(default)]
    pub with_scores: bool,
    /// Exact-match metadata constraints, AND-combined.
    #[serde(default)]
    pub filter: Option<HashMap<String, String>>,
}

impl RetrieveRequest {
    /// A request for `query` with default parameters.
    pub fn new(query: impl Into<String>) -> Self {
        Self { query: query.into(), k: None, with_scores: false, filter: None }
    }
}

/// Semantic search and ingestion over one knowledge base.
pub struct RetrievalTool {
    store: Arc<VectorStore>,
    processor: DocumentProcessor,
}

impl RetrievalTool {
    /// Create a retrieval tool over an opened store.
    pub fn new(store: Arc<VectorStore>) -> Self {
        Self { store, processor: DocumentProcessor::new() }
    }

    /// The underlying store.
    pub fn store(&self) -> &Arc<VectorStore> {
        &self.store
    }

    /// Retrieve documents for a structured request and render them.
    ///
    /// Zero results render a single "No documents found" line, never an
    /// empty string.
    pub async fn retrieve(&self, request: &RetrieveRequest) -> String {
        let k = request.k.unwrap_or(self.store.config().top_k);
        let results = self
            .store
            .similarity_search_with_score(&request.query, k, request.filter.as_ref())
            .await;
        format_results(&results, &request.query, request.with_scores)
    }

    /// Retrieve documents for a legacy pipe-delimited input string.
    ///
    /// The first unlabeled segment is the query; labeled segments
    /// (`key:value`, split on the first colon only) override `k`,
    /// `with_scores`, and `filter` (`key=value` pairs joined by commas).
    pub async fn retrieve_str(&self, input: &str) -> String {
        match parse_input(input) {
            Ok(request) => self.retrieve(&request).await,
            Err(message) => format!("Error retrieving documents: {message}"),
        }
    }

    /// Ingest files into the knowledge base.
    pub async fn add_from_files(&self, paths: &[String]) -> String {
        let mut documents = Vec::new();
        for path in paths {
            documents.extend(self.processor.process_file(path, None));
        }
        if documents.is_empty() {
            return "No valid documents found in the provided files.".to_string();
        }

        let valid = self.processor.validate_documents(documents);
        let count = valid.len();
        match self.store.add_documents(&valid).await {
            Ok(_) => format!(
                "Successfully added {count} documents from {} files to knowledge base.",
                paths.len()
            ),
            Err(e) => {
                error!(error = %e, "failed to add documents from files");
                format!("Error adding documents from files: {e}")
            }
        }
    }

    /// Ingest all supported files under a directory.
    pub async fn add_from_directory(
        &self,
        path: &str,
        recursive: bool,
        patterns: Option<&[String]>,
    ) -> String {
        let documents = self.processor.process_directory(path, recursive, patterns, None);
        if documents.is_empty() {
            return format!("No valid documents found in directory '{path}'.");
        }

        let valid = self.processor.validate_documents(documents);
        let count = valid.len();
        match self.store.add_documents(&valid).await {
            Ok(_) => format!(
                "Successfully added {count} documents from directory '{path}' to knowledge base."
            ),
            Err(e) => {
                error!(error = %e, "failed to add documents from directory");
                format!("Error adding documents from directory: {e}")
            }
        }
    }

    /// Ingest raw text as a single document.
    pub async fn add_text(
        &self,
        text: &str,
        metadata: Option<&HashMap<String, String>>,
    ) -> String {
        if text.trim().is_empty() {
            return "Error: text content is empty.".to_string();
        }

        let document = self.processor.process_text(text, metadata);
        let doc_id = document.doc_id().unwrap_or("unknown").to_string();
        match self.store.add_documents(std::slice::from_ref(&document)).await {
            Ok(_) => {
                format!("Successfully added text document to knowledge base (ID: {doc_id}).")
            }
            Err(e) => {
                error!(error = %e, "failed to add text document");
                format!("Error adding text document: {e}")
            }
        }
    }

    /// Render the collection's identity and size.
    pub async fn collection_info(&self) -> String {
        let info = self.store.collection_info().await;
        let count = info
            .document_count
            .map(|c| c.to_string())
            .unwrap_or_else(|| "Unknown".to_string());

        [
            "Vector Store Information:".to_string(),
            format!("- Store Type: {}", info.backend),
            format!("- Collection Name: {}", info.collection_name),
            format!("- Persist Directory: {}", info.persist_directory.display()),
            format!("- Embedding Model: {}", info.embedding_model),
            format!("- Document Count: {count}"),
        ]
        .join("\n")
    }

    /// Remove every document from the knowledge base.
    pub async fn clear_knowledge_base(&self) -> String {
        if self.store.clear_collection().await {
            "Successfully cleared all documents from knowledge base.".to_string()
        } else {
            "Failed to clear knowledge base.".to_string()
        }
    }
}

/// Parse the legacy pipe-delimited retrieval grammar.
///
/// Quirk preserved from the original tool: when every segment is labeled,
/// the query falls back to the entire trimmed input.
fn parse_input(input: &str) -> std::result::Result<RetrieveRequest, String> {
    let mut request = RetrieveRequest::new(input.trim());

    if !input.contains('|') {
        return Ok(request);
    }

    let mut query: Option<String> = None;
    for segment in input.split('|') {
        match segment.split_once(':') {
            Some((key, value)) => {
                let value = value.trim();
                match key.trim() {
                    "k" => {
                        let k = value
                            .parse()
                            .map_err(|_| format!("invalid value for k: '{value}'"))?;
                        request.k = Some(k);
                    }
                    "with_scores" => request.with_scores = value.eq_ignore_ascii_case("true"),
                    "filter" => request.filter = Some(parse_filter(value)),
                    _ => {}
                }
            }
            None => {
                if query.is_none() && !segment.trim().is_empty() {
                    query = Some(segment.trim().to_string());
                }
            }
        }
    }

    if let Some(query) = query {
        request.query = query;
    }
    Ok(request)
}

/// Parse `key=value,key2=value2` into a metadata filter. Pairs without an
/// equals sign (including trailing commas) are skipped.
fn parse_filter(filter: &str) -> HashMap<String, String> {
    filter
        .split(',')
        .filter_map(|pair| pair.split_once('='))
        .map(|(key, value)| (key.trim().to_string(), value.trim().to_string()))
        .collect()
}

/// Render scored results as a human-readable report.
fn format_results(results: &[SearchResult], query: &str, with_scores: bool) -> String {
    if results.is_empty() {
        return format!("No documents found for query: '{query}'");
    }

    let mut output = Vec::with_capacity(results.len() * 6 + 1);
    if with_scores {
        output.push(format!(
            "Found {} relevant documents for query: '{query}' (with relevance scores)\n",
            results.len()
        ));
    } else {
        output.push(format!("Found {} relevant documents for query: '{query}'\n", results.len()));
    }

    for (i, result) in results.iter().enumerate() {
        let n = i + 1;
        if with_scores {
            output.push(format!("--- Document {n} (Score: {:.4}) ---", result.score));
        } else {
            output.push(format!("--- Document {n} ---"));
        }

        let metadata = &result.chunk.metadata;
        if let Some(source) = metadata.get(META_SOURCE) {
            output.push(format!("Source: {source}"));
        }
        if let Some(filename) = metadata.get("filename") {
            output.push(format!("File: {filename}"));
        }
        if let Some(index) = metadata.get(META_CHUNK_INDEX) {
            let total = metadata.get(META_TOTAL_CHUNKS).map(String::as_str).unwrap_or("?");
            output.push(format!("Chunk: {index}/{total}"));
        }

        output.push(format!("Content: {}", preview(&result.chunk.content)));
        output.push(String::new());
    }

    output.join("\n")
}

/// Truncate content to the preview budget with an ellipsis marker.
fn preview(content: &str) -> String {
    let content = content.trim();
    if content.chars().count() <= PREVIEW_CHARS {
        return content.to_string();
    }
    let truncated: String = content.chars().take(PREVIEW_CHARS).collect();
    format!("{truncated}...")
}
