//! Knowledge base management facade.
//!
//! [`ManagementTool`] dispatches on an action discriminator to the
//! [`RetrievalTool`]'s ingestion and administrative operations. Like the
//! retrieval facade it is string-out only: unknown actions and missing
//! parameters come back as descriptive error strings, never as errors.
//!
//! Two parallel entry points exist: the structured [`ManageRequest`] and a
//! legacy `"action:params|key:value|..."` string grammar with
//! action-specific sub-parsers for directories and text.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::retrieval::RetrievalTool;

const UNKNOWN_ACTION: &str =
    "Available actions: add_file, add_files, add_directory, add_text, info, clear";

/// A structured management request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ManageRequest {
    /// One of `add_file`, `add_files`, `add_directory`, `add_text`, `info`,
    /// `clear`.
    pub action: String,
    /// File or directory path for the add operations. `add_files` takes a
    /// comma-separated list.
    #[serde(default)]
    pub path: Option<String>,
    /// Text content for `add_text`.
    #[serde(default)]
    pub content: Option<String>,
    /// Title metadata for text documents.
    #[serde(default)]
    pub title: Option<String>,
    /// Search directories recursively.
    #[serde(default = "default_true")]
    pub recursive: bool,
    /// Glob patterns to include for `add_directory`.
    #[serde(default)]
    pub patterns: Option<Vec<String>>,
}

fn default_true() -> bool {
    true
}

impl ManageRequest {
    /// A request for `action` with every parameter unset.
    pub fn new(action: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            path: None,
            content: None,
            title: None,
            recursive: true,
            patterns: None,
        }
    }
}

/// Command-dispatch facade over the retrieval tool's ingestion and
/// administrative operations.
pub struct ManagementTool {
    rag: Arc<RetrievalTool>,
}

impl ManagementTool {
    /// Create a management tool over a retrieval tool.
    pub fn new(rag: Arc<RetrievalTool>) -> Self {
        Self { rag }
    }

    /// Dispatch a structured request.
    pub async fn dispatch(&self, request: &ManageRequest) -> String {
        let action = request.action.trim().to_lowercase();
        match action.as_str() {
            "info" => self.rag.collection_info().await,
            "clear" => self.rag.clear_knowledge_base().await,
            "add_file" => match non_empty(&request.path) {
                Some(path) => self.rag.add_from_files(&[path.to_string()]).await,
                None => "Error: path parameter required for add_file action".to_string(),
            },
            "add_files" => match non_empty(&request.path) {
                Some(paths) => self.rag.add_from_files(&split_csv(paths)).await,
                None => "Error: path parameter required for add_files action".to_string(),
            },
            "add_directory" => match non_empty(&request.path) {
                Some(path) => {
                    self.rag
                        .add_from_directory(path, request.recursive, request.patterns.as_deref())
                        .await
                }
                None => "Error: path parameter required for add_directory action".to_string(),
            },
            "add_text" => match non_empty(&request.content) {
                Some(content) => {
                    let metadata = request
                        .title
                        .as_ref()
                        .map(|title| HashMap::from([("title".to_string(), title.clone())]));
                    self.rag.add_text(content, metadata.as_ref()).await
                }
                None => "Error: content parameter required for add_text action".to_string(),
            },
            other => format!("Unknown action: {other}. {UNKNOWN_ACTION}"),
        }
    }

    /// Dispatch a legacy `"action:params"` input string.
    ///
    /// Bare `info` and `clear` need no parameters. Other actions take
    /// `action:params`, with pipe-delimited `key:value` options after the
    /// first segment for `add_directory` (`recursive`, `patterns`) and
    /// `add_text` (`title`).
    pub async fn dispatch_str(&self, input: &str) -> String {
        let Some((action, params)) = input.split_once(':') else {
            return match input.trim().to_lowercase().as_str() {
                "info" => self.rag.collection_info().await,
                "clear" => self.rag.clear_knowledge_base().await,
                _ => "Invalid action. Use 'info' or 'clear', or specify action:parameters format."
                    .to_string(),
            };
        };

        match action.trim().to_lowercase().as_str() {
            "add_file" => self.rag.add_from_files(&[params.trim().to_string()]).await,
            "add_files" => self.rag.add_from_files(&split_csv(params)).await,
            "add_directory" => {
                let (directory, recursive, patterns) = parse_directory_params(params);
                self.rag.add_from_directory(&directory, recursive, patterns.as_deref()).await
            }
            "add_text" => {
                let (text, title) = parse_text_params(params);
                let metadata =
                    title.map(|title| HashMap::from([("title".to_string(), title)]));
                self.rag.add_text(&text, metadata.as_ref()).await
            }
            other => format!("Unknown action: {other}. {UNKNOWN_ACTION}"),
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

fn split_csv(paths: &str) -> Vec<String> {
    paths.split(',').map(|p| p.trim().to_string()).collect()
}

/// Parse `directory|recursive:bool|patterns:csv`. The first segment is the
/// directory; unknown labels are ignored.
fn parse_directory_params(params: &str) -> (String, bool, Option<Vec<String>>) {
    let mut segments = params.split('|');
    let directory = segments.next().unwrap_or_default().trim().to_string();
    let mut recursive = true;
    let mut patterns = None;

    for segment in segments {
        if let Some((key, value)) = segment.split_once(':') {
            match key.trim() {
                "recursive" => recursive = value.trim().eq_ignore_ascii_case("true"),
                "patterns" => patterns = Some(split_csv(value)),
                _ => {}
            }
        }
    }

    (directory, recursive, patterns)
}

/// Parse `text|title:value`. The first segment is the text content.
fn parse_text_params(params: &str) -> (String, Option<String>) {
    let mut segments = params.split('|');
    let text = segments.next().unwrap_or_default().trim().to_string();
    let mut title = None;

    for segment in segments {
        if let Some((key, value)) = segment.split_once(':') {
            if key.trim() == "title" {
                title = Some(value.trim().to_string());
            }
        }
    }

    (text, title)
}
