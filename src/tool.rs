//! Agent-facing tool wrappers.
//!
//! The [`Tool`] trait is the typed boundary the orchestration loop consumes:
//! a name, a description, a JSON schema for arguments, and an async
//! `execute` taking and returning `serde_json::Value`. [`RagSearchTool`]
//! and [`RagManageTool`] expose the retrieval and management facades
//! through that boundary.
//!
//! Only malformed arguments surface as errors here; operational failures
//! come back inside the tool's string result, per the facade contract.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::info;

use crate::error::{RagError, Result};
use crate::manage::{ManageRequest, ManagementTool};
use crate::retrieval::{RetrievalTool, RetrieveRequest};

/// A callable tool exposed to an agent orchestration loop.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Stable tool name used in tool-call requests.
    fn name(&self) -> &str;

    /// Human-readable description shown to the model.
    fn description(&self) -> &str;

    /// JSON schema for the tool's arguments, if any.
    fn parameters_schema(&self) -> Option<Value>;

    /// Execute the tool with JSON arguments.
    async fn execute(&self, args: Value) -> Result<Value>;
}

/// Semantic search over the knowledge base as an agent tool.
pub struct RagSearchTool {
    rag: Arc<RetrievalTool>,
}

impl RagSearchTool {
    /// Create a search tool over a retrieval facade.
    pub fn new(rag: Arc<RetrievalTool>) -> Self {
        Self { rag }
    }
}

#[async_trait]
impl Tool for RagSearchTool {
    fn name(&self) -> &str {
        "rag_retrieval"
    }

    fn description(&self) -> &str {
        "Retrieve relevant documents from the knowledge base using semantic search"
    }

    fn parameters_schema(&self) -> Option<Value> {
        Some(json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "Search query for the knowledge base"
                },
                "k": {
                    "type": "integer",
                    "description": "Number of documents to retrieve (defaults to the configured top_k)"
                },
                "with_scores": {
                    "type": "boolean",
                    "description": "Include relevance scores in results"
                },
                "filter": {
                    "type": "object",
                    "description": "Metadata filters as exact-match key-value pairs",
                    "additionalProperties": { "type": "string" }
                }
            },
            "required": ["query"]
        }))
    }

    async fn execute(&self, args: Value) -> Result<Value> {
        let query = args
            .get("query")
            .and_then(Value::as_str)
            .ok_or_else(|| RagError::ToolError("missing required 'query' parameter".into()))?;

        let mut request = RetrieveRequest::new(query);
        if let Some(k) = args.get("k").and_then(Value::as_u64) {
            request.k = Some(k as usize);
        }
        if let Some(with_scores) = args.get("with_scores").and_then(Value::as_bool) {
            request.with_scores = with_scores;
        }
        if let Some(filter) = args.get("filter").and_then(Value::as_object) {
            let filter: HashMap<String, String> = filter
                .iter()
                .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
                .collect();
            request.filter = Some(filter);
        }

        info!(query, k = ?request.k, "rag_retrieval tool called");
        Ok(Value::String(self.rag.retrieve(&request).await))
    }
}

/// Knowledge base administration as an agent tool.
pub struct RagManageTool {
    manager: Arc<ManagementTool>,
}

impl RagManageTool {
    /// Create a management tool wrapper.
    pub fn new(manager: Arc<ManagementTool>) -> Self {
        Self { manager }
    }
}

#[async_trait]
impl Tool for RagManageTool {
    fn name(&self) -> &str {
        "rag_management"
    }

    fn description(&self) -> &str {
        "Manage the RAG knowledge base - add documents, clear collection, get info"
    }

    fn parameters_schema(&self) -> Option<Value> {
        Some(json!({
            "type": "object",
            "properties": {
                "action": {
                    "type": "string",
                    "description": "Action to perform: add_file, add_files, add_directory, add_text, info, clear"
                },
                "path": {
                    "type": "string",
                    "description": "File or directory path for add operations"
                },
                "content": {
                    "type": "string",
                    "description": "Text content for add_text action"
                },
                "title": {
                    "type": "string",
                    "description": "Title for text documents"
                },
                "recursive": {
                    "type": "boolean",
                    "description": "Search recursively in directories (default true)"
                },
                "patterns": {
                    "type": "array",
                    "items": { "type": "string" },
                    "description": "File patterns to include (e.g. ['*.py', '*.md'])"
                }
            },
            "required": ["action"]
        }))
    }

    async fn execute(&self, args: Value) -> Result<Value> {
        let request: ManageRequest = serde_json::from_value(args)
            .map_err(|e| RagError::ToolError(format!("invalid arguments: {e}")))?;

        info!(action = %request.action, "rag_management tool called");
        Ok(Value::String(self.manager.dispatch(&request).await))
    }
}
