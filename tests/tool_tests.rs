//! Tests for the agent-facing tool wrappers.

use std::path::Path;
use std::sync::Arc;

use agent_rag::{
    BackendKind, HashingEmbeddingProvider, ManagementTool, RagConfig, RagError, RagManageTool,
    RagSearchTool, RetrievalTool, Tool, VectorStore,
};
use serde_json::{Value, json};
use tempfile::TempDir;

async fn tools(dir: &Path) -> (RagSearchTool, RagManageTool) {
    let config = RagConfig::builder()
        .backend(BackendKind::Sqlite)
        .persist_directory(dir)
        .collection_name("test_docs")
        .build()
        .unwrap();
    let store =
        VectorStore::open(config, Arc::new(HashingEmbeddingProvider::new())).await.unwrap();
    let rag = Arc::new(RetrievalTool::new(Arc::new(store)));
    let manager = Arc::new(ManagementTool::new(Arc::clone(&rag)));
    (RagSearchTool::new(rag), RagManageTool::new(manager))
}

fn as_string(value: Value) -> String {
    match value {
        Value::String(s) => s,
        other => panic!("tool returned non-string value: {other}"),
    }
}

#[tokio::test]
async fn tools_expose_names_and_schemas() {
    let dir = TempDir::new().unwrap();
    let (search, manage) = tools(dir.path()).await;

    assert_eq!(search.name(), "rag_retrieval");
    assert_eq!(manage.name(), "rag_management");

    let schema = search.parameters_schema().unwrap();
    assert_eq!(schema["required"], json!(["query"]));
    let schema = manage.parameters_schema().unwrap();
    assert_eq!(schema["required"], json!(["action"]));
}

#[tokio::test]
async fn search_tool_requires_a_query() {
    let dir = TempDir::new().unwrap();
    let (search, _) = tools(dir.path()).await;

    let result = search.execute(json!({ "k": 3 })).await;
    assert!(matches!(result, Err(RagError::ToolError(_))));
}

#[tokio::test]
async fn search_tool_returns_a_rendered_report() {
    let dir = TempDir::new().unwrap();
    let (search, manage) = tools(dir.path()).await;

    let added = manage
        .execute(json!({ "action": "add_text", "content": "facts about albatrosses" }))
        .await
        .unwrap();
    assert!(as_string(added).starts_with("Successfully added text document"));

    let report = search
        .execute(json!({ "query": "albatrosses", "k": 2, "with_scores": true }))
        .await
        .unwrap();
    let report = as_string(report);
    assert!(report.starts_with("Found 1 relevant documents for query: 'albatrosses'"));
    assert!(report.contains("(Score: "));
}

#[tokio::test]
async fn search_tool_passes_metadata_filters_through() {
    let dir = TempDir::new().unwrap();
    let (search, manage) = tools(dir.path()).await;

    manage
        .execute(json!({
            "action": "add_text",
            "content": "puffin colony survey",
            "title": "Survey"
        }))
        .await
        .unwrap();

    let report = search
        .execute(json!({ "query": "puffin", "filter": { "title": "Elsewhere" } }))
        .await
        .unwrap();
    assert_eq!(as_string(report), "No documents found for query: 'puffin'");
}

#[tokio::test]
async fn manage_tool_rejects_malformed_arguments() {
    let dir = TempDir::new().unwrap();
    let (_, manage) = tools(dir.path()).await;

    // Missing the required action discriminator.
    let result = manage.execute(json!({ "path": "/tmp/x" })).await;
    assert!(matches!(result, Err(RagError::ToolError(_))));
}

#[tokio::test]
async fn manage_tool_dispatches_structured_actions() {
    let dir = TempDir::new().unwrap();
    let (_, manage) = tools(dir.path()).await;

    let info = as_string(manage.execute(json!({ "action": "info" })).await.unwrap());
    assert!(info.starts_with("Vector Store Information:"));

    let unknown = as_string(manage.execute(json!({ "action": "rebuild" })).await.unwrap());
    assert!(unknown.starts_with("Unknown action: rebuild."));
}
