//! Tests for the management facade: structured dispatch, the legacy
//! `action:params` grammar, and required-parameter errors.

use std::path::Path;
use std::sync::Arc;

use agent_rag::{
    BackendKind, HashingEmbeddingProvider, ManageRequest, ManagementTool, RagConfig,
    RetrievalTool, VectorStore,
};
use tempfile::TempDir;

async fn management_tool(dir: &Path) -> ManagementTool {
    let config = RagConfig::builder()
        .backend(BackendKind::Sqlite)
        .persist_directory(dir)
        .collection_name("test_docs")
        .build()
        .unwrap();
    let store =
        VectorStore::open(config, Arc::new(HashingEmbeddingProvider::new())).await.unwrap();
    ManagementTool::new(Arc::new(RetrievalTool::new(Arc::new(store))))
}

#[tokio::test]
async fn unknown_actions_list_the_available_ones() {
    let dir = TempDir::new().unwrap();
    let manager = management_tool(dir.path()).await;

    let message = manager.dispatch(&ManageRequest::new("bogus")).await;
    assert!(message.starts_with("Unknown action: bogus."));
    assert!(message.contains("add_file, add_files, add_directory, add_text, info, clear"));
}

#[tokio::test]
async fn action_matching_is_case_insensitive() {
    let dir = TempDir::new().unwrap();
    let manager = management_tool(dir.path()).await;

    let message = manager.dispatch(&ManageRequest::new("  INFO ")).await;
    assert!(message.starts_with("Vector Store Information:"));
}

#[tokio::test]
async fn add_actions_require_their_parameters() {
    let dir = TempDir::new().unwrap();
    let manager = management_tool(dir.path()).await;

    for action in ["add_file", "add_files", "add_directory"] {
        let message = manager.dispatch(&ManageRequest::new(action)).await;
        assert_eq!(message, format!("Error: path parameter required for {action} action"));
    }

    let mut request = ManageRequest::new("add_text");
    request.content = Some("   ".to_string());
    let message = manager.dispatch(&request).await;
    assert_eq!(message, "Error: content parameter required for add_text action");
    assert!(manager.dispatch(&ManageRequest::new("info")).await.contains("- Document Count: 0"));
}

#[tokio::test]
async fn add_text_applies_the_title() {
    let dir = TempDir::new().unwrap();
    let manager = management_tool(dir.path()).await;

    let mut request = ManageRequest::new("add_text");
    request.content = Some("a brief note about sextants".to_string());
    request.title = Some("Navigation".to_string());

    let message = manager.dispatch(&request).await;
    assert!(message.starts_with("Successfully added text document"));
    assert!(manager.dispatch(&ManageRequest::new("info")).await.contains("- Document Count: 1"));
}

#[tokio::test]
async fn add_directory_honors_recursion_and_patterns() {
    let dir = TempDir::new().unwrap();
    let manager = management_tool(dir.path()).await;

    let docs = TempDir::new().unwrap();
    std::fs::write(docs.path().join("top.txt"), "top level content").unwrap();
    std::fs::write(docs.path().join("readme.md"), "markdown content").unwrap();
    let sub = docs.path().join("sub");
    std::fs::create_dir(&sub).unwrap();
    std::fs::write(sub.join("nested.txt"), "nested content").unwrap();

    let mut request = ManageRequest::new("add_directory");
    request.path = Some(docs.path().display().to_string());
    request.recursive = false;
    request.patterns = Some(vec!["*.txt".to_string()]);

    let message = manager.dispatch(&request).await;
    assert!(message.starts_with("Successfully added 1 documents from directory"));
}

#[tokio::test]
async fn string_grammar_handles_bare_and_invalid_actions() {
    let dir = TempDir::new().unwrap();
    let manager = management_tool(dir.path()).await;

    assert!(manager.dispatch_str("info").await.starts_with("Vector Store Information:"));
    assert_eq!(
        manager.dispatch_str("clear").await,
        "Successfully cleared all documents from knowledge base."
    );
    assert_eq!(
        manager.dispatch_str("garbage").await,
        "Invalid action. Use 'info' or 'clear', or specify action:parameters format."
    );
    let message = manager.dispatch_str("bogus:param").await;
    assert!(message.starts_with("Unknown action: bogus."));
}

#[tokio::test]
async fn string_grammar_parses_text_and_title() {
    let dir = TempDir::new().unwrap();
    let manager = management_tool(dir.path()).await;

    let message = manager.dispatch_str("add_text:notes on astrolabes|title:Instruments").await;
    assert!(message.starts_with("Successfully added text document"));
    assert!(manager.dispatch_str("info").await.contains("- Document Count: 1"));
}

#[tokio::test]
async fn string_grammar_parses_directory_options() {
    let dir = TempDir::new().unwrap();
    let manager = management_tool(dir.path()).await;

    let docs = TempDir::new().unwrap();
    std::fs::write(docs.path().join("keep.txt"), "kept content").unwrap();
    let sub = docs.path().join("sub");
    std::fs::create_dir(&sub).unwrap();
    std::fs::write(sub.join("deep.txt"), "deep content").unwrap();

    let input =
        format!("add_directory:{}|recursive:false|patterns:*.txt", docs.path().display());
    let message = manager.dispatch_str(&input).await;
    assert!(message.starts_with("Successfully added 1 documents from directory"));
}

#[tokio::test]
async fn string_grammar_handles_comma_separated_files() {
    let dir = TempDir::new().unwrap();
    let manager = management_tool(dir.path()).await;

    let docs = TempDir::new().unwrap();
    let a = docs.path().join("a.txt");
    let b = docs.path().join("b.txt");
    std::fs::write(&a, "first file").unwrap();
    std::fs::write(&b, "second file").unwrap();

    let input = format!("add_files:{}, {}", a.display(), b.display());
    let message = manager.dispatch_str(&input).await;
    assert_eq!(message, "Successfully added 2 documents from 2 files to knowledge base.");
}
