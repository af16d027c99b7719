//! Library Integration Tests
//!
//! Tests for the session catalog, file layout and the restart behaviour
//! (catalog resets, files stay searchable).

use larkwiki::domain::ObjType;
use larkwiki::{normalize, sanitize_file_name, search, DocumentRecord, DocumentStore};
use serde_json::json;
use tempfile::TempDir;

fn record(token: &str, name: &str) -> DocumentRecord {
    DocumentRecord::new(token, name, ObjType::Docx, "sp1", "Eng Handbook")
}

#[test]
fn test_sanitize_file_name() {
    assert_eq!(sanitize_file_name("a/b:c*d"), "a_b_c_d");
}

#[tokio::test]
async fn test_persist_writes_file_and_catalogs() {
    let temp = TempDir::new().unwrap();
    let mut store = DocumentStore::new(temp.path());

    let markdown = normalize(
        &json!({"blocks": [{"type": "paragraph", "text": "A"}, {"type": "heading", "level": 2, "text": "B"}]})
            .to_string(),
    );
    let saved = store.persist(record("wik1", "On-call: guide"), &markdown).await.unwrap();

    let expected = temp.path().join("Eng_Handbook").join("On-call__guide.md");
    assert_eq!(saved.id, 1);
    assert_eq!(saved.path.as_deref(), Some(expected.as_path()));
    assert_eq!(saved.content.as_deref(), Some("A\n\n## B\n\n"));
    assert_eq!(std::fs::read_to_string(&expected).unwrap(), "A\n\n## B\n\n");
}

#[tokio::test]
async fn test_same_sanitized_name_last_write_wins() {
    let temp = TempDir::new().unwrap();
    let mut store = DocumentStore::new(temp.path());

    let first = store.persist(record("wik1", "a/b"), "first").await.unwrap();
    let second = store.persist(record("wik2", "a:b"), "second").await.unwrap();

    assert_eq!(first.path, second.path);
    assert_eq!(store.len(), 2);
    assert_eq!(
        std::fs::read_to_string(second.path.unwrap()).unwrap(),
        "second"
    );
}

#[tokio::test]
async fn test_files_survive_catalog_reset() {
    let temp = TempDir::new().unwrap();

    {
        let mut store = DocumentStore::new(temp.path());
        store
            .persist(record("wik1", "Incident review"), "Root cause: expired certificate")
            .await
            .unwrap();
    }

    // A new session starts with an empty catalog
    let mut store = DocumentStore::new(temp.path());
    assert!(store.is_empty());
    assert!(store.get_by_token("wik1").is_none());
    assert_eq!(store.save_document(record("wik9", "Fresh")).id, 1);

    let results = search("certificate", temp.path()).await.unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(
        results[0].matches[0].line_text,
        "Root cause: expired certificate"
    );
}
