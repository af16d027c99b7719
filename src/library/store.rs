//! In-memory catalog of spaces and downloaded documents.
//!
//! The catalog lives for one session only. The Markdown files it writes stay
//! on disk and remain searchable after a restart.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::debug;

use super::sanitize::sanitize_file_name;
use crate::domain::{ObjType, Space};
use crate::error::Result;

/// A cataloged document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentRecord {
    /// Catalog-local id, assigned by [`DocumentStore::save_document`]
    pub id: u64,

    /// Remote node token
    pub token: String,

    pub name: String,

    pub obj_type: ObjType,

    pub space_id: String,

    pub space_name: String,

    /// Normalized Markdown, once downloaded
    pub content: Option<String>,

    /// Where the Markdown was written
    pub path: Option<PathBuf>,

    pub saved_at: DateTime<Utc>,
}

impl DocumentRecord {
    /// Create a record that has not been cataloged yet
    pub fn new(
        token: impl Into<String>,
        name: impl Into<String>,
        obj_type: ObjType,
        space_id: impl Into<String>,
        space_name: impl Into<String>,
    ) -> Self {
        Self {
            id: 0,
            token: token.into(),
            name: name.into(),
            obj_type,
            space_id: space_id.into(),
            space_name: space_name.into(),
            content: None,
            path: None,
            saved_at: Utc::now(),
        }
    }
}

/// Catalog of spaces and documents plus the Markdown writer
#[derive(Debug)]
pub struct DocumentStore {
    /// Root of the Markdown library
    root: PathBuf,

    spaces: BTreeMap<String, Space>,

    documents: BTreeMap<u64, DocumentRecord>,

    /// Remote token -> first id saved with it
    by_token: HashMap<String, u64>,

    next_id: u64,
}

impl DocumentStore {
    /// Create an empty catalog writing under `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            spaces: BTreeMap::new(),
            documents: BTreeMap::new(),
            by_token: HashMap::new(),
            next_id: 1,
        }
    }

    /// Root directory of the Markdown library
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Insert or replace a space
    pub fn save_space(&mut self, id: impl Into<String>, name: impl Into<String>) {
        let space = Space::new(id, name);
        self.spaces.insert(space.id.clone(), space);
    }

    pub fn space(&self, id: &str) -> Option<&Space> {
        self.spaces.get(id)
    }

    pub fn spaces(&self) -> Vec<&Space> {
        self.spaces.values().collect()
    }

    /// Catalog a document under the next id.
    ///
    /// Any id already set on `record` is replaced.
    pub fn save_document(&mut self, mut record: DocumentRecord) -> DocumentRecord {
        record.id = self.next_id;
        self.next_id += 1;

        self.by_token
            .entry(record.token.clone())
            .or_insert(record.id);
        self.documents.insert(record.id, record.clone());

        debug!("Cataloged document {} ({})", record.id, record.name);
        record
    }

    /// Attach downloaded content to a record. Unknown ids are ignored.
    pub fn update_content(&mut self, id: u64, content: impl Into<String>, path: impl Into<PathBuf>) {
        if let Some(record) = self.documents.get_mut(&id) {
            record.content = Some(content.into());
            record.path = Some(path.into());
        }
    }

    pub fn get(&self, id: u64) -> Option<&DocumentRecord> {
        self.documents.get(&id)
    }

    /// Documents whose name contains `query` (case-insensitive)
    pub fn search_by_name(&self, query: &str) -> Vec<&DocumentRecord> {
        let query_lower = query.to_lowercase();

        self.documents
            .values()
            .filter(|doc| doc.name.to_lowercase().contains(&query_lower))
            .collect()
    }

    pub fn get_by_space(&self, space_id: &str) -> Vec<&DocumentRecord> {
        self.documents
            .values()
            .filter(|doc| doc.space_id == space_id)
            .collect()
    }

    /// First document saved with this remote token
    pub fn get_by_token(&self, token: &str) -> Option<&DocumentRecord> {
        self.by_token.get(token).and_then(|id| self.documents.get(id))
    }

    /// All documents in id order
    pub fn documents(&self) -> Vec<&DocumentRecord> {
        self.documents.values().collect()
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Path a document would be written to
    pub fn markdown_path(&self, space_name: &str, title: &str) -> PathBuf {
        self.root
            .join(sanitize_file_name(space_name))
            .join(format!("{}.md", sanitize_file_name(title)))
    }

    /// Write Markdown to `<root>/<space>/<title>.md`, replacing any
    /// existing file
    pub async fn write_markdown(&self, space_name: &str, title: &str, markdown: &str) -> Result<PathBuf> {
        let path = self.markdown_path(space_name, title);

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&path, markdown).await?;

        Ok(path)
    }

    /// Catalog a downloaded document and write it to disk
    pub async fn persist(&mut self, record: DocumentRecord, markdown: &str) -> Result<DocumentRecord> {
        let path = self
            .write_markdown(&record.space_name, &record.name, markdown)
            .await?;

        let saved = self.save_document(record);
        self.update_content(saved.id, markdown, path);

        Ok(self.documents.get(&saved.id).cloned().unwrap_or(saved))
    }
}
