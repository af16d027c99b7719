//! Document downloads: single wiki nodes and whole spaces.

use std::pin::pin;

use futures::stream::{self, StreamExt};
use serde::Serialize;
use tracing::{info, warn};

use super::lark::ApiClient;
use crate::core::normalize::render;
use crate::domain::{DocumentPayload, Node, ObjType};
use crate::error::{LarkError, Result};
use crate::library::{DocumentRecord, DocumentStore};

/// How many documents a batch download fetches at once
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchPolicy {
    pub concurrency: usize,
}

impl Default for BatchPolicy {
    /// Sequential: one document at a time
    fn default() -> Self {
        Self { concurrency: 1 }
    }
}

impl BatchPolicy {
    pub fn new(concurrency: usize) -> Self {
        Self {
            concurrency: concurrency.max(1),
        }
    }
}

/// A downloaded wiki document, normalized to Markdown
#[derive(Debug, Clone, PartialEq)]
pub struct WikiDocument {
    pub node_token: String,
    pub title: String,
    pub obj_type: ObjType,
    pub space_id: String,
    pub content: String,
}

/// Result of a batch download
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub downloaded: usize,
    pub total: usize,
    pub failed: usize,

    /// (node token, error) per failed item
    pub failures: Vec<(String, String)>,
}

impl BatchSummary {
    fn record_failure(&mut self, node_token: &str, err: &LarkError) {
        self.failed += 1;
        self.failures.push((node_token.to_string(), err.to_string()));
    }
}

impl ApiClient {
    /// Resolve a node and fetch its content as Markdown.
    ///
    /// Object types without a content endpoint download as empty content.
    pub async fn download_wiki_document(&self, node_token: &str) -> Result<WikiDocument> {
        let info = self.get_node_info(node_token).await?;

        let payload = match self.get_content_by_type(&info.obj_token, &info.obj_type).await {
            Ok(payload) => payload,
            Err(LarkError::NotSupported(obj_type)) => {
                warn!("Node {} has unsupported type {}, saving empty content", node_token, obj_type);
                DocumentPayload::Text(String::new())
            }
            Err(e) => return Err(e),
        };

        Ok(WikiDocument {
            node_token: node_token.to_string(),
            title: info.title,
            obj_type: info.obj_type,
            space_id: info.space_id,
            content: render(&payload),
        })
    }

    /// Download one node and save it into the library
    pub async fn download_document_to(
        &self,
        node_token: &str,
        store: &mut DocumentStore,
    ) -> Result<DocumentRecord> {
        let doc = self.download_wiki_document(node_token).await?;
        let space_name = self.resolve_space_name(&doc.space_id, store).await;

        let record = DocumentRecord::new(
            &doc.node_token,
            &doc.title,
            doc.obj_type.clone(),
            &doc.space_id,
            space_name,
        );
        let saved = store.persist(record, &doc.content).await?;

        info!("Saved '{}' to {}", saved.name, display_path(&saved));
        Ok(saved)
    }

    /// Download every document of a space into the library.
    ///
    /// Failures of individual documents are counted and never abort the
    /// batch. Listing errors other than missing permissions propagate.
    pub async fn download_space_documents(
        &self,
        space_id: &str,
        store: &mut DocumentStore,
    ) -> Result<BatchSummary> {
        let space_name = self.resolve_space_name(space_id, store).await;
        let nodes: Vec<Node> = self
            .list_all_nodes(space_id)
            .await?
            .into_iter()
            .filter(|node| node.obj_type.is_document())
            .collect();

        let mut summary = BatchSummary {
            total: nodes.len(),
            ..Default::default()
        };
        info!(
            "Downloading {} documents from space '{}' ({} at a time)",
            summary.total, space_name, self.batch.concurrency
        );

        let mut fetches = pin!(stream::iter(nodes.iter())
            .map(|node| async move { (node, self.download_wiki_document(&node.node_token).await) })
            .buffered(self.batch.concurrency.max(1)));

        while let Some((node, fetched)) = fetches.next().await {
            let saved = match fetched {
                Ok(doc) => {
                    let title = if doc.title.is_empty() { &node.title } else { &doc.title };
                    let record = DocumentRecord::new(
                        &node.node_token,
                        title,
                        doc.obj_type.clone(),
                        space_id,
                        &space_name,
                    );
                    store.persist(record, &doc.content).await
                }
                Err(e) => Err(e),
            };

            match saved {
                Ok(record) => {
                    summary.downloaded += 1;
                    info!(
                        "[{}/{}] {}",
                        summary.downloaded + summary.failed,
                        summary.total,
                        record.name
                    );
                }
                Err(e) => {
                    warn!("Failed to download node {}: {}", node.node_token, e);
                    summary.record_failure(&node.node_token, &e);
                }
            }
        }

        info!(
            "Space '{}': {} downloaded, {} failed, {} total",
            space_name, summary.downloaded, summary.failed, summary.total
        );
        Ok(summary)
    }

    /// Name of a space for its directory, cached in the store.
    ///
    /// Falls back to the space id when the space cannot be fetched.
    async fn resolve_space_name(&self, space_id: &str, store: &mut DocumentStore) -> String {
        if let Some(space) = store.space(space_id).filter(|s| !s.name.is_empty()) {
            return space.name.clone();
        }

        let name = match self.get_space(space_id).await {
            Ok(space) if !space.name.is_empty() => space.name,
            Ok(_) => space_id.to_string(),
            Err(e) => {
                warn!("Could not fetch space {}: {}", space_id, e);
                space_id.to_string()
            }
        };

        store.save_space(space_id, name.clone());
        name
    }
}

fn display_path(record: &DocumentRecord) -> String {
    record
        .path
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_default()
}
