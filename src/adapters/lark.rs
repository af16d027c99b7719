//! Typed client for the Feishu/Lark open platform API.
//!
//! Every response is an envelope `{"code", "msg", "data"}`; `code == 0`
//! means success. Listing and content calls degrade to empty results when
//! the app lacks permission, so one inaccessible object never aborts a batch.

use std::collections::{HashSet, VecDeque};
use std::time::Duration;

use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use super::download::BatchPolicy;
use super::token::{Credentials, TokenManager};
use crate::config::ResolvedConfig;
use crate::domain::{
    DocumentMeta, DocumentPayload, Node, NodeInfo, ObjType, Page, RawContent, SearchItem, Sheet,
    Space,
};
use crate::error::{LarkError, Result};

/// Public Feishu endpoint
pub const DEFAULT_BASE_URL: &str = "https://open.feishu.cn";

/// Default page size for listings
pub const DEFAULT_PAGE_SIZE: u32 = 50;

/// Upper bound on pages fetched by one listing, whatever the server says
pub const MAX_PAGES: usize = 1000;

#[derive(Debug, Deserialize)]
struct Envelope {
    code: i64,
    #[serde(default)]
    msg: String,
    #[serde(default)]
    data: Value,
}

#[derive(Deserialize)]
struct SpaceData {
    space: Space,
}

#[derive(Deserialize)]
struct NodeData {
    node: Node,
}

#[derive(Deserialize)]
struct DocumentData {
    document: DocumentMeta,
}

#[derive(Deserialize)]
struct SheetList {
    #[serde(default)]
    sheets: Vec<SheetInfo>,
}

#[derive(Deserialize)]
struct SheetInfo {
    sheet_id: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    resource_type: Option<String>,
}

#[derive(Deserialize)]
struct ValuesData {
    #[serde(rename = "valueRange")]
    value_range: ValueRange,
}

#[derive(Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Option<Vec<Vec<Value>>>,
}

/// Feishu/Lark API client
pub struct ApiClient {
    base_url: String,
    http: reqwest::Client,
    tokens: TokenManager,
    pub(crate) page_size: u32,
    pub(crate) batch: BatchPolicy,
}

impl ApiClient {
    /// Create a client for `base_url` with default settings
    pub fn new(credentials: Credentials, base_url: impl Into<String>) -> Result<Self> {
        Self::with_timeout(credentials, base_url, Duration::from_secs(30))
    }

    /// Create a client whose requests time out after `timeout`
    pub fn with_timeout(
        credentials: Credentials,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        let tokens = TokenManager::new(credentials, base_url.clone(), http.clone());

        Ok(Self {
            base_url,
            http,
            tokens,
            page_size: DEFAULT_PAGE_SIZE,
            batch: BatchPolicy::default(),
        })
    }

    /// Create from resolved configuration
    pub fn from_config(config: &ResolvedConfig) -> Result<Self> {
        let client = Self::with_timeout(
            config.credentials()?,
            config.base_url.clone(),
            Duration::from_secs(config.timeout_seconds),
        )?;
        Ok(client
            .with_page_size(config.page_size)
            .with_batch_policy(BatchPolicy::new(config.download_concurrency)))
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn with_batch_policy(mut self, batch: BatchPolicy) -> Self {
        self.batch = batch;
        self
    }

    pub fn tokens(&self) -> &TokenManager {
        &self.tokens
    }

    /// Issue an authenticated call and decode the envelope's `data`
    pub async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
        query: &[(&str, String)],
    ) -> Result<T> {
        let data = self.request_value(method, path, body, query).await?;
        Ok(serde_json::from_value(data)?)
    }

    async fn request_value(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
        query: &[(&str, String)],
    ) -> Result<Value> {
        let token = self.tokens.get_token().await?;
        let url = format!("{}{}", self.base_url, path);
        debug!("{} {}", method, path);

        let mut request = self.http.request(method, &url).bearer_auth(token);
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        let envelope: Envelope = match serde_json::from_str(&text) {
            Ok(envelope) => envelope,
            Err(_) if !status.is_success() => {
                return Err(LarkError::Api {
                    code: i64::from(status.as_u16()),
                    msg: truncate(&text, 200),
                })
            }
            Err(e) => return Err(e.into()),
        };

        if envelope.code != 0 {
            let err = LarkError::Api {
                code: envelope.code,
                msg: envelope.msg,
            };
            if err.is_invalid_token() {
                self.tokens.invalidate().await;
            }
            return Err(err);
        }

        Ok(envelope.data)
    }

    /// List knowledge spaces visible to the app
    pub async fn get_spaces(&self, page_size: u32, page_token: Option<&str>) -> Result<Page<Space>> {
        let query = page_query(page_size, page_token);
        let result = self
            .request(Method::GET, "/open-apis/wiki/v2/spaces", None, &query)
            .await;
        degrade(result, Page::empty, "space listing")
    }

    /// Fetch a single space
    pub async fn get_space(&self, space_id: &str) -> Result<Space> {
        let path = format!("/open-apis/wiki/v2/spaces/{}", space_id);
        let data: SpaceData = self.request(Method::GET, &path, None, &[]).await?;
        Ok(data.space)
    }

    /// List the nodes of a space, below `parent_token` or at the top level
    pub async fn get_nodes(
        &self,
        space_id: &str,
        parent_token: Option<&str>,
        page_size: u32,
        page_token: Option<&str>,
    ) -> Result<Page<Node>> {
        let path = format!("/open-apis/wiki/v2/spaces/{}/nodes", space_id);
        let mut query = page_query(page_size, page_token);
        if let Some(parent) = parent_token {
            query.push(("parent_node_token", parent.to_string()));
        }

        let result = self.request(Method::GET, &path, None, &query).await;
        degrade(result, Page::empty, "node listing")
    }

    /// Resolve a wiki node to the object it points at.
    ///
    /// Errors propagate; a download cannot proceed without the node.
    pub async fn get_node_info(&self, node_token: &str) -> Result<NodeInfo> {
        let query = [("token", node_token.to_string())];
        let result: Result<NodeData> = self
            .request(Method::GET, "/open-apis/wiki/v2/spaces/get_node", None, &query)
            .await;

        match result {
            Ok(data) => Ok(data.node.into()),
            Err(e) if e.is_permission_denied() => Err(LarkError::PermissionDenied {
                token: node_token.to_string(),
                msg: e.to_string(),
            }),
            Err(e) => Err(e),
        }
    }

    pub async fn get_document_meta(&self, document_id: &str) -> Result<DocumentMeta> {
        let path = format!("/open-apis/docx/v1/documents/{}", document_id);
        let data: DocumentData = self.request(Method::GET, &path, None, &[]).await?;
        Ok(data.document)
    }

    /// Plain-text content of a docx document
    pub async fn get_document_content(&self, document_id: &str) -> Result<RawContent> {
        let path = format!("/open-apis/docx/v1/documents/{}/raw_content", document_id);
        let result = self.request(Method::GET, &path, None, &[]).await;
        degrade(result, RawContent::default, "document content")
    }

    /// Plain-text content of a legacy doc
    pub async fn get_legacy_doc_content(&self, doc_token: &str) -> Result<RawContent> {
        let path = format!("/open-apis/doc/v2/{}/raw_content", doc_token);
        let result = self.request(Method::GET, &path, None, &[]).await;
        degrade(result, RawContent::default, "legacy doc content")
    }

    /// All grid sheets of a spreadsheet with their cell values
    pub async fn get_sheet_content(&self, spreadsheet_token: &str) -> Result<Vec<Sheet>> {
        let result = self.fetch_sheets(spreadsheet_token).await;
        degrade(result, Vec::new, "spreadsheet content")
    }

    async fn fetch_sheets(&self, spreadsheet_token: &str) -> Result<Vec<Sheet>> {
        let path = format!(
            "/open-apis/sheets/v3/spreadsheets/{}/sheets/query",
            spreadsheet_token
        );
        let list: SheetList = self.request(Method::GET, &path, None, &[]).await?;

        let mut sheets = Vec::new();
        for info in list.sheets {
            if info.resource_type.as_deref().is_some_and(|t| t != "sheet") {
                continue;
            }

            let path = format!(
                "/open-apis/sheets/v2/spreadsheets/{}/values/{}",
                spreadsheet_token, info.sheet_id
            );
            let query = [("valueRenderOption", "ToString".to_string())];
            let data: ValuesData = self.request(Method::GET, &path, None, &query).await?;

            let name = if info.title.is_empty() {
                "Sheet".to_string()
            } else {
                info.title
            };
            sheets.push(Sheet::new(name, data.value_range.values.unwrap_or_default()));
        }

        Ok(sheets)
    }

    /// Fetch an object's content according to its type.
    ///
    /// Types without a content endpoint fail with [`LarkError::NotSupported`].
    pub async fn get_content_by_type(&self, obj_token: &str, obj_type: &ObjType) -> Result<DocumentPayload> {
        match obj_type {
            ObjType::Docx => {
                let raw = self.get_document_content(obj_token).await?;
                Ok(text_payload(raw.content))
            }
            ObjType::Doc => {
                let raw = self.get_legacy_doc_content(obj_token).await?;
                Ok(text_payload(raw.content))
            }
            ObjType::Sheet => Ok(DocumentPayload::Sheets(
                self.get_sheet_content(obj_token).await?,
            )),
            other => Err(LarkError::NotSupported(other.to_string())),
        }
    }

    /// Free-text search over the wiki index
    pub async fn search_wiki(&self, keyword: &str, space_id: Option<&str>) -> Result<Vec<SearchItem>> {
        let mut body = json!({ "query": keyword });
        if let Some(space_id) = space_id {
            body["space_id"] = json!(space_id);
        }
        let query = [("page_size", self.page_size.to_string())];

        let result: Result<Page<SearchItem>> = self
            .request(Method::POST, "/open-apis/wiki/v1/nodes/search", Some(&body), &query)
            .await;
        Ok(degrade(result, Page::empty, "wiki search")?.items)
    }

    /// All spaces, following the cursor up to [`MAX_PAGES`] pages
    pub async fn list_all_spaces(&self) -> Result<Vec<Space>> {
        let mut spaces = Vec::new();
        let mut cursor: Option<String> = None;

        for _ in 0..MAX_PAGES {
            let page = self.get_spaces(self.page_size, cursor.as_deref()).await?;
            cursor = page.next_token().map(str::to_string);
            spaces.extend(page.items);

            if cursor.is_none() {
                break;
            }
        }

        Ok(spaces)
    }

    /// Every node of a space, descending into children.
    ///
    /// At most [`MAX_PAGES`] pages are fetched in total.
    pub async fn list_all_nodes(&self, space_id: &str) -> Result<Vec<Node>> {
        let mut nodes = Vec::new();
        let mut seen = HashSet::new();
        let mut parents: VecDeque<Option<String>> = VecDeque::from([None]);
        let mut pages = 0;

        while let Some(parent) = parents.pop_front() {
            let mut cursor: Option<String> = None;

            loop {
                if pages >= MAX_PAGES {
                    warn!("Stopped listing space {} after {} pages", space_id, pages);
                    return Ok(nodes);
                }
                pages += 1;

                let page = self
                    .get_nodes(space_id, parent.as_deref(), self.page_size, cursor.as_deref())
                    .await?;
                cursor = page.next_token().map(str::to_string);

                for node in page.items {
                    if !seen.insert(node.node_token.clone()) {
                        continue;
                    }
                    if node.has_child {
                        parents.push_back(Some(node.node_token.clone()));
                    }
                    nodes.push(node);
                }

                if cursor.is_none() {
                    break;
                }
            }
        }

        debug!("Listed {} nodes in space {}", nodes.len(), space_id);
        Ok(nodes)
    }
}

/// Turn a permission error into `fallback`; pass everything else through
fn degrade<T>(result: Result<T>, fallback: impl FnOnce() -> T, what: &str) -> Result<T> {
    match result {
        Err(e) if e.is_permission_denied() => {
            warn!("No permission for {}, returning empty result: {}", what, e);
            Ok(fallback())
        }
        other => other,
    }
}

fn page_query(page_size: u32, page_token: Option<&str>) -> Vec<(&'static str, String)> {
    let mut query = vec![("page_size", page_size.to_string())];
    if let Some(token) = page_token.filter(|t| !t.is_empty()) {
        query.push(("page_token", token.to_string()));
    }
    query
}

/// Raw document text; JSON bodies are classified, anything else is Markdown
fn text_payload(content: String) -> DocumentPayload {
    DocumentPayload::parse(&content).unwrap_or(DocumentPayload::Text(content))
}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_query_skips_empty_token() {
        assert_eq!(page_query(20, Some("")), vec![("page_size", "20".to_string())]);
        assert_eq!(
            page_query(20, Some("abc")),
            vec![
                ("page_size", "20".to_string()),
                ("page_token", "abc".to_string())
            ]
        );
    }

    #[test]
    fn test_degrade_only_absorbs_permission_errors() {
        let denied: Result<Vec<u8>> = Err(LarkError::Api {
            code: 131006,
            msg: "permission denied".to_string(),
        });
        assert!(degrade(denied, Vec::new, "test").unwrap().is_empty());

        let other: Result<Vec<u8>> = Err(LarkError::Api {
            code: 500,
            msg: "internal".to_string(),
        });
        assert!(degrade(other, Vec::new, "test").is_err());
    }

    #[test]
    fn test_text_payload() {
        assert_eq!(
            text_payload("hello".to_string()),
            DocumentPayload::Text("hello".to_string())
        );
        assert_eq!(
            text_payload(r#"{"blocks": [7]}"#.to_string()),
            DocumentPayload::Text(r#"{"blocks": [7]}"#.to_string())
        );
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("abcdef", 3), "abc...");
        assert_eq!(truncate("ab", 3), "ab");
    }
}
