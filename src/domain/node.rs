//! Wiki spaces, nodes and the listing envelopes returned by the API.

use serde::{Deserialize, Serialize};

use super::null_as_empty;

/// A knowledge space ("wiki")
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Space {
    #[serde(alias = "space_id")]
    pub id: String,

    #[serde(default)]
    pub name: String,
}

impl Space {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// Type of the object a wiki node points at
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ObjType {
    /// Legacy rich-text document
    Doc,

    /// New-style document (docx v1)
    Docx,

    Sheet,
    Bitable,
    Mindnote,
    File,
    Slides,

    /// Anything this client does not know about
    Other(String),
}

impl ObjType {
    /// Whether nodes of this type carry downloadable document content
    pub fn is_document(&self) -> bool {
        matches!(self, ObjType::Doc | ObjType::Docx | ObjType::Sheet)
    }

    pub fn as_str(&self) -> &str {
        match self {
            ObjType::Doc => "doc",
            ObjType::Docx => "docx",
            ObjType::Sheet => "sheet",
            ObjType::Bitable => "bitable",
            ObjType::Mindnote => "mindnote",
            ObjType::File => "file",
            ObjType::Slides => "slides",
            ObjType::Other(s) => s,
        }
    }
}

impl From<String> for ObjType {
    fn from(s: String) -> Self {
        match s.to_lowercase().as_str() {
            "doc" => ObjType::Doc,
            "docx" => ObjType::Docx,
            "sheet" => ObjType::Sheet,
            "bitable" => ObjType::Bitable,
            "mindnote" => ObjType::Mindnote,
            "file" => ObjType::File,
            "slides" => ObjType::Slides,
            _ => ObjType::Other(s),
        }
    }
}

impl From<&str> for ObjType {
    fn from(s: &str) -> Self {
        ObjType::from(s.to_string())
    }
}

impl From<ObjType> for String {
    fn from(t: ObjType) -> Self {
        t.as_str().to_string()
    }
}

impl std::fmt::Display for ObjType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

/// An entry in a space's node tree
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    #[serde(default)]
    pub space_id: String,

    pub node_token: String,

    /// Token of the underlying document/sheet
    #[serde(default)]
    pub obj_token: String,

    pub obj_type: ObjType,

    #[serde(default)]
    pub parent_node_token: Option<String>,

    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub has_child: bool,
}

/// Resolved node, as returned by `get_node`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeInfo {
    pub obj_token: String,
    pub obj_type: ObjType,
    pub title: String,
    pub space_id: String,
}

impl From<Node> for NodeInfo {
    fn from(node: Node) -> Self {
        Self {
            obj_token: node.obj_token,
            obj_type: node.obj_type,
            title: node.title,
            space_id: node.space_id,
        }
    }
}

/// One page of a cursor-paginated listing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct Page<T> {
    #[serde(default = "Vec::new", deserialize_with = "null_as_empty")]
    pub items: Vec<T>,

    #[serde(default)]
    pub has_more: bool,

    #[serde(default)]
    pub page_token: Option<String>,
}

impl<T> Page<T> {
    /// The result a listing degrades to when access is denied
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            has_more: false,
            page_token: None,
        }
    }

    /// Cursor for the next page, if the listing should continue.
    ///
    /// `has_more` with an empty token ends the listing.
    pub fn next_token(&self) -> Option<&str> {
        if !self.has_more {
            return None;
        }
        self.page_token.as_deref().filter(|t| !t.is_empty())
    }
}

/// Metadata of a docx document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentMeta {
    pub document_id: String,

    #[serde(default)]
    pub revision_id: i64,

    #[serde(default)]
    pub title: String,
}

/// Plain-text content of a document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawContent {
    #[serde(default)]
    pub content: String,

    #[serde(default)]
    pub revision: i64,
}

/// A hit from the remote wiki search
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchItem {
    #[serde(default, alias = "node_token")]
    pub node_id: String,

    #[serde(default)]
    pub space_id: String,

    #[serde(default)]
    pub obj_token: String,

    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_obj_type_parsing() {
        assert_eq!(ObjType::from("docx"), ObjType::Docx);
        assert_eq!(ObjType::from("SHEET"), ObjType::Sheet);
        assert_eq!(
            ObjType::from("whiteboard"),
            ObjType::Other("whiteboard".to_string())
        );
        assert!(ObjType::Doc.is_document());
        assert!(!ObjType::Bitable.is_document());
    }

    #[test]
    fn test_node_deserialize() {
        let node: Node = serde_json::from_value(serde_json::json!({
            "space_id": "sp1",
            "node_token": "wik1",
            "obj_token": "dox1",
            "obj_type": "docx",
            "title": "Intro",
            "has_child": true
        }))
        .unwrap();

        assert_eq!(node.obj_type, ObjType::Docx);
        assert!(node.has_child);
        assert!(node.parent_node_token.is_none());
    }

    #[test]
    fn test_page_null_items() {
        let page: Page<Space> =
            serde_json::from_str(r#"{"items": null, "has_more": false}"#).unwrap();
        assert!(page.items.is_empty());
    }

    #[test]
    fn test_next_token_stops_on_empty_cursor() {
        let page: Page<Space> =
            serde_json::from_str(r#"{"items": [], "has_more": true, "page_token": ""}"#).unwrap();
        assert_eq!(page.next_token(), None);

        let page: Page<Space> =
            serde_json::from_str(r#"{"items": [], "has_more": true, "page_token": "p2"}"#)
                .unwrap();
        assert_eq!(page.next_token(), Some("p2"));

        let page: Page<Space> =
            serde_json::from_str(r#"{"items": [], "has_more": false, "page_token": "p2"}"#)
                .unwrap();
        assert_eq!(page.next_token(), None);
    }
}
