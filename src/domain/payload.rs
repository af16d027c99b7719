//! Decoded document payloads.
//!
//! Fetched content is decoded once into a [`DocumentPayload`] at the API
//! boundary. Renderers match over the variant instead of probing JSON fields.

use serde::Deserialize;
use serde_json::Value;

use super::{null_as_default, null_as_empty};

/// A fetched document, classified by shape
#[derive(Debug, Clone, PartialEq)]
pub enum DocumentPayload {
    /// Plain text, already final Markdown
    Text(String),

    /// Ordered rich-text blocks
    Blocks(Vec<Block>),

    /// One or more spreadsheet grids
    Sheets(Vec<Sheet>),

    /// Any other JSON value
    Opaque(Value),
}

impl DocumentPayload {
    /// Decode raw fetched text.
    ///
    /// Text that is not JSON is kept verbatim as [`DocumentPayload::Text`].
    pub fn parse(raw: &str) -> Result<Self, serde_json::Error> {
        match serde_json::from_str::<Value>(raw) {
            Ok(value) => Self::from_value(value),
            Err(_) => Ok(DocumentPayload::Text(raw.to_string())),
        }
    }

    /// Classify a JSON value.
    ///
    /// Blocks are decoded one at a time, so a block that does not decode
    /// becomes [`Block::Unsupported`] instead of failing the document. Fails
    /// only when a `valueRange` or `sheets` array does not decode.
    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        if let Some(Value::Array(blocks)) = value.get("blocks") {
            return Ok(DocumentPayload::Blocks(blocks.iter().map(Block::decode).collect()));
        }

        if let Some(range) = value.get("valueRange").filter(|r| r.is_object()) {
            return Ok(DocumentPayload::Sheets(vec![Sheet::deserialize(range)?]));
        }

        if let Some(sheets) = value.get("sheets").filter(|s| s.is_array()) {
            return Ok(DocumentPayload::Sheets(Vec::<Sheet>::deserialize(sheets)?));
        }

        Ok(DocumentPayload::Opaque(value))
    }
}

/// A rich-text block
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    Paragraph {
        #[serde(default, deserialize_with = "null_as_default")]
        text: String,
    },

    Heading {
        #[serde(default = "default_heading_level", deserialize_with = "null_as_default")]
        level: u8,
        #[serde(default, deserialize_with = "null_as_default")]
        text: String,
    },

    Code {
        #[serde(default)]
        language: Option<String>,
        #[serde(default, alias = "code", deserialize_with = "null_as_default")]
        text: String,
    },

    List {
        #[serde(default, deserialize_with = "null_as_empty")]
        items: Vec<Value>,
    },

    /// Block kinds this client does not render
    #[serde(other)]
    Unsupported,
}

impl Block {
    /// Decode a single block, treating anything undecodable as unsupported
    pub fn decode(value: &Value) -> Self {
        Block::deserialize(value).unwrap_or(Block::Unsupported)
    }
}

fn default_heading_level() -> u8 {
    1
}

/// A spreadsheet grid
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Sheet {
    #[serde(default = "default_sheet_name", alias = "title")]
    pub name: String,

    /// Rows of cells; the first row is the header
    #[serde(default, alias = "values", deserialize_with = "null_as_empty")]
    pub rows: Vec<Vec<Value>>,
}

impl Sheet {
    pub fn new(name: impl Into<String>, rows: Vec<Vec<Value>>) -> Self {
        Self {
            name: name.into(),
            rows,
        }
    }
}

fn default_sheet_name() -> String {
    "Sheet".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_plain_text_is_kept() {
        let payload = DocumentPayload::parse("# Title\n\nbody").unwrap();
        assert_eq!(payload, DocumentPayload::Text("# Title\n\nbody".to_string()));
    }

    #[test]
    fn test_blocks_decode() {
        let payload = DocumentPayload::from_value(json!({
            "blocks": [
                {"type": "heading", "text": "Intro"},
                {"type": "code", "code": "fn main() {}"},
                {"type": "callout", "text": "ignored"}
            ]
        }))
        .unwrap();

        assert_eq!(
            payload,
            DocumentPayload::Blocks(vec![
                Block::Heading {
                    level: 1,
                    text: "Intro".to_string()
                },
                Block::Code {
                    language: None,
                    text: "fn main() {}".to_string()
                },
                Block::Unsupported,
            ])
        );
    }

    #[test]
    fn test_value_range_is_single_sheet() {
        let payload = DocumentPayload::from_value(json!({
            "valueRange": {"range": "abc!A1:B2", "values": [["a", "b"]]}
        }))
        .unwrap();

        match payload {
            DocumentPayload::Sheets(sheets) => {
                assert_eq!(sheets.len(), 1);
                assert_eq!(sheets[0].name, "Sheet");
                assert_eq!(sheets[0].rows, vec![vec![json!("a"), json!("b")]]);
            }
            other => panic!("Expected sheets, got {:?}", other),
        }
    }

    #[test]
    fn test_other_shapes_are_opaque() {
        let value = json!({"title": "x", "count": 3});
        let payload = DocumentPayload::from_value(value.clone()).unwrap();
        assert_eq!(payload, DocumentPayload::Opaque(value));
    }

    #[test]
    fn test_undecodable_blocks_are_unsupported() {
        let payload = DocumentPayload::from_value(json!({
            "blocks": [
                42,
                {"text": "no type"},
                {"type": 7, "text": "numeric type"},
                {"type": "heading", "level": "two", "text": "bad level"},
                {"type": "paragraph", "text": "kept"}
            ]
        }))
        .unwrap();

        assert_eq!(
            payload,
            DocumentPayload::Blocks(vec![
                Block::Unsupported,
                Block::Unsupported,
                Block::Unsupported,
                Block::Unsupported,
                Block::Paragraph {
                    text: "kept".to_string()
                },
            ])
        );
    }

    #[test]
    fn test_null_fields_take_defaults() {
        let payload = DocumentPayload::from_value(json!({
            "blocks": [
                {"type": "paragraph", "text": null},
                {"type": "heading", "level": null, "text": "H"},
                {"type": "code", "language": null, "code": null}
            ]
        }))
        .unwrap();

        assert_eq!(
            payload,
            DocumentPayload::Blocks(vec![
                Block::Paragraph {
                    text: String::new()
                },
                Block::Heading {
                    level: 0,
                    text: "H".to_string()
                },
                Block::Code {
                    language: None,
                    text: String::new()
                },
            ])
        );
    }

    #[test]
    fn test_malformed_sheets_fail() {
        let result = DocumentPayload::from_value(json!({"sheets": [42]}));
        assert!(result.is_err());
    }
}
