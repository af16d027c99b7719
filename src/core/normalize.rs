//! Conversion of fetched document payloads into Markdown.
//!
//! Conversion is best-effort and never fails: input that cannot be decoded
//! is returned inside a diagnostic note instead of an error.

use std::fmt::Write;

use serde_json::Value;

use crate::domain::{Block, DocumentPayload, Sheet};

/// Convert raw fetched text into Markdown.
///
/// Text that is not JSON is returned unchanged.
pub fn normalize(raw: &str) -> String {
    match DocumentPayload::parse(raw) {
        Ok(payload) => render(&payload),
        Err(e) => diagnostic(&e, raw),
    }
}

/// Convert an already-parsed JSON value into Markdown
pub fn normalize_value(value: Value) -> String {
    let fallback = value.to_string();
    match DocumentPayload::from_value(value) {
        Ok(payload) => render(&payload),
        Err(e) => diagnostic(&e, &fallback),
    }
}

/// Render a decoded payload as Markdown
pub fn render(payload: &DocumentPayload) -> String {
    match payload {
        DocumentPayload::Text(text) => text.clone(),
        DocumentPayload::Blocks(blocks) => render_blocks(blocks),
        DocumentPayload::Sheets(sheets) => render_sheets(sheets),
        DocumentPayload::Opaque(value) => {
            serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
        }
    }
}

/// Heading levels outside 1..=6 are clamped into that range.
fn render_blocks(blocks: &[Block]) -> String {
    let mut out = String::new();

    for block in blocks {
        match block {
            Block::Paragraph { text } => {
                out.push_str(text);
                out.push_str("\n\n");
            }
            Block::Heading { level, text } => {
                let level = (*level).clamp(1, 6) as usize;
                let _ = write!(out, "{} {}\n\n", "#".repeat(level), text);
            }
            Block::Code { language, text } => {
                let _ = write!(
                    out,
                    "```{}\n{}\n```\n\n",
                    language.as_deref().unwrap_or(""),
                    text
                );
            }
            Block::List { items } => {
                for item in items {
                    let _ = writeln!(out, "- {}", cell_text(item));
                }
                out.push('\n');
            }
            Block::Unsupported => {}
        }
    }

    out
}

fn render_sheets(sheets: &[Sheet]) -> String {
    let mut out = String::new();

    for sheet in sheets {
        let _ = write!(out, "## {}\n\n", sheet.name);

        let Some((header, data)) = sheet.rows.split_first() else {
            continue;
        };

        let columns = header.len().max(1);
        out.push_str(&table_row(header, columns));
        let _ = writeln!(out, "|{}", " --- |".repeat(columns));
        for row in data {
            out.push_str(&table_row(row, columns));
        }
        out.push('\n');
    }

    out
}

/// One Markdown table row, padded or truncated to `columns` cells
fn table_row(cells: &[Value], columns: usize) -> String {
    let mut line = String::from("|");
    for i in 0..columns {
        let text = cells.get(i).map(cell_text).unwrap_or_default();
        let _ = write!(line, " {} |", escape_cell(&text));
    }
    line.push('\n');
    line
}

/// Display text of a sheet cell or list item.
///
/// Rich-text cells arrive as arrays of `{"text": ...}` segments.
fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Array(segments) if segments.iter().all(|s| s.get("text").is_some()) => segments
            .iter()
            .filter_map(|s| s.get("text").and_then(Value::as_str))
            .collect(),
        Value::Object(map) if map.get("text").and_then(Value::as_str).is_some() => map
            .get("text")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        other => other.to_string(),
    }
}

fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', " ")
}

fn diagnostic(err: &serde_json::Error, raw: &str) -> String {
    format!(
        "> Conversion failed: {}\n\n```json\n{}\n```\n",
        err, raw
    )
}
