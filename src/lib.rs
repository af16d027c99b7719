//! larkwiki - Sync Feishu/Lark wiki spaces to a local Markdown library
//!
//! Pulls documents from the Feishu/Lark open platform, converts them to
//! Markdown and writes them under a sanitized directory tree.
//!
//! # Architecture
//!
//! - `TokenManager` exchanges the app credentials for a tenant token and
//!   caches it until shortly before expiry
//! - `ApiClient` wraps the wiki, docx and sheets endpoints
//! - `normalize` turns fetched payloads into Markdown
//! - `DocumentStore` catalogs downloads for the session and writes files
//! - `search` scans the Markdown files on disk
//!
//! # Modules
//!
//! - `adapters`: Feishu/Lark API integration (token, client, downloads)
//! - `core`: Content logic (normalize, search)
//! - `domain`: Data structures (Space, Node, DocumentPayload)
//! - `library`: Session catalog and Markdown file layout
//! - `cli`: Command-line interface
//!
//! # Usage
//!
//! ```bash
//! export FEISHU_APP_ID=cli_xxx FEISHU_APP_SECRET=xxx
//!
//! # Download a whole space
//! larkwiki download-space 7034502641455497244
//!
//! # Search what has been downloaded
//! larkwiki search roadmap
//! ```

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod error;
pub mod library;

// Re-export main types at crate root for convenience
pub use adapters::{ApiClient, BatchPolicy, BatchSummary, Credentials, TokenManager, WikiDocument};
pub use crate::core::{normalize, search, FileMatches, SearchMatch};
pub use domain::{DocumentPayload, Node, ObjType, Space};
pub use error::{LarkError, Result};
pub use library::{sanitize_file_name, DocumentRecord, DocumentStore};
