//! Adapters for the Feishu/Lark open platform.
//!
//! - token: tenant access token exchange and caching
//! - lark: typed API client (spaces, nodes, documents, sheets, search)
//! - download: single-node and whole-space downloads into the library

pub mod download;
pub mod lark;
pub mod token;

pub use download::{BatchPolicy, BatchSummary, WikiDocument};
pub use lark::{ApiClient, DEFAULT_BASE_URL, DEFAULT_PAGE_SIZE, MAX_PAGES};
pub use token::{AccessToken, Credentials, TokenManager};
