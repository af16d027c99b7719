//! Local Markdown library.
//!
//! Downloaded documents are cataloged in memory and written to disk.
//!
//! # Storage Layout
//!
//! ```text
//! <save_dir>/
//! └── <space name>/             # sanitized
//!     └── <document title>.md   # sanitized, normalized Markdown
//! ```

pub mod sanitize;
pub mod store;

pub use sanitize::sanitize_file_name;
pub use store::{DocumentRecord, DocumentStore};
