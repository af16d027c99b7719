//! Core content logic.
//!
//! This module contains:
//! - Normalize: payload to Markdown conversion
//! - Search: keyword search over the Markdown library on disk

pub mod normalize;
pub mod search;

// Re-export commonly used types
pub use normalize::{normalize, normalize_value, render};
pub use search::{search, FileMatches, SearchMatch};
