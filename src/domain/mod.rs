//! Domain types for larkwiki.
//!
//! - Node: spaces, wiki nodes, listing pages and document metadata
//! - Payload: fetched document content decoded into a tagged variant

pub mod node;
pub mod payload;

use serde::{Deserialize, Deserializer};

// Re-export commonly used types
pub use node::{DocumentMeta, Node, NodeInfo, ObjType, Page, RawContent, SearchItem, Space};
pub use payload::{Block, DocumentPayload, Sheet};

/// Deserialize a possibly-null JSON array as an empty `Vec`
pub(crate) fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Deserialize a possibly-null JSON value as the type's default
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
