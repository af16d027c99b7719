//! Keyword search over the Markdown library on disk.
//!
//! Search reads the file tree directly and never touches the in-memory
//! catalog, so it finds documents written by earlier runs.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tokio::fs;
use tracing::{debug, warn};

use crate::error::Result;

/// A matching line
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchMatch {
    /// 1-based line number
    pub line_number: usize,

    /// The line with surrounding whitespace trimmed
    pub line_text: String,
}

/// All matches within one file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileMatches {
    /// Path relative to the search root
    pub path: PathBuf,

    pub matches: Vec<SearchMatch>,
}

/// Search every `.md` file under `root` for lines containing `keyword`
/// (case-insensitive).
///
/// Returns files with at least one match, ordered by path. A missing root
/// or an empty keyword yields no results.
pub async fn search(keyword: &str, root: &Path) -> Result<Vec<FileMatches>> {
    let needle = keyword.to_lowercase();
    if needle.is_empty() || !fs::try_exists(root).await.unwrap_or(false) {
        return Ok(Vec::new());
    }

    let mut results = Vec::new();
    for file in markdown_files(root).await? {
        let text = match fs::read_to_string(&file).await {
            Ok(text) => text,
            Err(e) => {
                warn!("Skipping unreadable file {}: {}", file.display(), e);
                continue;
            }
        };

        let matches: Vec<SearchMatch> = text
            .lines()
            .enumerate()
            .filter(|(_, line)| line.to_lowercase().contains(&needle))
            .map(|(i, line)| SearchMatch {
                line_number: i + 1,
                line_text: line.trim().to_string(),
            })
            .collect();

        if !matches.is_empty() {
            let path = file.strip_prefix(root).unwrap_or(file.as_path()).to_path_buf();
            results.push(FileMatches { path, matches });
        }
    }

    debug!("Search for '{}' matched {} files", keyword, results.len());
    Ok(results)
}

/// Collect all regular `.md` files below `root`, sorted
async fn markdown_files(root: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let mut pending = vec![root.to_path_buf()];

    while let Some(dir) = pending.pop() {
        let mut entries = match fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if dir == root => return Err(e.into()),
            Err(e) => {
                warn!("Skipping unreadable directory {}: {}", dir.display(), e);
                continue;
            }
        };

        loop {
            let entry = match entries.next_entry().await {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(e) => {
                    warn!("Stopped reading directory {}: {}", dir.display(), e);
                    break;
                }
            };
            let path = entry.path();
            let file_type = match entry.file_type().await {
                Ok(file_type) => file_type,
                Err(e) => {
                    warn!("Skipping uninspectable entry {}: {}", path.display(), e);
                    continue;
                }
            };

            if file_type.is_dir() {
                pending.push(path);
            } else if file_type.is_file() && is_markdown(&path) {
                files.push(path);
            }
        }
    }

    files.sort();
    Ok(files)
}

fn is_markdown(path: &Path) -> bool {
    path.extension().map(|ext| ext == "md").unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_markdown() {
        assert!(is_markdown(Path::new("a/b/notes.md")));
        assert!(!is_markdown(Path::new("notes.txt")));
        assert!(!is_markdown(Path::new("md")));
    }
}
