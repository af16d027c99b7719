//! Configuration for larkwiki.
//!
//! Configuration sources (highest priority first):
//! 1. Environment variables (FEISHU_APP_ID, FEISHU_APP_SECRET,
//!    FEISHU_BASE_URL, LARKWIKI_SAVE_DIR)
//! 2. Config file (.larkwiki/config.yaml)
//! 3. Defaults (https://open.feishu.cn, ~/larkwiki)
//!
//! Config file discovery:
//! - Searches current directory and parents for .larkwiki/config.yaml
//! - Paths in config file are relative to the project root (the parent of .larkwiki/)

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::adapters::{Credentials, DEFAULT_BASE_URL, DEFAULT_PAGE_SIZE};
use crate::error::LarkError;

pub const ENV_APP_ID: &str = "FEISHU_APP_ID";
pub const ENV_APP_SECRET: &str = "FEISHU_APP_SECRET";
pub const ENV_BASE_URL: &str = "FEISHU_BASE_URL";
pub const ENV_SAVE_DIR: &str = "LARKWIKI_SAVE_DIR";

/// Raw config file schema (matches YAML structure)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub app: AppConfig,
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub sync: Option<SyncConfig>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    pub app_id: Option<String>,
    pub app_secret: Option<String>,
    pub base_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PathsConfig {
    /// Markdown library root (relative to the project root)
    pub save_dir: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SyncConfig {
    pub page_size: Option<u32>,
    pub timeout_seconds: Option<u64>,
    pub download_concurrency: Option<usize>,
}

/// Resolved configuration with absolute paths
#[derive(Clone)]
pub struct ResolvedConfig {
    /// Only commands that talk to the API need these
    pub app_id: Option<String>,
    pub app_secret: Option<String>,
    pub base_url: String,
    /// Root of the Markdown library
    pub save_dir: PathBuf,
    /// Path to config file (if found)
    pub config_file: Option<PathBuf>,
    pub page_size: u32,
    pub timeout_seconds: u64,
    /// Documents fetched at once during a space download
    pub download_concurrency: usize,
}

impl ResolvedConfig {
    /// Application credentials, failing if either half is missing
    pub fn credentials(&self) -> crate::error::Result<Credentials> {
        let missing = |name: &str| {
            LarkError::Auth(format!("{} is not set (environment or config file)", name))
        };
        let app_id = self.app_id.clone().ok_or_else(|| missing(ENV_APP_ID))?;
        let app_secret = self.app_secret.clone().ok_or_else(|| missing(ENV_APP_SECRET))?;
        Ok(Credentials::new(app_id, app_secret))
    }
}

impl std::fmt::Debug for ResolvedConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedConfig")
            .field("app_id", &self.app_id)
            .field("app_secret", &self.app_secret.as_ref().map(|_| "***"))
            .field("base_url", &self.base_url)
            .field("save_dir", &self.save_dir)
            .field("config_file", &self.config_file)
            .field("page_size", &self.page_size)
            .field("timeout_seconds", &self.timeout_seconds)
            .field("download_concurrency", &self.download_concurrency)
            .finish()
    }
}

/// Find config file by searching current directory and parents
fn find_config_file() -> Option<PathBuf> {
    let mut current = std::env::current_dir().ok()?;

    loop {
        let config_path = current.join(".larkwiki").join("config.yaml");
        if config_path.exists() {
            return Some(config_path);
        }

        if !current.pop() {
            break;
        }
    }

    None
}

/// Load and parse config file
fn load_config_file(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Resolve a path that may be relative to the project root
fn resolve_path(base: &Path, path_str: &str) -> PathBuf {
    let path = PathBuf::from(path_str);
    if path.is_absolute() {
        path
    } else {
        base.join(path)
    }
}

/// Merge a config file and environment lookups into a resolved config
fn resolve_config(
    config_path: Option<&Path>,
    env: impl Fn(&str) -> Option<String>,
) -> Result<ResolvedConfig> {
    let config = match config_path {
        Some(path) => load_config_file(path)?,
        None => ConfigFile::default(),
    };

    // Base directory is the parent of .larkwiki/ (i.e., grandparent of config.yaml)
    let base_dir = config_path
        .and_then(|p| p.parent())
        .and_then(|p| p.parent())
        .unwrap_or(Path::new("."));

    let app_id = env(ENV_APP_ID)
        .or(config.app.app_id)
        .filter(|s| !s.is_empty());
    let app_secret = env(ENV_APP_SECRET)
        .or(config.app.app_secret)
        .filter(|s| !s.is_empty());

    let base_url = env(ENV_BASE_URL)
        .or(config.app.base_url)
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

    let save_dir = if let Some(dir) = env(ENV_SAVE_DIR) {
        PathBuf::from(dir)
    } else if let Some(ref dir) = config.paths.save_dir {
        resolve_path(base_dir, dir)
    } else {
        dirs::home_dir()
            .context("Failed to determine home directory")?
            .join("larkwiki")
    };

    let sync = config.sync.as_ref();

    Ok(ResolvedConfig {
        app_id,
        app_secret,
        base_url,
        save_dir,
        config_file: config_path.map(Path::to_path_buf),
        page_size: sync
            .and_then(|s| s.page_size)
            .unwrap_or(DEFAULT_PAGE_SIZE),
        timeout_seconds: sync.and_then(|s| s.timeout_seconds).unwrap_or(30),
        download_concurrency: sync
            .and_then(|s| s.download_concurrency)
            .unwrap_or(1)
            .max(1),
    })
}

/// Load configuration from all sources
pub fn load_config() -> Result<ResolvedConfig> {
    let config_file = find_config_file();
    resolve_config(config_file.as_deref(), |key| std::env::var(key).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::TempDir;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_env_only_config() {
        let config = resolve_config(
            None,
            env_of(&[
                (ENV_APP_ID, "cli_123"),
                (ENV_APP_SECRET, "secret"),
                (ENV_SAVE_DIR, "/data/wiki"),
            ]),
        )
        .unwrap();

        assert_eq!(config.credentials().unwrap().app_id, "cli_123");
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.save_dir, PathBuf::from("/data/wiki"));
        assert_eq!(config.page_size, DEFAULT_PAGE_SIZE);
        assert_eq!(config.download_concurrency, 1);
        assert!(config.config_file.is_none());
    }

    #[test]
    fn test_missing_credentials_fail_on_use() {
        let config = resolve_config(None, env_of(&[(ENV_APP_ID, "cli_123")])).unwrap();
        let err = config.credentials().unwrap_err();
        assert!(matches!(err, LarkError::Auth(_)));
        assert!(err.to_string().contains(ENV_APP_SECRET));
    }

    #[test]
    fn test_save_dir_resolves_without_credentials() {
        let config = resolve_config(None, env_of(&[(ENV_SAVE_DIR, "/data/wiki")])).unwrap();

        assert_eq!(config.save_dir, PathBuf::from("/data/wiki"));
        assert!(config.app_id.is_none());
        assert!(config.app_secret.is_none());
        assert!(config.credentials().is_err());
    }

    #[test]
    fn test_debug_hides_secret() {
        let config = resolve_config(
            None,
            env_of(&[(ENV_APP_ID, "cli_123"), (ENV_APP_SECRET, "s3cret"), (ENV_SAVE_DIR, "/w")]),
        )
        .unwrap();
        let debug = format!("{:?}", config);
        assert!(debug.contains("cli_123"));
        assert!(!debug.contains("s3cret"));
    }

    #[test]
    fn test_config_file_parsing() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join(".larkwiki");
        std::fs::create_dir_all(&dir).unwrap();

        let config_path = dir.join("config.yaml");
        let mut file = std::fs::File::create(&config_path).unwrap();
        writeln!(
            file,
            r#"
version: "1.0"
app:
  app_id: cli_file
  app_secret: file_secret
  base_url: https://open.larksuite.com
paths:
  save_dir: docs
sync:
  page_size: 20
  download_concurrency: 3
"#
        )
        .unwrap();

        let config = resolve_config(Some(config_path.as_path()), env_of(&[])).unwrap();
        assert_eq!(config.app_id.as_deref(), Some("cli_file"));
        assert_eq!(config.base_url, "https://open.larksuite.com");
        assert_eq!(config.save_dir, temp.path().join("docs"));
        assert_eq!(config.page_size, 20);
        assert_eq!(config.download_concurrency, 3);
        assert_eq!(config.timeout_seconds, 30);
    }

    #[test]
    fn test_env_overrides_file() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join(".larkwiki");
        std::fs::create_dir_all(&dir).unwrap();
        let config_path = dir.join("config.yaml");
        std::fs::write(&config_path, "app:\n  app_id: from_file\n  app_secret: s\n").unwrap();

        let config =
            resolve_config(Some(config_path.as_path()), env_of(&[(ENV_APP_ID, "from_env")])).unwrap();
        let credentials = config.credentials().unwrap();
        assert_eq!(credentials.app_id, "from_env");
        assert_eq!(credentials.app_secret, "s");
    }

    #[test]
    fn test_resolve_relative_path() {
        let base = PathBuf::from("/home/user/project");

        assert_eq!(
            resolve_path(&base, "wiki"),
            PathBuf::from("/home/user/project/wiki")
        );
        assert_eq!(
            resolve_path(&base, "/absolute/path"),
            PathBuf::from("/absolute/path")
        );
    }
}
