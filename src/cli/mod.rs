//! Command-line interface for larkwiki.
//!
//! Provides commands for listing wiki spaces and documents, downloading
//! documents into the local Markdown library, and searching it.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use crate::adapters::ApiClient;
use crate::config::{self, ResolvedConfig};
use crate::core::search;
use crate::domain::Node;
use crate::library::DocumentStore;

/// larkwiki - Sync Feishu/Lark wiki spaces to local Markdown
#[derive(Parser, Debug)]
#[command(name = "larkwiki")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List knowledge spaces visible to the app
    Spaces,

    /// List documents in one space, or in every visible space
    Documents {
        /// Space ID
        #[arg(short, long)]
        space: Option<String>,
    },

    /// Download a single wiki node as Markdown
    Download {
        /// Wiki node token
        node_token: String,
    },

    /// Download every document of a space
    DownloadSpace {
        /// Space ID
        space_id: String,
    },

    /// Search downloaded documents (or the remote wiki with --remote)
    Search {
        /// Keyword to look for
        keyword: String,

        /// Search the remote wiki index instead of local files
        #[arg(short, long)]
        remote: bool,

        /// Restrict a remote search to one space
        #[arg(short, long)]
        space: Option<String>,
    },

    /// Show resolved configuration (debug)
    Config,
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(self) -> Result<()> {
        let cfg = config::load_config()?;

        match self.command {
            Commands::Spaces => list_spaces(&cfg).await,
            Commands::Documents { space } => list_documents(&cfg, space.as_deref()).await,
            Commands::Download { node_token } => download_document(&cfg, &node_token).await,
            Commands::DownloadSpace { space_id } => download_space(&cfg, &space_id).await,
            Commands::Search {
                keyword,
                remote,
                space,
            } => {
                if remote {
                    search_remote(&cfg, &keyword, space.as_deref()).await
                } else {
                    search_local(&cfg, &keyword).await
                }
            }
            Commands::Config => show_config(&cfg),
        }
    }
}

fn client(cfg: &ResolvedConfig) -> Result<ApiClient> {
    ApiClient::from_config(cfg).context("Failed to create API client")
}

/// List knowledge spaces
async fn list_spaces(cfg: &ResolvedConfig) -> Result<()> {
    let spaces = client(cfg)?.list_all_spaces().await?;

    if spaces.is_empty() {
        println!("No spaces found (is the app a member of any space?)");
        return Ok(());
    }

    println!("{:<24} {}", "SPACE ID", "NAME");
    println!("{}", "-".repeat(60));
    for space in spaces {
        println!("{:<24} {}", space.id, space.name);
    }

    Ok(())
}

/// List document nodes of one or all spaces
async fn list_documents(cfg: &ResolvedConfig, space_id: Option<&str>) -> Result<()> {
    let client = client(cfg)?;

    let space_ids = match space_id {
        Some(id) => vec![id.to_string()],
        None => client
            .list_all_spaces()
            .await?
            .into_iter()
            .map(|s| s.id)
            .collect(),
    };

    let mut count = 0;
    for id in space_ids {
        let nodes: Vec<Node> = client
            .list_all_nodes(&id)
            .await
            .with_context(|| format!("Failed to list nodes of space {}", id))?;

        for node in nodes.iter().filter(|n| n.obj_type.is_document()) {
            println!(
                "{:<24} {:<28} {:<8} {}",
                id, node.node_token, node.obj_type, node.title
            );
            count += 1;
        }
    }

    eprintln!("\n[{} documents]", count);
    Ok(())
}

/// Download a single node
async fn download_document(cfg: &ResolvedConfig, node_token: &str) -> Result<()> {
    let client = client(cfg)?;
    let mut store = DocumentStore::new(&cfg.save_dir);

    let record = client
        .download_document_to(node_token, &mut store)
        .await
        .with_context(|| format!("Failed to download node {}", node_token))?;

    println!("Downloaded: {}", record.name);
    if let Some(path) = &record.path {
        println!("Saved to:   {}", path.display());
    }

    Ok(())
}

/// Download all documents of a space
async fn download_space(cfg: &ResolvedConfig, space_id: &str) -> Result<()> {
    let client = client(cfg)?;
    let mut store = DocumentStore::new(&cfg.save_dir);

    let summary = client
        .download_space_documents(space_id, &mut store)
        .await
        .with_context(|| format!("Failed to download space {}", space_id))?;

    println!(
        "Downloaded {}/{} documents ({} failed) into {}",
        summary.downloaded,
        summary.total,
        summary.failed,
        store.root().display()
    );
    for (token, reason) in &summary.failures {
        println!("  {}: {}", token, reason);
    }

    Ok(())
}

/// Search downloaded Markdown files
async fn search_local(cfg: &ResolvedConfig, keyword: &str) -> Result<()> {
    let results = search(keyword, &cfg.save_dir).await?;

    if results.is_empty() {
        println!("No matches for '{}'", keyword);
        return Ok(());
    }

    for file in &results {
        println!("{}", file.path.display());
        for m in &file.matches {
            println!("  {:>5}: {}", m.line_number, m.line_text);
        }
    }

    Ok(())
}

/// Search the remote wiki index
async fn search_remote(cfg: &ResolvedConfig, keyword: &str, space_id: Option<&str>) -> Result<()> {
    let items = client(cfg)?.search_wiki(keyword, space_id).await?;

    if items.is_empty() {
        println!("No remote matches for '{}'", keyword);
        return Ok(());
    }

    for item in items {
        println!(
            "{:<28} {:<24} {}",
            item.node_id, item.space_id, item.title
        );
    }

    Ok(())
}

fn show_config(cfg: &ResolvedConfig) -> Result<()> {
    println!("larkwiki configuration");
    println!();
    println!(
        "Config file: {}",
        cfg.config_file
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(none - using environment and defaults)".to_string())
    );
    println!();
    println!(
        "App ID:      {}",
        cfg.app_id.as_deref().unwrap_or("(not set)")
    );
    println!("API:         {}", cfg.base_url);
    println!("Save dir:    {}", cfg.save_dir.display());
    println!();
    println!("Sync:");
    println!("  Page size:   {}", cfg.page_size);
    println!("  Timeout:     {}s", cfg.timeout_seconds);
    println!("  Concurrency: {}", cfg.download_concurrency);

    Ok(())
}
