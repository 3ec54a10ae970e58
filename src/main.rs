//! Clio - Documentation MCP Server
//!
//! Main entry point. Wires the store adapters, the tool dispatch table,
//! and the protocol router into one of the transports: stdio (`serve`),
//! HTTP (`http`), or the stdio-to-HTTPS bridge (`bridge`).

use clap::{Parser, Subcommand};
use clio_core::{
    config::ClioConfig,
    error::{ClioError, Result},
    mcp::{HttpBridge, HttpServer, HttpServerConfig, McpRouter, SizeGuard, StdioServer, ToolHandler},
    store::{BlobStore, ConnectionMode, DocCatalog, FsBlobStore, LibsqlDocumentStore},
    types::Document,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, Level};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "clio")]
#[command(about = "Documentation MCP server for AI coding assistants", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Set log level
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Configuration file (TOML)
    #[arg(short, long)]
    config: Option<String>,

    /// Database path (overrides configuration)
    #[arg(long, env = "CLIO_DB_PATH")]
    db_path: Option<String>,

    /// Blob root directory (overrides configuration)
    #[arg(long, env = "CLIO_BLOB_ROOT")]
    blob_root: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the MCP server on stdio
    Serve,

    /// Start the MCP server on HTTP
    Http {
        /// Bind address (overrides configuration)
        #[arg(long)]
        addr: Option<String>,

        /// Shared API key required in the x-api-key header
        #[arg(long, env = "CLIO_API_KEY")]
        api_key: Option<String>,
    },

    /// Bridge stdio to a remote Clio HTTP endpoint
    Bridge {
        /// Remote /mcp endpoint URL
        #[arg(long)]
        endpoint: String,

        /// API key sent in the x-api-key header
        #[arg(long, env = "CLIO_API_KEY")]
        api_key: Option<String>,
    },

    /// Initialize the document store schema
    Init,

    /// Load documents (and their content) from a JSON file
    Load {
        /// JSON file: an array of document objects, each optionally
        /// carrying a "content" string
        file: PathBuf,
    },
}

/// Load configuration and apply CLI overrides
fn resolve_config(cli: &Cli) -> Result<ClioConfig> {
    let mut cfg = ClioConfig::load(cli.config.as_deref())?;
    if let Some(path) = &cli.db_path {
        cfg.database.path = path.clone();
    }
    if let Some(root) = &cli.blob_root {
        cfg.blobs.root = root.clone();
    }
    Ok(cfg)
}

fn connection_mode(path: &str) -> ConnectionMode {
    if path == ":memory:" {
        ConnectionMode::InMemory
    } else {
        ConnectionMode::Local(path.to_string())
    }
}

/// Open the stores and build the tool dispatch table
async fn build_tools(cfg: &ClioConfig, create_if_missing: bool) -> Result<ToolHandler> {
    let store = LibsqlDocumentStore::new_with_validation(
        connection_mode(&cfg.database.path),
        create_if_missing,
    )
    .await?;
    let blobs = FsBlobStore::new(cfg.blobs.root.clone())?;

    Ok(ToolHandler::new(
        DocCatalog::new(Arc::new(store)),
        Arc::new(blobs),
    ))
}

fn build_router(tools: ToolHandler, cfg: &ClioConfig) -> McpRouter {
    McpRouter::new(
        tools,
        SizeGuard::new(cfg.limits.max_response_bytes, cfg.limits.warn_response_bytes),
    )
}

async fn run_load(cfg: &ClioConfig, file: &PathBuf) -> Result<()> {
    let raw = std::fs::read_to_string(file)?;
    let entries: Vec<serde_json::Value> = serde_json::from_str(&raw)?;

    let store = Arc::new(
        LibsqlDocumentStore::new_with_validation(connection_mode(&cfg.database.path), true)
            .await?,
    );
    let blobs = FsBlobStore::new(cfg.blobs.root.clone())?;
    let catalog = DocCatalog::new(store);

    let mut loaded = 0usize;
    for entry in entries {
        let content = entry
            .get("content")
            .and_then(|c| c.as_str())
            .map(|c| c.to_string());

        let mut doc: Document = serde_json::from_value(entry)
            .map_err(|e| ClioError::InvalidParams(format!("invalid document entry: {}", e)))?;

        if let Some(text) = content {
            let location = doc
                .content_location
                .clone()
                .unwrap_or_else(|| format!("content/{}.md", doc.id));
            blobs
                .put(&location, text.as_bytes(), "text/markdown")
                .await?;
            doc.content_location = Some(location);
        }

        catalog.put_document(&doc).await?;
        loaded += 1;
        debug!("Loaded document {}", doc.id);
    }

    catalog.record_stat("documentCount", loaded).await?;
    info!("Loaded {} documents from {}", loaded, file.display());
    println!("Loaded {} documents", loaded);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let level = match cli.log_level.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let filter = EnvFilter::new(format!(
        "clio={0},clio_core={0}",
        level.as_str().to_lowercase()
    ));

    // Logs go to stderr; stdout is the protocol channel on stdio transports
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    debug!("Clio v{} starting...", env!("CARGO_PKG_VERSION"));

    let cfg = resolve_config(&cli)?;

    match cli.command {
        Commands::Serve => {
            let tools = build_tools(&cfg, false).await?;
            let router = build_router(tools, &cfg);
            StdioServer::new(router).run().await
        }
        Commands::Http { addr, api_key } => {
            let tools = build_tools(&cfg, false).await?;
            let router = build_router(tools, &cfg);
            let server = HttpServer::new(
                router,
                HttpServerConfig {
                    bind: addr.unwrap_or_else(|| cfg.server.bind.clone()),
                    api_key: api_key.or_else(|| cfg.server.api_key.clone()),
                },
            );
            server.run().await
        }
        Commands::Bridge { endpoint, api_key } => {
            let bridge = HttpBridge::new(endpoint, api_key)?;
            bridge.run().await
        }
        Commands::Init => {
            LibsqlDocumentStore::new_with_validation(connection_mode(&cfg.database.path), true)
                .await?;
            FsBlobStore::new(cfg.blobs.root.clone())?;
            println!("Document store initialized at {}", cfg.database.path);
            Ok(())
        }
        Commands::Load { file } => run_load(&cfg, &file).await,
    }
}
