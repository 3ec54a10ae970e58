//! Configuration for the Clio documentation server
//!
//! Settings are layered: built-in defaults, then an optional TOML file,
//! then `CLIO_*` environment variables. CLI flags override the result in
//! `main.rs`.

use crate::error::Result;
use serde::Deserialize;
use std::path::PathBuf;

/// Default hard ceiling on a serialized response, in bytes.
///
/// Matches the payload limit of the request/response gateway fronting the
/// HTTP transport.
pub const DEFAULT_MAX_RESPONSE_BYTES: usize = 5 * 1024 * 1024;

/// Default warning threshold; responses above it are logged but allowed.
pub const DEFAULT_WARN_RESPONSE_BYTES: usize = 4 * 1024 * 1024;

/// Top-level configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClioConfig {
    pub database: DatabaseConfig,
    pub blobs: BlobConfig,
    pub server: ServerConfig,
    pub limits: LimitConfig,
}

/// Document store settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Path to the libsql database file
    pub path: String,
}

/// Blob store settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BlobConfig {
    /// Root directory holding markdown content blobs
    pub root: String,
}

/// HTTP transport settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address for the HTTP transport
    pub bind: String,

    /// Shared API key required in the `x-api-key` header; unset disables auth
    pub api_key: Option<String>,
}

/// Response size guard settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LimitConfig {
    /// Hard ceiling in bytes; responses above it are rejected
    pub max_response_bytes: usize,

    /// Warning threshold in bytes; responses above it are logged
    pub warn_response_bytes: usize,
}

fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("clio")
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_data_dir()
                .join("clio.db")
                .to_string_lossy()
                .to_string(),
        }
    }
}

impl Default for BlobConfig {
    fn default() -> Self {
        Self {
            root: default_data_dir()
                .join("blobs")
                .to_string_lossy()
                .to_string(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8080".to_string(),
            api_key: None,
        }
    }
}

impl Default for LimitConfig {
    fn default() -> Self {
        Self {
            max_response_bytes: DEFAULT_MAX_RESPONSE_BYTES,
            warn_response_bytes: DEFAULT_WARN_RESPONSE_BYTES,
        }
    }
}

impl Default for ClioConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig::default(),
            blobs: BlobConfig::default(),
            server: ServerConfig::default(),
            limits: LimitConfig::default(),
        }
    }
}

impl ClioConfig {
    /// Load configuration from an optional TOML file plus `CLIO_*`
    /// environment variables (e.g. `CLIO_SERVER__API_KEY`).
    pub fn load(file: Option<&str>) -> Result<Self> {
        let mut builder = config::Config::builder();

        if let Some(path) = file {
            builder = builder.add_source(config::File::with_name(path));
        } else {
            // A missing default config file is not an error
            builder = builder.add_source(
                config::File::with_name("clio").required(false),
            );
        }

        builder = builder.add_source(
            config::Environment::with_prefix("CLIO").separator("__"),
        );

        let raw = builder.build()?;

        // Fall back to defaults for anything the sources left unset
        let mut cfg = ClioConfig::default();
        if let Ok(path) = raw.get_string("database.path") {
            cfg.database.path = path;
        }
        if let Ok(root) = raw.get_string("blobs.root") {
            cfg.blobs.root = root;
        }
        if let Ok(bind) = raw.get_string("server.bind") {
            cfg.server.bind = bind;
        }
        if let Ok(key) = raw.get_string("server.api_key") {
            if !key.is_empty() {
                cfg.server.api_key = Some(key);
            }
        }
        if let Ok(max) = raw.get_int("limits.max_response_bytes") {
            cfg.limits.max_response_bytes = max.max(1) as usize;
        }
        if let Ok(warn) = raw.get_int("limits.warn_response_bytes") {
            cfg.limits.warn_response_bytes = warn.max(1) as usize;
        }

        Ok(cfg)
    }
}
