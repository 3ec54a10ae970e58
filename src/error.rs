//! Error types for the Clio documentation server
//!
//! This module provides structured error definitions using thiserror, plus
//! the single mapping from internal errors to JSON-RPC 2.0 error codes so
//! that every transport reports failures identically.

use thiserror::Error;

/// Main error type for Clio operations
#[derive(Error, Debug)]
pub enum ClioError {
    /// Document store operation failed
    #[error("Document store error: {0}")]
    Store(String),

    /// Blob store operation failed
    #[error("Blob store error: {0}")]
    Blob(String),

    /// Requested document, blob, or tool target does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Tool arguments failed validation
    #[error("Invalid params: {0}")]
    InvalidParams(String),

    /// `tools/call` named a tool that is not registered
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    /// MCP protocol violation (bad envelope, bad URI scheme, etc.)
    #[error("MCP protocol error: {0}")]
    McpProtocol(String),

    /// Serialized response exceeds the transport payload ceiling
    #[error("Response size {size} bytes exceeds limit of {limit} bytes")]
    ResponseTooLarge { size: usize, limit: usize },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// HTTP request error (bridge transport)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

/// Result type alias for Clio operations
pub type Result<T> = std::result::Result<T, ClioError>;

/// Convert anyhow::Error to ClioError
impl From<anyhow::Error> for ClioError {
    fn from(err: anyhow::Error) -> Self {
        ClioError::Other(err.to_string())
    }
}

impl ClioError {
    /// JSON-RPC 2.0 error code for this error.
    ///
    /// Not-found and validation failures map to -32602 so clients can tell
    /// them apart from infrastructure failures (-32603). The size guard
    /// carries its own application code.
    pub fn rpc_code(&self) -> i32 {
        match self {
            ClioError::NotFound(_) | ClioError::InvalidParams(_) | ClioError::UnknownTool(_) => {
                -32602
            }
            ClioError::McpProtocol(_) => -32600,
            ClioError::ResponseTooLarge { .. } => -32001,
            _ => -32603,
        }
    }
}
