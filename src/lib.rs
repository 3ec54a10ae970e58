//! Clio - Documentation MCP Server
//!
//! A Rust-based Model Context Protocol server that lets AI coding
//! assistants discover and fetch structured API documentation:
//! - JSON-RPC 2.0 router with a fixed method table and permissive
//!   protocol-version negotiation
//! - Documentation tools (search, endpoint/schema lookup, listings) with
//!   pagination and response-size enforcement
//! - Interchangeable stdio and HTTP transports, plus a stdio-to-HTTPS
//!   bridge for IDE clients talking to a remote deployment
//!
//! # Architecture
//!
//! The system is organized into layers:
//! - **Types**: `Document` and the single-table key conventions
//! - **Store**: key-value document and blob adapters (libsql, filesystem,
//!   in-memory fakes) behind dependency-injected traits
//! - **MCP**: protocol router, tool dispatch table, transports
//!
//! # Example
//!
//! ```ignore
//! use clio_core::mcp::{McpRouter, SizeGuard, StdioServer, ToolHandler};
//! use clio_core::store::{DocCatalog, MemoryBlobStore, MemoryDocumentStore};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> clio_core::Result<()> {
//!     let catalog = DocCatalog::new(Arc::new(MemoryDocumentStore::new()));
//!     let tools = ToolHandler::new(catalog, Arc::new(MemoryBlobStore::new()));
//!     let router = McpRouter::new(tools, SizeGuard::default());
//!     StdioServer::new(router).run().await
//! }
//! ```

pub mod config;
pub mod error;
pub mod mcp;
pub mod store;
pub mod types;

// Re-export commonly used types
pub use config::ClioConfig;
pub use error::{ClioError, Result};
pub use mcp::{McpRouter, SizeGuard, StdioServer, ToolHandler};
pub use store::{BlobStore, DocCatalog, DocumentStore};
pub use types::{DocCategory, DocStatus, Document};
