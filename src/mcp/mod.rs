//! Model Context Protocol (MCP) server implementation
//!
//! Provides a JSON-RPC 2.0 documentation server with two interchangeable
//! transports (stdio lines and HTTP POST) plus a stdio-to-HTTPS bridge,
//! all feeding the same protocol router.

pub mod bridge;
pub mod http;
pub mod pagination;
pub mod protocol;
pub mod router;
pub mod stdio;
pub mod tools;

pub use bridge::HttpBridge;
pub use http::{HttpServer, HttpServerConfig};
pub use pagination::{paginate, PageParams, Pagination, SizeGuard};
pub use protocol::{JsonRpcError, JsonRpcRequest, JsonRpcResponse};
pub use router::McpRouter;
pub use stdio::{ResponseSequencer, StdioServer};
pub use tools::{Tool, ToolHandler};
