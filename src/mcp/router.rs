//! MCP protocol request router
//!
//! Converts one raw request into at most one response per JSON-RPC 2.0
//! semantics: parses and validates the envelope, dispatches by method name
//! against a fixed table, wraps handler results and errors, and runs every
//! outgoing response through the size guard. Transport-agnostic; the stdio
//! server, the HTTP server, and the tests all feed this same entry point.

use crate::error::ClioError;
use crate::mcp::pagination::SizeGuard;
use crate::mcp::protocol::{JsonRpcError, JsonRpcRequest, JsonRpcResponse};
use crate::mcp::tools::ToolHandler;
use serde_json::{json, Value};
use tracing::{debug, warn};

/// Baseline MCP protocol version offered when the client does not send one
pub const BASELINE_PROTOCOL_VERSION: &str = "2024-11-05";

/// Fixed table of built-in methods (everything else is -32601)
const METHODS: &[&str] = &[
    "initialize",
    "tools/list",
    "tools/call",
    "resources/list",
    "resources/read",
    "prompts/list",
    "prompts/get",
    "sampling/createMessage",
];

/// MCP request router
pub struct McpRouter {
    tools: ToolHandler,
    size_guard: SizeGuard,
}

impl McpRouter {
    /// Create a new router over a tool dispatch table
    pub fn new(tools: ToolHandler, size_guard: SizeGuard) -> Self {
        Self { tools, size_guard }
    }

    /// Process one raw request line.
    ///
    /// Returns `None` for notification-shaped requests: the caller must not
    /// write anything to the response channel. Malformed JSON yields a
    /// parse-error response with a null id.
    pub async fn handle_line(&self, line: &str) -> Option<JsonRpcResponse> {
        let request: JsonRpcRequest = match serde_json::from_str(line) {
            Ok(req) => req,
            Err(e) => {
                return Some(JsonRpcResponse::error(
                    None,
                    JsonRpcError::parse_error(format!("Invalid JSON: {}", e)),
                ));
            }
        };
        self.handle_request(request).await
    }

    /// Process one parsed request
    pub async fn handle_request(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        if request.jsonrpc != "2.0" {
            return Some(JsonRpcResponse::error(
                request.id,
                JsonRpcError::invalid_request("jsonrpc must be '2.0'"),
            ));
        }

        if request.is_notification() {
            debug!("Notification received: {}", request.method);
            return None;
        }

        let response = self.dispatch(request).await;
        Some(self.guard_size(response))
    }

    async fn dispatch(&self, request: JsonRpcRequest) -> JsonRpcResponse {
        match request.method.as_str() {
            "initialize" => self.handle_initialize(request),
            "tools/list" => self.handle_tools_list(request),
            "tools/call" => self.handle_tools_call(request).await,
            "resources/list" => self.handle_resources_list(request).await,
            "resources/read" => self.handle_resources_read(request).await,
            "prompts/list" => JsonRpcResponse::success(request.id, json!({ "prompts": [] })),
            "prompts/get" => JsonRpcResponse::error(
                request.id,
                JsonRpcError::invalid_params("no prompts are defined by this server"),
            ),
            // Recognized but unsupported by design: this server has no
            // model access of its own.
            "sampling/createMessage" => JsonRpcResponse::error(
                request.id,
                JsonRpcError {
                    code: -32601,
                    message: "sampling/createMessage is not supported by this server".to_string(),
                    data: None,
                },
            ),
            method => {
                debug_assert!(!METHODS.contains(&method));
                JsonRpcResponse::error(request.id, JsonRpcError::method_not_found(method))
            }
        }
    }

    /// Re-serialize the outgoing response and enforce the transport payload
    /// ceiling, replacing an oversized body with the distinguished
    /// size-limit error instead of truncating it.
    fn guard_size(&self, response: JsonRpcResponse) -> JsonRpcResponse {
        let serialized = match serde_json::to_string(&response) {
            Ok(s) => s,
            Err(e) => {
                return JsonRpcResponse::error(
                    response.id,
                    JsonRpcError::internal_error(format!("Serialization error: {}", e)),
                );
            }
        };

        match self.size_guard.check(&serialized) {
            Ok(()) => response,
            Err(ClioError::ResponseTooLarge { size, limit }) => {
                warn!(
                    "Rejecting oversized response ({} bytes > {} bytes)",
                    size, limit
                );
                JsonRpcResponse::error(response.id, JsonRpcError::response_too_large(size, limit))
            }
            Err(e) => JsonRpcResponse::error(
                response.id,
                JsonRpcError::internal_error(e.to_string()),
            ),
        }
    }

    /// Handle initialize request.
    ///
    /// Version negotiation is permissive: the caller's protocol version is
    /// echoed back (baseline when absent) rather than rejected, for
    /// forward/backward compatibility with evolving clients. Stateless and
    /// idempotent; calling it again returns the same serverInfo.
    fn handle_initialize(&self, request: JsonRpcRequest) -> JsonRpcResponse {
        debug!("Handling initialize");

        let protocol_version = request
            .params
            .get("protocolVersion")
            .and_then(|v| v.as_str())
            .unwrap_or(BASELINE_PROTOCOL_VERSION)
            .to_string();

        JsonRpcResponse::success(
            request.id,
            json!({
                "protocolVersion": protocol_version,
                "serverInfo": {
                    "name": "clio",
                    "version": env!("CARGO_PKG_VERSION")
                },
                "capabilities": {
                    "tools": {},
                    "resources": {},
                    "prompts": {}
                }
            }),
        )
    }

    /// Handle tools/list request
    fn handle_tools_list(&self, request: JsonRpcRequest) -> JsonRpcResponse {
        debug!("Handling tools/list");

        JsonRpcResponse::success(
            request.id,
            json!({ "tools": self.tools.list_tools() }),
        )
    }

    /// Handle tools/call request.
    ///
    /// Successful tool results are wrapped a second time into the MCP
    /// content-block envelope. The double wrapping is deliberate:
    /// `tools/call` is generic text/content-based while the tools return
    /// structured JSON, and clients depend on the outer shape.
    async fn handle_tools_call(&self, request: JsonRpcRequest) -> JsonRpcResponse {
        debug!("Handling tools/call");

        let params = match request.params.as_object() {
            Some(obj) => obj,
            None => {
                return JsonRpcResponse::error(
                    request.id,
                    JsonRpcError::invalid_params("params must be an object"),
                );
            }
        };

        let tool_name = match params.get("name").and_then(|v| v.as_str()) {
            Some(name) => name,
            None => {
                return JsonRpcResponse::error(
                    request.id,
                    JsonRpcError::invalid_params("missing 'name' field"),
                );
            }
        };

        let arguments = params
            .get("arguments")
            .cloned()
            .unwrap_or(Value::Object(serde_json::Map::new()));

        match self.tools.execute(tool_name, arguments).await {
            Ok(result) => JsonRpcResponse::success(
                request.id,
                json!({
                    "content": [
                        {
                            "type": "text",
                            "text": serde_json::to_string_pretty(&result)
                                .unwrap_or_else(|_| result.to_string())
                        }
                    ]
                }),
            ),
            Err(e) => JsonRpcResponse::error(request.id, Self::tool_error(e)),
        }
    }

    /// Map a tool failure to its JSON-RPC error, preserving the underlying
    /// message in `data` for infrastructure failures.
    fn tool_error(err: ClioError) -> JsonRpcError {
        let code = err.rpc_code();
        let message = err.to_string();
        if code == -32603 {
            JsonRpcError::internal_error("Tool execution failed")
                .with_data(json!({ "cause": message }))
        } else {
            JsonRpcError {
                code,
                message,
                data: None,
            }
        }
    }

    /// Handle resources/list: non-endpoint documents as URI-addressable
    /// resources.
    async fn handle_resources_list(&self, request: JsonRpcRequest) -> JsonRpcResponse {
        debug!("Handling resources/list");

        match self.tools.list_resource_descriptors().await {
            Ok(resources) => {
                JsonRpcResponse::success(request.id, json!({ "resources": resources }))
            }
            Err(e) => JsonRpcResponse::error(request.id, Self::tool_error(e)),
        }
    }

    /// Handle resources/read for `doc://<id>` URIs
    async fn handle_resources_read(&self, request: JsonRpcRequest) -> JsonRpcResponse {
        debug!("Handling resources/read");

        let uri = match request.params.get("uri").and_then(|v| v.as_str()) {
            Some(uri) => uri,
            None => {
                return JsonRpcResponse::error(
                    request.id,
                    JsonRpcError::invalid_params("missing 'uri' field"),
                );
            }
        };

        match self.tools.read_resource(uri).await {
            Ok(contents) => {
                JsonRpcResponse::success(request.id, json!({ "contents": [contents] }))
            }
            Err(e) => JsonRpcResponse::error(request.id, Self::tool_error(e)),
        }
    }
}
