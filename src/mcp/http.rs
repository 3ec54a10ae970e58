//! MCP server with HTTP transport
//!
//! Receives JSON-RPC request bodies via `POST /mcp` (the path a request/
//! response gateway forwards to) and returns the JSON-RPC envelope in the
//! body with status 200 regardless of logical success or failure — including
//! the size-guard rejection, which is deliberately in-body rather than an
//! HTTP error. Each invocation is stateless; no session survives a request.

use crate::error::{ClioError, Result};
use crate::mcp::router::McpRouter;
use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};

/// Header carrying the shared API key
pub const API_KEY_HEADER: &str = "x-api-key";

/// HTTP transport configuration
#[derive(Debug, Clone)]
pub struct HttpServerConfig {
    /// Bind address, e.g. "127.0.0.1:8080"
    pub bind: String,
    /// Shared API key; `None` disables the check
    pub api_key: Option<String>,
}

/// Shared application state passed to the route handlers
#[derive(Clone)]
struct AppState {
    router: Arc<McpRouter>,
    api_key: Option<String>,
}

/// MCP server over HTTP
pub struct HttpServer {
    config: HttpServerConfig,
    router: Arc<McpRouter>,
}

impl HttpServer {
    /// Create a new HTTP server
    pub fn new(router: McpRouter, config: HttpServerConfig) -> Self {
        Self {
            config,
            router: Arc::new(router),
        }
    }

    /// Build the axum application (exposed for transport tests)
    pub fn app(&self) -> Router {
        let state = AppState {
            router: Arc::clone(&self.router),
            api_key: self.config.api_key.clone(),
        };

        Router::new()
            .route("/mcp", post(handle_mcp))
            .route("/health", get(handle_health))
            .layer(CorsLayer::permissive())
            .layer(TraceLayer::new_for_http())
            .with_state(state)
    }

    /// Run the server until the process is terminated
    pub async fn run(&self) -> Result<()> {
        let listener = tokio::net::TcpListener::bind(&self.config.bind)
            .await
            .map_err(|e| {
                ClioError::Other(format!("Failed to bind {}: {}", self.config.bind, e))
            })?;

        info!("MCP HTTP server listening on http://{}", self.config.bind);

        axum::serve(listener, self.app())
            .await
            .map_err(|e| ClioError::Other(format!("HTTP server error: {}", e)))?;

        Ok(())
    }
}

/// Handler for `POST /mcp`
async fn handle_mcp(State(state): State<AppState>, headers: HeaderMap, body: String) -> Response {
    if let Some(expected) = &state.api_key {
        let provided = headers
            .get(API_KEY_HEADER)
            .and_then(|v| v.to_str().ok());
        if provided != Some(expected.as_str()) {
            warn!("Rejected request with missing or invalid api key");
            return (
                StatusCode::UNAUTHORIZED,
                Json(json!({
                    "error": { "code": "unauthorized", "message": "missing or invalid api key" }
                })),
            )
                .into_response();
        }
    }

    match state.router.handle_line(&body).await {
        Some(response) => (StatusCode::OK, Json(response)).into_response(),
        // Notification: nothing may be written to the response channel
        None => StatusCode::ACCEPTED.into_response(),
    }
}

/// JSON response body for `GET /health`
#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

/// Health check used by the gateway and monitoring
async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
