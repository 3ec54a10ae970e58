//! MCP server with stdio transport
//!
//! Reads line-delimited JSON-RPC from stdin and writes responses to stdout.
//! Requests are handled concurrently (one task each), but responses are
//! emitted in the order their requests arrived: completed responses wait in
//! a [`ResponseSequencer`] until all earlier-numbered in-flight responses
//! have been flushed, then release as a contiguous run.
//!
//! A closed stdin does not terminate the process; only an explicit
//! termination signal does.

use crate::error::Result;
use crate::mcp::protocol::{JsonRpcError, JsonRpcResponse};
use crate::mcp::router::McpRouter;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, error, info};

/// Head-of-line ordering gate for out-of-order async completions.
///
/// Responses are registered under the sequence number of their request;
/// `push` returns the contiguous run of lines that became ready to flush.
/// Notification slots carry `None` and release nothing when drained.
pub struct ResponseSequencer {
    next_seq: u64,
    pending: BTreeMap<u64, Option<String>>,
}

impl ResponseSequencer {
    pub fn new() -> Self {
        Self {
            next_seq: 0,
            pending: BTreeMap::new(),
        }
    }

    /// Register a completed response and collect everything now flushable
    pub fn push(&mut self, seq: u64, response: Option<String>) -> Vec<String> {
        self.pending.insert(seq, response);

        let mut ready = Vec::new();
        while let Some(slot) = self.pending.remove(&self.next_seq) {
            if let Some(line) = slot {
                ready.push(line);
            }
            self.next_seq += 1;
        }
        ready
    }

    /// Whether any completed responses are still held back
    pub fn is_drained(&self) -> bool {
        self.pending.is_empty()
    }
}

impl Default for ResponseSequencer {
    fn default() -> Self {
        Self::new()
    }
}

/// Serialize a response, falling back to a well-formed internal error
/// envelope if serialization itself fails.
pub(crate) fn serialize_response(response: JsonRpcResponse) -> String {
    serde_json::to_string(&response).unwrap_or_else(|e| {
        error!("Failed to serialize response: {}", e);
        serde_json::to_string(&JsonRpcResponse::error(
            None,
            JsonRpcError::internal_error(format!("Serialization error: {}", e)),
        ))
        .unwrap()
    })
}

/// MCP server that handles JSON-RPC requests over stdio
pub struct StdioServer {
    router: Arc<McpRouter>,
}

impl StdioServer {
    /// Create a new stdio server
    pub fn new(router: McpRouter) -> Self {
        Self {
            router: Arc::new(router),
        }
    }

    /// Run the server, processing stdin until a termination signal
    pub async fn run(&self) -> Result<()> {
        info!("MCP server started, listening on stdin...");

        let stdin = tokio::io::stdin();
        let mut reader = BufReader::new(stdin);

        let (tx, mut rx) = mpsc::unbounded_channel::<(u64, Option<String>)>();

        // Writer task owns stdout and the ordering gate
        let writer = tokio::spawn(async move {
            let mut stdout = tokio::io::stdout();
            let mut sequencer = ResponseSequencer::new();

            while let Some((seq, response)) = rx.recv().await {
                for line in sequencer.push(seq, response) {
                    debug!("Sending response: {}", line);
                    if let Err(e) = stdout.write_all(line.as_bytes()).await {
                        error!("Failed to write response: {}", e);
                        return;
                    }
                    if let Err(e) = stdout.write_all(b"\n").await {
                        error!("Failed to write newline: {}", e);
                        return;
                    }
                    if let Err(e) = stdout.flush().await {
                        error!("Failed to flush stdout: {}", e);
                        return;
                    }
                }
            }
        });

        let mut seq: u64 = 0;
        let mut line = String::new();

        loop {
            line.clear();

            tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    info!("Received termination signal, shutting down");
                    break;
                }
                read = reader.read_line(&mut line) => match read {
                    Ok(0) => {
                        // EOF is not fatal for a long-lived local bridge;
                        // idle until input resumes or we get a signal.
                        tokio::time::sleep(Duration::from_millis(250)).await;
                    }
                    Ok(_) => {
                        let trimmed = line.trim();
                        if trimmed.is_empty() {
                            continue;
                        }

                        debug!("Received request: {}", trimmed);

                        let request = trimmed.to_string();
                        let router = Arc::clone(&self.router);
                        let tx = tx.clone();
                        let this_seq = seq;
                        seq += 1;

                        tokio::spawn(async move {
                            let response =
                                router.handle_line(&request).await.map(serialize_response);
                            let _ = tx.send((this_seq, response));
                        });
                    }
                    Err(e) => {
                        error!("Failed to read from stdin: {}", e);
                        tokio::time::sleep(Duration::from_millis(250)).await;
                    }
                }
            }
        }

        drop(tx);
        let _ = writer.await;

        info!("MCP server shutting down");
        Ok(())
    }
}
