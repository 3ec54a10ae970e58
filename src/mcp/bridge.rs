//! Stdio-to-HTTPS bridge
//!
//! A thin local front end for IDE clients that speak stdio MCP: each input
//! line is forwarded as a `POST /mcp` body to a remote Clio HTTP server
//! with the shared API key header, and the response body is written back
//! as one line. The same head-of-line ordering gate as the local stdio
//! server keeps the output stream in request order even though forwarded
//! calls complete out of order.

use crate::error::{ClioError, Result};
use crate::mcp::http::API_KEY_HEADER;
use crate::mcp::protocol::{JsonRpcError, JsonRpcResponse};
use crate::mcp::stdio::{serialize_response, ResponseSequencer};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, error, info};

/// Stdio front end forwarding to a remote MCP endpoint over HTTPS
#[derive(Clone)]
pub struct HttpBridge {
    endpoint: String,
    api_key: Option<String>,
    client: reqwest::Client,
}

impl HttpBridge {
    /// Create a bridge targeting `endpoint` (the full `/mcp` URL)
    pub fn new(endpoint: impl Into<String>, api_key: Option<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(ClioError::Http)?;
        Ok(Self {
            endpoint: endpoint.into(),
            api_key,
            client,
        })
    }

    /// Forward one request line; `None` means the remote treated it as a
    /// notification (no body to emit).
    async fn forward(&self, line: &str) -> Option<String> {
        let mut request = self
            .client
            .post(&self.endpoint)
            .header("content-type", "application/json")
            .body(line.to_string());
        if let Some(key) = &self.api_key {
            request = request.header(API_KEY_HEADER, key);
        }

        let response = match request.send().await {
            Ok(r) => r,
            Err(e) => {
                error!("Failed to forward request: {}", e);
                return Some(serialize_response(JsonRpcResponse::error(
                    None,
                    JsonRpcError::internal_error(format!("Bridge forwarding failed: {}", e)),
                )));
            }
        };

        if response.status() == reqwest::StatusCode::ACCEPTED {
            return None;
        }

        match response.text().await {
            Ok(body) if body.trim().is_empty() => None,
            Ok(body) => Some(body.trim().to_string()),
            Err(e) => Some(serialize_response(JsonRpcResponse::error(
                None,
                JsonRpcError::internal_error(format!("Bridge response read failed: {}", e)),
            ))),
        }
    }

    /// Run the bridge, processing stdin until a termination signal
    pub async fn run(&self) -> Result<()> {
        info!("MCP bridge started, forwarding to {}", self.endpoint);

        let stdin = tokio::io::stdin();
        let mut reader = BufReader::new(stdin);

        let (tx, mut rx) = mpsc::unbounded_channel::<(u64, Option<String>)>();

        let writer = tokio::spawn(async move {
            let mut stdout = tokio::io::stdout();
            let mut sequencer = ResponseSequencer::new();

            while let Some((seq, response)) = rx.recv().await {
                for line in sequencer.push(seq, response) {
                    if stdout.write_all(line.as_bytes()).await.is_err()
                        || stdout.write_all(b"\n").await.is_err()
                        || stdout.flush().await.is_err()
                    {
                        error!("Failed to write bridged response");
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
                        tokio::time::sleep(Duration::from_millis(250)).await;
                    }
                    Ok(_) => {
                        let trimmed = line.trim();
                        if trimmed.is_empty() {
                            continue;
                        }

                        debug!("Forwarding request: {}", trimmed);

                        let bridge = self.clone();
                        let request = trimmed.to_string();
                        let tx = tx.clone();
                        let this_seq = seq;
                        seq += 1;

                        tokio::spawn(async move {
                            let response = bridge.forward(&request).await;
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

        info!("MCP bridge shutting down");
        Ok(())
    }
}
