//! Storage layer for the Clio documentation server
//!
//! Provides thin adapters over a key-value document table and a named blob
//! store. The adapters are convention-free: partition/sort-key meaning lives
//! in caller code (see [`crate::types::partitions`]), and the typed access
//! layer with the central soft-delete filter is [`catalog::DocCatalog`].

pub mod blob;
pub mod catalog;
pub mod libsql;
pub mod memory;

use crate::error::Result;
use async_trait::async_trait;
use serde_json::Value;

/// Key-value document store adapter.
///
/// A missing item is `Ok(None)`, distinguishable from an infrastructure
/// failure, so callers can map it to the correct JSON-RPC error code.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetch one item by (partition, sort key)
    async fn get_item(&self, partition: &str, sort_key: &str) -> Result<Option<Value>>;

    /// Insert or fully overwrite one item (no merge semantics)
    async fn put_item(&self, partition: &str, sort_key: &str, item: &Value) -> Result<()>;

    /// Fetch all items in a partition
    async fn query_partition(&self, partition: &str) -> Result<Vec<Value>>;
}

/// Named byte-blob store adapter (markdown content).
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Fetch a blob by path; `Ok(None)` when absent
    async fn get(&self, path: &str) -> Result<Option<Vec<u8>>>;

    /// Store a blob, overwriting any existing one
    async fn put(&self, path: &str, bytes: &[u8], content_type: &str) -> Result<()>;
}

pub use blob::FsBlobStore;
pub use catalog::DocCatalog;
pub use libsql::{ConnectionMode, LibsqlDocumentStore};
pub use memory::{MemoryBlobStore, MemoryDocumentStore};
