//! In-memory store implementations
//!
//! Used by tests and local fixtures. Both stores are dependency-injected
//! behind the same traits as the persistent backends, so the router and
//! tools cannot tell the difference.

use crate::error::Result;
use crate::store::{BlobStore, DocumentStore};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// In-memory key-value document store
#[derive(Default)]
pub struct MemoryDocumentStore {
    // partition -> sort_key -> item
    items: RwLock<HashMap<String, HashMap<String, Value>>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn get_item(&self, partition: &str, sort_key: &str) -> Result<Option<Value>> {
        let items = self.items.read().await;
        Ok(items
            .get(partition)
            .and_then(|p| p.get(sort_key))
            .cloned())
    }

    async fn put_item(&self, partition: &str, sort_key: &str, item: &Value) -> Result<()> {
        let mut items = self.items.write().await;
        items
            .entry(partition.to_string())
            .or_default()
            .insert(sort_key.to_string(), item.clone());
        Ok(())
    }

    async fn query_partition(&self, partition: &str) -> Result<Vec<Value>> {
        let items = self.items.read().await;
        Ok(items
            .get(partition)
            .map(|p| p.values().cloned().collect())
            .unwrap_or_default())
    }
}

/// In-memory blob store
#[derive(Default)]
pub struct MemoryBlobStore {
    blobs: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn get(&self, path: &str) -> Result<Option<Vec<u8>>> {
        let blobs = self.blobs.read().await;
        Ok(blobs.get(path).cloned())
    }

    async fn put(&self, path: &str, bytes: &[u8], _content_type: &str) -> Result<()> {
        let mut blobs = self.blobs.write().await;
        blobs.insert(path.to_string(), bytes.to_vec());
        Ok(())
    }
}
