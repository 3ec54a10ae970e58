//! Typed document access over the raw key-value adapter
//!
//! `DocCatalog` is the one layer every tool handler goes through. It owns
//! the single-table key convention (DOCUMENT/TAG/CATEGORY/STATS partitions)
//! and applies the soft-delete filter in exactly one place, so no listing
//! or lookup path can accidentally surface a `deleted`-flagged row.

use crate::error::Result;
use crate::store::DocumentStore;
use crate::types::{partitions, DocCategory, Document};
use serde_json::json;
use std::sync::Arc;
use tracing::warn;

/// Typed catalog over an injected [`DocumentStore`]
#[derive(Clone)]
pub struct DocCatalog {
    store: Arc<dyn DocumentStore>,
}

impl DocCatalog {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Fetch one document by id. Soft-deleted documents read as absent.
    pub async fn get_document(&self, id: &str) -> Result<Option<Document>> {
        let item = self.store.get_item(partitions::DOCUMENT, id).await?;
        match item {
            Some(value) => match serde_json::from_value::<Document>(value) {
                Ok(doc) if doc.is_deleted() => Ok(None),
                Ok(doc) => Ok(Some(doc)),
                Err(e) => {
                    warn!("Undecodable document row for id {}: {}", id, e);
                    Ok(None)
                }
            },
            None => Ok(None),
        }
    }

    /// Store a document (full overwrite) together with its category and tag
    /// index entries.
    pub async fn put_document(&self, doc: &Document) -> Result<()> {
        let body = serde_json::to_value(doc)?;
        self.store
            .put_item(partitions::DOCUMENT, &doc.id, &body)
            .await?;

        let category_key = format!("{}#{}", doc.category, doc.id);
        self.store
            .put_item(
                partitions::CATEGORY,
                &category_key,
                &json!({"id": doc.id, "category": doc.category}),
            )
            .await?;

        for tag in &doc.tags {
            let tag_key = format!("{}#{}", tag, doc.id);
            self.store
                .put_item(
                    partitions::TAG,
                    &tag_key,
                    &json!({"id": doc.id, "tag": tag}),
                )
                .await?;
        }

        Ok(())
    }

    /// All live documents. Rows that fail to decode are skipped with a
    /// warning rather than failing the whole listing.
    pub async fn all_documents(&self) -> Result<Vec<Document>> {
        let items = self.store.query_partition(partitions::DOCUMENT).await?;
        let mut docs = Vec::with_capacity(items.len());
        for item in items {
            match serde_json::from_value::<Document>(item) {
                Ok(doc) if doc.is_deleted() => {}
                Ok(doc) => docs.push(doc),
                Err(e) => warn!("Skipping undecodable document row: {}", e),
            }
        }
        Ok(docs)
    }

    /// Live documents in one category
    pub async fn documents_in_category(&self, category: DocCategory) -> Result<Vec<Document>> {
        let mut docs = self.all_documents().await?;
        docs.retain(|d| d.category == category);
        Ok(docs)
    }

    /// Record a bookkeeping counter under the STATS partition
    pub async fn record_stat(&self, name: &str, count: usize) -> Result<()> {
        self.store
            .put_item(partitions::STATS, name, &json!({"name": name, "count": count}))
            .await
    }
}
