//! LibSQL document store backend
//!
//! Persists the single-table key-value design: one `doc_items` table keyed
//! by (partition, sort key), where one physical table serves multiple
//! logical indexes via key convention.

use crate::error::{ClioError, Result};
use crate::store::DocumentStore;
use async_trait::async_trait;
use chrono::Utc;
use libsql::{params, Builder, Connection, Database};
use serde_json::Value;
use tracing::{debug, info};

/// Database connection mode
#[derive(Debug, Clone)]
pub enum ConnectionMode {
    /// Local file-based database
    Local(String),
    /// In-memory database (for testing)
    InMemory,
}

/// LibSQL-backed document store
#[derive(Debug)]
pub struct LibsqlDocumentStore {
    db: Database,
}

impl LibsqlDocumentStore {
    /// Validate a local database file before opening.
    ///
    /// SQLite files start with the 16-byte header "SQLite format 3\0";
    /// anything else is corruption and gets an actionable message instead
    /// of an opaque open failure later.
    fn validate_database_file(db_path: &str, must_exist: bool) -> Result<bool> {
        let path = std::path::Path::new(db_path);

        if !path.exists() {
            if must_exist {
                return Err(ClioError::Store(format!(
                    "Database file not found at '{}'. Run 'clio init' first.",
                    db_path
                )));
            }
            return Ok(false);
        }

        let bytes = std::fs::read(path).map_err(|e| {
            ClioError::Store(format!("Cannot read database file at '{}': {}", db_path, e))
        })?;

        if bytes.len() < 16 || &bytes[0..16] != b"SQLite format 3\0" {
            return Err(ClioError::Store(format!(
                "Database file at '{}' is corrupted or not a valid SQLite database. \
                 Delete it and run 'clio init' to reinitialize.",
                db_path
            )));
        }

        debug!("Database file validation passed: {}", db_path);
        Ok(true)
    }

    /// Open a document store.
    ///
    /// With `create_if_missing` false the database must already exist
    /// (secure by default); `clio init` opens with it set to true.
    pub async fn new_with_validation(mode: ConnectionMode, create_if_missing: bool) -> Result<Self> {
        info!(
            "Connecting to document store: {:?} (create_if_missing: {})",
            mode, create_if_missing
        );

        let db = match mode {
            ConnectionMode::Local(ref path) => {
                let exists = Self::validate_database_file(path, !create_if_missing)?;

                if create_if_missing && !exists {
                    if let Some(parent) = std::path::Path::new(path).parent() {
                        std::fs::create_dir_all(parent).map_err(|e| {
                            ClioError::Store(format!(
                                "Failed to create database directory {}: {}",
                                parent.display(),
                                e
                            ))
                        })?;
                    }
                }

                Builder::new_local(path).build().await.map_err(|e| {
                    ClioError::Store(format!("Failed to open local database: {}", e))
                })?
            }
            ConnectionMode::InMemory => Builder::new_local(":memory:")
                .build()
                .await
                .map_err(|e| {
                    ClioError::Store(format!("Failed to create in-memory database: {}", e))
                })?,
        };

        let store = Self { db };
        store.init_schema().await?;
        Ok(store)
    }

    /// Open an existing document store (database must exist)
    pub async fn new(mode: ConnectionMode) -> Result<Self> {
        Self::new_with_validation(mode, false).await
    }

    fn get_conn(&self) -> Result<Connection> {
        self.db
            .connect()
            .map_err(|e| ClioError::Store(format!("Failed to get connection: {}", e)))
    }

    /// Create the single table and its partition index. Idempotent; safe to
    /// repeat on every startup.
    async fn init_schema(&self) -> Result<()> {
        let conn = self.get_conn()?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS doc_items (
                partition_key TEXT NOT NULL,
                sort_key TEXT NOT NULL,
                body TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                PRIMARY KEY (partition_key, sort_key)
            )",
            params![],
        )
        .await
        .map_err(|e| ClioError::Store(format!("Failed to create doc_items table: {}", e)))?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_doc_items_partition
             ON doc_items(partition_key)",
            params![],
        )
        .await
        .map_err(|e| ClioError::Store(format!("Failed to create partition index: {}", e)))?;

        debug!("Document store schema ready");
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for LibsqlDocumentStore {
    async fn get_item(&self, partition: &str, sort_key: &str) -> Result<Option<Value>> {
        let conn = self.get_conn()?;

        let mut rows = conn
            .query(
                "SELECT body FROM doc_items WHERE partition_key = ? AND sort_key = ?",
                params![partition, sort_key],
            )
            .await
            .map_err(|e| ClioError::Store(format!("Query failed: {}", e)))?;

        match rows
            .next()
            .await
            .map_err(|e| ClioError::Store(format!("Row fetch failed: {}", e)))?
        {
            Some(row) => {
                let body: String = row
                    .get(0)
                    .map_err(|e| ClioError::Store(format!("Column decode failed: {}", e)))?;
                let value = serde_json::from_str(&body)?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    async fn put_item(&self, partition: &str, sort_key: &str, item: &Value) -> Result<()> {
        let conn = self.get_conn()?;
        let body = serde_json::to_string(item)?;
        let now = Utc::now().to_rfc3339();

        conn.execute(
            "INSERT OR REPLACE INTO doc_items (partition_key, sort_key, body, updated_at)
             VALUES (?, ?, ?, ?)",
            params![partition, sort_key, body, now],
        )
        .await
        .map_err(|e| ClioError::Store(format!("Insert failed: {}", e)))?;

        Ok(())
    }

    async fn query_partition(&self, partition: &str) -> Result<Vec<Value>> {
        let conn = self.get_conn()?;

        let mut rows = conn
            .query(
                "SELECT body FROM doc_items WHERE partition_key = ? ORDER BY sort_key",
                params![partition],
            )
            .await
            .map_err(|e| ClioError::Store(format!("Query failed: {}", e)))?;

        let mut items = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| ClioError::Store(format!("Row fetch failed: {}", e)))?
        {
            let body: String = row
                .get(0)
                .map_err(|e| ClioError::Store(format!("Column decode failed: {}", e)))?;
            items.push(serde_json::from_str(&body)?);
        }

        Ok(items)
    }
}
