//! Core data types for the Clio documentation server
//!
//! Defines the [`Document`] record shared by the store adapters and the MCP
//! tool handlers, plus the key-construction conventions of the single-table
//! document store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Partition values of the single-table document store.
///
/// One physical table serves multiple logical indexes by key convention.
/// The convention lives here, in caller code, not in the store adapter.
pub mod partitions {
    /// Primary document records, sort key = document id
    pub const DOCUMENT: &str = "DOCUMENT";
    /// Tag index entries, sort key = `<tag>#<document id>`
    pub const TAG: &str = "TAG";
    /// Category index entries, sort key = `<category>#<document id>`
    pub const CATEGORY: &str = "CATEGORY";
    /// Bookkeeping counters, sort key = counter name
    pub const STATS: &str = "STATS";
}

/// Sort-key prefix for schema documents (`schema-<name>`)
pub const SCHEMA_KEY_PREFIX: &str = "schema-";

/// Documentation category, determines which listing endpoints surface a document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocCategory {
    Api,
    Guide,
    Reference,
}

impl DocCategory {
    /// Parse a category filter string; `"all"` and empty mean no filter.
    pub fn parse_filter(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "api" => Some(DocCategory::Api),
            "guide" => Some(DocCategory::Guide),
            "reference" => Some(DocCategory::Reference),
            _ => None,
        }
    }
}

impl std::fmt::Display for DocCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            DocCategory::Api => "api",
            DocCategory::Guide => "guide",
            DocCategory::Reference => "reference",
        };
        write!(f, "{}", s)
    }
}

/// Document lifecycle status.
///
/// Documents are never removed from the store; webhook-driven deletion
/// flags them `deleted` and every read path filters flagged rows out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DocStatus {
    #[default]
    Active,
    Deleted,
}

/// A unit of documentation.
///
/// Content is not embedded: `content_location` references the blob store
/// and is fetched lazily by the tools that need it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    /// Unique identifier, stable across updates
    pub id: String,

    /// Category tag, immutable after creation (index entries are category-keyed)
    pub category: DocCategory,

    /// Display title
    pub title: String,

    /// Longer description, searched alongside title and tags
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Free-text tags used for filtering and substring search
    #[serde(default)]
    pub tags: Vec<String>,

    /// HTTP path, present only for endpoint documents
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// HTTP method, present only for endpoint documents
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,

    /// Blob store path of the markdown content
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_location: Option<String>,

    /// Advisory timestamp, no ordering guarantees
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<DateTime<Utc>>,

    /// Soft-delete flag
    #[serde(default)]
    pub status: DocStatus,
}

impl Document {
    /// Whether this document has been soft-deleted
    pub fn is_deleted(&self) -> bool {
        self.status == DocStatus::Deleted
    }

    /// Case-insensitive substring match over title, description, and tags
    pub fn matches_query(&self, query_lower: &str) -> bool {
        self.title.to_lowercase().contains(query_lower)
            || self
                .description
                .as_deref()
                .is_some_and(|d| d.to_lowercase().contains(query_lower))
            || self
                .tags
                .iter()
                .any(|t| t.to_lowercase().contains(query_lower))
    }
}

/// Build the document-store sort key for an endpoint lookup.
///
/// Path separators normalize to `-` (leading/trailing separators trimmed)
/// and the lowercased method is appended when given:
/// `/api/v1/users` + `GET` → `api-v1-users-get`.
pub fn endpoint_key(path: &str, method: Option<&str>) -> String {
    let normalized = path.trim_matches('/').replace('/', "-");
    match method {
        Some(m) if !m.is_empty() => format!("{}-{}", normalized, m.to_lowercase()),
        _ => normalized,
    }
}

/// Build the document-store sort key for a schema lookup:
/// `UserProfile` → `schema-userprofile`.
pub fn schema_key(name: &str) -> String {
    format!("{}{}", SCHEMA_KEY_PREFIX, name.to_lowercase())
}
