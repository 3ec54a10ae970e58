//! MCP tool implementations
//!
//! Provides the 8 documentation tools exposed through `tools/call`:
//! search, endpoint/schema/document lookups, and the category listings.
//! Each tool validates its arguments by deserializing into a typed params
//! struct at the dispatch boundary, so the handler bodies can assume
//! well-formed input.

use crate::error::{ClioError, Result};
use crate::mcp::pagination::{paginate, PageParams};
use crate::store::{BlobStore, DocCatalog};
use crate::types::{endpoint_key, schema_key, DocCategory, Document, SCHEMA_KEY_PREFIX};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::debug;

/// Tool schema definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tool {
    /// Tool name (e.g., "search_documentation")
    pub name: String,

    /// Human-readable description
    pub description: String,

    /// JSON Schema for input parameters
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

/// A single search hit. The score is constant: matching is substring-based
/// with no ranking.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct SearchHit {
    id: String,
    title: String,
    category: DocCategory,
    tags: Vec<String>,
    score: f32,
}

/// Summary row returned by `list_endpoints`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct EndpointSummary {
    id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    method: Option<String>,
    title: String,
    tags: Vec<String>,
}

/// Summary row returned by the guide/reference listings
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct DocSummary {
    id: String,
    title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    tags: Vec<String>,
}

/// Tool handler that dispatches to the appropriate implementation
pub struct ToolHandler {
    catalog: DocCatalog,
    blobs: Arc<dyn BlobStore>,
}

/// Deserialize tool arguments, mapping serde's error text (which names the
/// missing field) to an invalid-params error.
fn parse_params<T: serde::de::DeserializeOwned>(params: Value) -> Result<T> {
    serde_json::from_value(params).map_err(|e| ClioError::InvalidParams(e.to_string()))
}

impl ToolHandler {
    /// Create a new tool handler over injected store adapters
    pub fn new(catalog: DocCatalog, blobs: Arc<dyn BlobStore>) -> Self {
        Self { catalog, blobs }
    }

    /// Get list of all available tools
    pub fn list_tools(&self) -> Vec<Tool> {
        let page_props = json!({
            "page": {
                "type": "integer",
                "description": "Zero-based page index",
                "default": 0
            },
            "pageSize": {
                "type": "integer",
                "description": "Items per page (1-100)",
                "default": 50
            }
        });

        vec![
            Tool {
                name: "search_documentation".to_string(),
                description: "Search documentation by case-insensitive substring over titles, descriptions, and tags.".to_string(),
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "query": {
                            "type": "string",
                            "description": "Substring to search for"
                        },
                        "category": {
                            "type": "string",
                            "enum": ["api", "guide", "reference", "all"],
                            "description": "Restrict the search to one category; 'all' or omitted searches everything"
                        },
                        "page": page_props["page"],
                        "pageSize": page_props["pageSize"]
                    },
                    "required": ["query"]
                }),
            },
            Tool {
                name: "get_endpoint_details".to_string(),
                description: "Get full documentation for one API endpoint by path and optional HTTP method.".to_string(),
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "endpoint": {
                            "type": "string",
                            "description": "Endpoint path, e.g. /api/v1/users"
                        },
                        "method": {
                            "type": "string",
                            "description": "HTTP method, e.g. GET"
                        }
                    },
                    "required": ["endpoint"]
                }),
            },
            Tool {
                name: "list_endpoints".to_string(),
                description: "List API endpoint documents, optionally filtered by tag.".to_string(),
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "tag": {
                            "type": "string",
                            "description": "Only endpoints carrying this tag"
                        },
                        "category": {
                            "type": "string",
                            "description": "Category filter (endpoints live in 'api')"
                        },
                        "page": page_props["page"],
                        "pageSize": page_props["pageSize"]
                    }
                }),
            },
            Tool {
                name: "get_schema".to_string(),
                description: "Get a named data schema document.".to_string(),
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "schemaName": {
                            "type": "string",
                            "description": "Schema name, e.g. UserProfile"
                        },
                        "format": {
                            "type": "string",
                            "enum": ["typescript", "json"],
                            "description": "Preferred rendering of the schema"
                        }
                    },
                    "required": ["schemaName"]
                }),
            },
            Tool {
                name: "list_schemas".to_string(),
                description: "List available data schema documents.".to_string(),
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "page": page_props["page"],
                        "pageSize": page_props["pageSize"]
                    }
                }),
            },
            Tool {
                name: "list_guides".to_string(),
                description: "List guide documents.".to_string(),
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "page": page_props["page"],
                        "pageSize": page_props["pageSize"]
                    }
                }),
            },
            Tool {
                name: "list_resources".to_string(),
                description: "List reference documents.".to_string(),
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "page": page_props["page"],
                        "pageSize": page_props["pageSize"]
                    }
                }),
            },
            Tool {
                name: "get_document".to_string(),
                description: "Get one document by id, including its content.".to_string(),
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "id": {
                            "type": "string",
                            "description": "Document id"
                        }
                    },
                    "required": ["id"]
                }),
            },
        ]
    }

    /// Execute a tool call
    pub async fn execute(&self, tool_name: &str, params: Value) -> Result<Value> {
        debug!("Executing tool: {}", tool_name);

        match tool_name {
            "search_documentation" => self.search_documentation(params).await,
            "get_endpoint_details" => self.get_endpoint_details(params).await,
            "list_endpoints" => self.list_endpoints(params).await,
            "get_schema" => self.get_schema(params).await,
            "list_schemas" => self.list_schemas(params).await,
            "list_guides" => self.list_guides(params).await,
            "list_resources" => self.list_resources(params).await,
            "get_document" => self.get_document(params).await,
            _ => Err(ClioError::UnknownTool(tool_name.to_string())),
        }
    }

    /// Fetch a document's markdown content from the blob store.
    ///
    /// A document without a content location yields `None`; a dangling
    /// location is a distinguishable not-found, not an internal error.
    async fn fetch_content(&self, doc: &Document) -> Result<Option<String>> {
        let Some(location) = doc.content_location.as_deref() else {
            return Ok(None);
        };
        match self.blobs.get(location).await? {
            Some(bytes) => Ok(Some(String::from_utf8_lossy(&bytes).into_owned())),
            None => Err(ClioError::NotFound(format!("content blob {}", location))),
        }
    }

    /// Serialize a document with its lazily fetched content attached
    fn document_with_content(doc: &Document, content: Option<String>) -> Result<Value> {
        let mut value = serde_json::to_value(doc)?;
        value["content"] = match content {
            Some(text) => Value::String(text),
            None => Value::Null,
        };
        Ok(value)
    }

    /// Resource descriptors for `resources/list`: every live non-endpoint
    /// document, addressable as `doc://<id>`.
    pub async fn list_resource_descriptors(&self) -> Result<Vec<Value>> {
        let docs = self.catalog.all_documents().await?;
        let mut resources: Vec<Value> = docs
            .iter()
            .filter(|d| !d.tags.iter().any(|t| t == "endpoint"))
            .map(|d| {
                let mut desc = json!({
                    "uri": format!("doc://{}", d.id),
                    "name": d.title,
                    "mimeType": "text/markdown"
                });
                if let Some(description) = &d.description {
                    desc["description"] = Value::String(description.clone());
                }
                desc
            })
            .collect();
        resources.sort_by(|a, b| a["uri"].as_str().cmp(&b["uri"].as_str()));
        Ok(resources)
    }

    /// Resolve a `doc://<id>` URI for `resources/read`
    pub async fn read_resource(&self, uri: &str) -> Result<Value> {
        let id = uri.strip_prefix("doc://").ok_or_else(|| {
            ClioError::InvalidParams(format!("unsupported resource uri: {}", uri))
        })?;

        let doc = self
            .catalog
            .get_document(id)
            .await?
            .ok_or_else(|| ClioError::NotFound(format!("resource {}", uri)))?;

        let content = self.fetch_content(&doc).await?.unwrap_or_default();
        Ok(json!({
            "uri": uri,
            "mimeType": "text/markdown",
            "text": content
        }))
    }

    // === Tools ===

    async fn search_documentation(&self, params: Value) -> Result<Value> {
        #[derive(Deserialize)]
        struct SearchParams {
            query: String,
            category: Option<String>,
            #[serde(flatten)]
            page: PageParams,
        }

        let params: SearchParams = parse_params(params)?;

        let category = match params.category.as_deref() {
            None | Some("all") | Some("") => None,
            Some(s) => Some(DocCategory::parse_filter(s).ok_or_else(|| {
                ClioError::InvalidParams(format!(
                    "unknown category '{}' (expected api, guide, reference, or all)",
                    s
                ))
            })?),
        };

        let docs = match category {
            Some(cat) => self.catalog.documents_in_category(cat).await?,
            None => self.catalog.all_documents().await?,
        };

        let query_lower = params.query.to_lowercase();
        let mut hits: Vec<SearchHit> = docs
            .iter()
            .filter(|d| d.matches_query(&query_lower))
            .map(|d| SearchHit {
                id: d.id.clone(),
                title: d.title.clone(),
                category: d.category,
                tags: d.tags.clone(),
                score: 1.0,
            })
            .collect();
        // Deterministic page boundaries; relevance is constant anyway
        hits.sort_by(|a, b| a.id.cmp(&b.id));

        let (page, pagination) = paginate(&hits, &params.page);

        Ok(json!({
            "results": page,
            "query": params.query,
            "pagination": pagination
        }))
    }

    async fn get_endpoint_details(&self, params: Value) -> Result<Value> {
        #[derive(Deserialize)]
        struct EndpointParams {
            endpoint: String,
            method: Option<String>,
        }

        let params: EndpointParams = parse_params(params)?;
        let key = endpoint_key(&params.endpoint, params.method.as_deref());

        let doc = self
            .catalog
            .get_document(&key)
            .await?
            .ok_or_else(|| ClioError::NotFound(format!("endpoint {}", key)))?;

        let content = self.fetch_content(&doc).await?;
        Self::document_with_content(&doc, content)
    }

    async fn list_endpoints(&self, params: Value) -> Result<Value> {
        #[derive(Deserialize)]
        struct ListEndpointsParams {
            tag: Option<String>,
            category: Option<String>,
            #[serde(flatten)]
            page: PageParams,
        }

        let params: ListEndpointsParams = parse_params(params)?;

        // Endpoints live in the api category; an explicit different
        // category filter simply yields an empty listing.
        let category = match params.category.as_deref() {
            None | Some("all") | Some("") => DocCategory::Api,
            Some(s) => DocCategory::parse_filter(s).ok_or_else(|| {
                ClioError::InvalidParams(format!("unknown category '{}'", s))
            })?,
        };

        let docs = self.catalog.documents_in_category(category).await?;
        let mut endpoints: Vec<EndpointSummary> = docs
            .iter()
            .filter(|d| d.tags.iter().any(|t| t == "endpoint"))
            .filter(|d| match params.tag.as_deref() {
                Some(tag) => d.tags.iter().any(|t| t == tag),
                None => true,
            })
            .map(|d| EndpointSummary {
                id: d.id.clone(),
                path: d.path.clone(),
                method: d.method.clone(),
                title: d.title.clone(),
                tags: d.tags.clone(),
            })
            .collect();
        endpoints.sort_by(|a, b| a.id.cmp(&b.id));

        let (page, pagination) = paginate(&endpoints, &params.page);

        Ok(json!({
            "endpoints": page,
            "pagination": pagination
        }))
    }

    async fn get_schema(&self, params: Value) -> Result<Value> {
        #[derive(Deserialize)]
        struct SchemaParams {
            #[serde(rename = "schemaName")]
            schema_name: String,
            format: Option<String>,
        }

        let params: SchemaParams = parse_params(params)?;

        let format = match params.format.as_deref() {
            None => "typescript",
            Some(f @ ("typescript" | "json")) => f,
            Some(other) => {
                return Err(ClioError::InvalidParams(format!(
                    "unknown format '{}' (expected typescript or json)",
                    other
                )))
            }
        };

        let key = schema_key(&params.schema_name);
        let doc = self
            .catalog
            .get_document(&key)
            .await?
            .ok_or_else(|| ClioError::NotFound(format!("schema {}", params.schema_name)))?;

        let content = self
            .fetch_content(&doc)
            .await?
            .ok_or_else(|| ClioError::NotFound(format!("schema content for {}", key)))?;

        Ok(json!({
            "name": params.schema_name,
            "id": doc.id,
            "title": doc.title,
            "format": format,
            "content": content
        }))
    }

    async fn list_schemas(&self, params: Value) -> Result<Value> {
        #[derive(Deserialize)]
        struct ListParams {
            #[serde(flatten)]
            page: PageParams,
        }

        let params: ListParams = parse_params(params)?;

        let docs = self.catalog.all_documents().await?;
        let mut schemas: Vec<Value> = docs
            .iter()
            .filter(|d| d.id.starts_with(SCHEMA_KEY_PREFIX))
            .map(|d| {
                json!({
                    "id": d.id,
                    "name": d.id.trim_start_matches(SCHEMA_KEY_PREFIX),
                    "title": d.title,
                    "tags": d.tags
                })
            })
            .collect();
        schemas.sort_by(|a, b| a["id"].as_str().cmp(&b["id"].as_str()));

        let (page, pagination) = paginate(&schemas, &params.page);

        Ok(json!({
            "schemas": page,
            "pagination": pagination
        }))
    }

    async fn list_guides(&self, params: Value) -> Result<Value> {
        let (guides, pagination) = self
            .list_category_summaries(params, DocCategory::Guide)
            .await?;
        Ok(json!({
            "guides": guides,
            "pagination": pagination
        }))
    }

    async fn list_resources(&self, params: Value) -> Result<Value> {
        let (resources, pagination) = self
            .list_category_summaries(params, DocCategory::Reference)
            .await?;
        Ok(json!({
            "resources": resources,
            "pagination": pagination
        }))
    }

    async fn list_category_summaries(
        &self,
        params: Value,
        category: DocCategory,
    ) -> Result<(Vec<DocSummary>, crate::mcp::pagination::Pagination)> {
        #[derive(Deserialize)]
        struct ListParams {
            #[serde(flatten)]
            page: PageParams,
        }

        let params: ListParams = parse_params(params)?;

        let docs = self.catalog.documents_in_category(category).await?;
        let mut summaries: Vec<DocSummary> = docs
            .iter()
            .map(|d| DocSummary {
                id: d.id.clone(),
                title: d.title.clone(),
                description: d.description.clone(),
                tags: d.tags.clone(),
            })
            .collect();
        summaries.sort_by(|a, b| a.id.cmp(&b.id));

        Ok(paginate(&summaries, &params.page))
    }

    async fn get_document(&self, params: Value) -> Result<Value> {
        #[derive(Deserialize)]
        struct GetDocumentParams {
            id: String,
        }

        let params: GetDocumentParams = parse_params(params)?;

        let doc = self
            .catalog
            .get_document(&params.id)
            .await?
            .ok_or_else(|| ClioError::NotFound(format!("document {}", params.id)))?;

        let content = self.fetch_content(&doc).await?;
        Self::document_with_content(&doc, content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryBlobStore, MemoryDocumentStore};
    use crate::types::DocStatus;

    fn doc(id: &str, category: DocCategory, title: &str, tags: &[&str]) -> Document {
        Document {
            id: id.to_string(),
            category,
            title: title.to_string(),
            description: None,
            tags: tags.iter().map(|t| t.to_string()).collect(),
            path: None,
            method: None,
            content_location: None,
            last_updated: None,
            status: DocStatus::Active,
        }
    }

    async fn fixture() -> ToolHandler {
        let store = Arc::new(MemoryDocumentStore::new());
        let blobs = Arc::new(MemoryBlobStore::new());
        let catalog = DocCatalog::new(store);

        let mut users = doc(
            "api-v1-users-get",
            DocCategory::Api,
            "List Users",
            &["users", "endpoint"],
        );
        users.path = Some("/api/v1/users".to_string());
        users.method = Some("GET".to_string());
        users.content_location = Some("api/users-get.md".to_string());
        catalog.put_document(&users).await.unwrap();

        let mut schema = doc(
            "schema-userprofile",
            DocCategory::Reference,
            "UserProfile Schema",
            &["schema"],
        );
        schema.content_location = Some("schemas/userprofile.md".to_string());
        catalog.put_document(&schema).await.unwrap();

        catalog
            .put_document(&doc(
                "guide-quickstart",
                DocCategory::Guide,
                "Quickstart",
                &["intro"],
            ))
            .await
            .unwrap();

        let mut removed = doc(
            "api-v1-legacy-get",
            DocCategory::Api,
            "Legacy Users",
            &["users", "endpoint"],
        );
        removed.status = DocStatus::Deleted;
        catalog.put_document(&removed).await.unwrap();

        blobs
            .put("api/users-get.md", b"# List Users\n", "text/markdown")
            .await
            .unwrap();
        blobs
            .put(
                "schemas/userprofile.md",
                b"interface UserProfile {}\n",
                "text/markdown",
            )
            .await
            .unwrap();

        ToolHandler::new(catalog, blobs)
    }

    #[tokio::test]
    async fn test_search_finds_by_substring() {
        let handler = fixture().await;
        let result = handler
            .execute("search_documentation", json!({"query": "user"}))
            .await
            .unwrap();

        let results = result["results"].as_array().unwrap();
        assert!(results
            .iter()
            .any(|r| r["id"] == "api-v1-users-get" && r["score"] == 1.0));
        // Soft-deleted documents never surface
        assert!(!results.iter().any(|r| r["id"] == "api-v1-legacy-get"));
    }

    #[tokio::test]
    async fn test_search_miss_returns_empty() {
        let handler = fixture().await;
        let result = handler
            .execute("search_documentation", json!({"query": "zzz"}))
            .await
            .unwrap();
        assert!(result["results"].as_array().unwrap().is_empty());
        assert_eq!(result["pagination"]["totalItems"], 0);
    }

    #[tokio::test]
    async fn test_search_missing_query_names_field() {
        let handler = fixture().await;
        let err = handler
            .execute("search_documentation", json!({}))
            .await
            .unwrap_err();
        assert_eq!(err.rpc_code(), -32602);
        assert!(err.to_string().contains("query"));
    }

    #[tokio::test]
    async fn test_search_category_filter() {
        let handler = fixture().await;
        let result = handler
            .execute(
                "search_documentation",
                json!({"query": "quick", "category": "guide"}),
            )
            .await
            .unwrap();
        assert_eq!(result["results"].as_array().unwrap().len(), 1);

        let err = handler
            .execute(
                "search_documentation",
                json!({"query": "quick", "category": "bogus"}),
            )
            .await
            .unwrap_err();
        assert_eq!(err.rpc_code(), -32602);
    }

    #[tokio::test]
    async fn test_list_endpoints_shape() {
        let handler = fixture().await;
        let result = handler
            .execute("list_endpoints", json!({"pageSize": 10}))
            .await
            .unwrap();

        let endpoints = result["endpoints"].as_array().unwrap();
        assert_eq!(endpoints.len(), 1);
        assert_eq!(endpoints[0]["id"], "api-v1-users-get");
        assert_eq!(endpoints[0]["path"], "/api/v1/users");
        assert_eq!(endpoints[0]["method"], "GET");
        assert_eq!(
            result["pagination"],
            json!({
                "page": 0,
                "pageSize": 10,
                "totalPages": 1,
                "totalItems": 1,
                "hasMore": false
            })
        );
    }

    #[tokio::test]
    async fn test_get_endpoint_details_builds_key_and_fetches_content() {
        let handler = fixture().await;
        let result = handler
            .execute(
                "get_endpoint_details",
                json!({"endpoint": "/api/v1/users", "method": "GET"}),
            )
            .await
            .unwrap();
        assert_eq!(result["id"], "api-v1-users-get");
        assert_eq!(result["content"], "# List Users\n");

        let err = handler
            .execute("get_endpoint_details", json!({"endpoint": "/nope"}))
            .await
            .unwrap_err();
        assert!(matches!(err, ClioError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_get_schema() {
        let handler = fixture().await;
        let result = handler
            .execute("get_schema", json!({"schemaName": "UserProfile"}))
            .await
            .unwrap();
        assert_eq!(result["format"], "typescript");
        assert!(result["content"]
            .as_str()
            .unwrap()
            .contains("interface UserProfile"));

        let err = handler
            .execute("get_schema", json!({"schemaName": "Missing"}))
            .await
            .unwrap_err();
        assert!(matches!(err, ClioError::NotFound(_)));

        let err = handler
            .execute(
                "get_schema",
                json!({"schemaName": "UserProfile", "format": "xml"}),
            )
            .await
            .unwrap_err();
        assert_eq!(err.rpc_code(), -32602);
    }

    #[tokio::test]
    async fn test_listings_by_category() {
        let handler = fixture().await;

        let guides = handler.execute("list_guides", json!({})).await.unwrap();
        assert_eq!(guides["guides"].as_array().unwrap().len(), 1);
        assert_eq!(guides["guides"][0]["id"], "guide-quickstart");

        let resources = handler.execute("list_resources", json!({})).await.unwrap();
        assert_eq!(resources["resources"].as_array().unwrap().len(), 1);

        let schemas = handler.execute("list_schemas", json!({})).await.unwrap();
        assert_eq!(schemas["schemas"][0]["name"], "userprofile");
    }

    #[tokio::test]
    async fn test_get_document_roundtrip() {
        let handler = fixture().await;
        let result = handler
            .execute("get_document", json!({"id": "api-v1-users-get"}))
            .await
            .unwrap();
        assert_eq!(result["title"], "List Users");
        assert_eq!(result["tags"], json!(["users", "endpoint"]));
    }

    #[tokio::test]
    async fn test_resource_descriptors_exclude_endpoints() {
        let handler = fixture().await;
        let resources = handler.list_resource_descriptors().await.unwrap();

        assert!(resources
            .iter()
            .all(|r| r["uri"] != "doc://api-v1-users-get"));
        assert!(resources
            .iter()
            .any(|r| r["uri"] == "doc://guide-quickstart"));
    }

    #[tokio::test]
    async fn test_unknown_tool() {
        let handler = fixture().await;
        let err = handler.execute("frobnicate", json!({})).await.unwrap_err();
        assert!(matches!(err, ClioError::UnknownTool(_)));
        assert_eq!(err.rpc_code(), -32602);
    }

    #[test]
    fn test_tool_schemas_declare_required_fields() {
        let store = Arc::new(MemoryDocumentStore::new());
        let handler = ToolHandler::new(
            DocCatalog::new(store),
            Arc::new(MemoryBlobStore::new()),
        );
        let tools = handler.list_tools();
        assert_eq!(tools.len(), 8);

        let search = tools
            .iter()
            .find(|t| t.name == "search_documentation")
            .unwrap();
        assert_eq!(search.input_schema["required"], json!(["query"]));
    }
}
