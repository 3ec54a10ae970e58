//! End-to-end MCP protocol tests
//!
//! Drives the full stack (router, tool dispatch, libsql document store,
//! filesystem blob store) through raw JSON-RPC request lines, the same way
//! the stdio transport feeds it.

use clio_core::mcp::{McpRouter, SizeGuard, ToolHandler};
use clio_core::store::{
    BlobStore, ConnectionMode, DocCatalog, FsBlobStore, LibsqlDocumentStore,
};
use clio_core::types::{DocCategory, DocStatus, Document};
use serde_json::{json, Value};
use std::sync::Arc;
use tempfile::TempDir;

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

async fn create_test_router() -> (McpRouter, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("docs.db");

    let store = Arc::new(
        LibsqlDocumentStore::new_with_validation(
            ConnectionMode::Local(db_path.to_str().unwrap().to_string()),
            true,
        )
        .await
        .unwrap(),
    );
    let blobs = Arc::new(FsBlobStore::new(temp_dir.path().join("blobs")).unwrap());
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

    let mut create_user = doc(
        "api-v1-users-post",
        DocCategory::Api,
        "Create User",
        &["users", "endpoint"],
    );
    create_user.path = Some("/api/v1/users".to_string());
    create_user.method = Some("POST".to_string());
    catalog.put_document(&create_user).await.unwrap();

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

    let tools = ToolHandler::new(catalog, blobs);
    let router = McpRouter::new(tools, SizeGuard::new(5 * 1024 * 1024, 4 * 1024 * 1024));
    (router, temp_dir)
}

/// Call a tool through tools/call and unwrap the content-block envelope
/// back into the tool's structured result.
async fn call_tool(router: &McpRouter, name: &str, arguments: Value) -> Value {
    let line = json!({
        "jsonrpc": "2.0",
        "method": "tools/call",
        "id": 1,
        "params": {"name": name, "arguments": arguments}
    })
    .to_string();

    let response = router.handle_line(&line).await.unwrap();
    let result = response
        .result
        .unwrap_or_else(|| panic!("tool {} failed: {:?}", name, response.error));
    let text = result["content"][0]["text"].as_str().unwrap();
    serde_json::from_str(text).unwrap()
}

#[tokio::test]
async fn test_initialize_handshake() {
    let (router, _temp) = create_test_router().await;

    let response = router
        .handle_line(
            r#"{"jsonrpc":"2.0","method":"initialize","id":0,"params":{"protocolVersion":"2025-06-18","clientInfo":{"name":"test"}}}"#,
        )
        .await
        .unwrap();

    let result = response.result.unwrap();
    assert_eq!(result["protocolVersion"], "2025-06-18");
    assert_eq!(result["serverInfo"]["name"], "clio");
    assert!(result["capabilities"]["tools"].is_object());
}

#[tokio::test]
async fn test_tools_list_advertises_all_tools() {
    let (router, _temp) = create_test_router().await;

    let response = router
        .handle_line(r#"{"jsonrpc":"2.0","method":"tools/list","id":1}"#)
        .await
        .unwrap();

    let tools = response.result.unwrap()["tools"].as_array().unwrap().clone();
    assert_eq!(tools.len(), 8);

    let names: Vec<&str> = tools.iter().map(|t| t["name"].as_str().unwrap()).collect();
    for expected in [
        "search_documentation",
        "get_endpoint_details",
        "list_endpoints",
        "get_schema",
        "list_schemas",
        "list_guides",
        "list_resources",
        "get_document",
    ] {
        assert!(names.contains(&expected), "missing tool {}", expected);
    }
}

#[tokio::test]
async fn test_list_endpoints_scenario() {
    let (router, _temp) = create_test_router().await;

    let result = call_tool(&router, "list_endpoints", json!({"pageSize": 10})).await;

    let endpoints = result["endpoints"].as_array().unwrap();
    assert_eq!(endpoints.len(), 2);
    assert_eq!(endpoints[0]["id"], "api-v1-users-get");
    assert_eq!(endpoints[0]["path"], "/api/v1/users");
    assert_eq!(endpoints[0]["method"], "GET");
    assert_eq!(
        result["pagination"],
        json!({
            "page": 0,
            "pageSize": 10,
            "totalPages": 1,
            "totalItems": 2,
            "hasMore": false
        })
    );
}

#[tokio::test]
async fn test_search_hit_and_miss() {
    let (router, _temp) = create_test_router().await;

    let result = call_tool(&router, "search_documentation", json!({"query": "user"})).await;
    let hits = result["results"].as_array().unwrap();
    assert!(hits.iter().any(|h| h["id"] == "api-v1-users-get"));
    assert!(hits.iter().any(|h| h["id"] == "schema-userprofile"));
    // Soft-deleted documents never surface in results
    assert!(!hits.iter().any(|h| h["id"] == "api-v1-legacy-get"));

    let result = call_tool(&router, "search_documentation", json!({"query": "zzz"})).await;
    assert!(result["results"].as_array().unwrap().is_empty());
    assert_eq!(result["pagination"]["totalItems"], 0);
    assert_eq!(result["pagination"]["hasMore"], false);
}

#[tokio::test]
async fn test_get_endpoint_details_with_content() {
    let (router, _temp) = create_test_router().await;

    let result = call_tool(
        &router,
        "get_endpoint_details",
        json!({"endpoint": "/api/v1/users", "method": "GET"}),
    )
    .await;
    assert_eq!(result["id"], "api-v1-users-get");
    assert_eq!(result["content"], "# List Users\n");

    // A document without stored content still round-trips
    let result = call_tool(
        &router,
        "get_endpoint_details",
        json!({"endpoint": "/api/v1/users", "method": "POST"}),
    )
    .await;
    assert_eq!(result["id"], "api-v1-users-post");
    assert!(result["content"].is_null());
}

#[tokio::test]
async fn test_get_schema_roundtrip() {
    let (router, _temp) = create_test_router().await;

    let result = call_tool(&router, "get_schema", json!({"schemaName": "UserProfile"})).await;
    assert_eq!(result["name"], "UserProfile");
    assert_eq!(result["format"], "typescript");
    assert!(result["content"]
        .as_str()
        .unwrap()
        .contains("interface UserProfile"));
}

#[tokio::test]
async fn test_tool_errors_surface_as_jsonrpc_errors() {
    let (router, _temp) = create_test_router().await;

    // Missing required param
    let response = router
        .handle_line(
            r#"{"jsonrpc":"2.0","method":"tools/call","id":2,"params":{"name":"search_documentation","arguments":{}}}"#,
        )
        .await
        .unwrap();
    let error = response.error.unwrap();
    assert_eq!(error.code, -32602);
    assert!(error.message.contains("query"));

    // Unknown endpoint
    let response = router
        .handle_line(
            r#"{"jsonrpc":"2.0","method":"tools/call","id":3,"params":{"name":"get_endpoint_details","arguments":{"endpoint":"/nope"}}}"#,
        )
        .await
        .unwrap();
    assert_eq!(response.error.unwrap().code, -32602);

    // Unknown tool
    let response = router
        .handle_line(
            r#"{"jsonrpc":"2.0","method":"tools/call","id":4,"params":{"name":"frobnicate"}}"#,
        )
        .await
        .unwrap();
    assert_eq!(response.error.unwrap().code, -32602);
}

#[tokio::test]
async fn test_pagination_concatenation_covers_everything() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("docs.db");

    let store = Arc::new(
        LibsqlDocumentStore::new_with_validation(
            ConnectionMode::Local(db_path.to_str().unwrap().to_string()),
            true,
        )
        .await
        .unwrap(),
    );
    let blobs = Arc::new(FsBlobStore::new(temp_dir.path().join("blobs")).unwrap());
    let catalog = DocCatalog::new(store);

    for i in 0..7 {
        let mut d = doc(
            &format!("api-v1-items-{}-get", i),
            DocCategory::Api,
            &format!("Item {}", i),
            &["items", "endpoint"],
        );
        d.path = Some(format!("/api/v1/items/{}", i));
        d.method = Some("GET".to_string());
        catalog.put_document(&d).await.unwrap();
    }

    let tools = ToolHandler::new(catalog, blobs);
    let router = McpRouter::new(tools, SizeGuard::new(5 * 1024 * 1024, 4 * 1024 * 1024));

    let mut seen: Vec<String> = Vec::new();
    let mut page = 0;
    loop {
        let result = call_tool(
            &router,
            "list_endpoints",
            json!({"page": page, "pageSize": 3}),
        )
        .await;
        for e in result["endpoints"].as_array().unwrap() {
            seen.push(e["id"].as_str().unwrap().to_string());
        }
        if !result["pagination"]["hasMore"].as_bool().unwrap() {
            assert_eq!(result["pagination"]["totalPages"], 3);
            break;
        }
        page += 1;
    }

    assert_eq!(seen.len(), 7);
    let mut sorted = seen.clone();
    sorted.sort();
    sorted.dedup();
    assert_eq!(sorted.len(), 7, "pages must not overlap");
    assert_eq!(seen, sorted, "page order follows id order");
}

#[tokio::test]
async fn test_oversized_response_is_replaced_not_truncated() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("docs.db");

    let store = Arc::new(
        LibsqlDocumentStore::new_with_validation(
            ConnectionMode::Local(db_path.to_str().unwrap().to_string()),
            true,
        )
        .await
        .unwrap(),
    );
    let blobs = Arc::new(FsBlobStore::new(temp_dir.path().join("blobs")).unwrap());
    let catalog = DocCatalog::new(store);
    catalog
        .put_document(&doc(
            "guide-quickstart",
            DocCategory::Guide,
            "Quickstart",
            &["intro"],
        ))
        .await
        .unwrap();

    let tools = ToolHandler::new(catalog, blobs);
    let router = McpRouter::new(tools, SizeGuard::new(128, 64));

    let response = router
        .handle_line(r#"{"jsonrpc":"2.0","method":"tools/list","id":5}"#)
        .await
        .unwrap();

    let error = response.error.unwrap();
    assert_eq!(error.code, -32001);
    let data = error.data.unwrap();
    assert_eq!(data["limitBytes"], 128);
    assert!(data["sizeBytes"].as_u64().unwrap() > 128);
    assert!(data["hint"].as_str().unwrap().contains("pageSize"));
}

#[tokio::test]
async fn test_notifications_and_unknown_methods() {
    let (router, _temp) = create_test_router().await;

    // Notifications never get a response
    let response = router
        .handle_line(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#)
        .await;
    assert!(response.is_none());

    // Unknown methods are -32601
    let response = router
        .handle_line(r#"{"jsonrpc":"2.0","method":"documents/purge","id":6}"#)
        .await
        .unwrap();
    assert_eq!(response.error.unwrap().code, -32601);
}

#[tokio::test]
async fn test_resources_over_real_store() {
    let (router, _temp) = create_test_router().await;

    let response = router
        .handle_line(r#"{"jsonrpc":"2.0","method":"resources/list","id":7}"#)
        .await
        .unwrap();
    let resources = response.result.unwrap()["resources"]
        .as_array()
        .unwrap()
        .clone();
    assert!(resources
        .iter()
        .any(|r| r["uri"] == "doc://schema-userprofile"));
    assert!(resources
        .iter()
        .all(|r| r["uri"] != "doc://api-v1-users-get"));

    let response = router
        .handle_line(
            r#"{"jsonrpc":"2.0","method":"resources/read","id":8,"params":{"uri":"doc://schema-userprofile"}}"#,
        )
        .await
        .unwrap();
    let contents = &response.result.unwrap()["contents"][0];
    assert_eq!(contents["mimeType"], "text/markdown");
    assert!(contents["text"]
        .as_str()
        .unwrap()
        .contains("interface UserProfile"));
}
