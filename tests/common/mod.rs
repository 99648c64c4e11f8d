// tests/common/mod.rs
//! Shared fixtures for the integration tests.
#![allow(dead_code)]

use notion_clipper::{ApiKey, DatabaseId, NotionHttpClient, Profile};
use serde_json::{json, Value};
use wiremock::MockServer;

pub const API_KEY: &str = "secret_wiremock_integration_key_0001";
pub const DATABASE_ID: &str = "550e8400e29b41d4a716446655440000";
pub const DATABASE_PATH: &str = "/databases/550e8400-e29b-41d4-a716-446655440000";
pub const UPLOAD_ID: &str = "1f2e3d4c-5b6a-7980-a1b2-c3d4e5f60718";
pub const PAGE_ID: &str = "216cd412-8533-8087-a989-cf37889137c3";

pub fn api_key() -> ApiKey {
    ApiKey::new(API_KEY).expect("Test API key should be valid")
}

pub fn database_id() -> DatabaseId {
    DatabaseId::parse(DATABASE_ID).expect("Test database ID should be valid")
}

pub fn profile() -> Profile {
    Profile::new(api_key(), database_id())
}

/// A client pointed at the mock server.
pub fn client(server: &MockServer) -> NotionHttpClient {
    NotionHttpClient::with_base_url(&api_key(), server.uri()).expect("Client should build")
}

/// A database definition with the given properties map.
pub fn database(properties: Value) -> Value {
    json!({
        "object": "database",
        "id": "550e8400-e29b-41d4-a716-446655440000",
        "title": [{ "type": "text", "plain_text": "Reading list" }],
        "icon": { "type": "emoji", "emoji": "📚" },
        "properties": properties,
    })
}

pub fn complete_properties() -> Value {
    json!({
        "name": { "id": "title", "type": "title", "title": {} },
        "url": { "id": "a", "type": "url", "url": {} },
        "label": { "id": "b", "type": "select", "select": { "options": [] } },
        "saved_from": { "id": "c", "type": "rich_text", "rich_text": {} },
        "thumbnail": { "id": "d", "type": "files", "files": {} },
    })
}

/// The error envelope Notion sends with non-2xx responses.
pub fn error_body(status: u16, code: &str, message: &str) -> Value {
    json!({
        "object": "error",
        "status": status,
        "code": code,
        "message": message,
        "request_id": "00000000-0000-0000-0000-000000000000",
    })
}

pub fn created_page() -> Value {
    json!({
        "object": "page",
        "id": PAGE_ID,
        "url": "https://www.notion.so/216cd41285338087a989cf37889137c3",
        "created_time": "2025-06-01T10:00:00.000Z",
    })
}
