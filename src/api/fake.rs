//! In-memory [`NotionRepository`] double used by unit tests.
//!
//! Holds one database definition, applies schema patches to it the way
//! Notion would, and records every call so tests can count round-trips.

use super::responses::{CreatedPage, FileUploadSlot};
use super::NotionRepository;
use crate::error::AppError;
use crate::model::ImageData;
use crate::types::{ApiKey, DatabaseId, FileUploadId, PageId};
use parking_lot::Mutex;
use serde_json::{json, Map, Value};

pub(crate) const FAKE_UPLOAD_ID: &str = "1f2e3d4c5b6a7980a1b2c3d4e5f60718";
pub(crate) const FAKE_PAGE_ID: &str = "216cd41285338087a989cf37889137c3";

pub(crate) type Failure = fn() -> AppError;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Call {
    RetrieveDatabase,
    UpdateDatabase(Value),
    CreatePage(Value),
    CreateFileUpload,
    SendFileUpload { file_name: String, mime: String },
}

#[derive(Default)]
struct Failures {
    retrieve: Option<Failure>,
    patch: Option<Failure>,
    patch_once: bool,
    page: Option<Failure>,
    upload_slot: Option<Failure>,
    upload_send: Option<Failure>,
}

pub(crate) struct FakeNotion {
    api_key: ApiKey,
    database: Mutex<Value>,
    failures: Mutex<Failures>,
    calls: Mutex<Vec<Call>>,
}

impl FakeNotion {
    /// A database whose `properties` map is `properties`.
    pub(crate) fn with_properties(properties: Value) -> Self {
        Self {
            api_key: test_api_key(),
            database: Mutex::new(json!({
                "object": "database",
                "id": "550e8400-e29b-41d4-a716-446655440000",
                "title": [{ "type": "text", "plain_text": "Reading list" }],
                "icon": { "type": "emoji", "emoji": "📚" },
                "properties": properties,
            })),
            failures: Mutex::new(Failures::default()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn fail_retrieve(self, failure: Failure) -> Self {
        self.failures.lock().retrieve = Some(failure);
        self
    }

    pub(crate) fn fail_patch(self, failure: Failure) -> Self {
        self.failures.lock().patch = Some(failure);
        self
    }

    /// Fails only the next PATCH; later ones are applied.
    pub(crate) fn fail_patch_once(self, failure: Failure) -> Self {
        {
            let mut failures = self.failures.lock();
            failures.patch = Some(failure);
            failures.patch_once = true;
        }
        self
    }

    pub(crate) fn fail_page(self, failure: Failure) -> Self {
        self.failures.lock().page = Some(failure);
        self
    }

    pub(crate) fn fail_upload_slot(self, failure: Failure) -> Self {
        self.failures.lock().upload_slot = Some(failure);
        self
    }

    pub(crate) fn fail_upload_send(self, failure: Failure) -> Self {
        self.failures.lock().upload_send = Some(failure);
        self
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    pub(crate) fn count(&self, matches: impl Fn(&Call) -> bool) -> usize {
        self.calls.lock().iter().filter(|c| matches(c)).count()
    }

    fn record(&self, call: Call) {
        self.calls.lock().push(call);
    }
}

pub(crate) fn test_api_key() -> ApiKey {
    ApiKey::new("secret_fake_integration_key_1234abcd").expect("fixture key is valid")
}

pub(crate) fn test_database_id() -> DatabaseId {
    DatabaseId::parse("550e8400e29b41d4a716446655440000").expect("fixture id is valid")
}

/// Builds the same failure the transport produces for `status`.
pub(crate) fn service_error(status: u16, code: &str, message: &str) -> AppError {
    let body = json!({
        "object": "error",
        "status": status,
        "code": code,
        "message": message,
    })
    .to_string();
    let status = reqwest::StatusCode::from_u16(status).expect("fixture status is valid");
    super::parser::parse_error_response(&body, status, "fake://notion")
}

#[async_trait::async_trait]
impl NotionRepository for FakeNotion {
    fn api_key(&self) -> &ApiKey {
        &self.api_key
    }

    async fn retrieve_database(&self, _id: &DatabaseId) -> Result<Value, AppError> {
        self.record(Call::RetrieveDatabase);
        if let Some(failure) = self.failures.lock().retrieve {
            return Err(failure());
        }
        Ok(self.database.lock().clone())
    }

    async fn update_database(&self, _id: &DatabaseId, patch: &Value) -> Result<Value, AppError> {
        self.record(Call::UpdateDatabase(patch.clone()));
        let failure = {
            let mut failures = self.failures.lock();
            let failure = failures.patch;
            if failures.patch_once {
                failures.patch = None;
            }
            failure
        };
        if let Some(failure) = failure {
            return Err(failure());
        }

        let mut database = self.database.lock();
        let mut properties: Map<String, Value> = database["properties"]
            .as_object()
            .cloned()
            .unwrap_or_default();
        if let Some(changes) = patch["properties"].as_object() {
            for (name, change) in changes {
                if let Some(new_name) = change.get("name").and_then(Value::as_str) {
                    if let Some(existing) = properties.remove(name) {
                        properties.insert(new_name.to_string(), existing);
                    }
                } else if let Some((kind, config)) =
                    change.as_object().and_then(|c| c.iter().next())
                {
                    let mut definition = Map::new();
                    definition.insert("id".to_string(), json!(name));
                    definition.insert("name".to_string(), json!(name));
                    definition.insert("type".to_string(), json!(kind));
                    definition.insert(kind.clone(), config.clone());
                    properties.insert(name.clone(), Value::Object(definition));
                }
            }
        }
        database["properties"] = Value::Object(properties);
        Ok(database.clone())
    }

    async fn create_page(&self, body: &Value) -> Result<CreatedPage, AppError> {
        self.record(Call::CreatePage(body.clone()));
        if let Some(failure) = self.failures.lock().page {
            return Err(failure());
        }
        Ok(CreatedPage {
            id: PageId::parse(FAKE_PAGE_ID)?,
            url: Some(format!("https://www.notion.so/{}", FAKE_PAGE_ID)),
            created_time: None,
        })
    }

    async fn create_file_upload(&self) -> Result<FileUploadSlot, AppError> {
        self.record(Call::CreateFileUpload);
        if let Some(failure) = self.failures.lock().upload_slot {
            return Err(failure());
        }
        Ok(FileUploadSlot {
            id: FileUploadId::parse(FAKE_UPLOAD_ID)?,
            upload_url: None,
        })
    }

    async fn send_file_upload(
        &self,
        _slot: &FileUploadSlot,
        image: &ImageData,
        file_name: &str,
    ) -> Result<Value, AppError> {
        self.record(Call::SendFileUpload {
            file_name: file_name.to_string(),
            mime: image.mime().to_string(),
        });
        if let Some(failure) = self.failures.lock().upload_send {
            return Err(failure());
        }
        Ok(json!({ "object": "file_upload", "status": "uploaded" }))
    }
}
