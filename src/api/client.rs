// src/api/client.rs
//! Thin HTTP client wrapper for the Notion API.
//!
//! Handles authentication, the pinned API version and JSON encoding.
//! Status codes are turned into typed failures by [`super::parser`].

use super::parser::parse_api_response;
use super::responses::{CreatedPage, FileUploadSlot};
use crate::constants::{NOTION_API_BASE_URL, NOTION_VERSION};
use crate::error::{AppError, UploadStage};
use crate::model::ImageData;
use crate::types::{ApiKey, DatabaseId};
use reqwest::{header, multipart, Client, Method, Response};
use serde_json::{json, Value};

/// A thin wrapper around reqwest Client bound to one integration key.
#[derive(Clone)]
pub struct NotionHttpClient {
    client: Client,
    api_key: ApiKey,
    base_url: String,
}

impl NotionHttpClient {
    /// Creates a new HTTP client against the public Notion API.
    pub fn new(api_key: &ApiKey) -> Result<Self, AppError> {
        Self::with_base_url(api_key, NOTION_API_BASE_URL)
    }

    /// Creates a client against another base URL (a proxy or a test server).
    pub fn with_base_url(api_key: &ApiKey, base_url: impl Into<String>) -> Result<Self, AppError> {
        let client = Client::builder()
            .default_headers(Self::create_headers(api_key)?)
            .build()?;
        Ok(Self {
            client,
            api_key: api_key.clone(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Creates the headers every request carries.
    ///
    /// `Content-Type` is deliberately absent here: JSON calls set it per
    /// request, and multipart uploads must let reqwest write the boundary.
    fn create_headers(api_key: &ApiKey) -> Result<header::HeaderMap, AppError> {
        let mut headers = header::HeaderMap::new();

        let auth_header = format!("Bearer {}", api_key.as_str());
        let mut auth_value = header::HeaderValue::from_str(&auth_header).map_err(|e| {
            AppError::MissingConfiguration(format!("Invalid API token format: {}", e))
        })?;
        auth_value.set_sensitive(true);
        headers.insert(header::AUTHORIZATION, auth_value);

        headers.insert(
            "Notion-Version",
            header::HeaderValue::from_static(NOTION_VERSION),
        );

        Ok(headers)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Sends a JSON request to `endpoint` (relative to the base URL).
    pub async fn request(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<&Value>,
    ) -> Result<Value, AppError> {
        let url = format!("{}/{}", self.base_url, endpoint.trim_start_matches('/'));
        log::debug!("{} {}", method, url);

        let mut builder = self
            .client
            .request(method, url)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(body) = body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let result = extract_response_text(response).await?;
        parse_api_response(result)
    }

    /// Makes a GET request to the specified endpoint.
    pub async fn get(&self, endpoint: &str) -> Result<Value, AppError> {
        self.request(Method::GET, endpoint, None).await
    }

    /// Makes a POST request with JSON body to the specified endpoint.
    pub async fn post(&self, endpoint: &str, body: &Value) -> Result<Value, AppError> {
        self.request(Method::POST, endpoint, Some(body)).await
    }

    /// Makes a PATCH request with JSON body to the specified endpoint.
    pub async fn patch(&self, endpoint: &str, body: &Value) -> Result<Value, AppError> {
        self.request(Method::PATCH, endpoint, Some(body)).await
    }

    /// POSTs a multipart form to an absolute URL.
    pub async fn post_multipart(&self, url: &str, form: multipart::Form) -> Result<Value, AppError> {
        log::debug!("POST {} (multipart)", url);
        let response = self.client.post(url).multipart(form).send().await?;
        let result = extract_response_text(response).await?;
        parse_api_response(result)
    }
}

#[async_trait::async_trait]
impl super::NotionRepository for NotionHttpClient {
    fn api_key(&self) -> &ApiKey {
        &self.api_key
    }

    async fn retrieve_database(&self, id: &DatabaseId) -> Result<Value, AppError> {
        self.get(&format!("databases/{}", id.to_dashed())).await
    }

    async fn update_database(&self, id: &DatabaseId, patch: &Value) -> Result<Value, AppError> {
        self.patch(&format!("databases/{}", id.to_dashed()), patch)
            .await
    }

    async fn create_page(&self, body: &Value) -> Result<CreatedPage, AppError> {
        let created = self.post("pages", body).await?;
        Ok(serde_json::from_value(created)?)
    }

    async fn create_file_upload(&self) -> Result<FileUploadSlot, AppError> {
        let slot = self
            .post("file_uploads", &json!({ "mode": "single_part" }))
            .await?;
        Ok(serde_json::from_value(slot)?)
    }

    async fn send_file_upload(
        &self,
        slot: &FileUploadSlot,
        image: &ImageData,
        file_name: &str,
    ) -> Result<Value, AppError> {
        let url = slot.upload_url.clone().unwrap_or_else(|| {
            format!("{}/file_uploads/{}/send", self.base_url, slot.id.to_dashed())
        });

        let part = multipart::Part::bytes(image.bytes().to_vec())
            .file_name(file_name.to_string())
            .mime_str(image.mime())
            .map_err(|e| AppError::UploadFailed {
                stage: UploadStage::Decode,
                message: format!("unusable mime type '{}': {}", image.mime(), e),
            })?;
        let form = multipart::Form::new().part("file", part);

        self.post_multipart(&url, form).await
    }
}

/// Result of an HTTP operation with response metadata.
#[derive(Debug)]
pub struct ApiResponse<T> {
    pub data: T,
    pub status: reqwest::StatusCode,
    pub url: String,
}

/// Extracts the response body as text with metadata.
pub async fn extract_response_text(response: Response) -> Result<ApiResponse<String>, AppError> {
    let status = response.status();
    let url = response.url().to_string();
    let text = response.text().await?;

    Ok(ApiResponse {
        data: text,
        status,
        url,
    })
}
