// src/api/mod.rs
//! Notion API interaction: the endpoints the clipper needs and nothing more.
//!
//! Business logic depends on [`NotionRepository`], never on HTTP details,
//! so every step of the save flow can be exercised against an in-memory
//! double.

pub mod client;
#[cfg(test)]
pub(crate) mod fake;
pub mod parser;
pub mod responses;

use crate::error::AppError;
use crate::model::ImageData;
use crate::types::{ApiKey, DatabaseId};
use serde_json::Value;

/// The ability to inspect, patch and write to a Notion database on behalf
/// of one integration.
#[async_trait::async_trait]
pub trait NotionRepository: Send + Sync {
    /// The integration key requests are made with.
    fn api_key(&self) -> &ApiKey;

    /// `GET /databases/{id}`, the raw database definition.
    async fn retrieve_database(&self, id: &DatabaseId) -> Result<Value, AppError>;

    /// `PATCH /databases/{id}` with a `{properties: {...}}` body.
    async fn update_database(&self, id: &DatabaseId, patch: &Value) -> Result<Value, AppError>;

    /// `POST /pages`.
    async fn create_page(&self, body: &Value) -> Result<CreatedPage, AppError>;

    /// `POST /file_uploads` in single-part mode.
    async fn create_file_upload(&self) -> Result<FileUploadSlot, AppError>;

    /// Sends the image bytes to a previously created upload slot.
    async fn send_file_upload(
        &self,
        slot: &FileUploadSlot,
        image: &ImageData,
        file_name: &str,
    ) -> Result<Value, AppError>;
}

pub use client::NotionHttpClient;
pub use responses::{CreatedPage, FileUploadSlot};
