// src/api/responses.rs
//! Wire shapes of the few Notion API responses the clipper reads.
//!
//! Database definitions stay as raw `serde_json::Value` because the schema
//! inspector walks them generically; only fixed-shape payloads get structs.

use crate::types::{FileUploadId, PageId};
use serde::{Deserialize, Serialize};

/// Error body Notion returns with every non-2xx status.
#[derive(Debug, Clone, Deserialize)]
pub struct NotionErrorBody {
    pub code: Option<String>,
    pub message: Option<String>,
    pub request_id: Option<String>,
}

/// A single-part upload slot handed out by `POST /file_uploads`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FileUploadSlot {
    pub id: FileUploadId,
    /// Where the bytes go. Older API revisions leave this out.
    #[serde(default)]
    pub upload_url: Option<String>,
}

/// The page record returned by `POST /pages`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedPage {
    pub id: PageId,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub created_time: Option<chrono::DateTime<chrono::Utc>>,
}
