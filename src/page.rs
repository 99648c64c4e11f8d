// src/page.rs
//! Composes and submits one database entry per capture.

use crate::api::{CreatedPage, NotionRepository};
use crate::constants::{THUMBNAIL_FILE_NAME, UNKNOWN_DOMAIN};
use crate::error::AppError;
use crate::types::{DatabaseId, FileUploadId, PropertyName};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{json, Map, Value};

static HOST_FALLBACK: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"^(?:https?://)?(?:www\.)?([^/]+)").ok());

/// Everything needed to create one entry.
#[derive(Debug, Clone)]
pub struct NewPage<'a> {
    pub database_id: &'a DatabaseId,
    pub url: &'a str,
    pub title: Option<&'a str>,
    pub label: Option<&'a str>,
    pub title_property_name: &'a PropertyName,
    /// Recomputed from `url` when absent.
    pub domain: Option<&'a str>,
    pub thumbnail: Option<&'a FileUploadId>,
}

impl<'a> NewPage<'a> {
    pub fn new(
        database_id: &'a DatabaseId,
        url: &'a str,
        title_property_name: &'a PropertyName,
    ) -> Self {
        Self {
            database_id,
            url,
            title: None,
            label: None,
            title_property_name,
            domain: None,
            thumbnail: None,
        }
    }
}

/// Builds the `POST /pages` body.
///
/// Empty titles fall back to the URL and empty labels are left out.
pub fn build_page_body(page: &NewPage<'_>) -> Value {
    let title = page
        .title
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .unwrap_or(page.url);
    let domain = match page.domain.filter(|d| !d.trim().is_empty()) {
        Some(domain) => domain.to_string(),
        None => extract_domain(page.url),
    };

    let mut properties = Map::new();
    properties.insert(
        page.title_property_name.as_str().to_string(),
        json!({ "title": [{ "text": { "content": title } }] }),
    );
    properties.insert("url".to_string(), json!({ "url": page.url }));
    if let Some(label) = page.label.map(str::trim).filter(|l| !l.is_empty()) {
        properties.insert("label".to_string(), json!({ "select": { "name": label } }));
    }
    properties.insert(
        "saved_from".to_string(),
        json!({ "rich_text": [{ "text": { "content": domain } }] }),
    );
    if let Some(upload) = page.thumbnail {
        properties.insert(
            "thumbnail".to_string(),
            json!({
                "files": [{
                    "type": "file_upload",
                    "file_upload": { "id": upload.to_dashed() },
                    "name": THUMBNAIL_FILE_NAME,
                }]
            }),
        );
    }

    json!({
        "parent": { "database_id": page.database_id.to_dashed() },
        "properties": properties,
    })
}

/// Creates the entry. Any failure comes back as
/// [`AppError::PageCreationFailed`].
pub async fn create_page<R>(repo: &R, page: &NewPage<'_>) -> Result<CreatedPage, AppError>
where
    R: NotionRepository + ?Sized,
{
    let body = build_page_body(page);
    let created = repo
        .create_page(&body)
        .await
        .map_err(|e| AppError::PageCreationFailed {
            source: Box::new(e),
        })?;
    log::info!("Created page {} in database {}", created.id, page.database_id);
    Ok(created)
}

/// Host of `url` without a leading `www.`.
///
/// Falls back to a lenient pattern for strings that are not absolute URLs,
/// and to `"unknown"` when nothing resembling a host is found.
pub fn extract_domain(url: &str) -> String {
    if let Ok(parsed) = url::Url::parse(url) {
        if let Some(host) = parsed.host_str() {
            return host.strip_prefix("www.").unwrap_or(host).to_string();
        }
    }

    HOST_FALLBACK
        .as_ref()
        .and_then(|re| re.captures(url.trim()))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .filter(|host| !host.is_empty())
        .unwrap_or_else(|| UNKNOWN_DOMAIN.to_string())
}
