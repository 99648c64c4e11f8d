// src/api/parser.rs
//! Turns raw HTTP responses into typed values or typed failures.
//!
//! Every remote failure is classified here, once: the status code picks
//! the user-facing message and the body's `code` field picks the
//! [`NotionErrorCode`]. Nothing downstream looks at message prose.

use super::client::ApiResponse;
use super::responses::NotionErrorBody;
use crate::constants::ERROR_BODY_PREVIEW_LENGTH;
use crate::error::{AppError, NotionErrorCode};
use reqwest::StatusCode;

/// Parse any Notion API response into `T`, or into the typed failure.
pub fn parse_api_response<T>(result: ApiResponse<String>) -> Result<T, AppError>
where
    T: serde::de::DeserializeOwned,
{
    if result.status.is_success() {
        parse_success_body(&result.data, &result.url)
    } else {
        Err(parse_error_response(&result.data, result.status, &result.url))
    }
}

fn parse_success_body<T>(body: &str, url: &str) -> Result<T, AppError>
where
    T: serde::de::DeserializeOwned,
{
    // Some endpoints answer 200 with an empty body.
    let body = if body.trim().is_empty() { "null" } else { body };

    serde_json::from_str(body).map_err(|e| {
        log::error!("Failed to parse response from {}: {}", url, e);
        AppError::MalformedResponse(format!("{} (body: {})", e, preview(body)))
    })
}

/// Builds the typed failure for a non-2xx response.
pub fn parse_error_response(body: &str, status: StatusCode, url: &str) -> AppError {
    let parsed = serde_json::from_str::<NotionErrorBody>(body).ok();
    let remote_message = parsed.as_ref().and_then(|b| b.message.as_deref());

    let code = match parsed.as_ref().and_then(|b| b.code.as_deref()) {
        Some(code) => refine_code(NotionErrorCode::from_api_response(code), remote_message),
        None => NotionErrorCode::from_http_status(status.as_u16()),
    };

    if let Some(request_id) = parsed.as_ref().and_then(|b| b.request_id.as_deref()) {
        log::debug!("Notion request {} failed with {} ({})", request_id, status, code);
    }
    log::warn!("{} from {}: {}", status, url, remote_message.unwrap_or("<no message>"));

    AppError::NotionService {
        message: status_message(status.as_u16(), remote_message),
        code,
        status: status.as_u16(),
    }
}

/// Maps a status code to the message shown to the user.
///
/// The well-known statuses get fixed wording; everything else passes the
/// remote message through.
pub fn status_message(status: u16, remote_message: Option<&str>) -> String {
    match status {
        401 => "Invalid or expired API key".to_string(),
        403 => "You do not have permission to access this resource".to_string(),
        404 => "Resource not found".to_string(),
        s if s >= 500 => "Notion server error. Try again later.".to_string(),
        s => remote_message
            .filter(|m| !m.trim().is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| format!("HTTP error! status: {}", s)),
    }
}

/// Narrows a generic validation failure into the schema-conflict kind the
/// repair step tolerates.
///
/// Notion reports "a title property already exists" as a plain
/// `validation_error`; its message is the only distinguishing signal, so it
/// is read here at the boundary and nowhere else.
fn refine_code(code: NotionErrorCode, remote_message: Option<&str>) -> NotionErrorCode {
    match (code, remote_message) {
        (NotionErrorCode::ValidationFailed, Some(message))
            if message.to_lowercase().contains("title property") =>
        {
            NotionErrorCode::TitlePropertyConflict
        }
        (code, _) => code,
    }
}

fn preview(body: &str) -> String {
    if body.chars().count() > ERROR_BODY_PREVIEW_LENGTH {
        let cut: String = body.chars().take(ERROR_BODY_PREVIEW_LENGTH).collect();
        format!("{}...", cut)
    } else {
        body.to_string()
    }
}
