// src/error.rs
//! Application error types with structured error handling.
//!
//! Error types form the vocabulary for failure modes in the clipper.
//! Each variant tells what went wrong and where, so the save flow can
//! decide which failures are fatal and which only degrade the result.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Notion API error codes as a typed vocabulary.
///
/// The transport parses the `code` field of every error body into this
/// enum once. Downstream steps match on variants, never on message text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotionErrorCode {
    /// API rate limit exceeded
    RateLimited,
    /// The requested object does not exist or is inaccessible
    ObjectNotFound,
    /// API key is invalid or expired
    Unauthorized,
    /// API key lacks permission for this resource
    RestrictedResource,
    /// Request body contains invalid JSON
    InvalidJson,
    /// Request parameters failed Notion's validation
    ValidationFailed,
    /// A schema patch tried to create a second title property
    TitlePropertyConflict,
    /// Conflict with current state of the resource
    Conflict,
    /// Notion internal server error
    InternalError,
    /// Notion is temporarily unavailable
    ServiceUnavailable,
    /// HTTP status code fallback when the error body is unparseable
    HttpStatus(u16),
    /// An error code this client doesn't recognize yet
    Unknown(String),
}

impl NotionErrorCode {
    /// Parse a Notion API error code string into the typed vocabulary.
    pub fn from_api_response(code: &str) -> Self {
        match code {
            "rate_limited" => Self::RateLimited,
            "object_not_found" => Self::ObjectNotFound,
            "unauthorized" => Self::Unauthorized,
            "restricted_resource" => Self::RestrictedResource,
            "invalid_json" => Self::InvalidJson,
            "validation_error" => Self::ValidationFailed,
            "conflict_error" => Self::Conflict,
            "internal_server_error" => Self::InternalError,
            "service_unavailable" => Self::ServiceUnavailable,
            other => Self::Unknown(other.to_string()),
        }
    }

    /// Create from an HTTP status code when the error body is unparseable.
    pub fn from_http_status(status: u16) -> Self {
        Self::HttpStatus(status)
    }

    /// Whether this error is transient and worth retrying.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::RateLimited | Self::ServiceUnavailable | Self::InternalError
        ) || matches!(self, Self::HttpStatus(status) if *status >= 500)
    }

    /// Whether this error means the resource simply doesn't exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::ObjectNotFound | Self::HttpStatus(404))
    }
}

impl fmt::Display for NotionErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RateLimited => write!(f, "rate_limited"),
            Self::ObjectNotFound => write!(f, "object_not_found"),
            Self::Unauthorized => write!(f, "unauthorized"),
            Self::RestrictedResource => write!(f, "restricted_resource"),
            Self::InvalidJson => write!(f, "invalid_json"),
            Self::ValidationFailed => write!(f, "validation_error"),
            Self::TitlePropertyConflict => write!(f, "validation_error:title_property"),
            Self::Conflict => write!(f, "conflict_error"),
            Self::InternalError => write!(f, "internal_server_error"),
            Self::ServiceUnavailable => write!(f, "service_unavailable"),
            Self::HttpStatus(code) => write!(f, "http_{}", code),
            Self::Unknown(code) => write!(f, "{}", code),
        }
    }
}

/// Which half of the two-phase upload failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadStage {
    /// Decoding the captured image into bytes.
    Decode,
    /// Asking Notion for an upload slot.
    CreateSlot,
    /// Sending the bytes to the slot.
    Transfer,
}

impl fmt::Display for UploadStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Decode => write!(f, "image decoding"),
            Self::CreateSlot => write!(f, "upload slot creation"),
            Self::Transfer => write!(f, "file transfer"),
        }
    }
}

/// Main application error type.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Connection error. Check your connection and try again ({0})")]
    NetworkFailure(#[from] reqwest::Error),

    #[error("{message}")]
    NotionService {
        code: NotionErrorCode,
        status: u16,
        message: String,
    },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Unexpected database schema: {0}")]
    Schema(String),

    #[error("{message}")]
    PermissionDenied { message: String },

    #[error("Failed to add missing properties: {source}")]
    RepairFailed {
        #[source]
        source: Box<AppError>,
    },

    #[error("Thumbnail upload failed during {stage}: {message}")]
    UploadFailed { stage: UploadStage, message: String },

    #[error("Failed to create the page: {source}")]
    PageCreationFailed {
        #[source]
        source: Box<AppError>,
    },

    #[error("{0}")]
    DatabaseAccess(DatabaseAccessFailure),

    #[error("Missing configuration: {0}")]
    MissingConfiguration(String),

    #[error("Filesystem IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error for {path}: {source}")]
    JsonParseError {
        path: std::path::PathBuf,
        source: serde_json::Error,
    },

    #[error(transparent)]
    ValidationError(#[from] crate::types::ValidationError),
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::MalformedResponse(err.to_string())
    }
}

/// Coarse failure categories reported back to the UI layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Network,
    Api,
    Schema,
    Permission,
    Upload,
    PageCreation,
    Configuration,
    Internal,
}

impl AppError {
    /// The category this failure belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NetworkFailure(_) => ErrorKind::Network,
            Self::NotionService { .. } => ErrorKind::Api,
            Self::MalformedResponse(_) => ErrorKind::Internal,
            Self::Schema(_) => ErrorKind::Schema,
            Self::PermissionDenied { .. } => ErrorKind::Permission,
            Self::RepairFailed { source } => source.kind(),
            Self::UploadFailed { .. } => ErrorKind::Upload,
            Self::PageCreationFailed { .. } => ErrorKind::PageCreation,
            Self::DatabaseAccess(failure) => failure.kind(),
            Self::MissingConfiguration(_) | Self::ValidationError(_) => ErrorKind::Configuration,
            Self::Io(_) | Self::JsonParseError { .. } => ErrorKind::Configuration,
        }
    }

    /// HTTP status of the remote rejection behind this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::NotionService { status, .. } => Some(*status),
            Self::RepairFailed { source } | Self::PageCreationFailed { source } => source.status(),
            _ => None,
        }
    }

    /// Structured Notion error code behind this error, if any.
    pub fn notion_code(&self) -> Option<&NotionErrorCode> {
        match self {
            Self::NotionService { code, .. } => Some(code),
            Self::RepairFailed { source } | Self::PageCreationFailed { source } => {
                source.notion_code()
            }
            _ => None,
        }
    }

    /// Short message for the person using the clipper.
    ///
    /// Always distinguishes connectivity, credential, permission and
    /// not-found failures; never a bare status code.
    pub fn user_message(&self) -> String {
        match self {
            Self::NetworkFailure(_) => {
                "Connection error. Check your internet connection.".to_string()
            }
            Self::PageCreationFailed { source } => {
                format!("Could not save to Notion: {}", source.user_message())
            }
            Self::RepairFailed { source } => {
                format!("Could not update the database: {}", source.user_message())
            }
            Self::UploadFailed { .. } => "The screenshot could not be uploaded.".to_string(),
            other => other.to_string(),
        }
    }
}

/// Domain vocabulary for why a database could not be used at setup time.
///
/// This is a classification of the failure reason with a remediation hint,
/// shown when a profile is created or its settings change.
#[derive(Debug, Clone, PartialEq)]
pub enum DatabaseAccessFailure {
    /// The database ID is wrong or the integration is not connected to it.
    NotFound,
    /// The API key was rejected.
    InvalidApiKey,
    /// The integration cannot read the database.
    NoAccess,
    /// The integration can read but not edit the database.
    NoEditPermission,
}

impl DatabaseAccessFailure {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound | Self::InvalidApiKey => ErrorKind::Api,
            Self::NoAccess | Self::NoEditPermission => ErrorKind::Permission,
        }
    }
}

impl fmt::Display for DatabaseAccessFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(
                f,
                "Database not found. Check that the database ID is correct and that your integration has access to it."
            ),
            Self::InvalidApiKey => {
                write!(f, "Invalid API key. Check that your API key is correct.")
            }
            Self::NoAccess => write!(
                f,
                "No permission to access this database. Make sure your integration is connected to the database in Notion."
            ),
            Self::NoEditPermission => write!(
                f,
                "No permission to modify this database. Make sure your integration has access and edit permission on the database."
            ),
        }
    }
}

/// Classifies a setup-time failure into a remediation-bearing reason.
///
/// Returns `None` for failures that carry no useful remediation (network,
/// server errors, malformed responses); those are surfaced unchanged.
pub fn classify_database_access_failure(error: &AppError) -> Option<DatabaseAccessFailure> {
    match error {
        AppError::PermissionDenied { .. } => Some(DatabaseAccessFailure::NoEditPermission),
        AppError::NotionService { code, status, .. } => match (code, status) {
            (_, 404) => Some(DatabaseAccessFailure::NotFound),
            (_, 401) | (NotionErrorCode::Unauthorized, _) => {
                Some(DatabaseAccessFailure::InvalidApiKey)
            }
            (_, 403) | (NotionErrorCode::RestrictedResource, _) => {
                Some(DatabaseAccessFailure::NoAccess)
            }
            (code, _) if code.is_not_found() => Some(DatabaseAccessFailure::NotFound),
            _ => None,
        },
        AppError::RepairFailed { source } => classify_database_access_failure(source),
        _ => None,
    }
}
