// src/lib.rs
//! notion-clipper library: saves captured pages into a Notion database and
//! keeps that database's schema in the shape the clipper needs.
//!
//! # Public API
//!
//! The library exposes types organized by concern:
//! - **Error handling**: `AppError`, `ErrorKind`, `DatabaseAccessFailure`, `ValidationError`
//! - **Configuration**: `CommandLineInput`, `ClipperConfig`
//! - **Domain model**: `Profile`, `CapturePayload`, `ImageData`
//! - **Domain types**: `ApiKey`, `DatabaseId`, `PageId`, `FileUploadId`, `PropertyName`
//! - **API client**: `NotionRepository`, `NotionHttpClient`
//! - **Schema**: `inspect`, `ValidationCache`, `repair`
//! - **Save flow**: `Clipper`, `SaveOutcome`, `SaveReport`

pub mod api;
pub mod clock;
mod config;
pub mod constants;
mod error;
pub mod metadata;
mod model;
pub mod page;
mod pipeline;
pub mod schema;
pub mod thumbnail;
mod types;

// --- Error Handling ---
pub use crate::error::{
    classify_database_access_failure, AppError, DatabaseAccessFailure, ErrorKind,
    NotionErrorCode, UploadStage,
};
pub use crate::types::ValidationError;

// --- Configuration ---
pub use crate::config::{Action, ClipperConfig, Command, CommandLineInput, SourceArg};

// --- Domain Model ---
pub use crate::model::{CapturePayload, CaptureSource, DatabaseMetadata, ImageData, Profile};

// --- Domain Types ---
pub use crate::types::{
    ApiKey, DatabaseId, FileUploadId, PageId, PropertyName, ValidatedUrl,
};

// --- API Client ---
pub use crate::api::{CreatedPage, FileUploadSlot, NotionHttpClient, NotionRepository};

// --- Schema ---
pub use crate::schema::{
    CacheKey, DatabaseSchemaCheck, RepairOutcome, RequiredProperty, SkippedRepair,
    ValidationCache,
};

// --- Save Flow ---
pub use crate::page::{extract_domain, NewPage};
pub use crate::pipeline::{
    Clipper, ConfigurationCheck, SaveOutcome, SaveReport, SaveStage, StepStatus,
};
