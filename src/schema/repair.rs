// src/schema/repair.rs
//! Patches a database so it carries every required property.
//!
//! Missing properties are created empty and a non-canonical title property
//! is renamed, all in one PATCH. Rejections that only concern the title are
//! tolerated: a page can still be created under the existing title name.

use super::{DatabaseSchemaCheck, RequiredProperty};
use crate::api::NotionRepository;
use crate::error::{AppError, NotionErrorCode};
use crate::types::{DatabaseId, PropertyName};
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::fmt;

const EDIT_PERMISSION_MESSAGE: &str = "You do not have permission to modify this database. \
     Make sure your integration has edit access to it.";

/// A part of the repair Notion refused without making the database unusable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkippedRepair {
    /// Notion rejected the patch because of the title property.
    Title,
    /// Notion rejected renaming the title property.
    Rename,
}

impl fmt::Display for SkippedRepair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Title => f.write_str("Notion rejected the schema change over the title property"),
            Self::Rename => f.write_str("Notion refused to rename the title property"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RepairOutcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skipped: Option<SkippedRepair>,
}

impl RepairOutcome {
    pub fn completed() -> Self {
        Self {
            success: true,
            skipped: None,
        }
    }

    pub fn skipped(part: SkippedRepair) -> Self {
        Self {
            success: true,
            skipped: Some(part),
        }
    }

    /// Whether the title property is now called `name`, given that it
    /// needed a rename before the repair.
    pub fn renamed_title(&self) -> bool {
        self.success && self.skipped.is_none()
    }
}

/// Builds the `{"properties": {...}}` patch for `missing`, or `None` when
/// there is nothing to change.
///
/// The rename entry is keyed by the current title name; creations are keyed
/// by the required property name.
pub fn build_schema_patch(
    missing: &[RequiredProperty],
    title_property_name: Option<&PropertyName>,
    needs_rename: bool,
) -> Option<Value> {
    let mut properties = Map::new();

    if needs_rename {
        if let Some(current) = title_property_name.filter(|name| !name.is_canonical_title()) {
            properties.insert(
                current.as_str().to_string(),
                json!({ "name": RequiredProperty::Name.property_name() }),
            );
        }
    }

    for required in missing {
        if let Some(config) = required.creation_config() {
            properties.insert(required.property_name().to_string(), config);
        }
    }

    if properties.is_empty() {
        None
    } else {
        Some(json!({ "properties": properties }))
    }
}

/// Applies the patch for `missing`. No request is made when there is
/// nothing to change.
pub async fn repair<R>(
    repo: &R,
    database_id: &DatabaseId,
    missing: &[RequiredProperty],
    title_property_name: Option<&PropertyName>,
    needs_rename: bool,
) -> Result<RepairOutcome, AppError>
where
    R: NotionRepository + ?Sized,
{
    let Some(patch) = build_schema_patch(missing, title_property_name, needs_rename) else {
        return Ok(RepairOutcome::completed());
    };
    let renaming = needs_rename && title_property_name.is_some_and(|n| !n.is_canonical_title());

    log::info!("Repairing schema of database {}: {}", database_id, patch["properties"]);
    let error = match repo.update_database(database_id, &patch).await {
        Ok(_) => return Ok(RepairOutcome::completed()),
        Err(error) => error,
    };

    let skipped = classify_rejection(error, renaming)?;
    match skipped {
        SkippedRepair::Rename => {
            log::warn!("Notion refused to rename the title property; keeping its current name")
        }
        SkippedRepair::Title => {
            log::warn!("Notion rejected the schema patch over the title property; continuing")
        }
    }

    // A refused patch applies nothing. Without the rename the creations may still go through.
    if renaming {
        if let Some(creations) = build_schema_patch(missing, None, false) {
            if let Err(error) = repo.update_database(database_id, &creations).await {
                return classify_rejection(error, false).map(RepairOutcome::skipped);
            }
        }
    }
    Ok(RepairOutcome::skipped(skipped))
}

/// Repairs whatever `check` found missing.
pub async fn repair_from_check<R>(
    repo: &R,
    database_id: &DatabaseId,
    check: &DatabaseSchemaCheck,
) -> Result<RepairOutcome, AppError>
where
    R: NotionRepository + ?Sized,
{
    repair(
        repo,
        database_id,
        &check.missing,
        Some(&check.title_property_name),
        check.needs_rename,
    )
    .await
}

/// Sorts a rejected patch into a tolerable skip or a hard failure.
fn classify_rejection(error: AppError, renaming: bool) -> Result<SkippedRepair, AppError> {
    let code = error.notion_code().cloned();
    match (error.status(), code) {
        (Some(403), _) | (_, Some(NotionErrorCode::RestrictedResource)) => {
            Err(AppError::PermissionDenied {
                message: EDIT_PERMISSION_MESSAGE.to_string(),
            })
        }
        (_, Some(NotionErrorCode::TitlePropertyConflict)) => Ok(SkippedRepair::Title),
        (_, Some(NotionErrorCode::ValidationFailed)) if renaming => Ok(SkippedRepair::Rename),
        _ => Err(AppError::RepairFailed {
            source: Box::new(error),
        }),
    }
}
