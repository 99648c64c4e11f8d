// src/metadata.rs
//! Display metadata read off a database: title, icon and label options.

use crate::api::NotionRepository;
use crate::constants::{CUSTOM_ICON_PLACEHOLDER, UNTITLED_DATABASE};
use crate::error::AppError;
use crate::model::{DatabaseMetadata, Profile};
use crate::types::DatabaseId;
use serde_json::Value;

/// Title and emoji of a database definition.
///
/// Databases with a custom image icon get a placeholder emoji; databases
/// without any icon get none.
pub fn metadata_from_database(database: &Value) -> DatabaseMetadata {
    let name = database
        .pointer("/title/0/plain_text")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .unwrap_or(UNTITLED_DATABASE)
        .to_string();

    let emoji = database.get("icon").filter(|i| !i.is_null()).map(|icon| {
        match icon.get("type").and_then(Value::as_str) {
            Some("emoji") => icon
                .get("emoji")
                .and_then(Value::as_str)
                .unwrap_or(CUSTOM_ICON_PLACEHOLDER)
                .to_string(),
            _ => CUSTOM_ICON_PLACEHOLDER.to_string(),
        }
    });

    DatabaseMetadata { name, emoji }
}

/// Option names of the `label` select property, in database order.
pub fn label_options_from_database(database: &Value) -> Vec<String> {
    database
        .pointer("/properties/label/select/options")
        .and_then(Value::as_array)
        .map(|options| {
            options
                .iter()
                .filter_map(|o| o.get("name").and_then(Value::as_str))
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

pub async fn database_metadata<R>(
    repo: &R,
    database_id: &DatabaseId,
) -> Result<DatabaseMetadata, AppError>
where
    R: NotionRepository + ?Sized,
{
    let database = repo.retrieve_database(database_id).await?;
    Ok(metadata_from_database(&database))
}

pub async fn label_options<R>(repo: &R, database_id: &DatabaseId) -> Result<Vec<String>, AppError>
where
    R: NotionRepository + ?Sized,
{
    let database = repo.retrieve_database(database_id).await?;
    Ok(label_options_from_database(&database))
}

/// Re-reads name, emoji and label options for `profile` in one request.
pub async fn refresh_profile<R>(repo: &R, profile: &Profile) -> Result<Profile, AppError>
where
    R: NotionRepository + ?Sized,
{
    let database = repo.retrieve_database(&profile.database_id).await?;
    let mut refreshed = profile
        .clone()
        .with_metadata(metadata_from_database(&database));
    refreshed.label_options = label_options_from_database(&database);
    Ok(refreshed)
}
