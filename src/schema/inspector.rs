// src/schema/inspector.rs
//! Reads a database definition and reports which required properties are
//! missing or misnamed.

use super::{DatabaseSchemaCheck, RequiredProperty};
use crate::api::NotionRepository;
use crate::error::AppError;
use crate::types::{DatabaseId, PropertyName};
use serde_json::Value;
use std::collections::HashSet;

/// Fetches the database and checks it. Always one GET; see
/// [`ValidationCache`](super::ValidationCache) for the cached variant.
pub async fn inspect<R>(repo: &R, database_id: &DatabaseId) -> Result<DatabaseSchemaCheck, AppError>
where
    R: NotionRepository + ?Sized,
{
    let database = repo.retrieve_database(database_id).await?;
    let check = check_properties(database)?;
    log::debug!(
        "Database {} schema: title={:?}, missing={:?}",
        database_id,
        check.title_property_name.as_str(),
        check.missing
    );
    Ok(check)
}

/// Checks a database definition without touching the network.
///
/// A property satisfies a requirement only when both its name and its type
/// match. A database with no title property, or more than one, is rejected.
pub fn check_properties(database: Value) -> Result<DatabaseSchemaCheck, AppError> {
    let mut titles: Vec<&str> = Vec::new();
    let mut satisfied: HashSet<RequiredProperty> = HashSet::new();

    if let Some(properties) = database.get("properties").and_then(Value::as_object) {
        for (name, definition) in properties {
            let kind = definition.get("type").and_then(Value::as_str).unwrap_or("");
            if kind == "title" {
                titles.push(name);
                continue;
            }
            if let Some(required) = RequiredProperty::from_property_name(name) {
                if required.accepts(kind) {
                    satisfied.insert(required);
                }
            }
        }
    }

    let title_property_name = match titles.as_slice() {
        [only] => PropertyName::new(*only),
        [] => {
            return Err(AppError::Schema(
                "Database has no title property".to_string(),
            ))
        }
        many => {
            return Err(AppError::Schema(format!(
                "Database has {} title properties ({})",
                many.len(),
                many.join(", ")
            )))
        }
    };

    let needs_rename = !title_property_name.is_canonical_title();
    let missing: Vec<RequiredProperty> = RequiredProperty::ALL
        .into_iter()
        .filter(|required| match required {
            RequiredProperty::Name => needs_rename,
            other => !satisfied.contains(other),
        })
        .collect();

    Ok(DatabaseSchemaCheck {
        has_all: missing.is_empty(),
        missing,
        title_property_name,
        needs_rename,
        database,
    })
}
