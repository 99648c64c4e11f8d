use crate::constants::UNTITLED_DATABASE;
use crate::types::{ApiKey, DatabaseId, PropertyName};
use serde::{Deserialize, Serialize};

/// A saved credential + database binding the user can select.
///
/// The storage layer persists this record verbatim (camelCase JSON);
/// the clipper only reads it and hands back updated copies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: String,
    pub api_key: ApiKey,
    pub database_id: DatabaseId,
    #[serde(default = "untitled")]
    pub name: String,
    #[serde(default)]
    pub emoji: Option<String>,
    /// Cached name of the database's title property. Mirrors the remote
    /// schema and is refreshed by the save flow when a rename happens.
    #[serde(default = "PropertyName::canonical_title")]
    pub title_property_name: PropertyName,
    #[serde(default)]
    pub label_options: Vec<String>,
}

fn untitled() -> String {
    UNTITLED_DATABASE.to_string()
}

impl Profile {
    /// A fresh profile with a random id and no metadata yet.
    pub fn new(api_key: ApiKey, database_id: DatabaseId) -> Self {
        Self {
            id: uuid::Uuid::new_v4().as_simple().to_string(),
            api_key,
            database_id,
            name: untitled(),
            emoji: None,
            title_property_name: PropertyName::canonical_title(),
            label_options: Vec::new(),
        }
    }

    pub fn with_metadata(mut self, metadata: DatabaseMetadata) -> Self {
        self.name = metadata.name;
        self.emoji = metadata.emoji;
        self
    }

    pub fn with_title_property(mut self, name: PropertyName) -> Self {
        self.title_property_name = name;
        self
    }
}

/// Display metadata of a database: its title and icon emoji.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseMetadata {
    pub name: String,
    pub emoji: Option<String>,
}
