// src/schema/mod.rs
//! Keeping the target database in the shape the clipper writes to.
//!
//! Every save needs five properties on the database: the title property
//! (canonically `name`), `url`, `label`, `saved_from` and `thumbnail`.
//! [`inspector`] finds what is missing, [`cache`] avoids asking twice in a
//! short window, and [`repair`] patches the database back into shape.

pub mod cache;
pub mod inspector;
pub mod repair;

use crate::types::PropertyName;
use serde::Serialize;
use serde_json::{json, Value};
use std::fmt;

/// One of the properties every clipper database must have.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RequiredProperty {
    Name,
    Url,
    Label,
    SavedFrom,
    Thumbnail,
}

impl RequiredProperty {
    /// All required properties, in the order they are reported.
    pub const ALL: [RequiredProperty; 5] = [
        Self::Name,
        Self::Url,
        Self::Label,
        Self::SavedFrom,
        Self::Thumbnail,
    ];

    /// The property name as it appears on the database.
    pub fn property_name(self) -> &'static str {
        match self {
            Self::Name => crate::constants::CANONICAL_TITLE_PROPERTY,
            Self::Url => "url",
            Self::Label => "label",
            Self::SavedFrom => "saved_from",
            Self::Thumbnail => "thumbnail",
        }
    }

    /// Looks a property up by its database name.
    pub fn from_property_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.property_name() == name)
    }

    /// Whether a property of Notion type `kind` satisfies this requirement.
    pub fn accepts(self, kind: &str) -> bool {
        match self {
            Self::Name => kind == "title",
            Self::Url => kind == "url",
            Self::Label => kind == "select",
            // "text" is what older databases report for rich text
            Self::SavedFrom => kind == "rich_text" || kind == "text",
            Self::Thumbnail => kind == "files",
        }
    }

    /// The empty configuration that creates this property in a schema patch.
    ///
    /// `None` for the title: a database always has one, it can only be renamed.
    pub fn creation_config(self) -> Option<Value> {
        match self {
            Self::Name => None,
            Self::Url => Some(json!({ "url": {} })),
            Self::Label => Some(json!({ "select": { "options": [] } })),
            Self::SavedFrom => Some(json!({ "rich_text": {} })),
            Self::Thumbnail => Some(json!({ "files": {} })),
        }
    }
}

impl fmt::Display for RequiredProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.property_name())
    }
}

/// Result of inspecting a database schema.
///
/// `missing` lists requirements in [`RequiredProperty::ALL`] order. `Name`
/// in `missing` never means the title is absent (Notion databases always
/// have one); it means the title exists under another name.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseSchemaCheck {
    pub has_all: bool,
    pub missing: Vec<RequiredProperty>,
    pub title_property_name: PropertyName,
    pub needs_rename: bool,
    /// The raw database definition the check was computed from.
    pub database: Value,
}

pub use cache::{CacheKey, ValidationCache};
pub use inspector::{check_properties, inspect};
pub use repair::{build_schema_patch, repair, repair_from_check, RepairOutcome, SkippedRepair};
