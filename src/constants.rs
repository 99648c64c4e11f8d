// src/constants.rs
//! Domain constants that define the operational boundaries of the clipper.
//!
//! Each constant is named for the domain concept it constrains, not its
//! technical role.

// ---------------------------------------------------------------------------
// Notion API boundaries
// ---------------------------------------------------------------------------

/// The Notion API version every request is pinned to.
pub const NOTION_VERSION: &str = "2022-06-28";

/// Base URL of the public Notion REST API.
pub const NOTION_API_BASE_URL: &str = "https://api.notion.com/v1";

// ---------------------------------------------------------------------------
// Database schema
// ---------------------------------------------------------------------------

/// The name the clipper standardizes the database title property on.
pub const CANONICAL_TITLE_PROPERTY: &str = "name";

/// How long a schema inspection result is trusted before re-fetching.
///
/// Schema changes made outside the clipper go unnoticed for at most this long.
pub const SCHEMA_VALIDATION_TTL_MINUTES: i64 = 30;

/// How many trailing characters of the API key go into a cache key.
///
/// Enough to tell integrations apart without keeping the whole secret around.
pub const CACHE_KEY_SUFFIX_LEN: usize = 8;

// ---------------------------------------------------------------------------
// Thumbnails
// ---------------------------------------------------------------------------

/// File name attached to every uploaded screenshot.
pub const THUMBNAIL_FILE_NAME: &str = "screenshot.png";

/// Mime type assumed when image data carries none.
pub const THUMBNAIL_DEFAULT_MIME: &str = "image/png";

// ---------------------------------------------------------------------------
// Metadata fallbacks
// ---------------------------------------------------------------------------

/// Display name for a database whose title is empty.
pub const UNTITLED_DATABASE: &str = "Untitled";

/// Emoji shown for databases with a custom (file) icon.
pub const CUSTOM_ICON_PLACEHOLDER: &str = "🔲";

/// Domain reported when a URL cannot be parsed at all.
pub const UNKNOWN_DOMAIN: &str = "unknown";

// ---------------------------------------------------------------------------
// Error display
// ---------------------------------------------------------------------------

/// Maximum characters shown when previewing error response bodies.
pub const ERROR_BODY_PREVIEW_LENGTH: usize = 200;
