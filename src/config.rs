// src/config.rs
use crate::constants::{NOTION_API_BASE_URL, THUMBNAIL_DEFAULT_MIME};
use crate::error::AppError;
use crate::model::{CapturePayload, ImageData, Profile};
use crate::types::{ApiKey, DatabaseId, ValidatedUrl, ValidationError};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};

const API_KEY_VAR: &str = "NOTION_API_KEY";
const DATABASE_ID_VAR: &str = "NOTION_DATABASE_ID";

/// Parsed command-line input.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct CommandLineInput {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose logging (debug level)
    #[arg(short, long, global = true, default_value_t = false)]
    pub verbose: bool,

    /// Profile JSON file as written by the extension's storage layer.
    /// Defaults to NOTION_API_KEY / NOTION_DATABASE_ID from the environment.
    #[arg(long, global = true)]
    pub profile: Option<PathBuf>,

    /// Notion API base URL (for proxies and local mocks)
    #[arg(long, global = true)]
    pub base_url: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Save a URL into the profile's database
    Save {
        /// The URL to save
        url: String,

        /// Entry title (defaults to the URL)
        #[arg(long)]
        title: Option<String>,

        /// Label to file the entry under
        #[arg(long)]
        label: Option<String>,

        /// Screenshot to attach as thumbnail (image file or a file holding a data URL)
        #[arg(long)]
        thumbnail: Option<PathBuf>,

        /// What kind of capture this is
        #[arg(long, value_enum, default_value_t = SourceArg::Page)]
        source: SourceArg,
    },
    /// Validate and repair the database, then print the updated profile
    Check,
    /// Print the database's label options
    Labels,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceArg {
    Page,
    Link,
    SocialPost,
}

/// What the binary was asked to do, with inputs already validated.
#[derive(Debug, Clone)]
pub enum Action {
    Save(CapturePayload),
    Check,
    Labels,
}

/// Resolved configuration: a usable profile, an endpoint and an action.
#[derive(Debug, Clone)]
pub struct ClipperConfig {
    pub profile: Profile,
    pub base_url: ValidatedUrl,
    pub verbose: bool,
    pub action: Action,
}

impl ClipperConfig {
    /// Resolves a complete configuration from CLI input and environment.
    pub fn resolve(cli: CommandLineInput) -> Result<Self, AppError> {
        let profile = match &cli.profile {
            Some(path) => load_profile(path)?,
            None => profile_from_env()?,
        };
        let base_url = ValidatedUrl::parse(cli.base_url.as_deref().unwrap_or(NOTION_API_BASE_URL))?;

        let action = match cli.command {
            Command::Save {
                url,
                title,
                label,
                thumbnail,
                source,
            } => {
                let url = ValidatedUrl::parse(url.trim())?;
                let mut capture = match source {
                    SourceArg::Page => CapturePayload::page(url.as_str(), title),
                    SourceArg::Link => CapturePayload::link(url.as_str(), title),
                    SourceArg::SocialPost => CapturePayload::social_post(url.as_str(), title),
                };
                if let Some(label) = label {
                    capture = capture.with_label(label);
                }
                if let Some(path) = thumbnail {
                    capture = capture.with_thumbnail(load_image(&path)?);
                }
                Action::Save(capture)
            }
            Command::Check => Action::Check,
            Command::Labels => Action::Labels,
        };

        Ok(Self {
            profile,
            base_url,
            verbose: cli.verbose,
            action,
        })
    }
}

/// Reads a profile record as the storage layer persists it.
pub fn load_profile(path: &Path) -> Result<Profile, AppError> {
    let contents = std::fs::read_to_string(path)?;
    serde_json::from_str(&contents).map_err(|source| AppError::JsonParseError {
        path: path.to_path_buf(),
        source,
    })
}

fn profile_from_env() -> Result<Profile, AppError> {
    let api_key = ApiKey::new(required_env(API_KEY_VAR)?)?;
    let database_id = DatabaseId::parse(&required_env(DATABASE_ID_VAR)?)?;
    Ok(Profile::new(api_key, database_id))
}

fn required_env(name: &'static str) -> Result<String, AppError> {
    let value = std::env::var(name).map_err(|_| {
        AppError::MissingConfiguration(format!("{} environment variable not set", name))
    })?;
    if value.trim().is_empty() {
        return Err(ValidationError::EmptyField(name).into());
    }
    Ok(value)
}

/// Loads a thumbnail from disk. Files holding a `data:` URL are decoded;
/// anything else is taken as raw image bytes typed by extension.
fn load_image(path: &Path) -> Result<ImageData, AppError> {
    let bytes = std::fs::read(path)?;
    if bytes.starts_with(b"data:") {
        return ImageData::from_data_url(&String::from_utf8_lossy(&bytes));
    }
    Ok(ImageData::from_bytes(bytes, mime_for_path(path)))
}

fn mime_for_path(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        _ => THUMBNAIL_DEFAULT_MIME,
    }
}
