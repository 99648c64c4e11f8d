use crate::constants::THUMBNAIL_DEFAULT_MIME;
use crate::error::{AppError, UploadStage};
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a capture came from. Only the page capture carries a screenshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptureSource {
    /// The page open in the current tab.
    Page,
    /// A link picked from the page.
    Link,
    /// A post on a social network, saved from the injected button.
    SocialPost,
}

impl fmt::Display for CaptureSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Page => write!(f, "page"),
            Self::Link => write!(f, "link"),
            Self::SocialPost => write!(f, "social post"),
        }
    }
}

/// What the UI layer hands over for one save.
#[derive(Debug, Clone)]
pub struct CapturePayload {
    pub source: CaptureSource,
    pub url: String,
    pub title: Option<String>,
    pub label: Option<String>,
    pub thumbnail: Option<ImageData>,
}

impl CapturePayload {
    pub fn page(url: impl Into<String>, title: Option<String>) -> Self {
        Self::new(CaptureSource::Page, url, title)
    }

    pub fn link(url: impl Into<String>, text: Option<String>) -> Self {
        Self::new(CaptureSource::Link, url, text)
    }

    pub fn social_post(url: impl Into<String>, text: Option<String>) -> Self {
        Self::new(CaptureSource::SocialPost, url, text)
    }

    fn new(source: CaptureSource, url: impl Into<String>, title: Option<String>) -> Self {
        Self {
            source,
            url: url.into(),
            title,
            label: None,
            thumbnail: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_thumbnail(mut self, image: ImageData) -> Self {
        self.thumbnail = Some(image);
        self
    }
}

/// A captured image, decoded to raw bytes.
#[derive(Clone, PartialEq, Eq)]
pub struct ImageData {
    bytes: Vec<u8>,
    mime: String,
}

impl ImageData {
    pub fn from_bytes(bytes: Vec<u8>, mime: impl Into<String>) -> Self {
        Self {
            bytes,
            mime: mime.into(),
        }
    }

    /// Decodes a `data:<mime>;base64,<payload>` URL, as produced by tab
    /// capture. A bare base64 payload is accepted and assumed to be PNG.
    pub fn from_data_url(data_url: &str) -> Result<Self, AppError> {
        let data_url = data_url.trim();
        let (mime, payload) = match data_url.strip_prefix("data:") {
            Some(rest) => {
                let (header, payload) = rest
                    .split_once(',')
                    .ok_or_else(|| decode_error("data URL has no payload"))?;
                let mut parts = header.split(';');
                let mime = parts
                    .next()
                    .filter(|m| !m.is_empty())
                    .unwrap_or(THUMBNAIL_DEFAULT_MIME);
                if !parts.any(|p| p.eq_ignore_ascii_case("base64")) {
                    return Err(decode_error("only base64 data URLs are supported"));
                }
                (mime, payload)
            }
            None => (THUMBNAIL_DEFAULT_MIME, data_url),
        };

        let bytes = base64::engine::general_purpose::STANDARD
            .decode(payload.trim())
            .map_err(|e| decode_error(&format!("invalid base64 payload: {}", e)))?;
        if bytes.is_empty() {
            return Err(decode_error("image is empty"));
        }

        Ok(Self::from_bytes(bytes, mime))
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn mime(&self) -> &str {
        &self.mime
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl fmt::Debug for ImageData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ImageData({}, {} bytes)", self.mime, self.bytes.len())
    }
}

fn decode_error(message: &str) -> AppError {
    AppError::UploadFailed {
        stage: UploadStage::Decode,
        message: message.to_string(),
    }
}
