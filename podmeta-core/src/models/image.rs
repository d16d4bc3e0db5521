//! Inline image payloads sent to vision models.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::CoreError;

/// Image formats the vision endpoints accept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ImageMime {
    /// `image/png`
    #[serde(rename = "image/png")]
    Png,
    /// `image/jpeg`
    #[serde(rename = "image/jpeg")]
    Jpeg,
    /// `image/webp`
    #[serde(rename = "image/webp")]
    Webp,
    /// `image/gif`
    #[serde(rename = "image/gif")]
    Gif,
}

impl ImageMime {
    /// Returns the MIME type string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::Webp => "image/webp",
            Self::Gif => "image/gif",
        }
    }

    /// Parses a MIME type string.
    pub fn from_mime_type(mime: &str) -> Option<Self> {
        match mime.trim().to_ascii_lowercase().as_str() {
            "image/png" => Some(Self::Png),
            "image/jpeg" | "image/jpg" => Some(Self::Jpeg),
            "image/webp" => Some(Self::Webp),
            "image/gif" => Some(Self::Gif),
            _ => None,
        }
    }

    /// Guesses the MIME type from a file extension (without the dot).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "png" => Some(Self::Png),
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "webp" => Some(Self::Webp),
            "gif" => Some(Self::Gif),
            _ => None,
        }
    }
}

impl fmt::Display for ImageMime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A base64-encoded image with its MIME type.
#[derive(Clone, PartialEq, Eq)]
pub struct ImagePayload {
    data: String,
    mime: ImageMime,
}

impl ImagePayload {
    /// Validates and wraps an encoded image.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidImage`] if the payload is empty or the
    /// MIME type is not supported.
    pub fn new(base64_data: impl Into<String>, mime_type: &str) -> Result<Self, CoreError> {
        let data = base64_data.into();
        if data.trim().is_empty() {
            return Err(CoreError::InvalidImage("empty image payload".to_string()));
        }
        let mime = ImageMime::from_mime_type(mime_type).ok_or_else(|| {
            CoreError::InvalidImage(format!("unsupported mime type: {mime_type}"))
        })?;
        Ok(Self { data, mime })
    }

    /// Returns the base64 data.
    pub fn data(&self) -> &str {
        &self.data
    }

    /// Returns the MIME type.
    pub fn mime(&self) -> ImageMime {
        self.mime
    }

    /// Returns a `data:` URL suitable for an `image_url` content part.
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime.as_str(), self.data)
    }
}

impl fmt::Debug for ImagePayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImagePayload")
            .field("mime", &self.mime)
            .field("len", &self.data.len())
            .finish()
    }
}
