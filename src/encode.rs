//! Reference image encoding: local file → `data:image/<type>;base64,...`.
//!
//! The Ark API accepts the first frame either as a public URL or as a data
//! URL embedded in the request body. The MIME subtype comes from the file
//! extension alone: `.jpg`/`.jpeg` map to `jpeg`, everything else to `png`.

use crate::error::{ArkGenError, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::path::Path;
use tracing::debug;

/// Image subtype used in the data URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageMime {
    /// `image/jpeg`
    Jpeg,
    /// `image/png`
    Png,
}

impl ImageMime {
    /// Picks the subtype from a path's extension (case-insensitive).
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        match path
            .as_ref()
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref()
        {
            Some("jpg") | Some("jpeg") => Self::Jpeg,
            _ => Self::Png,
        }
    }

    /// Lowercase subtype as it appears after `image/`.
    pub fn subtype(&self) -> &'static str {
        match self {
            Self::Jpeg => "jpeg",
            Self::Png => "png",
        }
    }
}

/// An image ready to be embedded in a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    /// Subtype derived from the source extension.
    pub mime: ImageMime,
    /// Standard base64 of the file bytes.
    pub base64: String,
}

impl EncodedImage {
    /// Encodes raw bytes with the given subtype.
    pub fn from_bytes(bytes: &[u8], mime: ImageMime) -> Self {
        Self {
            mime,
            base64: STANDARD.encode(bytes),
        }
    }

    /// Renders `data:image/<type>;base64,<payload>`.
    pub fn to_data_url(&self) -> String {
        format!("data:image/{};base64,{}", self.mime.subtype(), self.base64)
    }
}

/// Reads an image file and encodes it for embedding.
///
/// A missing file yields [`ArkGenError::ImageNotFound`]; any other read
/// failure is reported as [`ArkGenError::Io`].
pub async fn encode_image_file(path: impl AsRef<Path>) -> Result<EncodedImage> {
    let path = path.as_ref();
    let bytes = tokio::fs::read(path).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            ArkGenError::ImageNotFound(path.to_path_buf())
        } else {
            ArkGenError::Io(e)
        }
    })?;

    let encoded = EncodedImage::from_bytes(&bytes, ImageMime::from_path(path));
    debug!(
        path = %path.display(),
        bytes = bytes.len(),
        encoded_len = encoded.base64.len(),
        "encoded reference image"
    );
    Ok(encoded)
}

/// Convenience wrapper returning the data URL directly.
pub async fn image_to_data_url(path: impl AsRef<Path>) -> Result<String> {
    Ok(encode_image_file(path).await?.to_data_url())
}

/// Decodes the payload of a `data:<mime>;base64,<payload>` string.
pub fn decode_data_url(data_url: &str) -> Result<Vec<u8>> {
    let payload = data_url
        .strip_prefix("data:")
        .and_then(|rest| rest.split_once(";base64,"))
        .map(|(_, payload)| payload)
        .ok_or_else(|| ArkGenError::Decode("not a base64 data URL".into()))?;

    STANDARD
        .decode(payload)
        .map_err(|e| ArkGenError::Decode(e.to_string()))
}
