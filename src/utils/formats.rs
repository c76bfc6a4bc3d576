//! Declared-type classification and content-based type detection.

use std::path::Path;
use serde::{Deserialize, Serialize};
use crate::utils::{ConverterError, ConverterResult};

/// MIME type written on a converted asset.
pub const WEBP_MIME: &str = "image/webp";

/// MIME type reported when content matches no known image signature.
pub const UNKNOWN_MIME: &str = "application/octet-stream";

/// Source formats the converter accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceFormat {
    Jpeg,
    Png,
    Gif,
    Bmp,
    Tiff,
    Ico,
}

/// Format-specific preprocessing the decoder has to apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DecodeHint {
    /// Decoded raster can be encoded as is
    Direct,
    /// Palette images must be expanded to full truecolor before encoding
    PaletteToTruecolor,
}

/// Verdict of [`classify`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Supported(DecodeHint),
    Unsupported,
}

impl SourceFormat {
    pub const ALL: [SourceFormat; 6] = [
        Self::Jpeg,
        Self::Png,
        Self::Gif,
        Self::Bmp,
        Self::Tiff,
        Self::Ico,
    ];

    /// Maps a declared type to a format.
    ///
    /// Matching is exact and case-sensitive: `IMAGE/JPEG` is not `image/jpeg`.
    pub fn from_mime(declared_type: &str) -> Option<Self> {
        match declared_type {
            "image/jpeg" => Some(Self::Jpeg),
            "image/png" => Some(Self::Png),
            "image/gif" => Some(Self::Gif),
            "image/bmp" => Some(Self::Bmp),
            "image/tiff" => Some(Self::Tiff),
            "image/x-icon" | "image/vnd.microsoft.icon" => Some(Self::Ico),
            _ => None,
        }
    }

    /// Canonical MIME type for this format
    pub fn mime(&self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::Gif => "image/gif",
            Self::Bmp => "image/bmp",
            Self::Tiff => "image/tiff",
            Self::Ico => "image/x-icon",
        }
    }

    pub fn decode_hint(&self) -> DecodeHint {
        match self {
            Self::Png => DecodeHint::PaletteToTruecolor,
            _ => DecodeHint::Direct,
        }
    }

    /// Get file extensions associated with this format
    pub fn extensions(&self) -> &[&str] {
        match self {
            Self::Jpeg => &["jpg", "jpeg"],
            Self::Png => &["png"],
            Self::Gif => &["gif"],
            Self::Bmp => &["bmp"],
            Self::Tiff => &["tiff"],
            Self::Ico => &["ico"],
        }
    }

    fn from_image_format(format: image::ImageFormat) -> Option<Self> {
        match format {
            image::ImageFormat::Jpeg => Some(Self::Jpeg),
            image::ImageFormat::Png => Some(Self::Png),
            image::ImageFormat::Gif => Some(Self::Gif),
            image::ImageFormat::Bmp => Some(Self::Bmp),
            image::ImageFormat::Tiff => Some(Self::Tiff),
            image::ImageFormat::Ico => Some(Self::Ico),
            _ => None,
        }
    }
}

/// Classifies a declared type. Pure; never touches the filesystem.
pub fn classify(declared_type: &str) -> Classification {
    match SourceFormat::from_mime(declared_type) {
        Some(format) => Classification::Supported(format.decode_hint()),
        None => Classification::Unsupported,
    }
}

/// Determines a file's MIME type from its leading bytes.
///
/// Used where the declared type must not come from the client. WebP input
/// yields `image/webp` (and is therefore not converted again); anything
/// unrecognised yields [`UNKNOWN_MIME`].
pub fn detect_declared_type(path: impl AsRef<Path>) -> ConverterResult<String> {
    let path = path.as_ref();
    let reader = image::ImageReader::open(path)
        .map_err(|e| ConverterError::io(format!("Cannot open {}: {e}", path.display())))?;

    // open() guesses from the extension; drop that guess so only content counts.
    let mut reader = reader;
    reader.clear_format();
    let reader = reader
        .with_guessed_format()
        .map_err(|e| ConverterError::io(format!("Cannot read {}: {e}", path.display())))?;

    let mime = match reader.format() {
        Some(image::ImageFormat::WebP) => WEBP_MIME,
        Some(format) => SourceFormat::from_image_format(format)
            .map(|f| f.mime())
            .unwrap_or(UNKNOWN_MIME),
        None => UNKNOWN_MIME,
    };
    Ok(mime.to_string())
}
