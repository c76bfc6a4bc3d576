//! The WebP column of the media list.

use serde::Serialize;

use crate::utils::{derive_webp_path, file_exists, has_convertible_extension, is_webp_path};

/// State shown in the media list's WebP column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum MediaColumnStatus {
    /// The file is WebP or has a `.webp` sibling
    AlreadyConverted,
    /// Offer the convert button
    Convertible,
    /// The file name has no convertible extension
    NotConvertible,
}

impl MediaColumnStatus {
    /// Label rendered in the media list.
    pub fn label(&self) -> &'static str {
        match self {
            Self::AlreadyConverted => "✓ Bereits konvertiert",
            Self::Convertible => "Zu WebP konvertieren",
            Self::NotConvertible => "Nicht konvertierbar",
        }
    }
}

/// Column state for an attached file.
pub fn column_status(path: &str) -> MediaColumnStatus {
    if is_webp_path(path) {
        return MediaColumnStatus::AlreadyConverted;
    }
    if !has_convertible_extension(path) {
        return MediaColumnStatus::NotConvertible;
    }
    if file_exists(derive_webp_path(path)) {
        MediaColumnStatus::AlreadyConverted
    } else {
        MediaColumnStatus::Convertible
    }
}
