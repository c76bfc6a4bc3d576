// src/processing/libvips/formats.rs

//! WebP save options for the rich backend.

use libvips::ops::{self, ForeignKeep};
use libvips::VipsImage;

use crate::processing::WEBP_QUALITY;
use crate::utils::ConverterError;

type Result<T> = std::result::Result<T, ConverterError>;

const WEBP_EFFORT: i32 = 4;

/// Saves `image` as lossy WebP at the fixed quality with all metadata stripped.
///
/// WebP has no interlaced mode, so there is no interlace flag to clear.
pub fn save_webp(image: &VipsImage, output_path: &str) -> Result<()> {
    let q = WEBP_QUALITY as i32;

    let opts = ops::WebpsaveOptions {
        q,
        lossless: false,
        alpha_q: q,
        effort: WEBP_EFFORT,
        smart_subsample: false,
        keep: ForeignKeep::None, // strip EXIF, XMP, ICC
        ..ops::WebpsaveOptions::default()
    };

    ops::webpsave_with_opts(image, output_path, &opts)
        .map_err(|e| ConverterError::processing(format!("WebP save failed: {e}")))
}
