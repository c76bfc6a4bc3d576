// src/processing/libvips/executor.rs

//! Rich backend: any format libvips can load, saved through `webpsave`.

use std::sync::Arc;
use tracing::debug;

use libvips::{VipsApp, VipsImage};

use crate::processing::backend::{ConversionBackend, ConversionJob};
use crate::utils::{ConverterError, ConverterResult, extract_filename};

use super::formats::save_webp;

/// Thread-safe guard for the libvips `VipsApp` lifecycle.
///
/// `VipsApp` initializes the libvips thread pool and global state on creation
/// and shuts it down on drop. Wrapping in Arc ensures exactly one shutdown
/// call when the last reference is released.
struct VipsAppGuard(VipsApp);

// libvips is designed for concurrent use; individual VipsImage instances are
// never shared between threads here, each conversion loads its own.
unsafe impl Send for VipsAppGuard {}
unsafe impl Sync for VipsAppGuard {}

/// Converts through libvips. Keeps libvips initialised while any clone lives.
#[derive(Clone)]
pub struct RichEncoder {
    _vips: Arc<VipsAppGuard>,
}

impl RichEncoder {
    /// Initialises libvips, failing when the library cannot start.
    pub fn initialise() -> ConverterResult<Self> {
        let vips = VipsApp::default("webp-converter")
            .map_err(|e| ConverterError::backend(format!("Failed to initialize libvips: {e}")))?;
        // 0 = let libvips decide based on available CPU cores
        vips.concurrency_set(0);
        debug!("libvips initialized (concurrency: {})", vips.concurency_get());

        Ok(Self {
            _vips: Arc::new(VipsAppGuard(vips)),
        })
    }
}

impl ConversionBackend for RichEncoder {
    fn name(&self) -> &'static str {
        "rich"
    }

    /// The decode hint is unused: libvips picks its loader from the file content.
    fn convert(&self, job: &ConversionJob<'_>) -> ConverterResult<()> {
        let input_path = job
            .source
            .to_str()
            .ok_or_else(|| ConverterError::processing("Source path is not valid UTF-8"))?;
        let output_path = job
            .destination
            .to_str()
            .ok_or_else(|| ConverterError::processing("Destination path is not valid UTF-8"))?;

        let image = VipsImage::new_from_file(input_path)
            .map_err(|e| ConverterError::processing(format!("Failed to load '{input_path}': {e}")))?;

        debug!(
            "Loaded '{}': {}×{}",
            extract_filename(input_path),
            image.get_width(),
            image.get_height()
        );

        save_webp(&image, output_path)
    }
}
