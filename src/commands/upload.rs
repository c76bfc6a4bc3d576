//! Upload-time conversion hook.

use tracing::{debug, info};
use crate::core::{ConversionStatus, EntryPoint, SourceDescriptor};
use crate::processing::ConversionPipeline;
use crate::utils::WEBP_MIME;

/// Converts a freshly uploaded file before the host stores its record.
///
/// Runs synchronously. On success the returned descriptor points at the
/// `.webp` file with type `image/webp`; on any failure the upload is handed
/// back untouched and the original file is stored as is.
pub fn handle_upload(pipeline: &ConversionPipeline, mut upload: SourceDescriptor) -> SourceDescriptor {
    let outcome = pipeline.run(&upload, EntryPoint::Upload);

    if outcome.status == ConversionStatus::Converted {
        info!("Upload '{}' stored as WebP", upload.path);
        upload.path = outcome.destination_path;
        upload.url = outcome.destination_url;
        upload.declared_type = WEBP_MIME.to_string();
    } else {
        debug!("Upload '{}' kept as is ({:?})", upload.path, outcome.error_kind);
    }

    upload
}
