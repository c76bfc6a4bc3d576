//! The unit of work for one asset: classify, derive, skip, convert, verify.

use std::path::Path;
use tracing::{debug, info, warn};

use crate::core::{ConversionOutcome, EntryPoint, SourceDescriptor};
use crate::utils::{
    classify,
    derive_webp_path,
    extract_filename,
    file_exists,
    get_file_size,
    has_convertible_extension,
    is_webp_path,
    Classification,
    ErrorKind,
    WEBP_MIME,
};

use super::backend::{BackendSelection, ConversionJob};

/// Converts single assets with the process-wide backend selection.
///
/// Cloning is cheap; clones share the selected backend.
#[derive(Debug, Clone)]
pub struct ConversionPipeline {
    backend: BackendSelection,
}

impl ConversionPipeline {
    pub fn new(backend: BackendSelection) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &BackendSelection {
        &self.backend
    }

    /// Runs the pipeline for `source`. Never fails: every error ends up as a
    /// `Failed` outcome carrying its [`ErrorKind`].
    ///
    /// The source file is never modified or removed.
    pub fn run(&self, source: &SourceDescriptor, entry: EntryPoint) -> ConversionOutcome {
        // A record that already points at its WebP counts as converted.
        if entry == EntryPoint::OnDemand && source.declared_type == WEBP_MIME && is_webp_path(&source.path) {
            info!("'{}' is already WebP", extract_filename(&source.path));
            return ConversionOutcome::skipped(source.path.clone(), source.url.clone());
        }

        let hint = match classify(&source.declared_type) {
            Classification::Supported(hint) => hint,
            Classification::Unsupported => {
                debug!("Not converting '{}': type '{}' unsupported", source.path, source.declared_type);
                return ConversionOutcome::rejected(ErrorKind::UnsupportedFormat);
            }
        };

        // An unchanged path would make the backend overwrite its own input.
        if !has_convertible_extension(&source.path) || !has_convertible_extension(&source.url) {
            warn!("Cannot derive a .webp destination for '{}'", source.path);
            return ConversionOutcome::rejected(ErrorKind::DestinationUnderivable);
        }
        let destination_path = derive_webp_path(&source.path);
        let destination_url = derive_webp_path(&source.url);

        if entry == EntryPoint::OnDemand && file_exists(&destination_path) {
            info!("'{}' already converted", extract_filename(&destination_path));
            return ConversionOutcome::skipped(destination_path, destination_url);
        }

        let Some(backend) = self.backend.backend() else {
            warn!("No conversion backend available for '{}'", source.path);
            return ConversionOutcome::failed(ErrorKind::NoBackendAvailable, destination_path, destination_url);
        };

        let job = ConversionJob {
            source: Path::new(&source.path),
            destination: Path::new(&destination_path),
            declared_type: &source.declared_type,
            hint,
        };

        if let Err(e) = backend.convert(&job) {
            warn!("Conversion of '{}' failed ({} backend): {}", source.path, backend.name(), e);
            return ConversionOutcome::failed(ErrorKind::ConversionFailed, destination_path, destination_url);
        }

        if !file_exists(&destination_path) {
            warn!("Backend reported success but '{}' does not exist", destination_path);
            return ConversionOutcome::failed(ErrorKind::OutputMissing, destination_path, destination_url);
        }

        debug!(
            "'{}' → '{}' ({} bytes)",
            extract_filename(&source.path),
            extract_filename(&destination_path),
            get_file_size(&destination_path).unwrap_or(0)
        );

        ConversionOutcome::converted(destination_path, destination_url)
    }
}
