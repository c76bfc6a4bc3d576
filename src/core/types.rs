//! Core types for conversion requests and results.

use serde::{Deserialize, Serialize};
use tracing::debug;
use crate::utils::{detect_declared_type, ConverterError, ConverterResult, ErrorKind};

/// Opaque identifier of a media item in the host store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetRef(pub u64);

impl std::fmt::Display for AssetRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl std::str::FromStr for AssetRef {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(Self)
    }
}

/// Source image as handed over by the host for one conversion request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceDescriptor {
    /// Filesystem location of the source image
    pub path: String,
    /// MIME-like type asserted for the file
    #[serde(rename = "type")]
    pub declared_type: String,
    /// Public URL of the source image
    pub url: String,
}

impl SourceDescriptor {
    pub fn new(path: impl Into<String>, declared_type: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            declared_type: declared_type.into(),
            url: url.into(),
        }
    }

    /// Replaces the declared type with the one detected from the file
    /// content. Reads the file header, so call it off the async workers.
    pub fn with_detected_type(mut self) -> ConverterResult<Self> {
        let detected = detect_declared_type(&self.path)
            .map_err(|e| ConverterError::resolve(format!("Cannot sniff '{}': {e}", self.path)))?;
        if detected != self.declared_type {
            debug!("'{}' declared '{}', content is '{}'", self.path, self.declared_type, detected);
        }
        self.declared_type = detected;
        Ok(self)
    }
}

/// Which trigger invoked the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryPoint {
    /// Upload-time conversion: runs exactly once, no existence check
    Upload,
    /// On-demand and bulk conversion: an existing destination is reused
    OnDemand,
}

/// Terminal state of one pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ConversionStatus {
    Converted,
    Skipped,
    Failed,
}

/// Result of converting one asset. Never persisted by the converter itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionOutcome {
    pub status: ConversionStatus,
    /// `true` for converted and skipped assets
    pub success: bool,
    /// Derived `.webp` path, empty when it could not be derived
    pub destination_path: String,
    /// Derived `.webp` URL, empty when it could not be derived
    pub destination_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
}

impl ConversionOutcome {
    pub fn converted(destination_path: String, destination_url: String) -> Self {
        Self {
            status: ConversionStatus::Converted,
            success: true,
            destination_path,
            destination_url,
            error_kind: None,
        }
    }

    pub fn skipped(destination_path: String, destination_url: String) -> Self {
        Self {
            status: ConversionStatus::Skipped,
            success: true,
            destination_path,
            destination_url,
            error_kind: None,
        }
    }

    pub fn failed(kind: ErrorKind, destination_path: String, destination_url: String) -> Self {
        Self {
            status: ConversionStatus::Failed,
            success: false,
            destination_path,
            destination_url,
            error_kind: Some(kind),
        }
    }

    /// Failure before any destination was derived.
    pub fn rejected(kind: ErrorKind) -> Self {
        Self::failed(kind, String::new(), String::new())
    }

    pub fn is_success(&self) -> bool {
        self.success
    }
}

/// One failed item of a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchFailure {
    pub asset: AssetRef,
    pub error_kind: ErrorKind,
}

/// Aggregate result of one batch invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchResult {
    /// Items that were dispatched to the pipeline
    pub attempted: usize,
    /// Converted or already-converted items whose record was updated
    pub succeeded: usize,
    /// Failed items, in input order
    pub failures: Vec<BatchFailure>,
    /// Items never dispatched because the batch was cancelled
    pub cancelled: usize,
}

impl BatchResult {
    pub fn record_failure(&mut self, asset: AssetRef, error_kind: ErrorKind) {
        self.failures.push(BatchFailure { asset, error_kind });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_serializes_with_camel_case_fields() {
        let outcome = ConversionOutcome::failed(
            ErrorKind::OutputMissing,
            "/u/a.webp".into(),
            "https://h/u/a.webp".into(),
        );
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["status"], "failed");
        assert_eq!(json["destinationPath"], "/u/a.webp");
        assert_eq!(json["errorKind"], "outputMissing");

        let ok = serde_json::to_value(ConversionOutcome::skipped("a".into(), "b".into())).unwrap();
        assert_eq!(ok["success"], true);
        assert!(ok.get("errorKind").is_none());
    }

    #[test]
    fn asset_ref_parses_numeric_ids_only() {
        assert_eq!(" 42 ".parse::<AssetRef>().unwrap(), AssetRef(42));
        assert!("abc".parse::<AssetRef>().is_err());
        assert!("-1".parse::<AssetRef>().is_err());
    }

    #[test]
    fn detected_type_replaces_the_declared_one() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("picture.jpg");
        image::RgbImage::from_pixel(2, 2, image::Rgb([1, 2, 3]))
            .save_with_format(&path, image::ImageFormat::Gif)
            .unwrap();

        let source = SourceDescriptor::new(path.to_string_lossy(), "image/jpeg", "https://h/picture.jpg")
            .with_detected_type()
            .unwrap();

        assert_eq!(source.declared_type, "image/gif");
    }

    #[test]
    fn missing_file_cannot_be_sniffed() {
        let err = SourceDescriptor::new("/nonexistent/x.png", "image/png", "u")
            .with_detected_type()
            .unwrap_err();
        assert!(matches!(err, ConverterError::Resolve(_)));
    }

    #[test]
    fn descriptor_uses_type_key() {
        let json = serde_json::to_value(SourceDescriptor::new("/a.png", "image/png", "u")).unwrap();
        assert_eq!(json["type"], "image/png");
    }
}
