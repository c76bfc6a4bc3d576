//! Error types for the WebP converter.
//!
//! [`ConverterError`] is the `thiserror` type returned by fallible internals
//! (backends, collaborators, content sniffing). [`ErrorKind`] is the flat
//! taxonomy a conversion outcome reports once the pipeline has recovered
//! from the error.

use std::io;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why a single asset did not end up converted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorKind {
    /// Declared type is not in the recognized set
    UnsupportedFormat,
    /// No encoding backend could be initialised in this process
    NoBackendAvailable,
    /// Decode, encode or write failed inside the backend
    ConversionFailed,
    /// Backend reported success but the destination file is absent
    OutputMissing,
    /// The asset reference could not be mapped to a source descriptor
    ResolveFailed,
    /// Source path or URL carries no convertible extension
    DestinationUnderivable,
    /// The host refused to record the new location
    RecordUpdateFailed,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UnsupportedFormat => "unsupportedFormat",
            Self::NoBackendAvailable => "noBackendAvailable",
            Self::ConversionFailed => "conversionFailed",
            Self::OutputMissing => "outputMissing",
            Self::ResolveFailed => "resolveFailed",
            Self::DestinationUnderivable => "destinationUnderivable",
            Self::RecordUpdateFailed => "recordUpdateFailed",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Main error type for the converter.
#[derive(Error, Debug, Serialize)]
pub enum ConverterError {
    /// Image decoding or encoding failed
    #[error("Processing error: {0}")]
    Processing(String),

    /// File IO error
    #[error("IO error: {0}")]
    IO(String),

    /// Unsupported or unrecognised image format
    #[error("Format error: {0}")]
    Format(String),

    /// Backend could not be initialised or used
    #[error("Backend error: {0}")]
    Backend(String),

    /// Asset reference could not be resolved by the host
    #[error("Resolve error: {0}")]
    Resolve(String),

    /// Host record update failed
    #[error("Record error: {0}")]
    Record(String),
}

/// Convenience result type for converter operations.
pub type ConverterResult<T> = Result<T, ConverterError>;

// Helper methods for error creation
impl ConverterError {
    pub fn processing<T: Into<String>>(msg: T) -> Self {
        Self::Processing(msg.into())
    }

    pub fn io<T: Into<String>>(msg: T) -> Self {
        Self::IO(msg.into())
    }

    pub fn format<T: Into<String>>(msg: T) -> Self {
        Self::Format(msg.into())
    }

    pub fn backend<T: Into<String>>(msg: T) -> Self {
        Self::Backend(msg.into())
    }

    pub fn resolve<T: Into<String>>(msg: T) -> Self {
        Self::Resolve(msg.into())
    }

    pub fn record<T: Into<String>>(msg: T) -> Self {
        Self::Record(msg.into())
    }
}

// Convert std::io::Error to ConverterError
impl From<io::Error> for ConverterError {
    fn from(err: io::Error) -> Self {
        Self::IO(err.to_string())
    }
}

impl From<image::ImageError> for ConverterError {
    fn from(err: image::ImageError) -> Self {
        match err {
            image::ImageError::Unsupported(e) => Self::Format(e.to_string()),
            image::ImageError::IoError(e) => Self::IO(e.to_string()),
            other => Self::Processing(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_kind_serializes_camel_case() {
        let json = serde_json::to_string(&ErrorKind::NoBackendAvailable).unwrap();
        assert_eq!(json, "\"noBackendAvailable\"");
        assert_eq!(ErrorKind::OutputMissing.to_string(), "outputMissing");
    }

    #[test]
    fn io_errors_convert() {
        let err: ConverterError = io::Error::new(io::ErrorKind::NotFound, "gone").into();
        assert!(matches!(err, ConverterError::IO(ref msg) if msg.contains("gone")));
    }
}
