use std::path::Path;
use crate::utils::{ConverterError, ConverterResult};

/// Get file size in bytes
pub fn get_file_size(path: impl AsRef<Path>) -> ConverterResult<u64> {
    std::fs::metadata(path.as_ref())
        .map(|m| m.len())
        .map_err(|e| ConverterError::io(format!("Failed to get file size: {}", e)))
}

/// Check if a regular file exists at `path`
pub fn file_exists(path: impl AsRef<Path>) -> bool {
    path.as_ref().is_file()
}

/// Extracts the file name for log messages, falling back to the full path.
pub fn extract_filename(path: &str) -> &str {
    Path::new(path)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(path)
}
