//! Destination path derivation.
//!
//! A converted file lives next to its source with the same stem and a
//! `.webp` extension. The same substitution applies to URLs.

use std::path::Path;
use lazy_static::lazy_static;
use regex::Regex;
use crate::utils::formats::SourceFormat;

lazy_static! {
    /// Trailing convertible extension, any case.
    static ref CONVERTIBLE_EXTENSION: Regex = {
        let alternatives = SourceFormat::ALL
            .iter()
            .flat_map(|format| format.extensions().iter().copied())
            .collect::<Vec<_>>()
            .join("|");
        Regex::new(&format!(r"(?i)\.(?:{alternatives})$"))
            .expect("extension pattern is a valid regex")
    };
}

/// Replaces a trailing convertible extension with `.webp`.
///
/// Returns the input unchanged when it carries no such extension; callers
/// must treat an unchanged result as "cannot derive a destination".
pub fn derive_webp_path(path: &str) -> String {
    CONVERTIBLE_EXTENSION.replace(path, ".webp").into_owned()
}

/// `true` when [`derive_webp_path`] would change `path`.
pub fn has_convertible_extension(path: &str) -> bool {
    CONVERTIBLE_EXTENSION.is_match(path)
}

/// `true` for a path or URL ending in `.webp`, any case.
pub fn is_webp_path(path: &str) -> bool {
    Path::new(path)
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("webp"))
}

/// Swaps the file name of `old_path` for that of `new_path` inside a
/// host-relative attachment path such as `2024/05/photo.jpg`.
pub fn rebase_attached_file(relative: &str, old_path: &str, new_path: &str) -> String {
    let old_name = file_name(old_path);
    let new_name = file_name(new_path);
    if old_name.is_empty() {
        return relative.to_string();
    }
    relative.replace(old_name, new_name)
}

fn file_name(path: &str) -> &str {
    Path::new(path)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("")
}
