//! In-memory media library.
//!
//! A minimal host: it resolves asset references to files and records where
//! converted files went. The CLI runs on it, and it is what tests use as the
//! host side of the endpoints.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use serde::Serialize;
use tracing::debug;

use crate::core::{AssetRef, AssetResolver, RecordUpdater, SourceDescriptor};
use crate::utils::{rebase_attached_file, ConverterError, ConverterResult, WEBP_MIME};

/// What the host stores per media item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaRecord {
    /// Absolute path of the attached file
    pub path: String,
    /// Public URL of the attached file
    pub url: String,
    /// MIME type recorded at upload
    pub declared_type: String,
    /// Attachment path relative to the upload root
    pub attached_file: String,
    /// Permalink, kept equal to the URL
    pub guid: String,
}

#[derive(Debug, Default)]
pub struct MediaLibrary {
    records: Mutex<BTreeMap<AssetRef, MediaRecord>>,
    upload_root: Option<PathBuf>,
}

impl MediaLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Library whose relative attachment paths are computed against `root`.
    pub fn with_upload_root(root: impl Into<PathBuf>) -> Self {
        Self {
            records: Mutex::default(),
            upload_root: Some(root.into()),
        }
    }

    /// Registers a file and returns its new reference. Ids start at 1.
    pub fn insert(&self, path: impl AsRef<Path>, url: &str, declared_type: &str) -> ConverterResult<AssetRef> {
        let path = path.as_ref();
        let attached_file = self.relative_to_root(path);
        let mut records = self.lock()?;
        let asset = AssetRef(records.keys().next_back().map_or(1, |last| last.0 + 1));
        records.insert(
            asset,
            MediaRecord {
                path: path.to_string_lossy().into_owned(),
                url: url.to_string(),
                declared_type: declared_type.to_string(),
                attached_file,
                guid: url.to_string(),
            },
        );
        Ok(asset)
    }

    /// Registers local files, using `file://` URLs.
    pub fn from_files<P: AsRef<Path>>(paths: &[P]) -> ConverterResult<(Self, Vec<AssetRef>)> {
        let library = Self::new();
        let mut assets = Vec::with_capacity(paths.len());
        for path in paths {
            let path = std::path::absolute(path.as_ref())?;
            let url = format!("file://{}", path.to_string_lossy());
            assets.push(library.insert(&path, &url, "")?);
        }
        Ok((library, assets))
    }

    pub fn get(&self, asset: AssetRef) -> Option<MediaRecord> {
        self.lock().ok()?.get(&asset).cloned()
    }

    fn relative_to_root(&self, path: &Path) -> String {
        let relative = match &self.upload_root {
            Some(root) => path.strip_prefix(root).unwrap_or(path),
            None => path,
        };
        relative.to_string_lossy().into_owned()
    }

    fn lock(&self) -> ConverterResult<MutexGuard<'_, BTreeMap<AssetRef, MediaRecord>>> {
        self.records
            .lock()
            .map_err(|_| ConverterError::record("Media library state is corrupted"))
    }
}

impl AssetResolver for MediaLibrary {
    fn resolve(&self, asset: AssetRef) -> ConverterResult<SourceDescriptor> {
        let records = self.lock()?;
        let record = records
            .get(&asset)
            .ok_or_else(|| ConverterError::resolve(format!("No media item {asset}")))?;
        if !Path::new(&record.path).is_file() {
            return Err(ConverterError::resolve(format!("File of {asset} missing: {}", record.path)));
        }
        Ok(SourceDescriptor::new(&record.path, &record.declared_type, &record.url))
    }
}

impl RecordUpdater for MediaLibrary {
    fn update(&self, asset: AssetRef, new_path: &str, new_url: &str) -> ConverterResult<()> {
        let mut records = self.lock()?;
        let record = records
            .get_mut(&asset)
            .ok_or_else(|| ConverterError::record(format!("No media item {asset}")))?;

        record.attached_file = rebase_attached_file(&record.attached_file, &record.path, new_path);
        record.path = new_path.to_string();
        record.url = new_url.to_string();
        record.guid = new_url.to_string();
        record.declared_type = WEBP_MIME.to_string();

        debug!("Media item {} now points at {}", asset, record.attached_file);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_sequential() {
        let library = MediaLibrary::new();
        assert_eq!(library.insert("/a.jpg", "u/a.jpg", "image/jpeg").unwrap(), AssetRef(1));
        assert_eq!(library.insert("/b.jpg", "u/b.jpg", "image/jpeg").unwrap(), AssetRef(2));
    }

    #[test]
    fn resolves_only_existing_files() {
        let dir = tempfile::tempdir().unwrap();
        let present = dir.path().join("here.png");
        std::fs::write(&present, b"x").unwrap();
        let library = MediaLibrary::new();
        let here = library.insert(&present, "https://h/here.png", "image/png").unwrap();
        let gone = library.insert(dir.path().join("gone.png"), "https://h/gone.png", "image/png").unwrap();

        let source = library.resolve(here).unwrap();
        assert_eq!(source.declared_type, "image/png");
        assert_eq!(source.url, "https://h/here.png");
        assert!(matches!(library.resolve(gone), Err(ConverterError::Resolve(_))));
        assert!(matches!(library.resolve(AssetRef(99)), Err(ConverterError::Resolve(_))));
    }

    #[test]
    fn update_rewrites_location_metadata() {
        let library = MediaLibrary::with_upload_root("/srv/uploads");
        let asset = library
            .insert("/srv/uploads/2024/05/photo.jpg", "https://h/uploads/2024/05/photo.jpg", "image/jpeg")
            .unwrap();
        assert_eq!(library.get(asset).unwrap().attached_file, "2024/05/photo.jpg");

        library
            .update(asset, "/srv/uploads/2024/05/photo.webp", "https://h/uploads/2024/05/photo.webp")
            .unwrap();

        let record = library.get(asset).unwrap();
        assert_eq!(record.path, "/srv/uploads/2024/05/photo.webp");
        assert_eq!(record.attached_file, "2024/05/photo.webp");
        assert_eq!(record.guid, "https://h/uploads/2024/05/photo.webp");
        assert_eq!(record.declared_type, "image/webp");
    }

    #[test]
    fn updating_unknown_asset_fails() {
        let library = MediaLibrary::new();
        assert!(matches!(
            library.update(AssetRef(5), "/x.webp", "u/x.webp"),
            Err(ConverterError::Record(_))
        ));
    }
}
