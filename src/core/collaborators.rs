//! Host-side collaborators the converter reads from and reports to.
//!
//! The converter never owns asset records. It asks an [`AssetResolver`] where
//! an asset lives and tells a [`RecordUpdater`] where the converted file went.

use crate::core::{AssetRef, SourceDescriptor};
use crate::utils::ConverterResult;

/// Maps an asset reference to the file behind it.
pub trait AssetResolver: Send + Sync {
    fn resolve(&self, asset: AssetRef) -> ConverterResult<SourceDescriptor>;
}

/// Persists the new location of a converted asset.
pub trait RecordUpdater: Send + Sync {
    fn update(&self, asset: AssetRef, new_path: &str, new_url: &str) -> ConverterResult<()>;
}
