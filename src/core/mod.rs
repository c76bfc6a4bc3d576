//! Core application types and state management.
//!
//! This module contains the fundamental types used throughout the crate:
//! - [`AppState`]: the backend selected at startup plus runtime configuration
//! - [`SourceDescriptor`]: the image a conversion request points at
//! - [`ConversionOutcome`]: result of converting one asset
//! - [`BatchResult`]: aggregate result of a batch
//! - [`AssetResolver`] / [`RecordUpdater`]: what the host has to provide

mod collaborators;
mod config;
mod state;
mod types;

pub use collaborators::{AssetResolver, RecordUpdater};
pub use config::{BackendPreference, ConverterConfig};
pub use state::AppState;
pub use types::{
    AssetRef,
    BatchFailure,
    BatchResult,
    ConversionOutcome,
    ConversionStatus,
    EntryPoint,
    SourceDescriptor,
};
