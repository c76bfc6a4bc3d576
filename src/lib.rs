// Module declarations in dependency order
pub mod commands;
pub mod core;
pub mod processing;
pub mod utils;

// Public exports for external consumers
pub use core::{
    AppState,
    AssetRef,
    AssetResolver,
    BackendPreference,
    BatchResult,
    ConversionOutcome,
    ConversionStatus,
    ConverterConfig,
    EntryPoint,
    RecordUpdater,
    SourceDescriptor,
};
pub use processing::{BackendSelection, ConversionBackend, ConversionPipeline, WEBP_QUALITY};
pub use utils::{ConverterError, ConverterResult, ErrorKind};
pub use commands::*;

// The command line entry point lives in main.rs.
