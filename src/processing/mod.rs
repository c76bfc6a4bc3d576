//! Conversion core: backends, the single-asset pipeline and the batch runner.

pub mod backend;
mod basic;
mod batch;
#[cfg(feature = "vips")]
mod libvips;
mod pipeline;

pub use backend::{BackendProbe, BackendSelection, ConversionBackend, ConversionJob};
pub use basic::BasicEncoder;
pub use batch::BatchRunner;
#[cfg(feature = "vips")]
pub use libvips::RichEncoder;
pub use pipeline::ConversionPipeline;

/// Lossy WebP quality on libwebp's 0-100 scale. Fixed, not configurable.
pub const WEBP_QUALITY: u8 = 75;
