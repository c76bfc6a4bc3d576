//! Runtime configuration.
//!
//! The encoding policy (lossy, quality 75, no metadata) is fixed and lives in
//! [`crate::processing`]; only operational knobs are configurable here.

use serde::{Deserialize, Serialize};

const DEFAULT_WORKERS: usize = 4;

/// Which backend the selector may pick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendPreference {
    /// Rich backend when available, basic backend otherwise
    #[default]
    Auto,
    /// Only the libvips backend
    Rich,
    /// Only the built-in decoders and libwebp
    Basic,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConverterConfig {
    /// Upper bound on conversions running at once during a batch
    pub workers: usize,
    pub backend: BackendPreference,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            backend: BackendPreference::Auto,
        }
    }
}

impl ConverterConfig {
    /// Worker count clamped to at least one.
    pub fn effective_workers(&self) -> usize {
        self.workers.max(1)
    }
}
