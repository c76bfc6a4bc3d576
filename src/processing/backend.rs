//! Encoding backends and their one-time selection.
//!
//! A backend decodes one source file and writes it back out as lossy WebP.
//! Which backend a process uses is decided once by [`BackendSelection::probe`]
//! and then shared read-only by every conversion.

use std::fmt;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

use crate::core::BackendPreference;
use crate::utils::{ConverterResult, DecodeHint};

use super::basic::BasicEncoder;

/// Everything a backend needs to convert one file.
#[derive(Debug, Clone, Copy)]
pub struct ConversionJob<'a> {
    pub source: &'a Path,
    pub destination: &'a Path,
    pub declared_type: &'a str,
    pub hint: DecodeHint,
}

/// A decode + lossy WebP encode implementation.
///
/// Implementations write `job.destination` and report any failure as `Err`;
/// they never panic on bad input.
pub trait ConversionBackend: Send + Sync {
    /// Short identifier for logs
    fn name(&self) -> &'static str;

    fn convert(&self, job: &ConversionJob<'_>) -> ConverterResult<()>;
}

/// Lazily evaluated backend candidate.
pub type BackendProbe = fn() -> Option<Arc<dyn ConversionBackend>>;

/// Backend chosen for the lifetime of the process.
#[derive(Clone)]
pub enum BackendSelection {
    Selected(Arc<dyn ConversionBackend>),
    /// No usable encoder; every conversion fails with `NoBackendAvailable`
    Unavailable,
}

impl BackendSelection {
    /// Probes the environment once, honouring `preference`.
    pub fn probe(preference: BackendPreference) -> Self {
        let selection = match preference {
            BackendPreference::Auto => Self::from_candidates([probe_rich as BackendProbe, probe_basic]),
            BackendPreference::Rich => Self::from_candidates([probe_rich as BackendProbe]),
            BackendPreference::Basic => Self::from_candidates([probe_basic as BackendProbe]),
        };
        info!("Conversion backend: {}", selection.name());
        selection
    }

    /// Takes the first candidate that yields a backend, in the given order.
    /// Later candidates are not evaluated once one succeeds.
    pub fn from_candidates(candidates: impl IntoIterator<Item = BackendProbe>) -> Self {
        candidates
            .into_iter()
            .find_map(|probe| probe())
            .map(Self::Selected)
            .unwrap_or(Self::Unavailable)
    }

    pub fn with_backend(backend: Arc<dyn ConversionBackend>) -> Self {
        Self::Selected(backend)
    }

    pub fn backend(&self) -> Option<&dyn ConversionBackend> {
        match self {
            Self::Selected(backend) => Some(backend.as_ref()),
            Self::Unavailable => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Selected(backend) => backend.name(),
            Self::Unavailable => "none",
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Self::Selected(_))
    }
}

impl fmt::Debug for BackendSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("BackendSelection").field(&self.name()).finish()
    }
}

#[cfg(feature = "vips")]
fn probe_rich() -> Option<Arc<dyn ConversionBackend>> {
    match super::libvips::RichEncoder::initialise() {
        Ok(encoder) => Some(Arc::new(encoder) as Arc<dyn ConversionBackend>),
        Err(e) => {
            debug!("Rich backend unavailable: {}", e);
            None
        }
    }
}

#[cfg(not(feature = "vips"))]
fn probe_rich() -> Option<Arc<dyn ConversionBackend>> {
    debug!("Rich backend not compiled in (enable the `vips` feature)");
    None
}

fn probe_basic() -> Option<Arc<dyn ConversionBackend>> {
    match BasicEncoder::probe() {
        Ok(encoder) => Some(Arc::new(encoder) as Arc<dyn ConversionBackend>),
        Err(e) => {
            debug!("Basic backend unavailable: {}", e);
            None
        }
    }
}
