//! Process-wide converter state.

use tracing::debug;
use crate::core::ConverterConfig;
use crate::processing::{BackendSelection, BatchRunner, ConversionPipeline};

/// Application state shared by every endpoint.
///
/// Holds the backend selected once at startup. Cloning shares that selection;
/// nothing in here changes after construction.
#[derive(Debug, Clone)]
pub struct AppState {
    config: ConverterConfig,
    pipeline: ConversionPipeline,
}

impl AppState {
    /// Probes for a backend according to `config` and keeps it for the
    /// lifetime of this state.
    pub fn new(config: ConverterConfig) -> Self {
        let backend = BackendSelection::probe(config.backend);
        Self::with_backend(config, backend)
    }

    /// Uses an already selected backend instead of probing.
    pub fn with_backend(config: ConverterConfig, backend: BackendSelection) -> Self {
        debug!("AppState initialized (backend: {}, workers: {})", backend.name(), config.effective_workers());
        Self {
            pipeline: ConversionPipeline::new(backend),
            config,
        }
    }

    pub fn config(&self) -> &ConverterConfig {
        &self.config
    }

    pub fn pipeline(&self) -> &ConversionPipeline {
        &self.pipeline
    }

    /// Creates a batch runner sized by the configured worker count.
    pub fn create_runner(&self) -> BatchRunner {
        BatchRunner::new(self.pipeline.clone(), self.config.effective_workers())
    }
}
