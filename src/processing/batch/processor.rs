use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::core::{
    AssetRef,
    AssetResolver,
    BatchResult,
    ConversionOutcome,
    EntryPoint,
    RecordUpdater,
};
use crate::processing::ConversionPipeline;
use crate::utils::ErrorKind;

/// One dispatched batch item, kept in input order until folded.
enum Pending {
    Rejected(AssetRef, ErrorKind),
    Running(AssetRef, JoinHandle<ConversionOutcome>),
}

/// Applies the pipeline to many assets, isolating per-item failures.
///
/// Conversions run on tokio's blocking pool, at most `workers` at a time.
/// Results are folded in input order, so counts and the failure list do not
/// depend on which conversion finishes first.
#[derive(Debug, Clone)]
pub struct BatchRunner {
    pipeline: ConversionPipeline,
    workers: usize,
    detect_content_type: bool,
}

impl BatchRunner {
    pub fn new(pipeline: ConversionPipeline, workers: usize) -> Self {
        let workers = workers.max(1);
        debug!("Creating BatchRunner with {} workers", workers);
        Self { pipeline, workers, detect_content_type: false }
    }

    /// Replaces each resolved declared type with the type sniffed from the
    /// file content. Sniffing runs on the blocking pool with the conversion.
    pub fn detecting_content_type(mut self) -> Self {
        self.detect_content_type = true;
        self
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Converts every asset in `assets`, in order.
    ///
    /// `cancel` is honoured between items only: once cancelled, no further
    /// item is dispatched, while conversions already running complete and
    /// are reported.
    pub async fn run(
        &self,
        assets: &[AssetRef],
        resolver: &dyn AssetResolver,
        updater: &dyn RecordUpdater,
        cancel: &CancellationToken,
    ) -> BatchResult {
        info!("Processing batch of {} assets with {} workers", assets.len(), self.workers);

        let semaphore = Arc::new(Semaphore::new(self.workers));
        let mut result = BatchResult::default();
        let mut pending = Vec::with_capacity(assets.len());

        for (index, &asset) in assets.iter().enumerate() {
            let permit = tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                permit = semaphore.clone().acquire_owned() => permit.ok(),
            };
            let Some(permit) = permit else {
                result.cancelled = assets.len() - index;
                warn!("Batch cancelled, {} assets not dispatched", result.cancelled);
                break;
            };

            result.attempted += 1;

            let source = match resolver.resolve(asset) {
                Ok(source) => source,
                Err(e) => {
                    warn!("Cannot resolve asset {}: {}", asset, e);
                    pending.push(Pending::Rejected(asset, ErrorKind::ResolveFailed));
                    continue;
                }
            };

            let pipeline = self.pipeline.clone();
            let detect_content_type = self.detect_content_type;
            let handle = tokio::task::spawn_blocking(move || {
                let _permit = permit;
                let source = if detect_content_type {
                    match source.with_detected_type() {
                        Ok(source) => source,
                        Err(e) => {
                            warn!("Cannot read asset {}: {}", asset, e);
                            return ConversionOutcome::rejected(ErrorKind::ResolveFailed);
                        }
                    }
                } else {
                    source
                };
                pipeline.run(&source, EntryPoint::OnDemand)
            });
            pending.push(Pending::Running(asset, handle));
        }

        for item in pending {
            match item {
                Pending::Rejected(asset, kind) => result.record_failure(asset, kind),
                Pending::Running(asset, handle) => {
                    let outcome = match handle.await {
                        Ok(outcome) => outcome,
                        Err(e) => {
                            warn!("Conversion task for asset {} panicked: {}", asset, e);
                            result.record_failure(asset, ErrorKind::ConversionFailed);
                            continue;
                        }
                    };
                    self.fold_outcome(&mut result, asset, outcome, updater);
                }
            }
        }

        if result.failures.is_empty() {
            info!("Batch completed: {}/{} assets converted", result.succeeded, result.attempted);
        } else {
            warn!(
                "Batch completed with {} failed assets out of {}",
                result.failures.len(),
                result.attempted
            );
        }

        result
    }

    fn fold_outcome(
        &self,
        result: &mut BatchResult,
        asset: AssetRef,
        outcome: ConversionOutcome,
        updater: &dyn RecordUpdater,
    ) {
        if let Some(kind) = outcome.error_kind {
            debug!("Asset {} failed: {}", asset, kind);
            result.record_failure(asset, kind);
            return;
        }

        match updater.update(asset, &outcome.destination_path, &outcome.destination_url) {
            Ok(()) => result.succeeded += 1,
            Err(e) => {
                warn!("Record update for asset {} failed: {}", asset, e);
                result.record_failure(asset, ErrorKind::RecordUpdateFailed);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::path::Path;
    use std::sync::Mutex;
    use crate::core::SourceDescriptor;
    use crate::processing::backend::{BackendSelection, ConversionBackend, ConversionJob};
    use crate::utils::{ConverterError, ConverterResult};

    struct CopyBackend;

    /// Copies like [`CopyBackend`] and fires the token while converting.
    struct CancellingBackend(CancellationToken);

    impl ConversionBackend for CancellingBackend {
        fn name(&self) -> &'static str {
            "cancelling"
        }

        fn convert(&self, job: &ConversionJob<'_>) -> ConverterResult<()> {
            self.0.cancel();
            std::fs::copy(job.source, job.destination)?;
            Ok(())
        }
    }

    impl ConversionBackend for CopyBackend {
        fn name(&self) -> &'static str {
            "copy"
        }

        fn convert(&self, job: &ConversionJob<'_>) -> ConverterResult<()> {
            std::fs::copy(job.source, job.destination)?;
            Ok(())
        }
    }

    #[derive(Default)]
    struct Host {
        sources: HashMap<AssetRef, SourceDescriptor>,
        updates: Mutex<Vec<(AssetRef, String)>>,
        refuse_updates: bool,
    }

    impl Host {
        fn add(&mut self, dir: &Path, id: u64, name: &str, declared_type: &str) -> AssetRef {
            let path = dir.join(name);
            std::fs::write(&path, name.as_bytes()).unwrap();
            let asset = AssetRef(id);
            self.sources.insert(
                asset,
                SourceDescriptor::new(path.to_string_lossy(), declared_type, format!("https://h/{name}")),
            );
            asset
        }

        fn updated(&self) -> Vec<AssetRef> {
            self.updates.lock().unwrap().iter().map(|(a, _)| *a).collect()
        }
    }

    impl AssetResolver for Host {
        fn resolve(&self, asset: AssetRef) -> ConverterResult<SourceDescriptor> {
            self.sources
                .get(&asset)
                .cloned()
                .ok_or_else(|| ConverterError::resolve(format!("unknown asset {asset}")))
        }
    }

    impl RecordUpdater for Host {
        fn update(&self, asset: AssetRef, new_path: &str, _new_url: &str) -> ConverterResult<()> {
            if self.refuse_updates {
                return Err(ConverterError::record("database is read-only"));
            }
            self.updates.lock().unwrap().push((asset, new_path.to_string()));
            Ok(())
        }
    }

    fn runner(workers: usize) -> BatchRunner {
        let pipeline = ConversionPipeline::new(BackendSelection::with_backend(Arc::new(CopyBackend)));
        BatchRunner::new(pipeline, workers)
    }

    #[tokio::test]
    async fn middle_failure_does_not_abort_the_batch() {
        let dir = tempfile::tempdir().unwrap();
        let mut host = Host::default();
        let first = host.add(dir.path(), 1, "one.jpg", "image/jpeg");
        let middle = host.add(dir.path(), 2, "vector.svg", "image/svg+xml");
        let last = host.add(dir.path(), 3, "three.png", "image/png");

        let result = runner(1)
            .run(&[first, middle, last], &host, &host, &CancellationToken::new())
            .await;

        assert_eq!(result.attempted, 3);
        assert_eq!(result.succeeded, 2);
        assert_eq!(result.failures.len(), 1);
        assert_eq!(result.failures[0].asset, middle);
        assert_eq!(result.failures[0].error_kind, ErrorKind::UnsupportedFormat);
        assert!(dir.path().join("one.webp").is_file());
        assert!(dir.path().join("three.webp").is_file());
        assert_eq!(host.updated(), vec![first, last]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn parallel_run_reports_in_input_order() {
        let dir = tempfile::tempdir().unwrap();
        let mut host = Host::default();
        let mut assets = Vec::new();
        for id in 0..12u64 {
            let (name, mime) = if id % 3 == 0 {
                (format!("doc{id}.pdf"), "application/pdf")
            } else {
                (format!("img{id}.gif"), "image/gif")
            };
            assets.push(host.add(dir.path(), id, &name, mime));
        }

        let result = runner(4).run(&assets, &host, &host, &CancellationToken::new()).await;

        assert_eq!(result.attempted, 12);
        assert_eq!(result.succeeded, 8);
        let failed: Vec<u64> = result.failures.iter().map(|f| f.asset.0).collect();
        assert_eq!(failed, vec![0, 3, 6, 9]);
        let updated: Vec<u64> = host.updated().iter().map(|a| a.0).collect();
        assert_eq!(updated, vec![1, 2, 4, 5, 7, 8, 10, 11]);
    }

    #[tokio::test]
    async fn unresolvable_asset_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let mut host = Host::default();
        let known = host.add(dir.path(), 1, "known.bmp", "image/bmp");

        let result = runner(2)
            .run(&[AssetRef(404), known], &host, &host, &CancellationToken::new())
            .await;

        assert_eq!(result.attempted, 2);
        assert_eq!(result.succeeded, 1);
        assert_eq!(result.failures[0].asset, AssetRef(404));
        assert_eq!(result.failures[0].error_kind, ErrorKind::ResolveFailed);
    }

    #[tokio::test]
    async fn already_converted_counts_as_success() {
        let dir = tempfile::tempdir().unwrap();
        let mut host = Host::default();
        let asset = host.add(dir.path(), 1, "again.jpg", "image/jpeg");
        std::fs::write(dir.path().join("again.webp"), b"previous run").unwrap();

        let result = runner(1).run(&[asset], &host, &host, &CancellationToken::new()).await;

        assert_eq!(result.succeeded, 1);
        assert!(result.failures.is_empty());
        assert_eq!(std::fs::read(dir.path().join("again.webp")).unwrap(), b"previous run");
        assert_eq!(host.updated(), vec![asset]);
    }

    #[tokio::test]
    async fn record_update_failure_is_surfaced() {
        let dir = tempfile::tempdir().unwrap();
        let mut host = Host { refuse_updates: true, ..Host::default() };
        let asset = host.add(dir.path(), 7, "photo.jpeg", "image/jpeg");

        let result = runner(1).run(&[asset], &host, &host, &CancellationToken::new()).await;

        assert_eq!(result.attempted, 1);
        assert_eq!(result.succeeded, 0);
        assert_eq!(result.failures[0].error_kind, ErrorKind::RecordUpdateFailed);
    }

    #[tokio::test]
    async fn cancelled_batch_dispatches_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let mut host = Host::default();
        let a = host.add(dir.path(), 1, "a.jpg", "image/jpeg");
        let b = host.add(dir.path(), 2, "b.jpg", "image/jpeg");
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = runner(2).run(&[a, b], &host, &host, &cancel).await;

        assert_eq!(result.attempted, 0);
        assert_eq!(result.cancelled, 2);
        assert!(!dir.path().join("a.webp").exists());
    }

    #[tokio::test]
    async fn cancel_during_first_item_lets_it_finish() {
        let dir = tempfile::tempdir().unwrap();
        let mut host = Host::default();
        let first = host.add(dir.path(), 1, "first.jpg", "image/jpeg");
        let second = host.add(dir.path(), 2, "second.jpg", "image/jpeg");
        let third = host.add(dir.path(), 3, "third.jpg", "image/jpeg");
        let cancel = CancellationToken::new();
        let pipeline = ConversionPipeline::new(BackendSelection::with_backend(Arc::new(CancellingBackend(
            cancel.clone(),
        ))));

        // One worker: the next item waits for the permit, and by then the
        // token has fired.
        let result = BatchRunner::new(pipeline, 1)
            .run(&[first, second, third], &host, &host, &cancel)
            .await;

        assert_eq!(result.attempted, 1);
        assert_eq!(result.succeeded, 1);
        assert_eq!(result.cancelled, 2);
        assert!(result.failures.is_empty());
        assert!(dir.path().join("first.webp").is_file());
        assert!(!dir.path().join("second.webp").exists());
        assert_eq!(host.updated(), vec![first]);
    }

    #[tokio::test]
    async fn content_type_is_sniffed_when_requested() {
        let dir = tempfile::tempdir().unwrap();
        let mut host = Host::default();
        // Declared as SVG, but the bytes are a GIF.
        let asset = host.add(dir.path(), 1, "mislabelled.gif", "image/svg+xml");
        image::RgbImage::from_pixel(2, 2, image::Rgb([9, 9, 9]))
            .save_with_format(dir.path().join("mislabelled.gif"), image::ImageFormat::Gif)
            .unwrap();
        let missing = host.add(dir.path(), 2, "gone.png", "image/png");
        std::fs::remove_file(dir.path().join("gone.png")).unwrap();

        let result = runner(2)
            .detecting_content_type()
            .run(&[asset, missing], &host, &host, &CancellationToken::new())
            .await;

        assert_eq!(result.succeeded, 1);
        assert_eq!(result.failures.len(), 1);
        assert_eq!(result.failures[0].asset, missing);
        assert_eq!(result.failures[0].error_kind, ErrorKind::ResolveFailed);
        assert!(dir.path().join("mislabelled.webp").is_file());
    }

    #[tokio::test]
    async fn empty_batch_is_empty_result() {
        let host = Host::default();
        let result = runner(3).run(&[], &host, &host, &CancellationToken::new()).await;
        assert_eq!(result, BatchResult::default());
    }
}
