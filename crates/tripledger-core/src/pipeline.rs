//! Image-to-ledger extraction pipeline
//!
//! Sequential driver from an image path to a persisted receipt:
//! fingerprint, cache lookup, model call, parse, cache write, ledger
//! append. Each image succeeds or fails on its own; a bad photo never
//! aborts the batch. The cache write happens before the ledger append
//! so a failed append can be retried without another model call.

use crate::cache::ExtractionCache;
use crate::classify::CategoryClassifier;
use crate::config::Config;
use crate::error::{Result, TripLedgerError};
use crate::fingerprint::fingerprint_file;
use crate::models::{CacheEntry, FailureKind, ProcessingResult, Receipt};
use crate::store::ReceiptStore;
use crate::vision::response::{parse_receipt, ReceiptMeta};
use crate::vision::{client_for, extraction_prompt, is_supported_image, ImagePayload, VisionClient};
use chrono::Utc;
use std::path::{Path, PathBuf};
use std::time::Instant;
use walkdir::WalkDir;

/// Outcome counts for a batch run
#[derive(Debug, Default)]
pub struct PipelineSummary {
    /// Images extracted through the model this run
    pub processed: usize,
    /// Images answered from the cache
    pub cached: usize,
    pub failed: usize,
    pub results: Vec<ProcessingResult>,
}

impl PipelineSummary {
    fn push(&mut self, result: ProcessingResult) {
        if result.success {
            if result.cached {
                self.cached += 1;
            } else {
                self.processed += 1;
            }
        } else {
            self.failed += 1;
        }
        self.results.push(result);
    }

    pub fn total(&self) -> usize {
        self.results.len()
    }

    pub fn all_succeeded(&self) -> bool {
        self.failed == 0
    }
}

pub struct ExtractionPipeline {
    client: Box<dyn VisionClient>,
    classifier: CategoryClassifier,
    cache: ExtractionCache,
    store: ReceiptStore,
    prompt: String,
}

impl ExtractionPipeline {
    pub fn new(
        client: Box<dyn VisionClient>,
        cache: ExtractionCache,
        store: ReceiptStore,
        prompt: String,
    ) -> Self {
        Self {
            client,
            classifier: CategoryClassifier::new(),
            cache,
            store,
            prompt,
        }
    }

    /// Build the pipeline from configuration: provider client, cache file,
    /// and CSV store under the data directory
    pub fn from_config(config: &Config) -> Result<Self> {
        config.require_credentials()?;
        Ok(Self::new(
            client_for(config)?,
            ExtractionCache::open(config.extraction_cache_path()),
            ReceiptStore::from_config(config)?,
            extraction_prompt(&config.primary_language),
        ))
    }

    pub fn cache(&self) -> &ExtractionCache {
        &self.cache
    }

    pub fn store(&self) -> &ReceiptStore {
        &self.store
    }

    /// Process one image end to end. With `force` the cache lookup is
    /// skipped and any previous entry for the image is overwritten.
    pub async fn process_image(&mut self, path: &Path, force: bool) -> ProcessingResult {
        let started = Instant::now();
        let name = image_name(path);

        if !path.is_file() {
            return ProcessingResult::failure(
                name,
                FailureKind::Io,
                format!("image not found: {}", path.display()),
                elapsed_ms(started),
            );
        }
        if !is_supported_image(path) {
            return ProcessingResult::failure(
                name,
                FailureKind::Validation,
                format!("unsupported image type: {}", path.display()),
                elapsed_ms(started),
            );
        }

        let print = match fingerprint_file(path) {
            Ok(print) => print,
            Err(e) => {
                return ProcessingResult::failure(
                    name,
                    FailureKind::Io,
                    e.to_string(),
                    elapsed_ms(started),
                )
            }
        };

        if !force {
            if let Some(entry) = self.cache.lookup(&print) {
                tracing::debug!(image = %name, "cache hit");
                return ProcessingResult::success(
                    name,
                    entry.receipt.clone(),
                    true,
                    elapsed_ms(started),
                );
            }
        }

        let receipt = match self.extract_one(path, &name, &print).await {
            Ok(receipt) => receipt,
            Err(e) => {
                return ProcessingResult::failure(
                    name,
                    failure_kind(&e),
                    e.to_string(),
                    elapsed_ms(started),
                )
            }
        };

        self.cache.store(CacheEntry {
            fingerprint: print,
            source_image: name.clone(),
            processed_at: Utc::now(),
            receipt: receipt.clone(),
        });
        if let Err(e) = self.store.append(&receipt) {
            return ProcessingResult::failure(
                name,
                FailureKind::Store,
                e.to_string(),
                elapsed_ms(started),
            );
        }

        ProcessingResult::success(name, receipt, false, elapsed_ms(started))
    }

    /// Process images in order, reporting progress before each one
    pub async fn process_batch<F>(
        &mut self,
        paths: &[PathBuf],
        force: bool,
        mut progress: F,
    ) -> PipelineSummary
    where
        F: FnMut(usize, usize, &str),
    {
        let mut summary = PipelineSummary::default();
        let total = paths.len();
        for (i, path) in paths.iter().enumerate() {
            progress(i + 1, total, &image_name(path));
            let result = self.process_image(path, force).await;
            if let Some(error) = &result.error {
                tracing::warn!(image = %result.source_image, %error, "extraction failed");
            }
            summary.push(result);
        }
        summary
    }

    async fn extract_one(&self, path: &Path, name: &str, print: &str) -> Result<Receipt> {
        let payload = ImagePayload::read(path)?;
        let reply = self.client.extract(&payload, &self.prompt).await?;
        let meta = ReceiptMeta {
            fingerprint: print,
            source_image: name,
        };
        parse_receipt(&reply, &meta, &self.classifier)
    }
}

/// Supported images directly inside `dir`, sorted by file name
pub fn scan_directory(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(TripLedgerError::InvalidInput(format!(
            "not a directory: {}",
            dir.display()
        )));
    }
    let mut paths = Vec::new();
    for entry in WalkDir::new(dir).max_depth(1).sort_by_file_name() {
        let entry = entry?;
        if entry.file_type().is_file() && is_supported_image(entry.path()) {
            paths.push(entry.into_path());
        }
    }
    Ok(paths)
}

fn image_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn elapsed_ms(started: Instant) -> u64 {
    started.elapsed().as_millis() as u64
}

fn failure_kind(err: &TripLedgerError) -> FailureKind {
    match err {
        TripLedgerError::Io(_) | TripLedgerError::WalkDir(_) => FailureKind::Io,
        TripLedgerError::Http(_) | TripLedgerError::Provider(_) => FailureKind::Provider,
        TripLedgerError::MalformedResponse(_) | TripLedgerError::Serialization(_) => {
            FailureKind::MalformedResponse
        }
        TripLedgerError::Validation(_) => FailureKind::Validation,
        TripLedgerError::Store(_) | TripLedgerError::Csv(_) => FailureKind::Store,
        _ => FailureKind::Io,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tempfile::TempDir;

    struct StubClient {
        replies: Vec<String>,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl VisionClient for StubClient {
        async fn extract(&self, _image: &ImagePayload, _prompt: &str) -> Result<String> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.replies[n % self.replies.len()].clone())
        }
    }

    fn valid_reply(store: &str, total: u32) -> String {
        format!(
            r#"{{
                "store_name": "{store}",
                "timestamp": "2024-11-02 12:30:00",
                "items": [
                    {{"name": "coffee", "quantity": 1, "unit_price": {total}, "total_price": {total}, "category": "beverage"}}
                ],
                "total": {total},
                "currency": "JPY",
                "original_language": "ja"
            }}"#
        )
    }

    fn test_pipeline(
        dir: &TempDir,
        replies: Vec<String>,
    ) -> (ExtractionPipeline, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let client = StubClient {
            replies,
            calls: calls.clone(),
        };
        let cache = ExtractionCache::open(dir.path().join("cache").join("processed.json"));
        let store = ReceiptStore::open(
            dir.path().join("receipts.csv"),
            dir.path().join("items.csv"),
            dir.path().join("locations.csv"),
        )
        .unwrap();
        let pipeline = ExtractionPipeline::new(
            Box::new(client),
            cache,
            store,
            extraction_prompt("English"),
        );
        (pipeline, calls)
    }

    fn write_image(dir: &TempDir, name: &str, bytes: &[u8]) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, bytes).unwrap();
        path
    }

    #[tokio::test]
    async fn test_repeat_run_hits_cache_without_model_call() {
        let dir = TempDir::new().unwrap();
        let (mut pipeline, calls) = test_pipeline(&dir, vec![valid_reply("Lawson", 421)]);
        let image = write_image(&dir, "IMG_0001.jpg", b"image-bytes");

        let first = pipeline.process_image(&image, false).await;
        assert!(first.success);
        assert!(!first.cached);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let second = pipeline.process_image(&image, false).await;
        assert!(second.success);
        assert!(second.cached);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(first.receipt, second.receipt);

        // A cache hit must not duplicate ledger rows.
        assert_eq!(pipeline.store().read_receipts().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_force_bypasses_cache_and_overwrites() {
        let dir = TempDir::new().unwrap();
        let (mut pipeline, calls) = test_pipeline(
            &dir,
            vec![valid_reply("Lawson", 421), valid_reply("Lawson", 500)],
        );
        let image = write_image(&dir, "IMG_0001.jpg", b"image-bytes");

        pipeline.process_image(&image, false).await;
        let forced = pipeline.process_image(&image, true).await;
        assert!(forced.success);
        assert!(!forced.cached);
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        // Same fingerprint, so the second extraction replaces both the
        // cache entry and the ledger rows.
        assert_eq!(pipeline.cache().len(), 1);
        let receipts = pipeline.store().read_receipts().unwrap();
        assert_eq!(receipts.len(), 1);
        assert_eq!(receipts[0].total.to_string(), "500");

        let after_force = pipeline.process_image(&image, false).await;
        assert!(after_force.cached);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_batch_isolates_failures() {
        let dir = TempDir::new().unwrap();
        let (mut pipeline, calls) = test_pipeline(
            &dir,
            vec![
                valid_reply("Lawson", 421),
                "I could not find a receipt in this photo.".to_string(),
                valid_reply("FamilyMart", 300),
            ],
        );
        let paths = vec![
            write_image(&dir, "a.jpg", b"first"),
            write_image(&dir, "b.jpg", b"second"),
            write_image(&dir, "c.jpg", b"third"),
        ];

        let mut seen = Vec::new();
        let summary = pipeline
            .process_batch(&paths, false, |current, total, name| {
                seen.push((current, total, name.to_string()));
            })
            .await;

        assert_eq!(summary.total(), 3);
        assert_eq!(summary.processed, 2);
        assert_eq!(summary.failed, 1);
        assert!(!summary.all_succeeded());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(seen[2], (3, 3, "c.jpg".to_string()));

        let failed = &summary.results[1];
        assert!(!failed.success);
        assert_eq!(
            failed.error.as_ref().unwrap().kind,
            FailureKind::MalformedResponse
        );

        // The good images landed in the ledger, the bad one did not.
        let receipts = pipeline.store().read_receipts().unwrap();
        assert_eq!(receipts.len(), 2);
        // Failures are never cached.
        assert_eq!(pipeline.cache().len(), 2);
    }

    #[tokio::test]
    async fn test_missing_file_fails_before_model_call() {
        let dir = TempDir::new().unwrap();
        let (mut pipeline, calls) = test_pipeline(&dir, vec![valid_reply("Lawson", 421)]);

        let result = pipeline
            .process_image(&dir.path().join("missing.jpg"), false)
            .await;
        assert!(!result.success);
        assert_eq!(result.error.as_ref().unwrap().kind, FailureKind::Io);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_unsupported_extension_rejected() {
        let dir = TempDir::new().unwrap();
        let (mut pipeline, calls) = test_pipeline(&dir, vec![valid_reply("Lawson", 421)]);
        let path = write_image(&dir, "notes.txt", b"not an image");

        let result = pipeline.process_image(&path, false).await;
        assert!(!result.success);
        assert_eq!(result.error.as_ref().unwrap().kind, FailureKind::Validation);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_scan_directory_sorted_and_filtered() {
        let dir = TempDir::new().unwrap();
        write_image(&dir, "b.jpg", b"b");
        write_image(&dir, "a.PNG", b"a");
        write_image(&dir, "c.txt", b"c");
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        std::fs::write(dir.path().join("nested").join("d.jpg"), b"d").unwrap();

        let paths = scan_directory(dir.path()).unwrap();
        let names: Vec<String> = paths
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.PNG", "b.jpg"]);

        assert!(scan_directory(&dir.path().join("missing")).is_err());
    }
}
