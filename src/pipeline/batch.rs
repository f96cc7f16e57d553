//! Batch processing over many files.
//!
//! Files are processed sequentially. Each one is looked up by name and
//! group first: processed documents and recorded duplicates are skipped,
//! failed ones are retried and rows stuck in `processing` are retried only
//! on request. One document's failure never stops the batch.

use super::processor::{DocumentProcessor, Outcome, ProcessReport};
use crate::core::DocumentStatus;
use crate::error::Result;
use crate::io::{document_name, read_document};
use crate::model::{AttemptLog, ModelInvoker};
use crate::storage::Storage;
use serde::Serialize;
use std::path::PathBuf;

/// One file to process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchItem {
    /// Path to the text file.
    pub path: PathBuf,
    /// Grouping key for dedup and lookup.
    pub group: Option<i64>,
}

impl BatchItem {
    /// Creates an item.
    pub fn new(path: impl Into<PathBuf>, group: Option<i64>) -> Self {
        Self {
            path: path.into(),
            group,
        }
    }
}

/// Batch behaviour switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchOptions {
    /// Retry documents left in `processing` by an interrupted run.
    pub reprocess_stale: bool,
    /// Pass the previous document's last chunk to the model as context.
    pub continuation: bool,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            reprocess_stale: false,
            continuation: true,
        }
    }
}

/// Counts and per-file reports for a batch run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    /// Documents chunked and stored.
    pub processed: usize,
    /// Documents that failed.
    pub failed: usize,
    /// Documents recorded as duplicates.
    pub duplicates: usize,
    /// Documents skipped because an earlier run handled them.
    pub skipped: usize,
    /// Total chunks stored in this run.
    pub chunks: usize,
    /// Total model calls made in this run.
    pub model_attempts: usize,
    /// One report per input file, in input order.
    pub reports: Vec<ProcessReport>,
}

impl BatchSummary {
    fn record(&mut self, report: ProcessReport) {
        match report.outcome {
            Outcome::Processed => self.processed += 1,
            Outcome::Failed => self.failed += 1,
            Outcome::Duplicate => self.duplicates += 1,
            Outcome::Skipped => self.skipped += 1,
        }
        self.chunks += report.chunk_count;
        self.model_attempts += report.model_attempts;
        self.reports.push(report);
    }

    /// Whether any document failed.
    #[must_use]
    pub const fn has_failures(&self) -> bool {
        self.failed > 0
    }
}

/// Runs a [`DocumentProcessor`] over a list of files.
#[derive(Debug)]
pub struct BatchProcessor<'a, I, S> {
    processor: DocumentProcessor<'a, I, S>,
    options: BatchOptions,
}

impl<'a, I, S> BatchProcessor<'a, I, S>
where
    I: ModelInvoker,
    S: Storage + AttemptLog,
{
    /// Creates a batch runner.
    pub const fn new(processor: DocumentProcessor<'a, I, S>, options: BatchOptions) -> Self {
        Self { processor, options }
    }

    /// Processes every item in order.
    ///
    /// Every failure, storage errors included, is reported per document in
    /// the summary and the batch moves on to the next file.
    pub async fn run(&mut self, items: &[BatchItem]) -> BatchSummary {
        let mut summary = BatchSummary::default();
        let mut previous: Option<String> = None;

        tracing::info!(files = items.len(), "batch started");

        for item in items {
            let report = match self.run_item(item, previous.as_deref()).await {
                Ok(report) => report,
                Err(e) => {
                    tracing::error!(path = %item.path.display(), error = %e, "document failed");
                    let mut report = ProcessReport::new(document_name(&item.path), Outcome::Failed);
                    report.error = Some(e.to_string());
                    report
                }
            };

            if self.options.continuation {
                previous = match report.outcome {
                    Outcome::Processed | Outcome::Skipped => report.last_chunk.clone(),
                    Outcome::Failed | Outcome::Duplicate => None,
                };
            }
            summary.record(report);
        }

        tracing::info!(
            processed = summary.processed,
            failed = summary.failed,
            duplicates = summary.duplicates,
            skipped = summary.skipped,
            "batch finished"
        );
        summary
    }

    async fn run_item(
        &mut self,
        item: &BatchItem,
        previous: Option<&str>,
    ) -> Result<ProcessReport> {
        let filename = document_name(&item.path);

        let content = match read_document(&item.path) {
            Ok(content) => content,
            Err(e) => {
                tracing::error!(path = %item.path.display(), error = %e, "cannot read file");
                let mut report = ProcessReport::new(filename, Outcome::Failed);
                report.error = Some(e.to_string());
                return Ok(report);
            }
        };

        let existing = self
            .processor
            .storage()
            .find_document(&filename, item.group)?;

        if let Some(doc) = &existing {
            let skip_reason = match doc.status {
                DocumentStatus::Processed => Some("already processed"),
                DocumentStatus::SkippedDuplicate => Some("already recorded as duplicate"),
                DocumentStatus::Processing if !self.options.reprocess_stale => {
                    Some("left in processing by an earlier run")
                }
                DocumentStatus::Processing | DocumentStatus::Failed => None,
            };

            if let Some(reason) = skip_reason {
                tracing::info!(filename = %filename, document_id = ?doc.id, reason, "skipping");
                let mut report = ProcessReport::new(filename, Outcome::Skipped);
                report.document_id = doc.id;
                report.chunk_count = doc.chunk_count;
                report.error = Some(reason.to_string());
                if let Some(id) = doc.id
                    && doc.status == DocumentStatus::Processed
                {
                    report.last_chunk = self
                        .processor
                        .storage()
                        .get_chunks(id)?
                        .pop()
                        .map(|c| c.content);
                }
                return Ok(report);
            }
        }

        self.processor
            .process(&filename, content, item.group, existing.as_ref(), previous)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProcessingConfig;
    use crate::core::{ChunkRecord, Document, ModelAttempt, ValidatedChunk};
    use crate::error::{Error, StorageError};
    use crate::model::MockInvoker;
    use crate::storage::{SqliteStorage, StorageStats};
    use std::fs;
    use tempfile::TempDir;

    const ONE_CHUNK: &str = r#"{"chunks": [{"startIndex": 1, "endIndex": 12, "firstWord": "Hello", "lastWord": "world."}]}"#;

    fn config() -> ProcessingConfig {
        ProcessingConfig {
            candidate_models: vec!["m".to_string()],
            retry_delay_ms: 0,
            max_retries: 1,
            clean: false,
            ..ProcessingConfig::default()
        }
    }

    fn storage() -> SqliteStorage {
        let mut storage = SqliteStorage::in_memory().unwrap();
        storage.init().unwrap();
        storage
    }

    fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    /// SQLite storage that refuses selected writes.
    struct FlakyStorage {
        inner: SqliteStorage,
        fail_create: Option<&'static str>,
        fail_chunks: bool,
    }

    fn refused() -> Error {
        StorageError::Database("disk I/O error".to_string()).into()
    }

    impl Storage for FlakyStorage {
        fn init(&mut self) -> Result<()> {
            self.inner.init()
        }
        fn is_initialized(&self) -> Result<bool> {
            self.inner.is_initialized()
        }
        fn reset(&mut self) -> Result<()> {
            self.inner.reset()
        }
        fn create_document(&mut self, document: &Document) -> Result<i64> {
            if self.fail_create == Some(document.filename.as_str()) {
                return Err(refused());
            }
            self.inner.create_document(document)
        }
        fn update_document(&mut self, document: &Document) -> Result<()> {
            self.inner.update_document(document)
        }
        fn set_status(
            &mut self,
            id: i64,
            status: DocumentStatus,
            error_message: Option<&str>,
        ) -> Result<()> {
            self.inner.set_status(id, status, error_message)
        }
        fn get_document(&self, id: i64) -> Result<Option<Document>> {
            self.inner.get_document(id)
        }
        fn find_document(&self, filename: &str, group: Option<i64>) -> Result<Option<Document>> {
            self.inner.find_document(filename, group)
        }
        fn find_by_content_hash(
            &self,
            hash: &str,
            group: Option<i64>,
            exclude_id: Option<i64>,
        ) -> Result<Option<Document>> {
            self.inner.find_by_content_hash(hash, group, exclude_id)
        }
        fn list_documents(&self, status: Option<DocumentStatus>) -> Result<Vec<Document>> {
            self.inner.list_documents(status)
        }
        fn save_chunks(&mut self, document_id: i64, chunks: &[ValidatedChunk]) -> Result<()> {
            if self.fail_chunks && !chunks.is_empty() {
                return Err(refused());
            }
            self.inner.save_chunks(document_id, chunks)
        }
        fn get_chunks(&self, document_id: i64) -> Result<Vec<ChunkRecord>> {
            self.inner.get_chunks(document_id)
        }
        fn add_attempt(&mut self, attempt: &ModelAttempt) -> Result<i64> {
            self.inner.add_attempt(attempt)
        }
        fn list_attempts(&self, limit: usize) -> Result<Vec<ModelAttempt>> {
            self.inner.list_attempts(limit)
        }
        fn stats(&self) -> Result<StorageStats> {
            self.inner.stats()
        }
    }

    impl AttemptLog for FlakyStorage {
        fn record_attempt(&mut self, attempt: &ModelAttempt) -> Result<()> {
            self.inner.record_attempt(attempt)
        }
    }

    #[tokio::test]
    async fn test_batch_counts_outcomes() {
        let dir = TempDir::new().unwrap();
        let a = write(&dir, "a.txt", "Hello world.");
        let b = write(&dir, "b.txt", "Hello world.");
        let missing = dir.path().join("missing.txt");

        let mock = MockInvoker::always(ONE_CHUNK);
        let mut storage = storage();
        let config = config();
        let processor = DocumentProcessor::new(&mock, &mut storage, &config);
        let mut batch = BatchProcessor::new(processor, BatchOptions::default());

        let summary = batch
            .run(&[
                BatchItem::new(a, None),
                BatchItem::new(b, None),
                BatchItem::new(missing, None),
            ])
            .await;

        assert_eq!(summary.processed, 1);
        assert_eq!(summary.duplicates, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.chunks, 1);
        assert!(summary.has_failures());
        assert_eq!(summary.reports[2].filename, "missing.txt");
        assert!(summary.reports[2].document_id.is_none());
    }

    #[tokio::test]
    async fn test_rerun_skips_processed() {
        let dir = TempDir::new().unwrap();
        let a = write(&dir, "a.txt", "Hello world.");
        let items = [BatchItem::new(a, Some(3))];

        let mock = MockInvoker::always(ONE_CHUNK);
        let mut storage = storage();
        let config = config();

        let processor = DocumentProcessor::new(&mock, &mut storage, &config);
        let mut batch = BatchProcessor::new(processor, BatchOptions::default());
        batch.run(&items).await;
        let summary = batch.run(&items).await;

        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.reports[0].last_chunk.as_deref(), Some("Hello world."));
        assert_eq!(mock.call_count(), 1);
    }

    #[tokio::test]
    async fn test_failed_document_retried() {
        let dir = TempDir::new().unwrap();
        let a = write(&dir, "a.txt", "Hello world.");
        let items = [BatchItem::new(a, None)];

        let mock = MockInvoker::new().reply("m", "not json").reply("m", ONE_CHUNK);
        let mut storage = storage();
        let config = config();

        let processor = DocumentProcessor::new(&mock, &mut storage, &config);
        let mut batch = BatchProcessor::new(processor, BatchOptions::default());
        let first = batch.run(&items).await;
        let second = batch.run(&items).await;

        assert_eq!(first.failed, 1);
        assert_eq!(second.processed, 1);
        assert_eq!(first.reports[0].document_id, second.reports[0].document_id);
    }

    #[tokio::test]
    async fn test_stale_processing_row() {
        let dir = TempDir::new().unwrap();
        let a = write(&dir, "a.txt", "Hello world.");
        let items = [BatchItem::new(a, None)];

        let mock = MockInvoker::always(ONE_CHUNK);
        let mut storage = storage();
        storage
            .create_document(&crate::core::Document::new("a.txt", "Hello world.".into()))
            .unwrap();
        let config = config();

        let processor = DocumentProcessor::new(&mock, &mut storage, &config);
        let mut batch = BatchProcessor::new(processor, BatchOptions::default());
        let skipped = batch.run(&items).await;
        assert_eq!(skipped.skipped, 1);
        assert_eq!(mock.call_count(), 0);

        let processor = DocumentProcessor::new(&mock, &mut storage, &config);
        let mut batch = BatchProcessor::new(
            processor,
            BatchOptions {
                reprocess_stale: true,
                ..BatchOptions::default()
            },
        );
        let retried = batch.run(&items).await;
        assert_eq!(retried.processed, 1);
        assert_eq!(storage.list_documents(None).unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_continuation_context_between_documents() {
        let dir = TempDir::new().unwrap();
        let a = write(&dir, "a.txt", "Hello world.");
        let b = write(&dir, "b.txt", "Other text.");

        let mock = MockInvoker::new().reply("m", ONE_CHUNK).reply(
            "m",
            r#"{"chunks": [{"startIndex": 1, "endIndex": 11, "firstWord": "Other", "lastWord": "text."}]}"#,
        );
        let mut storage = storage();
        let config = config();
        let processor = DocumentProcessor::new(&mock, &mut storage, &config);
        let mut batch = BatchProcessor::new(processor, BatchOptions::default());

        let summary = batch
            .run(&[BatchItem::new(a, None), BatchItem::new(b, None)])
            .await;
        assert_eq!(summary.processed, 2);

        let requests = mock.requests();
        assert!(!requests[0].user_content.contains("<previous>"));
        assert!(requests[1].user_content.contains("<previous>\nHello world.\n</previous>"));
    }

    #[tokio::test]
    async fn test_storage_error_does_not_stop_batch() {
        let dir = TempDir::new().unwrap();
        let bad = write(&dir, "bad.txt", "Other text.");
        let good = write(&dir, "good.txt", "Hello world.");

        let mock = MockInvoker::always(ONE_CHUNK);
        let mut storage = FlakyStorage {
            inner: storage(),
            fail_create: Some("bad.txt"),
            fail_chunks: false,
        };
        let config = config();
        let processor = DocumentProcessor::new(&mock, &mut storage, &config);
        let mut batch = BatchProcessor::new(processor, BatchOptions::default());

        let summary = batch
            .run(&[BatchItem::new(bad, None), BatchItem::new(good, None)])
            .await;
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.processed, 1);
        assert_eq!(summary.reports[0].outcome, Outcome::Failed);
        assert!(summary.reports[0].document_id.is_none());
        assert!(summary.reports[0].error.as_deref().unwrap().contains("disk I/O error"));
        assert_eq!(summary.reports[1].outcome, Outcome::Processed);
    }

    #[tokio::test]
    async fn test_storage_error_marks_row_failed() {
        let dir = TempDir::new().unwrap();
        let a = write(&dir, "a.txt", "Hello world.");

        let mock = MockInvoker::always(ONE_CHUNK);
        let mut storage = FlakyStorage {
            inner: storage(),
            fail_create: None,
            fail_chunks: true,
        };
        let config = config();
        let processor = DocumentProcessor::new(&mock, &mut storage, &config);
        let mut batch = BatchProcessor::new(processor, BatchOptions::default());

        let summary = batch.run(&[BatchItem::new(a, None)]).await;
        let report = &summary.reports[0];
        assert_eq!(report.outcome, Outcome::Failed);
        assert_eq!(report.chunk_count, 0);

        let doc = storage
            .inner
            .get_document(report.document_id.unwrap())
            .unwrap()
            .unwrap();
        assert_eq!(doc.status, DocumentStatus::Failed);
        assert!(doc.error_message.unwrap().contains("disk I/O error"));
    }
}
