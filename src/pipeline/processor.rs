//! Single-document processing.
//!
//! A document moves through dedup, cleaning, pre-chunking, model chunking
//! and boundary validation before its chunks are stored. Chunk offsets
//! refer to the cleaned text.

use crate::chunking::apply_removals;
use crate::config::ProcessingConfig;
use crate::core::{
    Document, DocumentStatus, RequestKind, SourceText, ValidatedChunk, Warning, char_len,
};
use crate::error::Result;
use crate::model::prompt::{
    CLEAN_SYSTEM_PROMPT, build_chunk_user_message, build_clean_user_message, chunk_system_prompt,
    simplified_chunk_system_prompt,
};
use crate::model::{
    AttemptLog, ChunkingResponse, CleaningResponse, ModelInvoker, ModelRequest,
    RetryFallbackOrchestrator, parse_response,
};
use crate::storage::Storage;
use serde::Serialize;
use serde::de::DeserializeOwned;

/// How processing of one document ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// Chunks validated and stored.
    Processed,
    /// Processing failed; the reason is in the report.
    Failed,
    /// Same content already stored; recorded as `skipped_duplicate`.
    Duplicate,
    /// Already handled in an earlier run; nothing was done.
    Skipped,
}

impl Outcome {
    /// Lowercase label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Processed => "processed",
            Self::Failed => "failed",
            Self::Duplicate => "duplicate",
            Self::Skipped => "skipped",
        }
    }
}

/// Result of processing one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProcessReport {
    /// Document file name.
    pub filename: String,
    /// Stored document, if a row exists.
    pub document_id: Option<i64>,
    /// How processing ended.
    pub outcome: Outcome,
    /// Number of stored chunks.
    pub chunk_count: usize,
    /// Warnings from cleaning and validation.
    pub warnings: Vec<Warning>,
    /// Failure or skip reason.
    pub error: Option<String>,
    /// Original document for duplicates.
    pub duplicate_of: Option<i64>,
    /// Model calls made for this document.
    pub model_attempts: usize,
    /// Text of the last chunk, handed to the next document as context.
    #[serde(skip)]
    pub last_chunk: Option<String>,
}

impl ProcessReport {
    pub(crate) fn new(filename: impl Into<String>, outcome: Outcome) -> Self {
        Self {
            filename: filename.into(),
            document_id: None,
            outcome,
            chunk_count: 0,
            warnings: Vec::new(),
            error: None,
            duplicate_of: None,
            model_attempts: 0,
            last_chunk: None,
        }
    }
}

/// Validated chunks of one text, in document coordinates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChunkingOutcome {
    /// Chunks in order.
    pub chunks: Vec<ValidatedChunk>,
    /// Every warning, with document-level chunk indices.
    pub warnings: Vec<Warning>,
}

/// Processes documents one at a time.
///
/// Holds borrowed collaborators: the model invoker, the storage backend
/// (which also receives the attempt log) and the configuration.
pub struct DocumentProcessor<'a, I, S> {
    invoker: &'a I,
    storage: &'a mut S,
    config: &'a ProcessingConfig,
    attempts: usize,
}

impl<I, S> std::fmt::Debug for DocumentProcessor<'_, I, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentProcessor")
            .field("config", self.config)
            .field("attempts", &self.attempts)
            .finish_non_exhaustive()
    }
}

impl<'a, I, S> DocumentProcessor<'a, I, S>
where
    I: ModelInvoker,
    S: Storage + AttemptLog,
{
    /// Creates a processor.
    pub fn new(invoker: &'a I, storage: &'a mut S, config: &'a ProcessingConfig) -> Self {
        Self {
            invoker,
            storage,
            config,
            attempts: 0,
        }
    }

    /// Read access to the storage backend.
    pub fn storage(&self) -> &S {
        self.storage
    }

    /// Processes one document and stores the result.
    ///
    /// `existing` is a stored row for the same file (a failed or stale run)
    /// that is reused instead of inserting a new one. `previous` is the last
    /// chunk of the preceding document, passed to the model as context.
    ///
    /// Once the row exists, every failure is recorded on it and returned as
    /// [`Outcome::Failed`].
    ///
    /// # Errors
    ///
    /// Returns storage errors raised while inserting or resetting the row.
    pub async fn process(
        &mut self,
        filename: &str,
        content: String,
        group: Option<i64>,
        existing: Option<&Document>,
        previous: Option<&str>,
    ) -> Result<ProcessReport> {
        let mut document = Document::new(filename, content).with_group(group);
        let id = match existing.and_then(|d| d.id) {
            Some(id) => {
                document.id = Some(id);
                if let Some(existing) = existing {
                    document.created_at = existing.created_at;
                }
                self.storage.update_document(&document)?;
                self.storage.save_chunks(id, &[])?;
                id
            }
            None => {
                let id = self.storage.create_document(&document)?;
                document.id = Some(id);
                id
            }
        };

        let mut report = ProcessReport::new(filename, Outcome::Processed);
        report.document_id = Some(id);

        if let Err(e) = self.record(&mut document, id, previous, &mut report).await {
            tracing::error!(filename, document_id = id, error = %e, "cannot record document");
            let message = e.to_string();
            let marked = self.storage.save_chunks(id, &[]).and_then(|()| {
                self.storage
                    .set_status(id, DocumentStatus::Failed, Some(&message))
            });
            if let Err(mark_err) = marked {
                tracing::error!(document_id = id, error = %mark_err, "cannot mark document failed");
            }
            report.outcome = Outcome::Failed;
            report.chunk_count = 0;
            report.last_chunk = None;
            report.error = Some(message);
        }

        report.warnings = document.warnings;
        Ok(report)
    }

    /// Dedups, segments and stores an inserted document.
    ///
    /// Model, cleaning and boundary failures are stored on the document.
    /// Only storage errors are returned.
    async fn record(
        &mut self,
        document: &mut Document,
        id: i64,
        previous: Option<&str>,
        report: &mut ProcessReport,
    ) -> Result<()> {
        match self.storage.find_by_content_hash(
            &document.content_hash,
            document.group_number,
            Some(id),
        ) {
            Ok(Some(original)) => {
                tracing::info!(
                    filename = %document.filename,
                    document_id = id,
                    duplicate_of = ?original.id,
                    "duplicate content"
                );
                document.status = DocumentStatus::SkippedDuplicate;
                document.duplicate_of = original.id;
                self.storage.update_document(document)?;
                report.outcome = Outcome::Duplicate;
                report.duplicate_of = original.id;
                return Ok(());
            }
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(
                    filename = %document.filename,
                    error = %e,
                    "duplicate lookup failed; continuing"
                );
            }
        }

        self.attempts = 0;
        let result = self.segment_document(document, id, previous).await;
        report.model_attempts = self.attempts;

        match result {
            Ok(outcome) => {
                document.status = DocumentStatus::Processed;
                document.chunk_count = outcome.chunks.len();
                document.warnings.extend(outcome.warnings);
                self.storage.update_document(document)?;

                tracing::info!(
                    filename = %document.filename,
                    document_id = id,
                    chunks = document.chunk_count,
                    warnings = document.warnings.len(),
                    "document processed"
                );
                report.chunk_count = document.chunk_count;
                report.last_chunk = outcome.chunks.last().map(|c| c.text().to_string());
            }
            Err(e) => {
                tracing::error!(
                    filename = %document.filename,
                    document_id = id,
                    error = %e,
                    "document failed"
                );
                document.status = DocumentStatus::Failed;
                document.error_message = Some(e.to_string());
                self.storage.update_document(document)?;

                report.outcome = Outcome::Failed;
                report.error = document.error_message.clone();
            }
        }
        Ok(())
    }

    /// Cleans and chunks the document, then stores its chunks.
    async fn segment_document(
        &mut self,
        document: &mut Document,
        id: i64,
        previous: Option<&str>,
    ) -> Result<ChunkingOutcome> {
        let text = if self.config.clean {
            let (cleaned, warnings) = self.clean_text(&document.original_content, Some(id)).await?;
            document.warnings.extend(warnings);
            document.cleaned_content = Some(cleaned.clone());
            cleaned
        } else {
            document.original_content.clone()
        };

        let outcome = self.chunk_text(&text, Some(id), previous).await?;
        self.storage.save_chunks(id, &outcome.chunks)?;
        Ok(outcome)
    }

    /// Runs the cleaning pass over `text`, one pre-chunk segment at a time.
    ///
    /// Returns the cleaned text and warnings for fragments that could not
    /// be removed.
    ///
    /// # Errors
    ///
    /// Returns the terminal model error if every attempt fails.
    pub async fn clean_text(
        &mut self,
        text: &str,
        document_id: Option<i64>,
    ) -> Result<(String, Vec<Warning>)> {
        let mut cleaned = String::with_capacity(text.len());
        let mut warnings = Vec::new();

        for segment in self.config.pre_chunker().pre_chunk(text)? {
            if segment.text.trim().is_empty() {
                cleaned.push_str(segment.text);
                continue;
            }

            let request =
                ModelRequest::json(CLEAN_SYSTEM_PROMPT, build_clean_user_message(segment.text));
            let response: CleaningResponse = self
                .call_model(RequestKind::Clean, document_id, &request)
                .await?;

            let outcome = apply_removals(
                segment.text,
                &response.text_to_remove,
                self.config.text_removal_position_tolerance,
            );
            cleaned.push_str(&outcome.cleaned);
            warnings.extend(outcome.warnings);
        }

        Ok((cleaned, warnings))
    }

    /// Chunks `text` segment by segment and validates every claimed chunking.
    ///
    /// The unprocessed tail of an incomplete segment is prepended to the
    /// next one; offsets in the result refer to `text`.
    ///
    /// # Errors
    ///
    /// Returns the terminal model error if every attempt fails, or the
    /// first boundary error. Boundary errors are not retried.
    pub async fn chunk_text(
        &mut self,
        text: &str,
        document_id: Option<i64>,
        previous: Option<&str>,
    ) -> Result<ChunkingOutcome> {
        let pre_chunker = self.config.pre_chunker();
        let validator = self.config.validator();
        let mut outcome = ChunkingOutcome::default();
        let mut remainder = String::new();

        for segment in pre_chunker.pre_chunk(text)? {
            let offset = segment.start_position - 1 - char_len(&remainder);
            let mut source = std::mem::take(&mut remainder);
            source.push_str(segment.text);

            if source.trim().is_empty() {
                if !segment.is_complete {
                    remainder = source;
                }
                continue;
            }

            let max_len = self.config.max_chunk_length;
            let system_prompt = if pre_chunker.should_use_simplified_prompt(&source) {
                simplified_chunk_system_prompt(max_len)
            } else {
                chunk_system_prompt(max_len)
            };
            let context = outcome
                .chunks
                .last()
                .map(ValidatedChunk::text)
                .or(previous);
            let request =
                ModelRequest::json(system_prompt, build_chunk_user_message(&source, context));

            let response: ChunkingResponse = self
                .call_model(RequestKind::Chunk, document_id, &request)
                .await?;

            let source = SourceText::new(source);
            let index_base = outcome.chunks.len();
            let report = validator
                .validate(&source, &response.chunks, segment.is_complete)
                .map_err(|e| e.relocate(offset, index_base))?;

            tracing::debug!(
                segment_start = segment.start_position,
                chunks = report.chunks.len(),
                remainder = char_len(&report.remainder),
                "segment validated"
            );

            outcome
                .warnings
                .extend(report.warnings.into_iter().map(|mut w| {
                    w.chunk_index += index_base;
                    w
                }));
            outcome.chunks.extend(
                report
                    .chunks
                    .into_iter()
                    .map(|chunk| chunk.relocate(offset, index_base)),
            );
            remainder = report.remainder;
        }

        Ok(outcome)
    }

    /// Sends `request` through the retry orchestrator and parses the reply.
    async fn call_model<T: DeserializeOwned>(
        &mut self,
        kind: RequestKind,
        document_id: Option<i64>,
        request: &ModelRequest,
    ) -> Result<T> {
        let invoker = self.invoker;
        let config = self.config;
        let mut orchestrator =
            RetryFallbackOrchestrator::new(config.retry_config(), &mut *self.storage);

        let result = orchestrator
            .run_with_fallback(&config.candidate_models, kind, document_id, |model| async move {
                let response = invoker.invoke(&model, request).await?;
                parse_response::<T>(&model, &response.content)
            })
            .await;

        self.attempts += orchestrator.history().len();
        result
    }
}
