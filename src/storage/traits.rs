//! Storage trait definition.
//!
//! Defines the interface for persistent storage backends, enabling
//! pluggable storage implementations.

use crate::core::{ChunkRecord, Document, DocumentStatus, ModelAttempt, ValidatedChunk};
use crate::error::Result;
use serde::Serialize;

/// Trait for persistent storage backends.
///
/// Implementations store documents, their validated chunks and the model
/// call log. `Sync` is not required: a backend is owned by one worker.
pub trait Storage: Send {
    /// Initializes storage (creates schema, runs migrations).
    ///
    /// Should be idempotent - safe to call multiple times.
    ///
    /// # Errors
    ///
    /// Returns an error if schema creation or migration fails.
    fn init(&mut self) -> Result<()>;

    /// Checks if storage is initialized.
    ///
    /// # Errors
    ///
    /// Returns an error if the check cannot be performed.
    fn is_initialized(&self) -> Result<bool>;

    /// Deletes all data but preserves the schema.
    ///
    /// # Errors
    ///
    /// Returns an error if deletion fails.
    fn reset(&mut self) -> Result<()>;

    // ==================== Document Operations ====================

    /// Inserts a document and returns its ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    fn create_document(&mut self, document: &Document) -> Result<i64>;

    /// Overwrites every mutable field of a stored document.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::StorageError::DocumentNotFound`] if the
    /// document has no ID or does not exist.
    fn update_document(&mut self, document: &Document) -> Result<()>;

    /// Transitions a document to `status`, recording `error_message`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::StorageError::DocumentNotFound`] if the
    /// document does not exist.
    fn set_status(
        &mut self,
        id: i64,
        status: DocumentStatus,
        error_message: Option<&str>,
    ) -> Result<()>;

    /// Retrieves a document by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    fn get_document(&self, id: i64) -> Result<Option<Document>>;

    /// Finds the most recent document with `filename` in `group`.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    fn find_document(&self, filename: &str, group: Option<i64>) -> Result<Option<Document>>;

    /// Finds the oldest document in `group` with the given content hash.
    ///
    /// Failed documents and recorded duplicates never match; neither does
    /// `exclude_id`.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    fn find_by_content_hash(
        &self,
        hash: &str,
        group: Option<i64>,
        exclude_id: Option<i64>,
    ) -> Result<Option<Document>>;

    /// Lists documents, optionally filtered by status.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    fn list_documents(&self, status: Option<DocumentStatus>) -> Result<Vec<Document>>;

    // ==================== Chunk Operations ====================

    /// Replaces the chunks of a document atomically.
    ///
    /// # Errors
    ///
    /// Returns an error if chunk insertion fails; no chunks are stored then.
    fn save_chunks(&mut self, document_id: i64, chunks: &[ValidatedChunk]) -> Result<()>;

    /// Retrieves all chunks of a document in order.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    fn get_chunks(&self, document_id: i64) -> Result<Vec<ChunkRecord>>;

    // ==================== Attempt Operations ====================

    /// Appends a model attempt to the log.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    fn add_attempt(&mut self, attempt: &ModelAttempt) -> Result<i64>;

    /// Lists the most recent attempts, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    fn list_attempts(&self, limit: usize) -> Result<Vec<ModelAttempt>>;

    // ==================== Utility Operations ====================

    /// Gets storage statistics.
    ///
    /// # Errors
    ///
    /// Returns an error if statistics cannot be gathered.
    fn stats(&self) -> Result<StorageStats>;
}

/// Storage statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StorageStats {
    /// Number of documents stored.
    pub document_count: usize,
    /// Documents in `processed` state.
    pub processed: usize,
    /// Documents in `failed` state.
    pub failed: usize,
    /// Documents in `skipped_duplicate` state.
    pub skipped_duplicate: usize,
    /// Documents still in `processing` state.
    pub processing: usize,
    /// Total number of chunks across all documents.
    pub chunk_count: usize,
    /// Number of logged model attempts.
    pub attempt_count: usize,
    /// Schema version.
    pub schema_version: u32,
    /// Database file size in bytes (if applicable).
    pub db_size: Option<u64>,
}
