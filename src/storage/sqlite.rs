//! `SQLite` storage implementation.
//!
//! Provides persistent storage using `SQLite` with proper transaction
//! management and migration support.

// SQLite stores all integers as i64. These casts are intentional and safe
// because we only store non-negative values that fit in usize.
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_possible_wrap)]

use crate::core::document::current_timestamp;
use crate::core::{
    ChunkRecord, Document, DocumentStatus, ModelAttempt, RequestKind, ValidatedChunk, Warning,
};
use crate::error::{Result, StorageError};
use crate::model::AttemptLog;
use crate::storage::schema::{
    CHECK_SCHEMA_SQL, CURRENT_SCHEMA_VERSION, GET_VERSION_SQL, SCHEMA_SQL, SET_VERSION_SQL,
};
use crate::storage::traits::{Storage, StorageStats};
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Row, params};
use std::path::{Path, PathBuf};

const DOCUMENT_COLUMNS: &str = "id, filename, group_number, content_hash, original_content, \
     cleaned_content, status, warnings, error_message, duplicate_of, chunk_count, \
     created_at, updated_at";

const CHUNK_COLUMNS: &str = "id, document_id, chunk_index, start_index, end_index, first_word, \
     last_word, content, warnings, created_at";

/// SQLite-based storage implementation.
///
/// # Examples
///
/// ```no_run
/// use doc_segmenter::storage::{SqliteStorage, Storage};
///
/// let mut storage = SqliteStorage::open("segmenter.db").unwrap();
/// storage.init().unwrap();
/// ```
pub struct SqliteStorage {
    /// `SQLite` connection.
    conn: Connection,
    /// Path to the database file (None for in-memory).
    path: Option<PathBuf>,
}

impl std::fmt::Debug for SqliteStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteStorage")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl SqliteStorage {
    /// Opens or creates a `SQLite` database at the given path.
    ///
    /// Missing parent directories are created.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| StorageError::Database(e.to_string()))?;
        }

        let conn = Connection::open(&path).map_err(StorageError::from)?;
        conn.execute("PRAGMA foreign_keys = ON;", [])
            .map_err(StorageError::from)?;

        // journal_mode returns the resulting mode as a row
        let _: String = conn
            .query_row("PRAGMA journal_mode = WAL;", [], |row| row.get(0))
            .map_err(StorageError::from)?;

        Ok(Self {
            conn,
            path: Some(path),
        })
    }

    /// Creates an in-memory `SQLite` database.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be created.
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(StorageError::from)?;
        conn.execute("PRAGMA foreign_keys = ON;", [])
            .map_err(StorageError::from)?;

        Ok(Self { conn, path: None })
    }

    /// Returns the database path (None for in-memory).
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn get_schema_version(&self) -> Result<Option<u32>> {
        let version: Option<String> = self
            .conn
            .query_row(GET_VERSION_SQL, [], |row| row.get(0))
            .optional()
            .map_err(StorageError::from)?;

        Ok(version.and_then(|v| v.parse().ok()))
    }

    fn set_schema_version(&self, version: u32) -> Result<()> {
        self.conn
            .execute(SET_VERSION_SQL, params![version.to_string()])
            .map_err(StorageError::from)?;
        Ok(())
    }

    fn count(&self, sql: &str) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row(sql, [], |row| row.get(0))
            .map_err(StorageError::from)?;
        Ok(count as usize)
    }

    fn query_documents(
        &self,
        sql: &str,
        params: impl rusqlite::Params,
    ) -> Result<Vec<Document>> {
        let mut stmt = self.conn.prepare(sql).map_err(StorageError::from)?;
        let documents = stmt
            .query_map(params, document_from_row)
            .map_err(StorageError::from)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(StorageError::from)?;
        Ok(documents)
    }
}

fn conversion_error(
    index: usize,
    err: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(index, Type::Text, Box::new(err))
}

fn warnings_column(row: &Row<'_>, index: usize) -> rusqlite::Result<Vec<Warning>> {
    let json: String = row.get(index)?;
    serde_json::from_str(&json).map_err(|e| conversion_error(index, e))
}

fn document_from_row(row: &Row<'_>) -> rusqlite::Result<Document> {
    let status: String = row.get(6)?;
    let status = status
        .parse::<DocumentStatus>()
        .map_err(|s| conversion_error(6, StorageError::UnknownStatus(s)))?;

    Ok(Document {
        id: Some(row.get(0)?),
        filename: row.get(1)?,
        group_number: row.get(2)?,
        content_hash: row.get(3)?,
        original_content: row.get(4)?,
        cleaned_content: row.get(5)?,
        status,
        warnings: warnings_column(row, 7)?,
        error_message: row.get(8)?,
        duplicate_of: row.get(9)?,
        chunk_count: row.get::<_, i64>(10)? as usize,
        created_at: row.get(11)?,
        updated_at: row.get(12)?,
    })
}

fn chunk_from_row(row: &Row<'_>) -> rusqlite::Result<ChunkRecord> {
    Ok(ChunkRecord {
        id: row.get(0)?,
        document_id: row.get(1)?,
        index: row.get::<_, i64>(2)? as usize,
        start_index: row.get::<_, i64>(3)? as usize,
        end_index: row.get::<_, i64>(4)? as usize,
        first_word: row.get(5)?,
        last_word: row.get(6)?,
        content: row.get(7)?,
        warnings: warnings_column(row, 8)?,
        created_at: row.get(9)?,
    })
}

fn attempt_from_row(row: &Row<'_>) -> rusqlite::Result<ModelAttempt> {
    let kind: String = row.get(1)?;
    let request_kind = match kind.as_str() {
        "clean" => RequestKind::Clean,
        "chunk" => RequestKind::Chunk,
        other => {
            return Err(conversion_error(
                1,
                StorageError::Serialization(format!("unknown request kind: {other}")),
            ));
        }
    };

    Ok(ModelAttempt {
        model: row.get(0)?,
        request_kind,
        document_id: row.get(2)?,
        succeeded: row.get::<_, i64>(3)? != 0,
        error: row.get(4)?,
        started_at_ms: row.get(5)?,
        finished_at_ms: row.get(6)?,
    })
}

impl Storage for SqliteStorage {
    fn init(&mut self) -> Result<()> {
        let is_init: i64 = self
            .conn
            .query_row(CHECK_SCHEMA_SQL, [], |row| row.get(0))
            .map_err(StorageError::from)?;

        if is_init == 0 {
            self.conn
                .execute_batch(SCHEMA_SQL)
                .map_err(StorageError::from)?;
            self.set_schema_version(CURRENT_SCHEMA_VERSION)?;
        } else if let Some(current) = self.get_schema_version()?
            && current < CURRENT_SCHEMA_VERSION
        {
            for migration in crate::storage::schema::get_migrations_from(current) {
                self.conn
                    .execute_batch(migration.sql)
                    .map_err(|e| StorageError::Migration(e.to_string()))?;
                tracing::info!(
                    from = migration.from_version,
                    to = migration.to_version,
                    "applied schema migration"
                );
            }
            self.set_schema_version(CURRENT_SCHEMA_VERSION)?;
        }

        Ok(())
    }

    fn is_initialized(&self) -> Result<bool> {
        let count: i64 = self
            .conn
            .query_row(CHECK_SCHEMA_SQL, [], |row| row.get(0))
            .map_err(StorageError::from)?;
        Ok(count > 0)
    }

    fn reset(&mut self) -> Result<()> {
        self.conn
            .execute_batch(
                r"
            DELETE FROM chunks;
            DELETE FROM model_attempts;
            DELETE FROM documents;
        ",
            )
            .map_err(StorageError::from)?;
        Ok(())
    }

    // ==================== Document Operations ====================

    fn create_document(&mut self, document: &Document) -> Result<i64> {
        let warnings = serde_json::to_string(&document.warnings).map_err(StorageError::from)?;

        self.conn
            .execute(
                r"
            INSERT INTO documents (
                filename, group_number, content_hash, original_content, cleaned_content,
                status, warnings, error_message, duplicate_of, chunk_count,
                created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        ",
                params![
                    document.filename,
                    document.group_number,
                    document.content_hash,
                    document.original_content,
                    document.cleaned_content,
                    document.status.as_str(),
                    warnings,
                    document.error_message,
                    document.duplicate_of,
                    document.chunk_count as i64,
                    document.created_at,
                    document.updated_at,
                ],
            )
            .map_err(StorageError::from)?;

        Ok(self.conn.last_insert_rowid())
    }

    fn update_document(&mut self, document: &Document) -> Result<()> {
        let id = document
            .id
            .ok_or(StorageError::DocumentNotFound { id: 0 })?;
        let warnings = serde_json::to_string(&document.warnings).map_err(StorageError::from)?;

        let updated = self
            .conn
            .execute(
                r"
            UPDATE documents SET
                filename = ?, group_number = ?, content_hash = ?, original_content = ?,
                cleaned_content = ?, status = ?, warnings = ?, error_message = ?,
                duplicate_of = ?, chunk_count = ?, updated_at = ?
            WHERE id = ?
        ",
                params![
                    document.filename,
                    document.group_number,
                    document.content_hash,
                    document.original_content,
                    document.cleaned_content,
                    document.status.as_str(),
                    warnings,
                    document.error_message,
                    document.duplicate_of,
                    document.chunk_count as i64,
                    current_timestamp(),
                    id,
                ],
            )
            .map_err(StorageError::from)?;

        if updated == 0 {
            return Err(StorageError::DocumentNotFound { id }.into());
        }
        Ok(())
    }

    fn set_status(
        &mut self,
        id: i64,
        status: DocumentStatus,
        error_message: Option<&str>,
    ) -> Result<()> {
        let updated = self
            .conn
            .execute(
                "UPDATE documents SET status = ?, error_message = ?, updated_at = ? WHERE id = ?",
                params![status.as_str(), error_message, current_timestamp(), id],
            )
            .map_err(StorageError::from)?;

        if updated == 0 {
            return Err(StorageError::DocumentNotFound { id }.into());
        }
        Ok(())
    }

    fn get_document(&self, id: i64) -> Result<Option<Document>> {
        let document = self
            .conn
            .query_row(
                &format!("SELECT {DOCUMENT_COLUMNS} FROM documents WHERE id = ?"),
                params![id],
                document_from_row,
            )
            .optional()
            .map_err(StorageError::from)?;

        Ok(document)
    }

    fn find_document(&self, filename: &str, group: Option<i64>) -> Result<Option<Document>> {
        let document = self
            .conn
            .query_row(
                &format!(
                    "SELECT {DOCUMENT_COLUMNS} FROM documents \
                     WHERE filename = ? AND group_number IS ? ORDER BY id DESC LIMIT 1"
                ),
                params![filename, group],
                document_from_row,
            )
            .optional()
            .map_err(StorageError::from)?;

        Ok(document)
    }

    fn find_by_content_hash(
        &self,
        hash: &str,
        group: Option<i64>,
        exclude_id: Option<i64>,
    ) -> Result<Option<Document>> {
        let document = self
            .conn
            .query_row(
                &format!(
                    "SELECT {DOCUMENT_COLUMNS} FROM documents \
                     WHERE content_hash = ? AND group_number IS ? \
                       AND status NOT IN ('failed', 'skipped_duplicate') \
                       AND id IS NOT ? \
                     ORDER BY id LIMIT 1"
                ),
                params![hash, group, exclude_id],
                document_from_row,
            )
            .optional()
            .map_err(StorageError::from)?;

        Ok(document)
    }

    fn list_documents(&self, status: Option<DocumentStatus>) -> Result<Vec<Document>> {
        match status {
            Some(status) => self.query_documents(
                &format!("SELECT {DOCUMENT_COLUMNS} FROM documents WHERE status = ? ORDER BY id"),
                params![status.as_str()],
            ),
            None => self.query_documents(
                &format!("SELECT {DOCUMENT_COLUMNS} FROM documents ORDER BY id"),
                [],
            ),
        }
    }

    // ==================== Chunk Operations ====================

    fn save_chunks(&mut self, document_id: i64, chunks: &[ValidatedChunk]) -> Result<()> {
        let tx = self.conn.transaction().map_err(StorageError::from)?;
        let now = current_timestamp();

        tx.execute("DELETE FROM chunks WHERE document_id = ?", params![document_id])
            .map_err(StorageError::from)?;

        {
            let mut stmt = tx
                .prepare(
                    r"
                INSERT INTO chunks (
                    document_id, chunk_index, start_index, end_index, first_word,
                    last_word, content, warnings, created_at
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            ",
                )
                .map_err(StorageError::from)?;

            for chunk in chunks {
                let warnings =
                    serde_json::to_string(chunk.warnings()).map_err(StorageError::from)?;
                stmt.execute(params![
                    document_id,
                    chunk.index() as i64,
                    chunk.start_index() as i64,
                    chunk.end_index() as i64,
                    chunk.first_word(),
                    chunk.last_word(),
                    chunk.text(),
                    warnings,
                    now,
                ])
                .map_err(StorageError::from)?;
            }
        }

        tx.execute(
            "UPDATE documents SET chunk_count = ?, updated_at = ? WHERE id = ?",
            params![chunks.len() as i64, now, document_id],
        )
        .map_err(StorageError::from)?;

        tx.commit().map_err(StorageError::from)?;
        Ok(())
    }

    fn get_chunks(&self, document_id: i64) -> Result<Vec<ChunkRecord>> {
        let mut stmt = self
            .conn
            .prepare(&format!(
                "SELECT {CHUNK_COLUMNS} FROM chunks WHERE document_id = ? ORDER BY chunk_index"
            ))
            .map_err(StorageError::from)?;

        let chunks = stmt
            .query_map(params![document_id], chunk_from_row)
            .map_err(StorageError::from)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(StorageError::from)?;

        Ok(chunks)
    }

    // ==================== Attempt Operations ====================

    fn add_attempt(&mut self, attempt: &ModelAttempt) -> Result<i64> {
        self.conn
            .execute(
                r"
            INSERT INTO model_attempts (
                model, request_kind, document_id, succeeded, error,
                started_at_ms, finished_at_ms
            ) VALUES (?, ?, ?, ?, ?, ?, ?)
        ",
                params![
                    attempt.model,
                    attempt.request_kind.as_str(),
                    attempt.document_id,
                    i64::from(attempt.succeeded),
                    attempt.error,
                    attempt.started_at_ms,
                    attempt.finished_at_ms,
                ],
            )
            .map_err(StorageError::from)?;

        Ok(self.conn.last_insert_rowid())
    }

    fn list_attempts(&self, limit: usize) -> Result<Vec<ModelAttempt>> {
        let mut stmt = self
            .conn
            .prepare(
                r"
            SELECT model, request_kind, document_id, succeeded, error,
                   started_at_ms, finished_at_ms
            FROM model_attempts ORDER BY id DESC LIMIT ?
        ",
            )
            .map_err(StorageError::from)?;

        let attempts = stmt
            .query_map(params![limit as i64], attempt_from_row)
            .map_err(StorageError::from)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(StorageError::from)?;

        Ok(attempts)
    }

    // ==================== Utility Operations ====================

    fn stats(&self) -> Result<StorageStats> {
        let mut stats = StorageStats {
            document_count: self.count("SELECT COUNT(*) FROM documents")?,
            chunk_count: self.count("SELECT COUNT(*) FROM chunks")?,
            attempt_count: self.count("SELECT COUNT(*) FROM model_attempts")?,
            schema_version: self.get_schema_version()?.unwrap_or(0),
            db_size: self
                .path
                .as_ref()
                .and_then(|p| std::fs::metadata(p).ok().map(|m| m.len())),
            ..StorageStats::default()
        };

        let mut stmt = self
            .conn
            .prepare("SELECT status, COUNT(*) FROM documents GROUP BY status")
            .map_err(StorageError::from)?;
        let rows = stmt
            .query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)? as usize))
            })
            .map_err(StorageError::from)?;

        for row in rows {
            let (status, count) = row.map_err(StorageError::from)?;
            match status.parse::<DocumentStatus>() {
                Ok(DocumentStatus::Processed) => stats.processed = count,
                Ok(DocumentStatus::Failed) => stats.failed = count,
                Ok(DocumentStatus::SkippedDuplicate) => stats.skipped_duplicate = count,
                Ok(DocumentStatus::Processing) => stats.processing = count,
                Err(other) => return Err(StorageError::UnknownStatus(other).into()),
            }
        }

        Ok(stats)
    }
}

impl AttemptLog for SqliteStorage {
    fn record_attempt(&mut self, attempt: &ModelAttempt) -> Result<()> {
        self.add_attempt(attempt).map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunking::ChunkBoundaryValidator;
    use crate::core::{ChunkClaim, SourceText};
    use crate::error::Error;

    fn setup() -> SqliteStorage {
        let mut storage = SqliteStorage::in_memory().unwrap();
        storage.init().unwrap();
        storage
    }

    fn sample_chunks() -> Vec<ValidatedChunk> {
        let source = SourceText::new("Hello world. Goodbye now.");
        let claims = vec![
            ChunkClaim::new(1, 12, "Hello", "world."),
            ChunkClaim::new(14, 25, "Goodbye", "now."),
        ];
        ChunkBoundaryValidator::default()
            .validate(&source, &claims, true)
            .unwrap()
            .chunks
    }

    #[test]
    fn test_init() {
        let mut storage = SqliteStorage::in_memory().unwrap();
        assert!(!storage.is_initialized().unwrap());
        storage.init().unwrap();
        assert!(storage.is_initialized().unwrap());
        assert_eq!(storage.stats().unwrap().schema_version, CURRENT_SCHEMA_VERSION);
    }

    #[test]
    fn test_init_idempotent() {
        let mut storage = setup();
        assert!(storage.init().is_ok());
    }

    #[test]
    fn test_migrates_v1_database() {
        let mut storage = SqliteStorage::in_memory().unwrap();
        storage.init().unwrap();
        storage
            .conn
            .execute_batch("DROP TABLE model_attempts;")
            .unwrap();
        storage.set_schema_version(1).unwrap();

        storage.init().unwrap();
        assert_eq!(storage.get_schema_version().unwrap(), Some(2));
        assert_eq!(storage.list_attempts(10).unwrap().len(), 0);
    }

    #[test]
    fn test_document_crud() {
        let mut storage = setup();
        let mut doc = Document::new("a.txt", "Hello world.".to_string()).with_group(Some(3));
        let id = storage.create_document(&doc).unwrap();

        let loaded = storage.get_document(id).unwrap().unwrap();
        assert_eq!(loaded.filename, "a.txt");
        assert_eq!(loaded.group_number, Some(3));
        assert_eq!(loaded.status, DocumentStatus::Processing);

        doc.id = Some(id);
        doc.cleaned_content = Some("Hello world.".to_string());
        doc.warnings.push(Warning::tolerable(0, "small gap").with_gap(" "));
        doc.status = DocumentStatus::Processed;
        storage.update_document(&doc).unwrap();

        let loaded = storage.get_document(id).unwrap().unwrap();
        assert_eq!(loaded.status, DocumentStatus::Processed);
        assert_eq!(loaded.warnings, doc.warnings);
        assert_eq!(loaded.cleaned_content.as_deref(), Some("Hello world."));
    }

    #[test]
    fn test_update_missing_document() {
        let mut storage = setup();
        let mut doc = Document::new("a.txt", "x".to_string());
        doc.id = Some(99);
        let err = storage.update_document(&doc).unwrap_err();
        assert!(matches!(
            err,
            Error::Storage(StorageError::DocumentNotFound { id: 99 })
        ));
        assert!(storage.set_status(99, DocumentStatus::Failed, None).is_err());
    }

    #[test]
    fn test_set_status() {
        let mut storage = setup();
        let id = storage
            .create_document(&Document::new("a.txt", "x".to_string()))
            .unwrap();
        storage
            .set_status(id, DocumentStatus::Failed, Some("model down"))
            .unwrap();

        let doc = storage.get_document(id).unwrap().unwrap();
        assert_eq!(doc.status, DocumentStatus::Failed);
        assert_eq!(doc.error_message.as_deref(), Some("model down"));
        assert_eq!(doc.original_content, "x");
    }

    #[test]
    fn test_find_document_by_name_and_group() {
        let mut storage = setup();
        storage
            .create_document(&Document::new("a.txt", "one".to_string()).with_group(Some(1)))
            .unwrap();
        let second = storage
            .create_document(&Document::new("a.txt", "two".to_string()))
            .unwrap();

        let found = storage.find_document("a.txt", None).unwrap().unwrap();
        assert_eq!(found.id, Some(second));
        assert!(storage.find_document("a.txt", Some(1)).unwrap().is_some());
        assert!(storage.find_document("a.txt", Some(2)).unwrap().is_none());
        assert!(storage.find_document("b.txt", None).unwrap().is_none());
    }

    #[test]
    fn test_find_by_content_hash_skips_failed() {
        let mut storage = setup();
        let doc = Document::new("a.txt", "same text".to_string());
        let failed = storage.create_document(&doc).unwrap();
        storage
            .set_status(failed, DocumentStatus::Failed, Some("boom"))
            .unwrap();
        assert!(storage
            .find_by_content_hash(&doc.content_hash, None, None)
            .unwrap()
            .is_none());

        let ok = storage.create_document(&doc).unwrap();
        storage.set_status(ok, DocumentStatus::Processed, None).unwrap();
        let found = storage
            .find_by_content_hash(&doc.content_hash, None, None)
            .unwrap()
            .unwrap();
        assert_eq!(found.id, Some(ok));

        assert!(storage
            .find_by_content_hash(&doc.content_hash, None, Some(ok))
            .unwrap()
            .is_none());
        assert!(storage
            .find_by_content_hash(&doc.content_hash, Some(5), None)
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_list_documents_by_status() {
        let mut storage = setup();
        let a = storage
            .create_document(&Document::new("a.txt", "a".to_string()))
            .unwrap();
        storage
            .create_document(&Document::new("b.txt", "b".to_string()))
            .unwrap();
        storage.set_status(a, DocumentStatus::Processed, None).unwrap();

        assert_eq!(storage.list_documents(None).unwrap().len(), 2);
        let processed = storage
            .list_documents(Some(DocumentStatus::Processed))
            .unwrap();
        assert_eq!(processed.len(), 1);
        assert_eq!(processed[0].filename, "a.txt");
    }

    #[test]
    fn test_save_and_replace_chunks() {
        let mut storage = setup();
        let id = storage
            .create_document(&Document::new("a.txt", "Hello world. Goodbye now.".to_string()))
            .unwrap();

        let chunks = sample_chunks();
        storage.save_chunks(id, &chunks).unwrap();
        storage.save_chunks(id, &chunks).unwrap();

        let stored = storage.get_chunks(id).unwrap();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[0].content, "Hello world.");
        assert_eq!(stored[1].start_index, 14);
        assert_eq!(stored[1].warnings.len(), 1);
        assert_eq!(storage.get_document(id).unwrap().unwrap().chunk_count, 2);
    }

    #[test]
    fn test_chunks_deleted_with_document() {
        let mut storage = setup();
        let id = storage
            .create_document(&Document::new("a.txt", "x".to_string()))
            .unwrap();
        storage.save_chunks(id, &sample_chunks()).unwrap();
        storage.reset().unwrap();
        assert!(storage.get_chunks(id).unwrap().is_empty());
        assert_eq!(storage.stats().unwrap().document_count, 0);
    }

    #[test]
    fn test_attempt_log() {
        let mut storage = setup();
        for (i, succeeded) in [false, true].into_iter().enumerate() {
            let attempt = ModelAttempt {
                model: format!("model-{i}"),
                request_kind: RequestKind::Chunk,
                document_id: Some(1),
                succeeded,
                error: (!succeeded).then(|| "timeout".to_string()),
                started_at_ms: 10,
                finished_at_ms: 25,
            };
            storage.record_attempt(&attempt).unwrap();
        }

        let attempts = storage.list_attempts(10).unwrap();
        assert_eq!(attempts.len(), 2);
        assert_eq!(attempts[0].model, "model-1");
        assert!(attempts[0].succeeded);
        assert_eq!(attempts[1].error.as_deref(), Some("timeout"));
        assert_eq!(attempts[1].duration_ms(), 15);
        assert_eq!(storage.list_attempts(1).unwrap().len(), 1);
    }

    #[test]
    fn test_stats_by_status() {
        let mut storage = setup();
        let a = storage
            .create_document(&Document::new("a.txt", "a".to_string()))
            .unwrap();
        let b = storage
            .create_document(&Document::new("b.txt", "b".to_string()))
            .unwrap();
        storage
            .create_document(&Document::new("c.txt", "c".to_string()))
            .unwrap();
        storage.set_status(a, DocumentStatus::Processed, None).unwrap();
        storage.set_status(b, DocumentStatus::Failed, Some("x")).unwrap();

        let stats = storage.stats().unwrap();
        assert_eq!(stats.document_count, 3);
        assert_eq!(stats.processed, 1);
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.processing, 1);
        assert_eq!(stats.skipped_duplicate, 0);
        assert!(stats.db_size.is_none());
    }

    #[test]
    fn test_file_database() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("segmenter.db");
        {
            let mut storage = SqliteStorage::open(&path).unwrap();
            storage.init().unwrap();
            storage
                .create_document(&Document::new("a.txt", "a".to_string()))
                .unwrap();
        }
        let storage = SqliteStorage::open(&path).unwrap();
        assert!(storage.is_initialized().unwrap());
        assert_eq!(storage.path(), Some(path.as_path()));
        assert_eq!(storage.list_documents(None).unwrap().len(), 1);
    }
}
