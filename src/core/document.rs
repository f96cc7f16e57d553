//! Documents and their processing status.
//!
//! A document is one input file. Its status moves from `processing` to
//! exactly one of `processed`, `failed` or `skipped_duplicate`.

use crate::core::chunk::Warning;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

/// Lifecycle state of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
    /// Work started but did not finish.
    Processing,
    /// Chunks were validated and stored.
    Processed,
    /// Processing failed; see the error message.
    Failed,
    /// Same content already exists under another document.
    SkippedDuplicate,
}

impl DocumentStatus {
    /// Status label as stored in the database.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Processing => "processing",
            Self::Processed => "processed",
            Self::Failed => "failed",
            Self::SkippedDuplicate => "skipped_duplicate",
        }
    }

    /// Whether a batch run should leave this document alone.
    #[must_use]
    pub const fn is_settled(self) -> bool {
        matches!(self, Self::Processed | Self::SkippedDuplicate)
    }
}

impl fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "processing" => Ok(Self::Processing),
            "processed" => Ok(Self::Processed),
            "failed" => Ok(Self::Failed),
            "skipped_duplicate" => Ok(Self::SkippedDuplicate),
            other => Err(other.to_string()),
        }
    }
}

/// A document row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// Unique identifier (assigned by storage layer).
    pub id: Option<i64>,
    /// File name without directories.
    pub filename: String,
    /// Optional grouping key for duplicate detection and lookup.
    pub group_number: Option<i64>,
    /// SHA-256 hex digest of `original_content`.
    pub content_hash: String,
    /// Text as read from the source file.
    pub original_content: String,
    /// Text after the cleaning pass.
    pub cleaned_content: Option<String>,
    /// Current status.
    pub status: DocumentStatus,
    /// Warnings collected while processing.
    pub warnings: Vec<Warning>,
    /// Reason for failure, if any.
    pub error_message: Option<String>,
    /// Id of the document this one duplicates.
    pub duplicate_of: Option<i64>,
    /// Number of stored chunks.
    pub chunk_count: usize,
    /// Unix timestamp of creation.
    pub created_at: i64,
    /// Unix timestamp of last update.
    pub updated_at: i64,
}

impl Document {
    /// Creates a new document in the `processing` state.
    ///
    /// # Examples
    ///
    /// ```
    /// use doc_segmenter::core::{Document, DocumentStatus};
    ///
    /// let doc = Document::new("notes.txt", "Some text.".to_string());
    /// assert_eq!(doc.status, DocumentStatus::Processing);
    /// assert_eq!(doc.content_hash.len(), 64);
    /// ```
    pub fn new(filename: impl Into<String>, original_content: String) -> Self {
        let now = current_timestamp();
        Self {
            id: None,
            filename: filename.into(),
            group_number: None,
            content_hash: content_hash(&original_content),
            original_content,
            cleaned_content: None,
            status: DocumentStatus::Processing,
            warnings: Vec::new(),
            error_message: None,
            duplicate_of: None,
            chunk_count: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Sets the grouping key.
    #[must_use]
    pub const fn with_group(mut self, group_number: Option<i64>) -> Self {
        self.group_number = group_number;
        self
    }

    /// Size of the original content in characters.
    #[must_use]
    pub fn char_len(&self) -> usize {
        self.original_content.chars().count()
    }
}

/// A stored chunk row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkRecord {
    /// Unique identifier.
    pub id: i64,
    /// Parent document.
    pub document_id: i64,
    /// Sequential index within the document (0-based).
    pub index: usize,
    /// First character position in the cleaned text (1-based).
    pub start_index: usize,
    /// Last character position (inclusive).
    pub end_index: usize,
    /// Verified first word.
    pub first_word: String,
    /// Verified last word.
    pub last_word: String,
    /// Chunk text.
    pub content: String,
    /// Warnings attached to this chunk.
    pub warnings: Vec<Warning>,
    /// Unix timestamp of creation.
    pub created_at: i64,
}

/// Computes the SHA-256 hex digest used for duplicate detection.
#[must_use]
pub fn content_hash(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}

/// Returns the current Unix timestamp in seconds.
#[allow(clippy::cast_possible_wrap)]
pub(crate) fn current_timestamp() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}
