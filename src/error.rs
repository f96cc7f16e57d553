//! Error types for document segmentation.
//!
//! This module provides the error hierarchy using `thiserror` for all
//! operations: storage, boundary validation, model calls, I/O and CLI
//! commands.

use thiserror::Error;

/// Result type alias for segmentation operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type.
#[derive(Error, Debug)]
pub enum Error {
    /// Storage-related errors (database operations).
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// Pre-chunking errors.
    #[error("chunking error: {0}")]
    Chunking(#[from] ChunkingError),

    /// A claimed chunking failed validation against the source text.
    #[error("boundary error: {0}")]
    Boundary(#[from] BoundaryError),

    /// A model call failed after all retries and fallbacks.
    #[error("model error: {0}")]
    Model(#[from] ModelError),

    /// I/O errors (file operations).
    #[error("I/O error: {0}")]
    Io(#[from] IoError),

    /// CLI command errors.
    #[error("command error: {0}")]
    Command(#[from] CommandError),

    /// Invalid state errors.
    #[error("invalid state: {message}")]
    InvalidState {
        /// Description of the invalid state.
        message: String,
    },

    /// Configuration errors.
    #[error("configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },
}

impl Error {
    /// Builds a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}

/// Storage-specific errors for database operations.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Database connection or query error.
    #[error("database error: {0}")]
    Database(String),

    /// Storage not initialized (init command not run).
    #[error("database not initialized. Run: doc-segmenter init")]
    NotInitialized,

    /// Document not found by ID.
    #[error("document not found: {id}")]
    DocumentNotFound {
        /// Document ID that was not found.
        id: i64,
    },

    /// Schema migration error.
    #[error("migration error: {0}")]
    Migration(String),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Stored status string is not a known document status.
    #[error("unknown document status: {0}")]
    UnknownStatus(String),
}

/// Errors raised while pre-chunking text.
#[derive(Error, Debug)]
pub enum ChunkingError {
    /// Invalid chunk configuration.
    #[error("invalid chunk configuration: {reason}")]
    InvalidConfig {
        /// Reason the configuration is invalid.
        reason: String,
    },
}

/// A claimed chunking that could not be reconciled with the source text.
///
/// Every variant carries the zero-based index of the offending claim. For
/// the trailing gap after the last chunk the index equals the number of
/// claims.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BoundaryError {
    /// Offsets are outside the text or `end_index < start_index`.
    #[error("chunk {chunk_index}: invalid range {start_index}..={end_index} for text of {text_len} characters")]
    InvalidRange {
        /// Index of the claim.
        chunk_index: usize,
        /// Claimed start (1-based).
        start_index: usize,
        /// Claimed end (1-based, inclusive).
        end_index: usize,
        /// Length of the source text in characters.
        text_len: usize,
    },

    /// A claimed boundary word does not match the extracted text.
    #[error("chunk {chunk_index}: {boundary} word mismatch: expected {expected:?}, found {actual:?}")]
    WordMismatch {
        /// Index of the claim.
        chunk_index: usize,
        /// Which boundary: `"first"` or `"last"`.
        boundary: &'static str,
        /// Word the model claimed.
        expected: String,
        /// Word actually found at the boundary.
        actual: String,
    },

    /// Extracted chunk exceeds the configured maximum length.
    #[error("chunk {chunk_index}: length {length} exceeds maximum {max}")]
    ChunkTooLong {
        /// Index of the claim.
        chunk_index: usize,
        /// Actual length in characters.
        length: usize,
        /// Configured maximum.
        max: usize,
    },

    /// Chunk starts at or before the end of the previous chunk.
    #[error("chunk {chunk_index}: starts at {start_index} but previous chunk ends at {previous_end} (overlap of {overlap})")]
    Overlap {
        /// Index of the claim.
        chunk_index: usize,
        /// Claimed start of this chunk.
        start_index: usize,
        /// End of the previous validated chunk.
        previous_end: usize,
        /// Number of overlapping characters.
        overlap: usize,
    },

    /// Gap between chunks is longer than the configured tolerance.
    #[error("chunk {chunk_index}: gap of {} characters at position {position} exceeds tolerance {tolerance}: {gap_text:?}", .gap_text.chars().count())]
    GapToleranceExceeded {
        /// Index of the claim following the gap.
        chunk_index: usize,
        /// 1-based position of the first gap character.
        position: usize,
        /// Literal gap content.
        gap_text: String,
        /// Configured tolerance.
        tolerance: usize,
    },
}

impl BoundaryError {
    /// Returns the index of the claim that failed.
    #[must_use]
    pub const fn chunk_index(&self) -> usize {
        match self {
            Self::InvalidRange { chunk_index, .. }
            | Self::WordMismatch { chunk_index, .. }
            | Self::ChunkTooLong { chunk_index, .. }
            | Self::Overlap { chunk_index, .. }
            | Self::GapToleranceExceeded { chunk_index, .. } => *chunk_index,
        }
    }

    /// Moves the error from segment into document coordinates.
    ///
    /// `offset` is the number of characters preceding the validated segment
    /// and `index_base` the number of chunks already emitted. Range errors
    /// keep the claimed offsets, which only make sense against the segment
    /// length they report.
    #[must_use]
    pub fn relocate(mut self, offset: usize, index_base: usize) -> Self {
        match &mut self {
            Self::InvalidRange { chunk_index, .. }
            | Self::WordMismatch { chunk_index, .. }
            | Self::ChunkTooLong { chunk_index, .. } => *chunk_index += index_base,
            Self::Overlap {
                chunk_index,
                start_index,
                previous_end,
                ..
            } => {
                *chunk_index += index_base;
                *start_index += offset;
                *previous_end += offset;
            }
            Self::GapToleranceExceeded {
                chunk_index,
                position,
                ..
            } => {
                *chunk_index += index_base;
                *position += offset;
            }
        }
        self
    }
}

/// Why a single model call failed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModelErrorCause {
    /// Network, timeout or API failure.
    #[error("transport failure: {0}")]
    Transport(String),

    /// Provider rejected the call for rate limiting.
    #[error("rate limited: {0}")]
    RateLimited(String),

    /// The response carried no content.
    #[error("empty response")]
    EmptyResponse,

    /// The response could not be parsed into the expected shape.
    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

/// Failure of one model invocation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("model {model}: {cause}")]
pub struct ModelError {
    /// Model that produced the failure.
    pub model: String,
    /// Underlying cause.
    pub cause: ModelErrorCause,
}

impl ModelError {
    /// Creates a model error.
    pub fn new(model: impl Into<String>, cause: ModelErrorCause) -> Self {
        Self {
            model: model.into(),
            cause,
        }
    }

    /// Creates a malformed-response error.
    pub fn malformed(model: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::new(model, ModelErrorCause::MalformedResponse(reason.into()))
    }
}

/// I/O-specific errors for file operations.
#[derive(Error, Debug)]
pub enum IoError {
    /// File not found.
    #[error("file not found: {path}")]
    FileNotFound {
        /// Path to the file that was not found.
        path: String,
    },

    /// Failed to read file.
    #[error("failed to read file: {path}: {reason}")]
    ReadFailed {
        /// Path to the file.
        path: String,
        /// Reason for failure.
        reason: String,
    },

    /// File contains only whitespace.
    #[error("file is empty: {path}")]
    EmptyFile {
        /// Path to the file.
        path: String,
    },

    /// File type needs conversion before it can be processed.
    #[error("unsupported file type {extension:?}: {path}")]
    UnsupportedType {
        /// Path to the file.
        path: String,
        /// Offending extension.
        extension: String,
    },

    /// Generic I/O error wrapper.
    #[error("I/O error: {0}")]
    Generic(String),
}

/// CLI command-specific errors.
#[derive(Error, Debug)]
pub enum CommandError {
    /// Invalid argument provided.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Command execution failed.
    #[error("command execution failed: {0}")]
    ExecutionFailed(String),
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Io(IoError::Generic(err.to_string()))
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Self::Storage(StorageError::Database(err.to_string()))
    }
}

impl From<rusqlite::Error> for StorageError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
