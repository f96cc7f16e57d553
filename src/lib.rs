//! # doc-segmenter
//!
//! Splits plain-text documents into contiguous, validated chunks.
//!
//! A language model proposes chunk boundaries as 1-based character offsets
//! plus the first and last word of each chunk. Every proposal is checked
//! against the source text before anything is stored: ranges must be in
//! bounds and ordered, boundary words must match, chunks must respect the
//! length limit, and uncovered text between chunks is only accepted up to
//! a small tolerance.
//!
//! ## Features
//!
//! - **Boundary validation**: strict checks with tolerable-gap warnings
//! - **Pre-chunking**: long documents are segmented before prompting
//! - **Retry and fallback**: models are tried in priority order
//! - **Cleaning pass**: model-suggested boilerplate removal
//! - **`SQLite` Storage**: documents, chunks and the model call log

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod chunking;
pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod io;
pub mod logging;
pub mod model;
pub mod pipeline;
pub mod storage;

// Re-export commonly used types at crate root
pub use error::{Error, Result};

// Re-export core domain types
pub use core::{
    ChunkClaim, ChunkRecord, Document, DocumentStatus, ModelAttempt, RequestKind, Severity,
    SourceText, ValidatedChunk, Warning,
};

// Re-export chunking types
pub use chunking::{
    ChunkBoundaryValidator, GapClassifier, PreChunker, Segment, ValidationReport, apply_removals,
};

// Re-export model types
pub use model::{
    MockInvoker, ModelInvoker, ModelRequest, ModelResponse, OpenAiInvoker, RetryConfig,
    RetryFallbackOrchestrator,
};

// Re-export pipeline types
pub use pipeline::{BatchProcessor, BatchSummary, DocumentProcessor, ProcessReport};

// Re-export storage types
pub use storage::{DEFAULT_DB_PATH, SqliteStorage, Storage};

// Re-export configuration
pub use config::ProcessingConfig;

// Re-export CLI types
pub use cli::{Cli, Commands, OutputFormat};
