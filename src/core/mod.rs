//! Core domain models.
//!
//! This module contains the fundamental data structures used throughout the
//! crate: source text, chunk claims, validated chunks, documents and model
//! attempts. These are pure domain models with no I/O dependencies.

pub mod attempt;
pub mod chunk;
pub mod document;
pub mod source;

pub use attempt::{ModelAttempt, RequestKind};
pub use chunk::{ChunkClaim, Severity, ValidatedChunk, Warning};
pub use document::{ChunkRecord, Document, DocumentStatus, content_hash};
pub use source::{SourceText, char_len};
