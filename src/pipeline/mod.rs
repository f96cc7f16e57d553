//! Document processing pipeline.
//!
//! [`DocumentProcessor`] turns one document into validated, stored chunks;
//! [`BatchProcessor`] runs it over many files with skip and retry rules.

pub mod batch;
pub mod processor;

pub use batch::{BatchItem, BatchOptions, BatchProcessor, BatchSummary};
pub use processor::{ChunkingOutcome, DocumentProcessor, Outcome, ProcessReport};
