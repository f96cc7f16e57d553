//! Storage layer.
//!
//! Provides persistent storage using `SQLite`: documents with their
//! processing status, validated chunks, and the model call log.

pub mod schema;
pub mod sqlite;
pub mod traits;

pub use schema::{CURRENT_SCHEMA_VERSION, SCHEMA_SQL};
pub use sqlite::SqliteStorage;
pub use traits::{Storage, StorageStats};

/// Default database path relative to the working directory.
pub const DEFAULT_DB_PATH: &str = ".doc-segmenter/segmenter.db";
