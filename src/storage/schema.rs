//! Database schema definitions.
//!
//! Contains SQL schema and migration logic for the `SQLite` database.

/// Current schema version.
pub const CURRENT_SCHEMA_VERSION: u32 = 2;

/// SQL schema for initial database setup.
pub const SCHEMA_SQL: &str = r"
-- Schema version tracking
CREATE TABLE IF NOT EXISTS schema_info (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);

-- Source documents and their processing state
CREATE TABLE IF NOT EXISTS documents (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    filename TEXT NOT NULL,
    group_number INTEGER,
    content_hash TEXT NOT NULL,
    original_content TEXT NOT NULL,
    cleaned_content TEXT,
    status TEXT NOT NULL CHECK (status IN ('processing', 'processed', 'failed', 'skipped_duplicate')),
    warnings TEXT NOT NULL DEFAULT '[]',  -- JSON array of warnings
    error_message TEXT,
    duplicate_of INTEGER,
    chunk_count INTEGER NOT NULL DEFAULT 0,
    created_at INTEGER NOT NULL,
    updated_at INTEGER NOT NULL,
    FOREIGN KEY (duplicate_of) REFERENCES documents(id) ON DELETE SET NULL
);

-- Lookup by file name within a group
CREATE INDEX IF NOT EXISTS idx_documents_name ON documents(filename, group_number);

-- Lookup by hash (deduplication)
CREATE INDEX IF NOT EXISTS idx_documents_hash ON documents(content_hash, group_number);

CREATE INDEX IF NOT EXISTS idx_documents_status ON documents(status);

-- Validated chunks of cleaned document text
CREATE TABLE IF NOT EXISTS chunks (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    document_id INTEGER NOT NULL,
    chunk_index INTEGER NOT NULL,
    start_index INTEGER NOT NULL,
    end_index INTEGER NOT NULL,
    first_word TEXT NOT NULL,
    last_word TEXT NOT NULL,
    content TEXT NOT NULL,
    warnings TEXT NOT NULL DEFAULT '[]',
    created_at INTEGER NOT NULL,
    FOREIGN KEY (document_id) REFERENCES documents(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_chunks_order ON chunks(document_id, chunk_index);

-- Model call log (v2)
CREATE TABLE IF NOT EXISTS model_attempts (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    model TEXT NOT NULL,
    request_kind TEXT NOT NULL,
    document_id INTEGER,
    succeeded INTEGER NOT NULL,
    error TEXT,
    started_at_ms INTEGER NOT NULL,
    finished_at_ms INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_attempts_document ON model_attempts(document_id);
";

/// SQL to check if schema is initialized.
pub const CHECK_SCHEMA_SQL: &str = r"
SELECT COUNT(*) FROM sqlite_master
WHERE type='table' AND name='schema_info';
";

/// SQL to get schema version.
pub const GET_VERSION_SQL: &str = r"
SELECT value FROM schema_info WHERE key = 'version';
";

/// SQL to set schema version.
pub const SET_VERSION_SQL: &str = r"
INSERT OR REPLACE INTO schema_info (key, value) VALUES ('version', ?);
";

/// Migrations from older schema versions.
pub struct Migration {
    /// Version this migration upgrades from.
    pub from_version: u32,
    /// Version this migration upgrades to.
    pub to_version: u32,
    /// SQL statements to execute.
    pub sql: &'static str,
}

/// SQL for v1 to v2 migration (adds the model call log).
const MIGRATION_V1_TO_V2: &str = r"
CREATE TABLE IF NOT EXISTS model_attempts (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    model TEXT NOT NULL,
    request_kind TEXT NOT NULL,
    document_id INTEGER,
    succeeded INTEGER NOT NULL,
    error TEXT,
    started_at_ms INTEGER NOT NULL,
    finished_at_ms INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_attempts_document ON model_attempts(document_id);
";

/// Available migrations.
pub const MIGRATIONS: &[Migration] = &[Migration {
    from_version: 1,
    to_version: 2,
    sql: MIGRATION_V1_TO_V2,
}];

/// Gets migrations needed to upgrade from a version.
#[must_use]
pub fn get_migrations_from(current_version: u32) -> Vec<&'static Migration> {
    MIGRATIONS
        .iter()
        .filter(|m| m.from_version >= current_version && m.to_version <= CURRENT_SCHEMA_VERSION)
        .collect()
}
