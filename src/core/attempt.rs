//! Model attempt records.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which prompt an attempt served.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestKind {
    /// Text cleaning (`textToRemove`).
    Clean,
    /// Chunk segmentation (`chunks`).
    Chunk,
}

impl RequestKind {
    /// Label as stored in the database.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Clean => "clean",
            Self::Chunk => "chunk",
        }
    }
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable record of one model invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelAttempt {
    /// Model identifier.
    pub model: String,
    /// Request kind.
    pub request_kind: RequestKind,
    /// Document being processed, if known.
    pub document_id: Option<i64>,
    /// Whether the call returned a usable result.
    pub succeeded: bool,
    /// Error description on failure.
    pub error: Option<String>,
    /// Unix time in milliseconds when the call started.
    pub started_at_ms: i64,
    /// Unix time in milliseconds when the call finished.
    pub finished_at_ms: i64,
}

impl ModelAttempt {
    /// Wall-clock duration of the attempt.
    #[must_use]
    pub const fn duration_ms(&self) -> i64 {
        self.finished_at_ms - self.started_at_ms
    }
}

/// Returns the current Unix time in milliseconds.
#[allow(clippy::cast_possible_truncation)]
pub(crate) fn now_millis() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}
