//! Chunk claims, validated chunks and warnings.
//!
//! A [`ChunkClaim`] is what a model says about one chunk. It is untrusted
//! until the boundary validator turns it into a [`ValidatedChunk`], which
//! carries the text actually found at those offsets.

use serde::{Deserialize, Serialize};

/// A model's assertion about one chunk.
///
/// Offsets are 1-based and inclusive, counted in characters.
///
/// # Examples
///
/// ```
/// use doc_segmenter::core::ChunkClaim;
///
/// let claim: ChunkClaim = serde_json::from_str(
///     r#"{"startIndex": 1, "endIndex": 12, "firstWord": "Hello", "lastWord": "world."}"#,
/// ).unwrap();
/// assert_eq!(claim.len(), 12);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkClaim {
    /// First character position (1-based).
    pub start_index: usize,
    /// Last character position (inclusive).
    pub end_index: usize,
    /// First word including any leading punctuation.
    pub first_word: String,
    /// Last word including any trailing punctuation.
    pub last_word: String,
}

impl ChunkClaim {
    /// Creates a claim.
    pub fn new(
        start_index: usize,
        end_index: usize,
        first_word: impl Into<String>,
        last_word: impl Into<String>,
    ) -> Self {
        Self {
            start_index,
            end_index,
            first_word: first_word.into(),
            last_word: last_word.into(),
        }
    }

    /// Claimed length in characters (0 for an inverted range).
    #[must_use]
    pub const fn len(&self) -> usize {
        (self.end_index + 1).saturating_sub(self.start_index)
    }

    /// Whether the claimed range is empty or inverted.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// How serious a reconciliation finding is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Within tolerance; processing continues.
    Tolerable,
    /// Beyond tolerance.
    Error,
}

impl Severity {
    /// Lowercase label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Tolerable => "tolerable",
            Self::Error => "error",
        }
    }
}

/// A finding attached to a chunk or document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Warning {
    /// Severity of the finding.
    pub severity: Severity,
    /// Chunk the finding belongs to.
    pub chunk_index: usize,
    /// Human-readable description.
    pub message: String,
    /// Literal gap text, when the finding is about a gap.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gap_text: Option<String>,
}

impl Warning {
    /// Creates a tolerable warning.
    pub fn tolerable(chunk_index: usize, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Tolerable,
            chunk_index,
            message: message.into(),
            gap_text: None,
        }
    }

    /// Attaches gap text.
    #[must_use]
    pub fn with_gap(mut self, gap_text: impl Into<String>) -> Self {
        self.gap_text = Some(gap_text.into());
        self
    }
}

/// A chunk whose boundaries were verified against the source text.
///
/// Only the boundary validator creates these; fields are read through
/// accessors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidatedChunk {
    index: usize,
    start_index: usize,
    end_index: usize,
    first_word: String,
    last_word: String,
    text: String,
    gap_before: String,
    warnings: Vec<Warning>,
}

impl ValidatedChunk {
    pub(crate) fn new(index: usize, claim: &ChunkClaim, text: String, gap_before: String) -> Self {
        Self {
            index,
            start_index: claim.start_index,
            end_index: claim.end_index,
            first_word: claim.first_word.clone(),
            last_word: claim.last_word.clone(),
            text,
            gap_before,
            warnings: Vec::new(),
        }
    }

    pub(crate) fn push_warning(&mut self, warning: Warning) {
        self.warnings.push(warning);
    }

    /// Moves the chunk into document coordinates.
    ///
    /// `offset` is the number of characters preceding the validated segment
    /// in the document; `index_base` is the number of chunks already emitted
    /// for the document.
    pub(crate) fn relocate(mut self, offset: usize, index_base: usize) -> Self {
        self.start_index += offset;
        self.end_index += offset;
        self.index += index_base;
        for warning in &mut self.warnings {
            warning.chunk_index += index_base;
        }
        self
    }

    /// Sequential index (0-based).
    #[must_use]
    pub const fn index(&self) -> usize {
        self.index
    }

    /// First character position (1-based).
    #[must_use]
    pub const fn start_index(&self) -> usize {
        self.start_index
    }

    /// Last character position (inclusive).
    #[must_use]
    pub const fn end_index(&self) -> usize {
        self.end_index
    }

    /// Verified first word.
    #[must_use]
    pub fn first_word(&self) -> &str {
        &self.first_word
    }

    /// Verified last word.
    #[must_use]
    pub fn last_word(&self) -> &str {
        &self.last_word
    }

    /// Extracted chunk text.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Text between the previous chunk (or start of text) and this one.
    #[must_use]
    pub fn gap_before(&self) -> &str {
        &self.gap_before
    }

    /// Warnings attached during validation.
    #[must_use]
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    /// Length in characters.
    #[must_use]
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    /// Converts back to a claim, e.g. to re-validate stored chunks.
    #[must_use]
    pub fn to_claim(&self) -> ChunkClaim {
        ChunkClaim::new(
            self.start_index,
            self.end_index,
            self.first_word.clone(),
            self.last_word.clone(),
        )
    }

    /// Returns a preview of the chunk text (first N characters).
    #[must_use]
    pub fn preview(&self, max_chars: usize) -> &str {
        match self.text.char_indices().nth(max_chars) {
            Some((byte, _)) => &self.text[..byte],
            None => &self.text,
        }
    }
}
