//! Immutable source text addressed by 1-based character offsets.
//!
//! Model-reported offsets count characters, not bytes, and start at 1. All
//! slicing in the boundary logic goes through [`SourceText`] so the
//! conversion happens in one place.

use std::fmt;

/// Text addressed by 1-based, inclusive character positions.
///
/// # Examples
///
/// ```
/// use doc_segmenter::core::SourceText;
///
/// let text = SourceText::new("Hello world. Goodbye now.");
/// assert_eq!(text.len(), 25);
/// assert_eq!(text.slice(1, 12), "Hello world.");
/// assert_eq!(text.slice(13, 13), " ");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceText {
    text: String,
    /// Byte offset of every character, plus `text.len()` as a sentinel.
    offsets: Vec<usize>,
}

impl SourceText {
    /// Wraps the given text.
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let mut offsets: Vec<usize> = text.char_indices().map(|(i, _)| i).collect();
        offsets.push(text.len());
        Self { text, offsets }
    }

    /// Number of characters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.offsets.len() - 1
    }

    /// Whether the text has no characters.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the full text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Returns characters `start..=end` (1-based).
    ///
    /// Out-of-range bounds are clamped, and `end < start` yields an empty
    /// string, so gap computations never panic. Callers that need strict
    /// range checks do them before slicing.
    #[must_use]
    pub fn slice(&self, start: usize, end: usize) -> &str {
        let len = self.len();
        let start = start.max(1);
        let end = end.min(len);
        if end < start {
            return "";
        }
        &self.text[self.offsets[start - 1]..self.offsets[end]]
    }

    /// Returns everything from `start` (1-based) to the end.
    #[must_use]
    pub fn tail(&self, start: usize) -> &str {
        self.slice(start, self.len())
    }
}

impl fmt::Display for SourceText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl From<&str> for SourceText {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

impl From<String> for SourceText {
    fn from(text: String) -> Self {
        Self::new(text)
    }
}

/// Counts characters, the unit every offset in this crate uses.
#[must_use]
pub fn char_len(s: &str) -> usize {
    s.chars().count()
}
