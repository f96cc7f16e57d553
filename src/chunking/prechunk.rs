//! Pre-chunking of long documents.
//!
//! Splits text into fixed-size character segments before it is sent to a
//! model, so each request stays within the model's context window. Only the
//! final segment is marked complete; earlier ones may end mid-word and their
//! unprocessed tail is carried into the next segment by the caller.

use crate::chunking::DEFAULT_PRE_CHUNK_SIZE;
use crate::error::{ChunkingError, Result};
use serde::Serialize;

/// One pre-chunked segment of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Segment<'a> {
    /// Segment text.
    pub text: &'a str,
    /// True only for the segment that reaches the end of the document.
    pub is_complete: bool,
    /// First character position in the document (1-based).
    pub start_position: usize,
    /// Last character position in the document (inclusive).
    pub end_position: usize,
}

/// Fixed-size pre-chunker.
///
/// # Examples
///
/// ```
/// use doc_segmenter::chunking::PreChunker;
///
/// let chunker = PreChunker::with_size(10);
/// let segments: Vec<_> = chunker.pre_chunk("0123456789ABCDE").unwrap().collect();
/// assert_eq!(segments.len(), 2);
/// assert_eq!(segments[1].text, "ABCDE");
/// assert!(segments[1].is_complete);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct PreChunker {
    /// Maximum segment size in characters.
    max_chunk_size: usize,
}

impl Default for PreChunker {
    fn default() -> Self {
        Self::new()
    }
}

impl PreChunker {
    /// Creates a pre-chunker with the default segment size.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            max_chunk_size: DEFAULT_PRE_CHUNK_SIZE,
        }
    }

    /// Creates a pre-chunker with a custom segment size.
    #[must_use]
    pub const fn with_size(max_chunk_size: usize) -> Self {
        Self { max_chunk_size }
    }

    /// Configured segment size.
    #[must_use]
    pub const fn max_chunk_size(&self) -> usize {
        self.max_chunk_size
    }

    /// Lazily splits `text` into segments.
    ///
    /// # Errors
    ///
    /// Returns [`ChunkingError::InvalidConfig`] when the segment size is zero.
    pub fn pre_chunk<'a>(&self, text: &'a str) -> Result<PreChunks<'a>> {
        pre_chunk(text, self.max_chunk_size)
    }

    /// See [`should_use_simplified_prompt`].
    #[must_use]
    pub fn should_use_simplified_prompt(&self, text: &str) -> bool {
        should_use_simplified_prompt(text, self.max_chunk_size)
    }
}

/// Lazily splits `text` into segments of at most `max_chunk_size` characters.
///
/// Text that fits produces exactly one complete segment spanning the whole
/// input (`1..=len`, or `1..=0` for empty input).
///
/// # Errors
///
/// Returns [`ChunkingError::InvalidConfig`] when `max_chunk_size` is zero.
pub fn pre_chunk(text: &str, max_chunk_size: usize) -> Result<PreChunks<'_>> {
    if max_chunk_size == 0 {
        return Err(ChunkingError::InvalidConfig {
            reason: "pre-chunk size must be > 0".to_string(),
        }
        .into());
    }
    Ok(PreChunks {
        text,
        max_chunk_size,
        byte_pos: 0,
        char_pos: 0,
        done: false,
    })
}

/// Whether a cheaper prompt suffices: the text fits in one segment and,
/// trimmed, ends with a sentence terminator.
#[must_use]
pub fn should_use_simplified_prompt(text: &str, max_chunk_size: usize) -> bool {
    text.chars().count() <= max_chunk_size && text.trim_end().ends_with(['.', '!', '?'])
}

/// Iterator over pre-chunked segments.
#[derive(Debug, Clone)]
pub struct PreChunks<'a> {
    text: &'a str,
    max_chunk_size: usize,
    byte_pos: usize,
    char_pos: usize,
    done: bool,
}

impl<'a> Iterator for PreChunks<'a> {
    type Item = Segment<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let rest = &self.text[self.byte_pos..];
        let (segment_bytes, segment_chars) = match rest.char_indices().nth(self.max_chunk_size) {
            Some((byte, _)) => (byte, self.max_chunk_size),
            None => (rest.len(), rest.chars().count()),
        };

        let is_complete = segment_bytes == rest.len();
        let segment = Segment {
            text: &rest[..segment_bytes],
            is_complete,
            start_position: self.char_pos + 1,
            end_position: self.char_pos + segment_chars,
        };

        self.byte_pos += segment_bytes;
        self.char_pos += segment_chars;
        self.done = is_complete;
        Some(segment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use test_case::test_case;

    fn collect(text: &str, size: usize) -> Vec<Segment<'_>> {
        pre_chunk(text, size).unwrap().collect()
    }

    #[test]
    fn test_short_text_single_complete_segment() {
        let segments = collect("Hello, world!", 100);
        assert_eq!(segments.len(), 1);
        assert!(segments[0].is_complete);
        assert_eq!(segments[0].start_position, 1);
        assert_eq!(segments[0].end_position, 13);
    }

    #[test]
    fn test_exact_size_is_single_segment() {
        let segments = collect("0123456789", 10);
        assert_eq!(segments.len(), 1);
        assert!(segments[0].is_complete);
    }

    #[test]
    fn test_empty_text() {
        let segments = collect("", 10);
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].text, "");
        assert_eq!(segments[0].start_position, 1);
        assert_eq!(segments[0].end_position, 0);
        assert!(segments[0].is_complete);
    }

    #[test]
    fn test_multiple_segments() {
        let segments = collect("0123456789ABCDEFGHIJKL", 10);
        assert_eq!(segments.len(), 3);
        assert_eq!(segments[0].text, "0123456789");
        assert_eq!((segments[0].start_position, segments[0].end_position), (1, 10));
        assert_eq!((segments[1].start_position, segments[1].end_position), (11, 20));
        assert_eq!((segments[2].start_position, segments[2].end_position), (21, 22));
        assert!(!segments[0].is_complete);
        assert!(!segments[1].is_complete);
        assert!(segments[2].is_complete);
    }

    #[test]
    fn test_multiple_of_size_ends_complete() {
        let segments = collect("0123456789", 5);
        assert_eq!(segments.len(), 2);
        assert!(segments[1].is_complete);
        assert_eq!(segments[1].end_position, 10);
    }

    #[test]
    fn test_unicode_segments_count_characters() {
        let segments = collect("héllo wörld", 4);
        assert_eq!(segments[0].text, "héll");
        assert_eq!(segments[1].text, "o wö");
        assert_eq!(segments[2].text, "rld");
    }

    #[test]
    fn test_zero_size_rejected() {
        assert!(pre_chunk("text", 0).is_err());
        assert!(PreChunker::with_size(0).pre_chunk("text").is_err());
    }

    #[test]
    fn test_default_size() {
        assert_eq!(PreChunker::new().max_chunk_size(), DEFAULT_PRE_CHUNK_SIZE);
    }

    #[test_case("A short sentence.", 100, true ; "terminated")]
    #[test_case("Is it short?  \n", 100, true ; "trailing whitespace")]
    #[test_case("Wow!", 100, true ; "exclamation")]
    #[test_case("No terminator", 100, false ; "unterminated")]
    #[test_case("Too long for the limit.", 5, false ; "too long")]
    #[test_case("", 5, false ; "empty")]
    fn test_simplified_prompt(text: &str, size: usize, expected: bool) {
        assert_eq!(should_use_simplified_prompt(text, size), expected);
    }

    proptest! {
        #[test]
        fn segments_cover_text_exactly(text in "\\PC{0,200}", size in 1usize..50) {
            let segments = collect(&text, size);
            let joined: String = segments.iter().map(|s| s.text).collect();
            prop_assert_eq!(&joined, &text);

            let mut expected_start = 1;
            for (i, segment) in segments.iter().enumerate() {
                prop_assert_eq!(segment.start_position, expected_start);
                prop_assert!(segment.text.chars().count() <= size);
                prop_assert_eq!(segment.is_complete, i == segments.len() - 1);
                expected_start = segment.end_position + 1;
            }
        }
    }
}
