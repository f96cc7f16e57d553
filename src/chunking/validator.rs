//! Chunk boundary validation and gap reconciliation.
//!
//! Model-reported offsets drift easily (off-by-one, whitespace counted
//! differently) but boundary words are copied verbatim. The validator is
//! therefore strict about words and lenient about small gaps:
//!
//! - a claim whose first or last word differs from the text is rejected;
//! - overlapping or out-of-order claims are rejected;
//! - gaps up to the configured tolerance become warnings, longer gaps are
//!   rejected.
//!
//! A rejection invalidates the whole claimed chunking for the segment.

use crate::chunking::gap::GapClassifier;
use crate::chunking::{DEFAULT_GAP_TOLERANCE, DEFAULT_MAX_CHUNK_LENGTH};
use crate::core::{ChunkClaim, SourceText, ValidatedChunk, Warning};
use crate::error::BoundaryError;
use serde::Serialize;

/// Result of validating one claimed chunking.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    /// Validated chunks in ascending order.
    pub chunks: Vec<ValidatedChunk>,
    /// Every warning raised, in order of discovery.
    pub warnings: Vec<Warning>,
    /// Tolerated text after the last chunk of a complete segment.
    pub trailing_gap: String,
    /// Unprocessed text after the last chunk of an incomplete segment.
    pub remainder: String,
}

impl ValidationReport {
    /// Rebuilds the validated text from chunks, gaps and remainder.
    ///
    /// Always equals the source text the report was produced from.
    #[must_use]
    pub fn reconstruct(&self) -> String {
        let mut text = String::new();
        for chunk in &self.chunks {
            text.push_str(chunk.gap_before());
            text.push_str(chunk.text());
        }
        text.push_str(&self.trailing_gap);
        text.push_str(&self.remainder);
        text
    }

    /// End position of the last validated chunk (0 if none).
    #[must_use]
    pub fn covered_until(&self) -> usize {
        self.chunks.last().map_or(0, ValidatedChunk::end_index)
    }
}

/// Verifies claimed chunkings against their source text.
///
/// # Examples
///
/// ```
/// use doc_segmenter::chunking::ChunkBoundaryValidator;
/// use doc_segmenter::core::{ChunkClaim, SourceText};
///
/// let source = SourceText::new("Hello world. Goodbye now.");
/// let claims = vec![
///     ChunkClaim::new(1, 12, "Hello", "world."),
///     ChunkClaim::new(14, 25, "Goodbye", "now."),
/// ];
/// let report = ChunkBoundaryValidator::default()
///     .validate(&source, &claims, true)
///     .unwrap();
/// assert_eq!(report.chunks.len(), 2);
/// assert_eq!(report.warnings.len(), 1);
/// assert_eq!(report.reconstruct(), source.as_str());
/// ```
#[derive(Debug, Clone, Copy)]
pub struct ChunkBoundaryValidator {
    max_chunk_length: usize,
    classifier: GapClassifier,
}

impl Default for ChunkBoundaryValidator {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CHUNK_LENGTH, DEFAULT_GAP_TOLERANCE)
    }
}

impl ChunkBoundaryValidator {
    /// Creates a validator.
    ///
    /// # Arguments
    ///
    /// * `max_chunk_length` - Longest accepted chunk in characters.
    /// * `gap_tolerance` - Longest tolerated gap in characters.
    #[must_use]
    pub const fn new(max_chunk_length: usize, gap_tolerance: usize) -> Self {
        Self {
            max_chunk_length,
            classifier: GapClassifier::new(gap_tolerance),
        }
    }

    /// Longest accepted chunk in characters.
    #[must_use]
    pub const fn max_chunk_length(&self) -> usize {
        self.max_chunk_length
    }

    /// Validates `claims` against `source`.
    ///
    /// `is_complete` is false when `source` is a segment that continues in
    /// the next one; its trailing text is then returned as
    /// [`ValidationReport::remainder`] instead of being classified.
    ///
    /// # Errors
    ///
    /// Returns the first [`BoundaryError`] found. No partial result is
    /// returned.
    pub fn validate(
        &self,
        source: &SourceText,
        claims: &[ChunkClaim],
        is_complete: bool,
    ) -> Result<ValidationReport, BoundaryError> {
        let text_len = source.len();
        let mut report = ValidationReport::default();
        let mut previous_end = 0;

        for (chunk_index, claim) in claims.iter().enumerate() {
            let (start, end) = (claim.start_index, claim.end_index);

            if start == 0 || end < start || end > text_len {
                return Err(BoundaryError::InvalidRange {
                    chunk_index,
                    start_index: start,
                    end_index: end,
                    text_len,
                });
            }

            if start <= previous_end {
                return Err(BoundaryError::Overlap {
                    chunk_index,
                    start_index: start,
                    previous_end,
                    overlap: previous_end - start + 1,
                });
            }

            let actual = source.slice(start, end);
            check_boundary_words(chunk_index, claim, actual)?;

            let length = actual.chars().count();
            if length > self.max_chunk_length {
                return Err(BoundaryError::ChunkTooLong {
                    chunk_index,
                    length,
                    max: self.max_chunk_length,
                });
            }

            let gap_text = source.slice(previous_end + 1, start - 1);
            let mut chunk =
                ValidatedChunk::new(chunk_index, claim, actual.to_string(), gap_text.to_string());
            if let Some(warning) = self.reconcile_gap(chunk_index, previous_end + 1, gap_text)? {
                chunk.push_warning(warning.clone());
                report.warnings.push(warning);
            }

            tracing::trace!(chunk_index, start, end, "chunk boundaries verified");
            report.chunks.push(chunk);
            previous_end = end;
        }

        let tail = source.tail(previous_end + 1);
        if is_complete {
            if let Some(warning) = self.reconcile_gap(claims.len(), previous_end + 1, tail)? {
                report.warnings.push(warning);
            }
            report.trailing_gap = tail.to_string();
        } else {
            report.remainder = tail.to_string();
        }

        Ok(report)
    }

    /// Classifies one gap; `Ok(None)` for an empty gap.
    fn reconcile_gap(
        &self,
        chunk_index: usize,
        position: usize,
        gap_text: &str,
    ) -> Result<Option<Warning>, BoundaryError> {
        if gap_text.is_empty() {
            return Ok(None);
        }

        let classification = self.classifier.classify(gap_text);
        if classification.is_error() {
            tracing::warn!(chunk_index, position, gap = gap_text, "gap exceeds tolerance");
            return Err(BoundaryError::GapToleranceExceeded {
                chunk_index,
                position,
                gap_text: gap_text.to_string(),
                tolerance: self.classifier.max_tolerance(),
            });
        }

        tracing::debug!(chunk_index, position, gap = gap_text, "tolerated gap");
        Ok(Some(
            Warning::tolerable(chunk_index, classification.message).with_gap(gap_text),
        ))
    }
}

/// Compares the claimed first and last words with the extracted text.
fn check_boundary_words(
    chunk_index: usize,
    claim: &ChunkClaim,
    actual: &str,
) -> Result<(), BoundaryError> {
    let mut words = actual.split_whitespace();
    let first = words.next().unwrap_or_default();
    let last = words.next_back().unwrap_or(first);

    if first != claim.first_word {
        return Err(BoundaryError::WordMismatch {
            chunk_index,
            boundary: "first",
            expected: claim.first_word.clone(),
            actual: first.to_string(),
        });
    }
    if last != claim.last_word {
        return Err(BoundaryError::WordMismatch {
            chunk_index,
            boundary: "last",
            expected: claim.last_word.clone(),
            actual: last.to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Severity;
    use proptest::prelude::*;

    const TEXT: &str = "Hello world. Goodbye now.";

    fn validator() -> ChunkBoundaryValidator {
        ChunkBoundaryValidator::new(2000, 1)
    }

    fn claim(start: usize, end: usize, first: &str, last: &str) -> ChunkClaim {
        ChunkClaim::new(start, end, first, last)
    }

    #[test]
    fn test_exact_partition_has_no_warnings() {
        let source = SourceText::new(TEXT);
        let claims = vec![
            claim(1, 13, "Hello", "world."),
            claim(14, 25, "Goodbye", "now."),
        ];
        let report = validator().validate(&source, &claims, true).unwrap();
        assert_eq!(report.chunks.len(), 2);
        assert!(report.warnings.is_empty());
        assert_eq!(report.chunks[0].text(), "Hello world. ");
        assert_eq!(report.reconstruct(), TEXT);
    }

    #[test]
    fn test_single_space_gap_is_tolerated() {
        let source = SourceText::new(TEXT);
        let claims = vec![
            claim(1, 12, "Hello", "world."),
            claim(14, 25, "Goodbye", "now."),
        ];
        let report = validator().validate(&source, &claims, true).unwrap();
        assert_eq!(report.chunks[0].text(), "Hello world.");
        assert_eq!(report.warnings.len(), 1);

        let warning = &report.warnings[0];
        assert_eq!(warning.severity, Severity::Tolerable);
        assert_eq!(warning.chunk_index, 1);
        assert_eq!(warning.gap_text.as_deref(), Some(" "));
        assert_eq!(report.chunks[1].warnings(), std::slice::from_ref(warning));
        assert_eq!(report.reconstruct(), TEXT);
    }

    #[test]
    fn test_missing_period_leaves_tolerable_gap() {
        let source = SourceText::new(TEXT);
        let claims = vec![
            claim(1, 11, "Hello", "world"),
            claim(13, 25, "Goodbye", "now."),
        ];
        let report = validator().validate(&source, &claims, true).unwrap();
        assert_eq!(report.chunks[0].text(), "Hello world");
        assert_eq!(report.warnings[0].gap_text.as_deref(), Some("."));
    }

    #[test]
    fn test_inverted_range_rejected() {
        let source = SourceText::new(TEXT);
        let err = validator()
            .validate(&source, &[claim(5, 3, "o", "l")], true)
            .unwrap_err();
        assert!(matches!(
            err,
            BoundaryError::InvalidRange {
                chunk_index: 0,
                start_index: 5,
                end_index: 3,
                ..
            }
        ));
    }

    #[test]
    fn test_out_of_bounds_rejected() {
        let source = SourceText::new(TEXT);
        let err = validator()
            .validate(&source, &[claim(1, 26, "Hello", "now.")], true)
            .unwrap_err();
        assert!(matches!(err, BoundaryError::InvalidRange { .. }));

        let err = validator()
            .validate(&source, &[claim(0, 5, "Hello", "Hello")], true)
            .unwrap_err();
        assert!(matches!(err, BoundaryError::InvalidRange { .. }));
    }

    #[test]
    fn test_overlap_rejected() {
        let source = SourceText::new(TEXT);
        let claims = vec![
            claim(1, 12, "Hello", "world."),
            claim(10, 25, "ld.", "now."),
        ];
        let err = validator().validate(&source, &claims, true).unwrap_err();
        assert_eq!(
            err,
            BoundaryError::Overlap {
                chunk_index: 1,
                start_index: 10,
                previous_end: 12,
                overlap: 3,
            }
        );
    }

    #[test]
    fn test_out_of_order_rejected() {
        let source = SourceText::new(TEXT);
        let claims = vec![
            claim(14, 25, "Goodbye", "now."),
            claim(1, 12, "Hello", "world."),
        ];
        let err = validator().validate(&source, &claims, true).unwrap_err();
        assert!(matches!(err, BoundaryError::GapToleranceExceeded { chunk_index: 0, .. }));
    }

    #[test]
    fn test_word_mismatch_rejected() {
        let source = SourceText::new(TEXT);
        let err = validator()
            .validate(&source, &[claim(1, 12, "Hello", "world")], true)
            .unwrap_err();
        assert_eq!(
            err,
            BoundaryError::WordMismatch {
                chunk_index: 0,
                boundary: "last",
                expected: "world".to_string(),
                actual: "world.".to_string(),
            }
        );
    }

    #[test]
    fn test_split_word_rejected() {
        let source = SourceText::new(TEXT);
        let err = validator()
            .validate(&source, &[claim(2, 12, "Hello", "world.")], true)
            .unwrap_err();
        assert!(matches!(
            err,
            BoundaryError::WordMismatch { boundary: "first", .. }
        ));
    }

    #[test]
    fn test_whitespace_only_chunk_rejected() {
        let source = SourceText::new("a   b");
        let err = validator()
            .validate(&source, &[claim(2, 4, "a", "b")], false)
            .unwrap_err();
        assert!(matches!(err, BoundaryError::WordMismatch { .. }));
    }

    #[test]
    fn test_chunk_too_long_rejected() {
        let source = SourceText::new(TEXT);
        let err = ChunkBoundaryValidator::new(10, 1)
            .validate(&source, &[claim(1, 12, "Hello", "world.")], false)
            .unwrap_err();
        assert_eq!(
            err,
            BoundaryError::ChunkTooLong {
                chunk_index: 0,
                length: 12,
                max: 10,
            }
        );
    }

    #[test]
    fn test_large_gap_rejected_with_position() {
        let source = SourceText::new(TEXT);
        let claims = vec![
            claim(1, 5, "Hello", "Hello"),
            claim(14, 25, "Goodbye", "now."),
        ];
        let err = validator().validate(&source, &claims, true).unwrap_err();
        assert_eq!(
            err,
            BoundaryError::GapToleranceExceeded {
                chunk_index: 1,
                position: 6,
                gap_text: " world. ".to_string(),
                tolerance: 1,
            }
        );
    }

    #[test]
    fn test_trailing_gap_classified_for_complete_segment() {
        let source = SourceText::new(TEXT);
        let err = validator()
            .validate(&source, &[claim(1, 12, "Hello", "world.")], true)
            .unwrap_err();
        assert!(matches!(
            err,
            BoundaryError::GapToleranceExceeded {
                chunk_index: 1,
                position: 13,
                ..
            }
        ));

        let report = validator()
            .validate(&source, &[claim(1, 24, "Hello", "now")], true)
            .unwrap();
        assert_eq!(report.trailing_gap, ".");
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(report.warnings[0].chunk_index, 1);
        assert!(report.chunks[0].warnings().is_empty());
    }

    #[test]
    fn test_incomplete_segment_returns_remainder() {
        let source = SourceText::new("Hello world. Goodbye no");
        let report = validator()
            .validate(&source, &[claim(1, 12, "Hello", "world.")], false)
            .unwrap();
        assert_eq!(report.remainder, " Goodbye no");
        assert!(report.trailing_gap.is_empty());
        assert!(report.warnings.is_empty());
        assert_eq!(report.reconstruct(), source.as_str());
    }

    #[test]
    fn test_no_claims() {
        let empty = SourceText::new("");
        let report = validator().validate(&empty, &[], true).unwrap();
        assert!(report.chunks.is_empty());

        let source = SourceText::new(TEXT);
        assert!(validator().validate(&source, &[], true).is_err());
        let report = validator().validate(&source, &[], false).unwrap();
        assert_eq!(report.remainder, TEXT);
    }

    #[test]
    fn test_multibyte_offsets() {
        let source = SourceText::new("Größe zählt. Ende.");
        let claims = vec![
            claim(1, 12, "Größe", "zählt."),
            claim(14, 18, "Ende.", "Ende."),
        ];
        let report = validator().validate(&source, &claims, true).unwrap();
        assert_eq!(report.chunks[0].text(), "Größe zählt.");
        assert_eq!(report.chunks[1].gap_before(), " ");
    }

    #[test]
    fn test_revalidation_is_idempotent() {
        let source = SourceText::new(TEXT);
        let claims = vec![
            claim(1, 12, "Hello", "world."),
            claim(14, 25, "Goodbye", "now."),
        ];
        let first = validator().validate(&source, &claims, true).unwrap();
        let replay: Vec<ChunkClaim> = first.chunks.iter().map(ValidatedChunk::to_claim).collect();
        let second = validator().validate(&source, &replay, true).unwrap();
        assert_eq!(first, second);
    }

    /// Builds a text and its exact word-aligned partition.
    fn partitioned_text() -> impl Strategy<Value = (String, Vec<ChunkClaim>)> {
        prop::collection::vec(prop::collection::vec("[a-zA-Z.,!?]{1,8}", 1..6), 1..8).prop_map(
            |groups| {
                let mut text = String::new();
                let mut claims = Vec::new();
                for (i, words) in groups.iter().enumerate() {
                    let mut piece = words.join(" ");
                    if i + 1 < groups.len() {
                        piece.push(' ');
                    }
                    let start = text.chars().count() + 1;
                    let end = start + piece.chars().count() - 1;
                    claims.push(ChunkClaim::new(
                        start,
                        end,
                        words[0].clone(),
                        words[words.len() - 1].clone(),
                    ));
                    text.push_str(&piece);
                }
                (text, claims)
            },
        )
    }

    proptest! {
        #[test]
        fn exact_partitions_reconstruct_source((text, claims) in partitioned_text()) {
            let source = SourceText::new(text.clone());
            let report = ChunkBoundaryValidator::new(10_000, 1)
                .validate(&source, &claims, true)
                .unwrap();
            prop_assert!(report.warnings.is_empty());
            prop_assert_eq!(report.chunks.len(), claims.len());
            let joined: String = report.chunks.iter().map(ValidatedChunk::text).collect();
            prop_assert_eq!(joined, text);
        }

        #[test]
        fn overlapping_claims_always_rejected(
            (text, claims) in partitioned_text(),
            shift in 0usize..4,
        ) {
            prop_assume!(claims.len() >= 2);
            let mut claims = claims;
            let previous_end = claims[0].end_index;
            claims[1].start_index = previous_end.saturating_sub(shift).max(1);
            let source = SourceText::new(text);
            let result = ChunkBoundaryValidator::new(10_000, 1).validate(&source, &claims, true);
            prop_assert!(result.is_err());
        }
    }
}
