//! Gap classification.
//!
//! A gap is the text a claimed chunking leaves uncovered between two
//! chunks. Small gaps come from offset drift (an off-by-one, a space counted
//! differently) and are tolerated; anything longer means content was lost.

use crate::chunking::DEFAULT_GAP_TOLERANCE;
use crate::core::Severity;

/// Outcome of classifying one gap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GapClassification {
    /// Tolerable or error.
    pub severity: Severity,
    /// Human-readable description including the gap content.
    pub message: String,
}

impl GapClassification {
    /// Whether the gap exceeds the tolerance.
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

/// Classifies gaps against a maximum tolerated length in characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GapClassifier {
    max_tolerance: usize,
}

impl Default for GapClassifier {
    fn default() -> Self {
        Self::new(DEFAULT_GAP_TOLERANCE)
    }
}

impl GapClassifier {
    /// Creates a classifier tolerating gaps up to `max_tolerance` characters.
    #[must_use]
    pub const fn new(max_tolerance: usize) -> Self {
        Self { max_tolerance }
    }

    /// Configured tolerance.
    #[must_use]
    pub const fn max_tolerance(&self) -> usize {
        self.max_tolerance
    }

    /// Classifies `gap_text`.
    ///
    /// # Examples
    ///
    /// ```
    /// use doc_segmenter::chunking::GapClassifier;
    ///
    /// let classifier = GapClassifier::new(1);
    /// assert!(!classifier.classify(" ").is_error());
    /// assert!(classifier.classify("lost").is_error());
    /// ```
    #[must_use]
    pub fn classify(&self, gap_text: &str) -> GapClassification {
        let length = gap_text.chars().count();
        if length > self.max_tolerance {
            GapClassification {
                severity: Severity::Error,
                message: format!(
                    "Gap of {length} characters exceeds maximum tolerance of {}. Gap content: {gap_text:?}",
                    self.max_tolerance
                ),
            }
        } else {
            GapClassification {
                severity: Severity::Tolerable,
                message: format!("Small gap detected ({length} chars). Gap content: {gap_text:?}"),
            }
        }
    }
}
