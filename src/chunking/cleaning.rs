//! Application of model-suggested text removals.
//!
//! The cleaning prompt returns fragments (page headers, OCR debris, stray
//! numbering) together with approximate positions. Positions are only a hint:
//! each fragment is located verbatim in the text, at the occurrence nearest
//! the claimed start, and accepted only within a configured tolerance.

use crate::core::Warning;
use serde::{Deserialize, Serialize};

/// One fragment a model asked to remove.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextRemoval {
    /// Exact fragment text.
    pub text: String,
    /// Claimed first character position (1-based).
    pub start_position: usize,
    /// Claimed last character position (inclusive).
    #[serde(default)]
    pub end_position: usize,
}

impl TextRemoval {
    /// Creates a removal.
    pub fn new(text: impl Into<String>, start_position: usize, end_position: usize) -> Self {
        Self {
            text: text.into(),
            start_position,
            end_position,
        }
    }
}

/// Result of applying removals to a text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CleaningOutcome {
    /// Text with the accepted fragments removed.
    pub cleaned: String,
    /// Accepted removals with their actual positions.
    pub applied: Vec<TextRemoval>,
    /// Fragments that could not be applied.
    pub warnings: Vec<Warning>,
}

/// Removes the fragments in `removals` from `text`.
///
/// A fragment that does not occur, or whose nearest occurrence starts more
/// than `tolerance` characters from its claimed position, is skipped with a
/// warning. So is a fragment overlapping one already accepted. Warning
/// indices refer to positions in `removals`.
///
/// # Examples
///
/// ```
/// use doc_segmenter::chunking::{TextRemoval, apply_removals};
///
/// let text = "Page 1\nThe report begins here.";
/// let outcome = apply_removals(text, &[TextRemoval::new("Page 1\n", 1, 7)], 35);
/// assert_eq!(outcome.cleaned, "The report begins here.");
/// assert!(outcome.warnings.is_empty());
/// ```
#[must_use]
pub fn apply_removals(text: &str, removals: &[TextRemoval], tolerance: usize) -> CleaningOutcome {
    let mut outcome = CleaningOutcome::default();
    // (byte_start, byte_end, index into removals, actual char start)
    let mut accepted: Vec<(usize, usize, usize, usize)> = Vec::new();

    for (index, removal) in removals.iter().enumerate() {
        if removal.text.is_empty() {
            continue;
        }

        let Some((byte_start, char_start)) = nearest_occurrence(text, removal) else {
            outcome.warnings.push(Warning::tolerable(
                index,
                format!("Text to remove not found: {:?}", removal.text),
            ));
            continue;
        };

        let drift = char_start.abs_diff(removal.start_position);
        if drift > tolerance {
            outcome.warnings.push(Warning::tolerable(
                index,
                format!(
                    "Text to remove {:?} found at position {char_start}, {drift} characters from claimed position {}",
                    removal.text, removal.start_position
                ),
            ));
            continue;
        }

        let byte_end = byte_start + removal.text.len();
        if accepted
            .iter()
            .any(|&(start, end, _, _)| byte_start < end && start < byte_end)
        {
            outcome.warnings.push(Warning::tolerable(
                index,
                format!("Text to remove {:?} overlaps an earlier removal", removal.text),
            ));
            continue;
        }

        accepted.push((byte_start, byte_end, index, char_start));
    }

    accepted.sort_unstable_by_key(|&(start, ..)| start);

    let mut cursor = 0;
    for &(start, end, index, char_start) in &accepted {
        outcome.cleaned.push_str(&text[cursor..start]);
        cursor = end;

        let removal = &removals[index];
        outcome.applied.push(TextRemoval::new(
            removal.text.clone(),
            char_start,
            char_start + removal.text.chars().count() - 1,
        ));
    }
    outcome.cleaned.push_str(&text[cursor..]);

    tracing::debug!(
        requested = removals.len(),
        applied = outcome.applied.len(),
        skipped = outcome.warnings.len(),
        "applied text removals"
    );
    outcome
}

/// Finds the occurrence of `removal.text` whose 1-based character position
/// is closest to the claimed start. Returns `(byte_offset, char_position)`.
fn nearest_occurrence(text: &str, removal: &TextRemoval) -> Option<(usize, usize)> {
    let mut chars_seen = 0;
    let mut last_byte = 0;

    text.match_indices(removal.text.as_str())
        .map(|(byte, _)| {
            chars_seen += text[last_byte..byte].chars().count();
            last_byte = byte;
            (byte, chars_seen + 1)
        })
        .min_by_key(|&(_, position)| position.abs_diff(removal.start_position))
}
