//! System prompts and user-message builders.
//!
//! The chunking prompt is parameterised by the maximum chunk length; the
//! simplified variant is used for short, sentence-terminated text. User
//! messages wrap the text in tags so optional context from the previous
//! document cannot be mistaken for content to chunk.

use std::fmt::Write;

/// System prompt for the cleaning pass.
pub const CLEAN_SYSTEM_PROMPT: &str = r#"You prepare raw document text for segmentation. Identify fragments that are not part of the document's prose: page headers and footers, page numbers, repeated running titles, OCR debris, and stray formatting artifacts.

Rules:
1. Copy every fragment exactly as it appears, including whitespace and punctuation.
2. Report the 1-based character position where the fragment starts and ends (inclusive).
3. Never list prose, headings that introduce sections, or anything whose removal changes the meaning.
4. If nothing should be removed, return an empty list.

Return only a JSON object in this exact format:
{
  "textToRemove": [
    {"text": "Page 3", "startPosition": 1201, "endPosition": 1206}
  ]
}"#;

/// Builds the system prompt for chunking text into chunks of at most
/// `max_chunk_length` characters.
#[must_use]
pub fn chunk_system_prompt(max_chunk_length: usize) -> String {
    format!(
        r#"Divide the text inside <text> into topic-coherent chunks following these strict rules:
1. Each chunk MUST end with a complete sentence (ending with ., !, or ?).
2. Never split in the middle of a sentence.
3. Keep each chunk under {max_chunk_length} characters.
4. Start each chunk at the beginning of a sentence.
5. Record the exact first and last words of each chunk, including attached punctuation.
6. The first chunk MUST start at index 1.
7. Each subsequent chunk MUST start right after the previous chunk ends.
8. There MUST NOT be any gaps or overlaps between chunks.
9. Indices are 1-based, inclusive, and count characters.
10. If the text ends mid-sentence, leave the unfinished sentence out; it is continued in the next request.

Text inside <previous> is context only. Never chunk it or count it in indices.

Example. Given text: "The cat sat on the mat. The dog ran fast. Birds flew high in the sky."
Return only a JSON object in this exact format:
{{
  "chunks": [
    {{"startIndex": 1, "endIndex": 23, "firstWord": "The", "lastWord": "mat."}},
    {{"startIndex": 24, "endIndex": 41, "firstWord": "The", "lastWord": "fast."}},
    {{"startIndex": 42, "endIndex": 70, "firstWord": "Birds", "lastWord": "sky."}}
  ]
}}"#
    )
}

/// Builds the cheaper prompt for short text that ends on a sentence.
#[must_use]
pub fn simplified_chunk_system_prompt(max_chunk_length: usize) -> String {
    format!(
        r#"Split the text inside <text> into chunks of complete sentences, each under {max_chunk_length} characters. Chunks must be contiguous and cover the whole text. Indices are 1-based, inclusive, and count characters. Include the exact first and last word of each chunk.

Return only a JSON object:
{{"chunks": [{{"startIndex": 1, "endIndex": 23, "firstWord": "The", "lastWord": "mat."}}]}}"#
    )
}

/// Builds the user message for a chunking request.
///
/// `previous` is the last chunk of the preceding document, given as
/// read-only context.
#[must_use]
pub fn build_chunk_user_message(text: &str, previous: Option<&str>) -> String {
    let mut message = String::new();
    if let Some(previous) = previous.filter(|p| !p.trim().is_empty()) {
        let _ = write!(message, "<previous>\n{previous}\n</previous>\n\n");
    }
    let _ = write!(message, "<text>{text}</text>");
    message
}

/// Builds the user message for a cleaning request.
#[must_use]
pub fn build_clean_user_message(text: &str) -> String {
    format!("<text>{text}</text>")
}
