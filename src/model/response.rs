//! Typed schemas for model replies.
//!
//! Replies are untrusted. They are reduced to a JSON object (markdown fences
//! and chatter around it are dropped) and parsed into a typed schema; any
//! failure is a malformed-response [`ModelError`], which the retry
//! orchestrator treats like any other failed attempt.

use crate::chunking::TextRemoval;
use crate::core::ChunkClaim;
use crate::error::ModelError;
use regex::Regex;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::sync::OnceLock;

fn code_fence() -> Option<&'static Regex> {
    static CODE_FENCE: OnceLock<Option<Regex>> = OnceLock::new();
    CODE_FENCE
        .get_or_init(|| Regex::new(r"(?s)```(?:json|JSON)?\s*\n?(.*?)\n?\s*```").ok())
        .as_ref()
}

/// Reply to a chunking prompt.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ChunkingResponse {
    /// Claimed chunks in document order.
    pub chunks: Vec<ChunkClaim>,
}

/// Reply to a cleaning prompt.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CleaningResponse {
    /// Fragments to remove.
    #[serde(rename = "textToRemove", default)]
    pub text_to_remove: Vec<TextRemoval>,
}

/// Reduces a reply to the JSON object it contains.
///
/// Takes the body of the first markdown code fence if any, then the slice
/// from the first `{` to the last `}`. Returns `None` when no object is
/// present.
///
/// # Examples
///
/// ```
/// use doc_segmenter::model::extract_json;
///
/// let reply = "Sure!\n```json\n{\"chunks\": []}\n```";
/// assert_eq!(extract_json(reply), Some("{\"chunks\": []}"));
/// assert_eq!(extract_json("no json here"), None);
/// ```
#[must_use]
pub fn extract_json(content: &str) -> Option<&str> {
    let body = code_fence()
        .and_then(|re| re.captures(content))
        .and_then(|caps| caps.get(1))
        .map_or(content, |m| m.as_str());

    let start = body.find('{')?;
    let end = body.rfind('}')?;
    (start < end).then(|| &body[start..=end])
}

/// Parses a reply from `model` into `T`.
///
/// # Errors
///
/// Returns a malformed-response [`ModelError`] when no JSON object is found
/// or it does not match the schema.
pub fn parse_response<T: DeserializeOwned>(model: &str, content: &str) -> Result<T, ModelError> {
    let json = extract_json(content)
        .ok_or_else(|| ModelError::malformed(model, "reply contains no JSON object"))?;
    serde_json::from_str(json).map_err(|e| ModelError::malformed(model, e.to_string()))
}
