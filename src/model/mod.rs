//! Language-model access.
//!
//! A [`ModelInvoker`] performs exactly one call against one model. Retries
//! and fallback between models live in [`retry`]; prompt text in [`prompt`];
//! parsing of the untrusted JSON replies in [`response`].

pub mod mock;
pub mod openai;
pub mod prompt;
pub mod response;
pub mod retry;

use crate::error::ModelError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use mock::MockInvoker;
pub use openai::OpenAiInvoker;
pub use response::{ChunkingResponse, CleaningResponse, extract_json, parse_response};
pub use retry::{AttemptLog, RetryConfig, RetryFallbackOrchestrator, TracingAttemptLog};

/// Output format requested from the model.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseFormat {
    /// A single JSON object.
    #[default]
    JsonObject,
    /// Free text.
    Text,
}

/// One request to a model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModelRequest {
    /// System instructions.
    pub system_prompt: String,
    /// The text to operate on, plus any context.
    pub user_content: String,
    /// Requested output format.
    pub response_format: ResponseFormat,
}

impl ModelRequest {
    /// Creates a JSON-object request.
    pub fn json(system_prompt: impl Into<String>, user_content: impl Into<String>) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            user_content: user_content.into(),
            response_format: ResponseFormat::JsonObject,
        }
    }
}

/// Raw reply from a model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModelResponse {
    /// Model that answered.
    pub model: String,
    /// Message content, not yet parsed.
    pub content: String,
}

/// A single call to an external model.
///
/// Implementations never retry or fall back; every failure (transport,
/// rate limit, empty reply) is reported as a [`ModelError`].
#[async_trait]
pub trait ModelInvoker: Send + Sync {
    /// Sends `request` to `model`.
    async fn invoke(&self, model: &str, request: &ModelRequest)
    -> Result<ModelResponse, ModelError>;
}

#[async_trait]
impl<T: ModelInvoker + ?Sized> ModelInvoker for &T {
    async fn invoke(
        &self,
        model: &str,
        request: &ModelRequest,
    ) -> Result<ModelResponse, ModelError> {
        (**self).invoke(model, request).await
    }
}
