//! OpenAI chat-completions invoker.

use super::{ModelInvoker, ModelRequest, ModelResponse, ResponseFormat};
use crate::error::{ModelError, ModelErrorCause};
use async_openai::Client;
use async_openai::config::OpenAIConfig;
use async_openai::error::OpenAIError;
use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
    ResponseFormat as ApiResponseFormat,
};
use async_trait::async_trait;

/// Environment variable holding the API key.
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Invokes models through the OpenAI chat-completions API.
///
/// Build one per process and share it by reference.
#[derive(Debug, Clone)]
pub struct OpenAiInvoker {
    client: Client<OpenAIConfig>,
    temperature: f32,
}

impl OpenAiInvoker {
    /// Creates an invoker using `api_key`, and `api_base` when given.
    pub fn new(api_key: impl Into<String>, api_base: Option<&str>) -> Self {
        let mut config = OpenAIConfig::new().with_api_key(api_key.into());
        if let Some(base) = api_base {
            config = config.with_api_base(base);
        }
        Self {
            client: Client::with_config(config),
            temperature: 0.0,
        }
    }

    /// Overrides the sampling temperature (default `0.0`).
    #[must_use]
    pub const fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }
}

#[async_trait]
impl ModelInvoker for OpenAiInvoker {
    async fn invoke(
        &self,
        model: &str,
        request: &ModelRequest,
    ) -> Result<ModelResponse, ModelError> {
        let to_model_error = |e: OpenAIError| ModelError::new(model, classify_error(e));

        let system = ChatCompletionRequestSystemMessageArgs::default()
            .content(request.system_prompt.as_str())
            .build()
            .map_err(to_model_error)?;
        let user = ChatCompletionRequestUserMessageArgs::default()
            .content(request.user_content.as_str())
            .build()
            .map_err(to_model_error)?;

        let messages: Vec<ChatCompletionRequestMessage> = vec![system.into(), user.into()];
        let mut args = CreateChatCompletionRequestArgs::default();
        args.model(model)
            .messages(messages)
            .temperature(self.temperature);
        if request.response_format == ResponseFormat::JsonObject {
            args.response_format(ApiResponseFormat::JsonObject);
        }
        let api_request = args.build().map_err(to_model_error)?;

        tracing::debug!(model, chars = request.user_content.len(), "sending chat completion");
        let response = self
            .client
            .chat()
            .create(api_request)
            .await
            .map_err(to_model_error)?;

        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| ModelError::new(model, ModelErrorCause::EmptyResponse))?;

        Ok(ModelResponse {
            model: model.to_string(),
            content,
        })
    }
}

/// Maps client errors onto model error causes.
fn classify_error(error: OpenAIError) -> ModelErrorCause {
    match error {
        OpenAIError::ApiError(api) => {
            let rate_limited = [api.code.as_deref(), api.r#type.as_deref()]
                .into_iter()
                .flatten()
                .any(|tag| tag.contains("rate_limit") || tag == "insufficient_quota");
            if rate_limited {
                ModelErrorCause::RateLimited(api.message)
            } else {
                ModelErrorCause::Transport(api.message)
            }
        }
        OpenAIError::JSONDeserialize(e) => ModelErrorCause::MalformedResponse(e.to_string()),
        other => ModelErrorCause::Transport(other.to_string()),
    }
}
