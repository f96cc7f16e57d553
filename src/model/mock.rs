//! Scripted invoker for tests and offline runs.

use super::{ModelInvoker, ModelRequest, ModelResponse};
use crate::error::{ModelError, ModelErrorCause};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, PoisonError};

type Script = HashMap<String, VecDeque<Result<String, ModelErrorCause>>>;

/// Deterministic [`ModelInvoker`] that replays scripted replies.
///
/// Replies are queued per model and consumed in order. When a model's queue
/// is empty the default reply is used; without a default the call fails
/// with [`ModelErrorCause::EmptyResponse`].
///
/// # Examples
///
/// ```
/// use doc_segmenter::model::{MockInvoker, ModelInvoker, ModelRequest};
/// use doc_segmenter::error::ModelErrorCause;
///
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// let mock = MockInvoker::new()
///     .fail("gpt-4o", ModelErrorCause::Transport("timeout".into()))
///     .reply("gpt-4o", r#"{"chunks": []}"#);
/// let request = ModelRequest::json("system", "text");
///
/// assert!(mock.invoke("gpt-4o", &request).await.is_err());
/// assert!(mock.invoke("gpt-4o", &request).await.is_ok());
/// assert_eq!(mock.call_count(), 2);
/// # });
/// ```
#[derive(Debug, Clone, Default)]
pub struct MockInvoker {
    script: Arc<Mutex<Script>>,
    default_reply: Option<String>,
    calls: Arc<Mutex<Vec<(String, ModelRequest)>>>,
}

impl MockInvoker {
    /// Creates an invoker with an empty script.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an invoker that answers every call with `reply`.
    #[must_use]
    pub fn always(reply: impl Into<String>) -> Self {
        Self {
            default_reply: Some(reply.into()),
            ..Self::default()
        }
    }

    /// Queues a successful reply for `model`.
    #[must_use]
    pub fn reply(self, model: &str, content: impl Into<String>) -> Self {
        self.push(model, Ok(content.into()));
        self
    }

    /// Queues a failure for `model`.
    #[must_use]
    pub fn fail(self, model: &str, cause: ModelErrorCause) -> Self {
        self.push(model, Err(cause));
        self
    }

    /// Queues `count` identical failures for `model`.
    #[must_use]
    pub fn fail_times(self, model: &str, cause: &ModelErrorCause, count: usize) -> Self {
        for _ in 0..count {
            self.push(model, Err(cause.clone()));
        }
        self
    }

    fn push(&self, model: &str, entry: Result<String, ModelErrorCause>) {
        self.script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(model.to_string())
            .or_default()
            .push_back(entry);
    }

    /// Total number of invocations.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Models invoked, in call order.
    #[must_use]
    pub fn models_called(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(model, _)| model.clone())
            .collect()
    }

    /// Requests received, in call order.
    #[must_use]
    pub fn requests(&self) -> Vec<ModelRequest> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, request)| request.clone())
            .collect()
    }
}

#[async_trait]
impl ModelInvoker for MockInvoker {
    async fn invoke(
        &self,
        model: &str,
        request: &ModelRequest,
    ) -> Result<ModelResponse, ModelError> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((model.to_string(), request.clone()));

        let scripted = self
            .script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get_mut(model)
            .and_then(VecDeque::pop_front);

        let content = match scripted {
            Some(entry) => entry.map_err(|cause| ModelError::new(model, cause))?,
            None => self
                .default_reply
                .clone()
                .ok_or_else(|| ModelError::new(model, ModelErrorCause::EmptyResponse))?,
        };

        Ok(ModelResponse {
            model: model.to_string(),
            content,
        })
    }
}
