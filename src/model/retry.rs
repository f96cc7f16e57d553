//! Retry and model-fallback orchestration.
//!
//! Candidate models are tried in priority order. A failure moves to the
//! next candidate immediately; only the last candidate is retried, after a
//! fixed delay, up to `max_retries` attempts. With `m` candidates at most
//! `(m - 1) + max_retries` calls are made.

use crate::core::attempt::now_millis;
use crate::core::{ModelAttempt, RequestKind};
use crate::error::{Error, ModelError, Result};
use std::future::Future;
use std::time::Duration;

/// Retry limits for one orchestrated operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryConfig {
    /// Attempts allowed on the last candidate model (at least 1).
    pub max_retries: u32,
    /// Pause before re-trying the last candidate.
    pub retry_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            retry_delay: Duration::from_millis(1000),
        }
    }
}

impl RetryConfig {
    /// Creates a config.
    #[must_use]
    pub const fn new(max_retries: u32, retry_delay: Duration) -> Self {
        Self {
            max_retries,
            retry_delay,
        }
    }
}

/// Sink for model attempt records.
///
/// Failures to record are reported to the orchestrator, which logs them
/// and carries on.
pub trait AttemptLog {
    /// Records one attempt.
    ///
    /// # Errors
    ///
    /// Returns an error if the attempt could not be stored.
    fn record_attempt(&mut self, attempt: &ModelAttempt) -> Result<()>;
}

/// Attempt log that only emits tracing events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAttemptLog;

impl AttemptLog for TracingAttemptLog {
    fn record_attempt(&mut self, attempt: &ModelAttempt) -> Result<()> {
        tracing::info!(
            model = %attempt.model,
            kind = %attempt.request_kind,
            succeeded = attempt.succeeded,
            duration_ms = attempt.duration_ms(),
            error = attempt.error.as_deref().unwrap_or(""),
            "model attempt"
        );
        Ok(())
    }
}

/// Drives an operation through candidate models with retries and fallback.
pub struct RetryFallbackOrchestrator<'a> {
    config: RetryConfig,
    log: &'a mut dyn AttemptLog,
    history: Vec<ModelAttempt>,
}

impl std::fmt::Debug for RetryFallbackOrchestrator<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryFallbackOrchestrator")
            .field("config", &self.config)
            .field("history", &self.history)
            .finish_non_exhaustive()
    }
}

impl<'a> RetryFallbackOrchestrator<'a> {
    /// Creates an orchestrator recording attempts into `log`.
    pub fn new(config: RetryConfig, log: &'a mut dyn AttemptLog) -> Self {
        Self {
            config,
            log,
            history: Vec::new(),
        }
    }

    /// Attempts made so far, oldest first.
    #[must_use]
    pub fn history(&self) -> &[ModelAttempt] {
        &self.history
    }

    /// Consumes the orchestrator, returning its attempt history.
    #[must_use]
    pub fn into_history(self) -> Vec<ModelAttempt> {
        self.history
    }

    /// Runs `operation` against `candidates` until one call succeeds.
    ///
    /// `operation` receives the model name for each attempt. Parsing of the
    /// model's reply belongs inside `operation`, so malformed replies are
    /// retried like transport failures.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if `candidates` is empty, and the last
    /// observed [`ModelError`] once every attempt has failed.
    pub async fn run_with_fallback<T, F, Fut>(
        &mut self,
        candidates: &[String],
        request_kind: RequestKind,
        document_id: Option<i64>,
        mut operation: F,
    ) -> Result<T>
    where
        F: FnMut(String) -> Fut,
        Fut: Future<Output = std::result::Result<T, ModelError>>,
    {
        if candidates.is_empty() {
            return Err(Error::config("no candidate models configured"));
        }

        let max_retries = self.config.max_retries.max(1);
        let mut model_index = 0;
        let mut attempt = 1;

        loop {
            let model = &candidates[model_index];
            let started_at_ms = now_millis();
            let outcome = operation(model.clone()).await;

            let record = ModelAttempt {
                model: model.clone(),
                request_kind,
                document_id,
                succeeded: outcome.is_ok(),
                error: outcome.as_ref().err().map(ToString::to_string),
                started_at_ms,
                finished_at_ms: now_millis(),
            };
            self.record(record);

            let error = match outcome {
                Ok(value) => {
                    tracing::debug!(
                        model = %model,
                        attempt,
                        kind = %request_kind,
                        "model call succeeded"
                    );
                    return Ok(value);
                }
                Err(error) => error,
            };

            if model_index + 1 < candidates.len() {
                model_index += 1;
                attempt = 1;
                tracing::warn!(
                    failed = %model,
                    next = %candidates[model_index],
                    error = %error,
                    "falling back to next model"
                );
            } else if attempt < max_retries {
                attempt += 1;
                tracing::warn!(
                    model = %model,
                    attempt,
                    max_retries,
                    error = %error,
                    "retrying model"
                );
                if !self.config.retry_delay.is_zero() {
                    tokio::time::sleep(self.config.retry_delay).await;
                }
            } else {
                tracing::error!(
                    model = %model,
                    attempts = self.history.len(),
                    error = %error,
                    "all model attempts failed"
                );
                return Err(error.into());
            }
        }
    }

    fn record(&mut self, attempt: ModelAttempt) {
        if let Err(e) = self.log.record_attempt(&attempt) {
            tracing::warn!(error = %e, model = %attempt.model, "failed to record model attempt");
        }
        self.history.push(attempt);
    }
}
