//! Processing configuration.
//!
//! Values come from CLI flags and their environment fallbacks; see
//! [`crate::cli::parser`]. Both tolerances are independent: `gap_tolerance`
//! bounds uncovered text between chunks, `text_removal_position_tolerance`
//! bounds how far a cleaning fragment may drift from its claimed position.

use crate::chunking::{
    ChunkBoundaryValidator, DEFAULT_GAP_TOLERANCE, DEFAULT_MAX_CHUNK_LENGTH,
    DEFAULT_PRE_CHUNK_SIZE, DEFAULT_TEXT_REMOVAL_TOLERANCE, PreChunker,
};
use crate::error::{Error, Result};
use crate::model::RetryConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default candidate models, highest priority first.
pub const DEFAULT_MODELS: [&str; 2] = ["gpt-4o", "gpt-4o-mini"];

/// Settings for cleaning and chunking documents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessingConfig {
    /// Longest accepted chunk in characters.
    pub max_chunk_length: usize,
    /// Models to try, highest priority first.
    pub candidate_models: Vec<String>,
    /// Attempts allowed on the last candidate model.
    pub max_retries: u32,
    /// Pause between retries in milliseconds.
    pub retry_delay_ms: u64,
    /// Longest tolerated gap between chunks in characters.
    pub gap_tolerance: usize,
    /// Pre-chunk segment size in characters.
    pub pre_chunk_size: usize,
    /// Longest accepted drift of a removal from its claimed position.
    pub text_removal_position_tolerance: usize,
    /// Whether to run the cleaning pass before chunking.
    pub clean: bool,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            max_chunk_length: DEFAULT_MAX_CHUNK_LENGTH,
            candidate_models: DEFAULT_MODELS.iter().map(ToString::to_string).collect(),
            max_retries: 3,
            retry_delay_ms: 1000,
            gap_tolerance: DEFAULT_GAP_TOLERANCE,
            pre_chunk_size: DEFAULT_PRE_CHUNK_SIZE,
            text_removal_position_tolerance: DEFAULT_TEXT_REMOVAL_TOLERANCE,
            clean: true,
        }
    }
}

impl ProcessingConfig {
    /// Checks that every value is usable.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] naming the first invalid setting.
    pub fn validate(&self) -> Result<()> {
        if self.candidate_models.is_empty() {
            return Err(Error::config("at least one candidate model is required"));
        }
        if self.candidate_models.iter().any(|m| m.trim().is_empty()) {
            return Err(Error::config("candidate model names must not be blank"));
        }
        if self.max_retries == 0 {
            return Err(Error::config("max_retries must be at least 1"));
        }
        if self.max_chunk_length == 0 {
            return Err(Error::config("max_chunk_length must be > 0"));
        }
        if self.pre_chunk_size == 0 {
            return Err(Error::config("pre_chunk_size must be > 0"));
        }
        Ok(())
    }

    /// Retry limits for the orchestrator.
    #[must_use]
    pub const fn retry_config(&self) -> RetryConfig {
        RetryConfig::new(self.max_retries, Duration::from_millis(self.retry_delay_ms))
    }

    /// Boundary validator using these limits.
    #[must_use]
    pub const fn validator(&self) -> ChunkBoundaryValidator {
        ChunkBoundaryValidator::new(self.max_chunk_length, self.gap_tolerance)
    }

    /// Pre-chunker using the configured segment size.
    #[must_use]
    pub const fn pre_chunker(&self) -> PreChunker {
        PreChunker::with_size(self.pre_chunk_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ProcessingConfig::default();
        assert_eq!(config.max_chunk_length, 2000);
        assert_eq!(config.candidate_models, vec!["gpt-4o", "gpt-4o-mini"]);
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.retry_delay_ms, 1000);
        assert_eq!(config.gap_tolerance, 1);
        assert_eq!(config.pre_chunk_size, 1500);
        assert_eq!(config.text_removal_position_tolerance, 35);
        assert!(config.clean);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_invalid_values() {
        let cases: Vec<fn(&mut ProcessingConfig)> = vec![
            |c| c.candidate_models.clear(),
            |c| c.candidate_models = vec![" ".to_string()],
            |c| c.candidate_models = vec!["gpt-4o".to_string(), String::new()],
            |c| c.max_retries = 0,
            |c| c.max_chunk_length = 0,
            |c| c.pre_chunk_size = 0,
        ];
        for mutate in cases {
            let mut config = ProcessingConfig::default();
            mutate(&mut config);
            assert!(matches!(config.validate(), Err(Error::Config { .. })));
        }
    }

    #[test]
    fn test_derived_components() {
        let config = ProcessingConfig {
            max_chunk_length: 500,
            pre_chunk_size: 300,
            retry_delay_ms: 5,
            ..ProcessingConfig::default()
        };
        assert_eq!(config.validator().max_chunk_length(), 500);
        assert_eq!(config.pre_chunker().max_chunk_size(), 300);
        assert_eq!(config.retry_config().retry_delay, Duration::from_millis(5));
    }
}
