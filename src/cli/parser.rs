//! Command-line argument parsing.
//!
//! Defines the CLI structure using clap derive macros.

use crate::chunking::{
    DEFAULT_GAP_TOLERANCE, DEFAULT_MAX_CHUNK_LENGTH, DEFAULT_PRE_CHUNK_SIZE,
    DEFAULT_TEXT_REMOVAL_TOLERANCE,
};
use crate::config::{DEFAULT_MODELS, ProcessingConfig};
use crate::model::openai::API_KEY_ENV;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// doc-segmenter: split text documents into validated, contiguous chunks.
///
/// A language model proposes chunk boundaries; every proposal is checked
/// against the source text before it is stored.
#[derive(Parser, Debug)]
#[command(name = "doc-segmenter")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the database file.
    ///
    /// Defaults to `.doc-segmenter/segmenter.db` in the current directory.
    #[arg(short, long, env = "DOC_SEGMENTER_DB_PATH", global = true)]
    pub db_path: Option<PathBuf>,

    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format (text, json).
    #[arg(long, default_value = "text", global = true)]
    pub format: String,

    /// Directory for daily rolling log files.
    #[arg(long, env = "DOC_SEGMENTER_LOG_DIR", global = true)]
    pub log_dir: Option<PathBuf>,

    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize the database.
    ///
    /// Creates the database file and schema if they don't exist.
    Init {
        /// Force re-initialization (destroys existing data).
        #[arg(short, long)]
        force: bool,
    },

    /// Show database statistics.
    Status,

    /// Delete all documents, chunks and attempts.
    Reset {
        /// Skip confirmation prompt.
        #[arg(short = 'y', long)]
        yes: bool,
    },

    /// Clean, chunk and store one document.
    Process {
        /// Path to the text file.
        file: PathBuf,

        /// Group number used for lookup and deduplication.
        #[arg(short, long)]
        group: Option<i64>,

        /// Model and chunking settings.
        #[command(flatten)]
        processing: ProcessingArgs,
    },

    /// Process several documents in order.
    Batch {
        /// Paths to the text files.
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Group number used for lookup and deduplication.
        #[arg(short, long)]
        group: Option<i64>,

        /// Model and chunking settings.
        #[command(flatten)]
        processing: ProcessingArgs,
    },

    /// List stored documents.
    #[command(alias = "ls")]
    List {
        /// Only documents in this status
        /// (processing, processed, failed, skipped_duplicate).
        #[arg(short, long)]
        status: Option<String>,
    },

    /// Show a stored document.
    Show {
        /// Document ID.
        id: i64,

        /// Show chunks as well.
        #[arg(short, long)]
        chunks: bool,
    },

    /// Show recent model calls.
    Attempts {
        /// Maximum number of attempts to show.
        #[arg(short = 'n', long, default_value = "20")]
        limit: usize,
    },

    /// Validate a chunking claims file against a document without calling a model.
    Validate {
        /// Path to the text file.
        file: PathBuf,

        /// JSON file with `{"chunks": [...]}` or a bare array of claims.
        #[arg(long)]
        claims: PathBuf,

        /// Treat the text as an incomplete segment (trailing text is a remainder).
        #[arg(long)]
        incomplete: bool,

        /// Longest accepted chunk in characters.
        #[arg(long, env = "DOC_SEGMENTER_MAX_CHUNK_LENGTH", default_value_t = DEFAULT_MAX_CHUNK_LENGTH)]
        max_chunk_length: usize,

        /// Longest tolerated gap between chunks in characters.
        #[arg(long, env = "DOC_SEGMENTER_GAP_TOLERANCE", default_value_t = DEFAULT_GAP_TOLERANCE)]
        gap_tolerance: usize,
    },
}

/// Model and limit settings shared by `process` and `batch`.
#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct ProcessingArgs {
    /// OpenAI API key.
    #[arg(long, env = API_KEY_ENV, hide_env_values = true)]
    pub api_key: Option<String>,

    /// Alternative API base URL (OpenAI-compatible servers).
    #[arg(long, env = "OPENAI_BASE_URL")]
    pub api_base: Option<String>,

    /// Candidate models, highest priority first (comma separated).
    #[arg(long, env = "DOC_SEGMENTER_MODELS", value_delimiter = ',', default_value = "gpt-4o,gpt-4o-mini")]
    pub models: Vec<String>,

    /// Longest accepted chunk in characters.
    #[arg(long, env = "DOC_SEGMENTER_MAX_CHUNK_LENGTH", default_value_t = DEFAULT_MAX_CHUNK_LENGTH)]
    pub max_chunk_length: usize,

    /// Attempts allowed on the last candidate model.
    #[arg(long, env = "DOC_SEGMENTER_MAX_RETRIES", default_value_t = 3)]
    pub max_retries: u32,

    /// Pause between retries in milliseconds.
    #[arg(long, env = "DOC_SEGMENTER_RETRY_DELAY_MS", default_value_t = 1000)]
    pub retry_delay_ms: u64,

    /// Longest tolerated gap between chunks in characters.
    #[arg(long, env = "DOC_SEGMENTER_GAP_TOLERANCE", default_value_t = DEFAULT_GAP_TOLERANCE)]
    pub gap_tolerance: usize,

    /// Pre-chunk segment size in characters.
    #[arg(long, env = "DOC_SEGMENTER_PRE_CHUNK_SIZE", default_value_t = DEFAULT_PRE_CHUNK_SIZE)]
    pub pre_chunk_size: usize,

    /// How far a cleaning fragment may drift from its claimed position.
    #[arg(long, env = "DOC_SEGMENTER_REMOVAL_TOLERANCE", default_value_t = DEFAULT_TEXT_REMOVAL_TOLERANCE)]
    pub removal_tolerance: usize,

    /// Skip the cleaning pass.
    #[arg(long)]
    pub no_clean: bool,

    /// Do not pass the previous document's last chunk as context.
    #[arg(long)]
    pub no_continuation: bool,

    /// Retry documents left in `processing` by an interrupted run.
    #[arg(long)]
    pub reprocess_stale: bool,
}

impl Default for ProcessingArgs {
    fn default() -> Self {
        Self {
            api_key: None,
            api_base: None,
            models: DEFAULT_MODELS.iter().map(ToString::to_string).collect(),
            max_chunk_length: DEFAULT_MAX_CHUNK_LENGTH,
            max_retries: 3,
            retry_delay_ms: 1000,
            gap_tolerance: DEFAULT_GAP_TOLERANCE,
            pre_chunk_size: DEFAULT_PRE_CHUNK_SIZE,
            removal_tolerance: DEFAULT_TEXT_REMOVAL_TOLERANCE,
            no_clean: false,
            no_continuation: false,
            reprocess_stale: false,
        }
    }
}

impl ProcessingArgs {
    /// Builds the processing config. Model names are trimmed and blank
    /// entries dropped.
    #[must_use]
    pub fn to_config(&self) -> ProcessingConfig {
        ProcessingConfig {
            max_chunk_length: self.max_chunk_length,
            candidate_models: self
                .models
                .iter()
                .map(|m| m.trim())
                .filter(|m| !m.is_empty())
                .map(ToString::to_string)
                .collect(),
            max_retries: self.max_retries,
            retry_delay_ms: self.retry_delay_ms,
            gap_tolerance: self.gap_tolerance,
            pre_chunk_size: self.pre_chunk_size,
            text_removal_position_tolerance: self.removal_tolerance,
            clean: !self.no_clean,
        }
    }
}

impl Cli {
    /// Returns the database path, using the default if not specified.
    #[must_use]
    pub fn get_db_path(&self) -> PathBuf {
        self.db_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(crate::storage::DEFAULT_DB_PATH))
    }
}
