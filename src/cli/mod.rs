//! CLI layer for doc-segmenter.
//!
//! Provides the command-line interface using clap, with commands for
//! initializing the database, processing documents and inspecting results.

pub mod commands;
pub mod output;
pub mod parser;

pub use commands::{execute, execute_with_invoker};
pub use output::OutputFormat;
pub use parser::{Cli, Commands, ProcessingArgs};
