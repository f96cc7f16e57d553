//! Binary entry point for doc-segmenter.

#![allow(clippy::print_stdout, clippy::print_stderr)]

use clap::Parser;
use doc_segmenter::cli::output::{OutputFormat, format_error};
use doc_segmenter::cli::{Cli, execute};
use doc_segmenter::logging::init_logging;
use std::io::{self, Write};
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let format = OutputFormat::parse(&cli.format);
    let _log_guard = init_logging(cli.verbose, cli.log_dir.as_deref());

    match execute(&cli).await {
        Ok(output) => {
            if !output.is_empty() {
                // Piping into `head` or `jq` may close stdout early
                if let Err(e) = write!(io::stdout(), "{output}")
                    && e.kind() != io::ErrorKind::BrokenPipe
                {
                    eprintln!("Error writing to stdout: {e}");
                    return ExitCode::FAILURE;
                }
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            let error_output = format_error(&e, format);
            match format {
                // JSON errors go to stdout for programmatic parsing
                OutputFormat::Json => println!("{error_output}"),
                OutputFormat::Text => eprintln!("Error: {error_output}"),
            }
            ExitCode::FAILURE
        }
    }
}
