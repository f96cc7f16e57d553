//! CLI command implementations.
//!
//! Contains the business logic for each CLI command.

use crate::chunking::ChunkBoundaryValidator;
use crate::cli::output::{
    OutputFormat, format_attempts, format_batch_summary, format_document, format_document_list,
    format_status, format_validation,
};
use crate::cli::parser::{Cli, Commands, ProcessingArgs};
use crate::core::{ChunkClaim, DocumentStatus, SourceText};
use crate::error::{CommandError, Error, Result, StorageError};
use crate::io::read_document;
use crate::model::openai::API_KEY_ENV;
use crate::model::{ChunkingResponse, ModelInvoker, OpenAiInvoker};
use crate::pipeline::{BatchItem, BatchOptions, BatchProcessor, DocumentProcessor};
use crate::storage::{SqliteStorage, Storage};
use serde::Deserialize;
use std::path::Path;

/// Executes the CLI command.
///
/// `process` and `batch` call the OpenAI API; every other command works on
/// the database or local files only.
///
/// # Errors
///
/// Returns an error if the command fails to execute.
pub async fn execute(cli: &Cli) -> Result<String> {
    let invoker = match &cli.command {
        Commands::Process { processing, .. } | Commands::Batch { processing, .. } => {
            Some(openai_invoker(processing)?)
        }
        _ => None,
    };
    execute_with_invoker(cli, invoker.as_ref()).await
}

/// Executes the CLI command with a caller-supplied model invoker.
///
/// # Errors
///
/// Returns an error if the command fails, or [`Error::Config`] if a model
/// command is run without an invoker.
pub async fn execute_with_invoker<I: ModelInvoker>(
    cli: &Cli,
    invoker: Option<&I>,
) -> Result<String> {
    let format = OutputFormat::parse(&cli.format);
    let db_path = cli.get_db_path();

    match &cli.command {
        Commands::Init { force } => cmd_init(&db_path, *force),
        Commands::Status => cmd_status(&db_path, format),
        Commands::Reset { yes } => cmd_reset(&db_path, *yes),
        Commands::Process {
            file,
            group,
            processing,
        } => {
            let invoker = invoker.ok_or_else(|| Error::config("no model invoker configured"))?;
            let items = [BatchItem::new(file.clone(), *group)];
            cmd_batch(&db_path, invoker, &items, processing, format).await
        }
        Commands::Batch {
            files,
            group,
            processing,
        } => {
            let invoker = invoker.ok_or_else(|| Error::config("no model invoker configured"))?;
            let items: Vec<_> = files
                .iter()
                .map(|f| BatchItem::new(f.clone(), *group))
                .collect();
            cmd_batch(&db_path, invoker, &items, processing, format).await
        }
        Commands::List { status } => cmd_list(&db_path, status.as_deref(), format),
        Commands::Show { id, chunks } => cmd_show(&db_path, *id, *chunks, format),
        Commands::Attempts { limit } => cmd_attempts(&db_path, *limit, format),
        Commands::Validate {
            file,
            claims,
            incomplete,
            max_chunk_length,
            gap_tolerance,
        } => cmd_validate(
            file,
            claims,
            *incomplete,
            ChunkBoundaryValidator::new(*max_chunk_length, *gap_tolerance),
            format,
        ),
    }
}

/// Builds the OpenAI invoker from CLI settings.
fn openai_invoker(args: &ProcessingArgs) -> Result<OpenAiInvoker> {
    let api_key = args
        .api_key
        .as_deref()
        .filter(|k| !k.trim().is_empty())
        .ok_or_else(|| {
            Error::config(format!(
                "missing API key: set {API_KEY_ENV} or pass --api-key"
            ))
        })?;
    Ok(OpenAiInvoker::new(api_key, args.api_base.as_deref()))
}

/// Opens storage and ensures it's initialized.
fn open_storage(db_path: &Path) -> Result<SqliteStorage> {
    let storage = SqliteStorage::open(db_path)?;

    if !storage.is_initialized()? {
        return Err(StorageError::NotInitialized.into());
    }

    Ok(storage)
}

// ==================== Command Implementations ====================

fn cmd_init(db_path: &Path, force: bool) -> Result<String> {
    if db_path.exists() && !force {
        return Err(CommandError::ExecutionFailed(
            "Database already exists. Use --force to reinitialize.".to_string(),
        )
        .into());
    }

    if force && db_path.exists() {
        std::fs::remove_file(db_path).map_err(|e| {
            CommandError::ExecutionFailed(format!("Failed to remove existing database: {e}"))
        })?;
    }

    let mut storage = SqliteStorage::open(db_path)?;
    storage.init()?;
    tracing::info!(path = %db_path.display(), "database initialized");

    Ok(format!("Initialized database at: {}\n", db_path.display()))
}

fn cmd_status(db_path: &Path, format: OutputFormat) -> Result<String> {
    let storage = open_storage(db_path)?;
    let stats = storage.stats()?;
    Ok(format_status(&stats, format))
}

fn cmd_reset(db_path: &Path, yes: bool) -> Result<String> {
    if !yes {
        return Err(CommandError::ExecutionFailed(
            "Use --yes to confirm reset. This will delete all data.".to_string(),
        )
        .into());
    }

    let mut storage = open_storage(db_path)?;
    storage.reset()?;

    Ok("Database reset successfully.\n".to_string())
}

async fn cmd_batch<I: ModelInvoker>(
    db_path: &Path,
    invoker: &I,
    items: &[BatchItem],
    args: &ProcessingArgs,
    format: OutputFormat,
) -> Result<String> {
    let config = args.to_config();
    config.validate()?;

    let mut storage = open_storage(db_path)?;
    let processor = DocumentProcessor::new(invoker, &mut storage, &config);
    let options = BatchOptions {
        reprocess_stale: args.reprocess_stale,
        continuation: !args.no_continuation,
    };

    let summary = BatchProcessor::new(processor, options).run(items).await;
    Ok(format_batch_summary(&summary, format))
}

fn cmd_list(db_path: &Path, status: Option<&str>, format: OutputFormat) -> Result<String> {
    let status = status
        .map(str::parse::<DocumentStatus>)
        .transpose()
        .map_err(CommandError::InvalidArgument)?;

    let storage = open_storage(db_path)?;
    let documents = storage.list_documents(status)?;
    Ok(format_document_list(&documents, format))
}

fn cmd_show(db_path: &Path, id: i64, with_chunks: bool, format: OutputFormat) -> Result<String> {
    let storage = open_storage(db_path)?;
    let document = storage
        .get_document(id)?
        .ok_or(StorageError::DocumentNotFound { id })?;

    let chunks = if with_chunks {
        Some(storage.get_chunks(id)?)
    } else {
        None
    };

    Ok(format_document(&document, chunks.as_deref(), format))
}

fn cmd_attempts(db_path: &Path, limit: usize, format: OutputFormat) -> Result<String> {
    let storage = open_storage(db_path)?;
    let attempts = storage.list_attempts(limit)?;
    Ok(format_attempts(&attempts, format))
}

/// Claims file layout: the model response object or a bare array.
#[derive(Deserialize)]
#[serde(untagged)]
enum ClaimsFile {
    Response(ChunkingResponse),
    Claims(Vec<ChunkClaim>),
}

fn cmd_validate(
    file: &Path,
    claims_path: &Path,
    incomplete: bool,
    validator: ChunkBoundaryValidator,
    format: OutputFormat,
) -> Result<String> {
    let text = read_document(file)?;
    let raw = std::fs::read_to_string(claims_path).map_err(|e| {
        CommandError::InvalidArgument(format!(
            "cannot read claims file {}: {e}",
            claims_path.display()
        ))
    })?;
    let claims = match serde_json::from_str::<ClaimsFile>(&raw) {
        Ok(ClaimsFile::Response(response)) => response.chunks,
        Ok(ClaimsFile::Claims(claims)) => claims,
        Err(e) => {
            return Err(CommandError::InvalidArgument(format!(
                "invalid claims file {}: {e}",
                claims_path.display()
            ))
            .into());
        }
    };

    let report = validator.validate(&SourceText::new(text), &claims, !incomplete)?;
    Ok(format_validation(&report, format))
}
