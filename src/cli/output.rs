//! Output formatting for CLI commands.
//!
//! Supports text and JSON output formats.

use crate::chunking::ValidationReport;
use crate::core::{ChunkRecord, Document, ModelAttempt, Warning};
use crate::error::Error;
use crate::pipeline::BatchSummary;
use crate::storage::StorageStats;
use serde::Serialize;
use std::fmt::Write;

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable text output.
    Text,
    /// JSON output.
    Json,
}

impl OutputFormat {
    /// Parses format from string.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => Self::Json,
            _ => Self::Text,
        }
    }
}

/// Formats a status response.
#[must_use]
pub fn format_status(stats: &StorageStats, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => format_status_text(stats),
        OutputFormat::Json => format_json(stats),
    }
}

fn format_status_text(stats: &StorageStats) -> String {
    let mut output = String::new();
    output.push_str("doc-segmenter status\n");
    output.push_str("====================\n\n");
    let _ = writeln!(output, "  Documents:     {}", stats.document_count);
    let _ = writeln!(output, "    processed:   {}", stats.processed);
    let _ = writeln!(output, "    failed:      {}", stats.failed);
    let _ = writeln!(output, "    duplicates:  {}", stats.skipped_duplicate);
    let _ = writeln!(output, "    processing:  {}", stats.processing);
    let _ = writeln!(output, "  Chunks:        {}", stats.chunk_count);
    let _ = writeln!(output, "  Model calls:   {}", stats.attempt_count);
    let _ = writeln!(output, "  Schema:        v{}", stats.schema_version);
    if let Some(size) = stats.db_size {
        let _ = writeln!(output, "  DB size:       {}", format_size(size));
    }
    output
}

/// Formats a document list.
#[must_use]
pub fn format_document_list(documents: &[Document], format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => format_document_list_text(documents),
        OutputFormat::Json => {
            #[derive(Serialize)]
            struct DocumentSummary<'a> {
                id: Option<i64>,
                filename: &'a str,
                group_number: Option<i64>,
                status: &'a str,
                chunk_count: usize,
                warnings: usize,
                error_message: Option<&'a str>,
            }
            let rows: Vec<_> = documents
                .iter()
                .map(|d| DocumentSummary {
                    id: d.id,
                    filename: &d.filename,
                    group_number: d.group_number,
                    status: d.status.as_str(),
                    chunk_count: d.chunk_count,
                    warnings: d.warnings.len(),
                    error_message: d.error_message.as_deref(),
                })
                .collect();
            format_json(&rows)
        }
    }
}

fn format_document_list_text(documents: &[Document]) -> String {
    if documents.is_empty() {
        return "No documents found.\n".to_string();
    }

    let mut output = String::new();
    output.push_str("Documents:\n");
    let _ = writeln!(
        output,
        "{:<6} {:<24} {:<6} {:<18} {:<7} Warnings",
        "ID", "File", "Group", "Status", "Chunks"
    );
    output.push_str(&"-".repeat(72));
    output.push('\n');

    for doc in documents {
        let id = doc.id.map_or_else(|| "-".to_string(), |i| i.to_string());
        let group = doc
            .group_number
            .map_or_else(|| "-".to_string(), |g| g.to_string());
        let _ = writeln!(
            output,
            "{:<6} {:<24} {:<6} {:<18} {:<7} {}",
            id,
            truncate(&doc.filename, 24),
            group,
            doc.status,
            doc.chunk_count,
            doc.warnings.len()
        );
    }

    output
}

/// Formats a single document, optionally with its chunks.
#[must_use]
pub fn format_document(
    document: &Document,
    chunks: Option<&[ChunkRecord]>,
    format: OutputFormat,
) -> String {
    match format {
        OutputFormat::Text => format_document_text(document, chunks),
        OutputFormat::Json => {
            #[derive(Serialize)]
            struct DocumentWithChunks<'a> {
                document: &'a Document,
                chunks: Option<&'a [ChunkRecord]>,
            }
            format_json(&DocumentWithChunks { document, chunks })
        }
    }
}

fn format_document_text(document: &Document, chunks: Option<&[ChunkRecord]>) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "Document: {}", document.filename);
    let _ = writeln!(output, "  ID:           {}", document.id.unwrap_or(0));
    if let Some(group) = document.group_number {
        let _ = writeln!(output, "  Group:        {group}");
    }
    let _ = writeln!(output, "  Status:       {}", document.status);
    let _ = writeln!(output, "  Characters:   {}", document.char_len());
    let _ = writeln!(output, "  Chunks:       {}", document.chunk_count);
    let _ = writeln!(output, "  Hash:         {}", truncate(&document.content_hash, 16));
    if let Some(ref cleaned) = document.cleaned_content {
        let _ = writeln!(output, "  Cleaned:      {} characters", cleaned.chars().count());
    }
    if let Some(original) = document.duplicate_of {
        let _ = writeln!(output, "  Duplicate of: {original}");
    }
    if let Some(ref error) = document.error_message {
        let _ = writeln!(output, "  Error:        {error}");
    }
    push_warnings(&mut output, &document.warnings);

    if let Some(chunks) = chunks {
        output.push('\n');
        output.push_str("Chunks:\n");
        let _ = writeln!(
            output,
            "{:<6} {:<10} {:<10} {:<8} Preview",
            "Index", "Start", "End", "Chars"
        );
        output.push_str(&"-".repeat(72));
        output.push('\n');

        for chunk in chunks {
            let preview = truncate(&chunk.content.replace('\n', "\\n"), 32);
            let _ = writeln!(
                output,
                "{:<6} {:<10} {:<10} {:<8} {}",
                chunk.index,
                chunk.start_index,
                chunk.end_index,
                chunk.end_index + 1 - chunk.start_index,
                preview
            );
        }
    }

    output
}

/// Formats recent model attempts.
#[must_use]
pub fn format_attempts(attempts: &[ModelAttempt], format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => format_json(&attempts),
        OutputFormat::Text => {
            if attempts.is_empty() {
                return "No model calls recorded.\n".to_string();
            }
            let mut output = String::new();
            let _ = writeln!(
                output,
                "{:<16} {:<6} {:<9} {:<8} {:<9} Error",
                "Model", "Kind", "Document", "Result", "Duration"
            );
            output.push_str(&"-".repeat(72));
            output.push('\n');
            for attempt in attempts {
                let document = attempt
                    .document_id
                    .map_or_else(|| "-".to_string(), |d| d.to_string());
                let _ = writeln!(
                    output,
                    "{:<16} {:<6} {:<9} {:<8} {:<9} {}",
                    truncate(&attempt.model, 16),
                    attempt.request_kind.as_str(),
                    document,
                    if attempt.succeeded { "ok" } else { "failed" },
                    format!("{}ms", attempt.duration_ms()),
                    attempt.error.as_deref().map_or("", |e| e)
                );
            }
            output
        }
    }
}

/// Formats a batch run summary.
#[must_use]
pub fn format_batch_summary(summary: &BatchSummary, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => format_json(summary),
        OutputFormat::Text => {
            let mut output = String::new();
            for report in &summary.reports {
                let id = report
                    .document_id
                    .map_or_else(|| "-".to_string(), |i| i.to_string());
                let _ = write!(
                    output,
                    "[{}] {} (id {id})",
                    report.outcome.as_str(),
                    report.filename
                );
                if report.chunk_count > 0 {
                    let _ = write!(output, ": {} chunks", report.chunk_count);
                }
                if let Some(original) = report.duplicate_of {
                    let _ = write!(output, ": same content as document {original}");
                }
                if let Some(ref reason) = report.error {
                    let _ = write!(output, ": {reason}");
                }
                output.push('\n');
                for warning in &report.warnings {
                    let _ = writeln!(output, "    warning: {}", warning.message);
                }
            }
            let _ = writeln!(
                output,
                "\n{} processed, {} failed, {} duplicates, {} skipped ({} chunks, {} model calls)",
                summary.processed,
                summary.failed,
                summary.duplicates,
                summary.skipped,
                summary.chunks,
                summary.model_attempts
            );
            output
        }
    }
}

/// Formats an offline validation result.
#[must_use]
pub fn format_validation(report: &ValidationReport, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => format_json(report),
        OutputFormat::Text => {
            let mut output = String::new();
            let _ = writeln!(output, "Valid: {} chunks", report.chunks.len());
            for chunk in &report.chunks {
                let _ = writeln!(
                    output,
                    "  [{}] {}..={} {}",
                    chunk.index(),
                    chunk.start_index(),
                    chunk.end_index(),
                    truncate(&chunk.text().replace('\n', "\\n"), 40)
                );
            }
            push_warnings(&mut output, &report.warnings);
            if !report.remainder.is_empty() {
                let _ = writeln!(
                    output,
                    "Remainder: {} characters",
                    report.remainder.chars().count()
                );
            }
            output
        }
    }
}

/// Formats an error for display.
///
/// JSON output carries a machine-readable `kind` next to the message.
#[must_use]
pub fn format_error(error: &Error, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => error.to_string(),
        OutputFormat::Json => {
            #[derive(Serialize)]
            struct ErrorOutput<'a> {
                kind: &'a str,
                message: String,
            }
            let kind = match error {
                Error::Storage(_) => "storage",
                Error::Chunking(_) => "chunking",
                Error::Boundary(_) => "boundary",
                Error::Model(_) => "model",
                Error::Io(_) => "io",
                Error::Command(_) => "command",
                Error::InvalidState { .. } => "invalid_state",
                Error::Config { .. } => "config",
            };
            format_json(&ErrorOutput {
                kind,
                message: error.to_string(),
            })
        }
    }
}

fn push_warnings(output: &mut String, warnings: &[Warning]) {
    if warnings.is_empty() {
        return;
    }
    let _ = writeln!(output, "Warnings ({}):", warnings.len());
    for warning in warnings {
        let _ = writeln!(output, "  chunk {}: {}", warning.chunk_index, warning.message);
    }
}

/// Formats a value as JSON.
fn format_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string())
}

/// Formats a byte size as human-readable.
#[allow(clippy::cast_precision_loss)]
fn format_size(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{bytes} B")
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}

/// Truncates a string to `max_chars` characters with ellipsis.
fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else if max_chars <= 3 {
        s.chars().take(max_chars).collect()
    } else {
        let head: String = s.chars().take(max_chars - 3).collect();
        format!("{head}...")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::DocumentStatus;
    use crate::error::{BoundaryError, CommandError};

    #[test]
    fn test_output_format_from_str() {
        assert_eq!(OutputFormat::parse("json"), OutputFormat::Json);
        assert_eq!(OutputFormat::parse("JSON"), OutputFormat::Json);
        assert_eq!(OutputFormat::parse("text"), OutputFormat::Text);
        assert_eq!(OutputFormat::parse("unknown"), OutputFormat::Text);
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(100), "100 B");
        assert_eq!(format_size(1024), "1.0 KB");
        assert_eq!(format_size(1024 * 1024), "1.0 MB");
    }

    #[test]
    fn test_truncate_counts_chars() {
        assert_eq!(truncate("Hello", 10), "Hello");
        assert_eq!(truncate("Hello World", 8), "Hello...");
        assert_eq!(truncate("héllo wörld", 8), "héllo...");
    }

    #[test]
    fn test_format_status() {
        let stats = StorageStats {
            document_count: 3,
            processed: 2,
            failed: 1,
            chunk_count: 10,
            schema_version: 2,
            db_size: Some(4096),
            ..StorageStats::default()
        };

        let text = format_status(&stats, OutputFormat::Text);
        assert!(text.contains("Documents:     3"));
        assert!(text.contains("Chunks:        10"));

        let json = format_status(&stats, OutputFormat::Json);
        assert!(json.contains("\"document_count\": 3"));
    }

    #[test]
    fn test_format_document_list() {
        let mut doc = Document::new("a.txt", "Hello world.".into());
        doc.id = Some(7);
        doc.status = DocumentStatus::Failed;

        let text = format_document_list(&[doc.clone()], OutputFormat::Text);
        assert!(text.contains("a.txt"));
        assert!(text.contains("failed"));

        let json = format_document_list(&[doc], OutputFormat::Json);
        assert!(json.contains("\"status\": \"failed\""));
        assert_eq!(
            format_document_list(&[], OutputFormat::Text),
            "No documents found.\n"
        );
    }

    #[test]
    fn test_format_error_json_kind() {
        let error: Error = BoundaryError::ChunkTooLong {
            chunk_index: 0,
            length: 30,
            max: 20,
        }
        .into();
        let json = format_error(&error, OutputFormat::Json);
        assert!(json.contains("\"kind\": \"boundary\""));
        assert!(json.contains("exceeds maximum 20"));

        let error: Error = CommandError::InvalidArgument("bad".into()).into();
        assert_eq!(format_error(&error, OutputFormat::Text), error.to_string());
    }
}
