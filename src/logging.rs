//! Tracing subscriber setup for the binary.

use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing::Subscriber;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, fmt};

/// Environment variable overriding the log filter.
pub const LOG_ENV: &str = "DOC_SEGMENTER_LOG";

/// File name prefix for daily log files.
pub const LOG_FILE_PREFIX: &str = "doc-segmenter.log";

/// Builds the filter: `DOC_SEGMENTER_LOG` if set, else `info` when verbose
/// and `warn` otherwise.
#[must_use]
pub fn env_filter(verbose: bool) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("info")
        } else {
            EnvFilter::new("warn")
        }
    })
}

/// Installs the global subscriber.
///
/// Events go to stderr. With `log_dir`, they are also written to a daily
/// rolling file at debug level; the returned guard flushes it on drop and
/// must be held until exit. A second call is a no-op.
pub fn init_logging(verbose: bool, log_dir: Option<&Path>) -> Option<WorkerGuard> {
    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(env_filter(verbose));

    let (file_layer, guard) = log_dir.map(file_layer).unzip();

    if let Err(e) = tracing_subscriber::registry()
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
    {
        tracing::debug!(error = %e, "subscriber already installed");
    }

    guard
}

/// Debug-level layer writing to a daily rolling file in `dir`.
fn file_layer<S>(dir: &Path) -> (impl Layer<S> + use<S>, WorkerGuard)
where
    S: Subscriber + for<'span> LookupSpan<'span>,
{
    let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let layer = fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_filter(EnvFilter::new("debug"));
    (layer, guard)
}
