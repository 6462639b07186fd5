//! Tracing initialisation for the CLI: stderr always, plus a log file when requested.
//!
//! - **RUST_LOG**: filter, e.g. `info`, `ponder=debug`. Default `info`, or `debug` when
//!   `verbose` is set.
//! - **`<APP>_LOG_DIR`** (e.g. `PONDER_LOG_DIR`): when set, events are also written to
//!   `<dir>/<app>.log` (plain text, no ANSI) through a non-blocking writer.

use std::path::PathBuf;

use thiserror::Error;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

#[derive(Error, Debug)]
pub enum LogInitError {
    #[error("create log dir {}: {}", .path.display(), .source)]
    LogDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("install subscriber: {0}")]
    Install(#[from] tracing_subscriber::util::TryInitError),
}

fn filter(verbose: bool) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "info" }))
}

/// Name of the env var holding the log directory for `app_name`.
pub fn log_dir_var(app_name: &str) -> String {
    format!("{}_LOG_DIR", app_name.to_uppercase().replace('-', "_"))
}

/// Installs the global subscriber. Keep the returned guard alive until exit so buffered
/// file output is flushed.
pub fn init(app_name: &str, verbose: bool) -> Result<Option<WorkerGuard>, LogInitError> {
    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_filter(filter(verbose));

    let Some(dir) = std::env::var_os(log_dir_var(app_name)).map(PathBuf::from) else {
        tracing_subscriber::registry().with(stderr_layer).try_init()?;
        return Ok(None);
    };

    std::fs::create_dir_all(&dir).map_err(|source| LogInitError::LogDir {
        path: dir.clone(),
        source,
    })?;
    let appender = tracing_appender::rolling::never(&dir, format!("{}.log", app_name));
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_filter(filter(verbose));
    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(file_layer)
        .try_init()?;
    tracing::info!(path = %dir.display(), "logging to file");
    Ok(Some(guard))
}
