//! Error types for solving one task instance and for the run loop.
//!
//! [`SolveError`] is returned by the oracle, the task provider and the search engine;
//! [`RunError`] wraps it for the run loop together with persistence failures.

use std::path::PathBuf;

use thiserror::Error;

/// Failure while solving one task instance.
///
/// Not recovered locally: the run loop propagates it and stops the run.
#[derive(Debug, Error)]
pub enum SolveError {
    /// The generation oracle failed (API error, empty response, bad request).
    #[error("oracle failed: {0}")]
    Oracle(String),

    /// The task provider could not serve the request (e.g. index out of range).
    #[error("task failed: {0}")]
    Task(String),

    /// The reflection generator failed.
    #[error("reflection failed: {0}")]
    Reflection(String),
}

/// Failure of a whole run over an index range.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("solve: {0}")]
    Solve(#[from] SolveError),

    #[error("io on {}: {}", .path.display(), .source)]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("serialization: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid instance range [{start}, {end})")]
    InvalidRange { start: usize, end: usize },

    #[error("config: {0}")]
    Config(String),
}

impl RunError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        RunError::Io {
            path: path.into(),
            source,
        }
    }
}
