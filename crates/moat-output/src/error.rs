//! Error types for report output.

use thiserror::Error;

/// Errors that can occur while writing reports.
#[derive(Debug, Error)]
pub enum OutputError {
    /// Filesystem operation failed.
    #[error("I/O error on {path}: {source}")]
    Io {
        /// Path being written.
        path: String,
        /// Underlying error.
        source: std::io::Error,
    },

    /// JSON serialization failed.
    #[error("Failed to serialize JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV writing through Polars failed.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// Report formatting failed.
    #[error("Failed to format report: {0}")]
    Fmt(#[from] std::fmt::Error),

    /// Error from the core types.
    #[error(transparent)]
    Core(#[from] moat_types::MoatError),
}

impl OutputError {
    pub(crate) fn io(path: &std::path::Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.display().to_string(),
            source,
        }
    }
}

/// A specialized Result type for output operations.
pub type Result<T> = std::result::Result<T, OutputError>;
