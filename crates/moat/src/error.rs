//! Error types for pipeline orchestration.

use thiserror::Error;

/// Errors surfaced by [`Pipeline`](crate::Pipeline) and its configuration.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Validation or data error from a pipeline stage.
    #[error(transparent)]
    Core(#[from] moat_types::MoatError),

    /// Configuration JSON could not be parsed.
    #[error("Invalid pipeline configuration: {0}")]
    Config(#[from] serde_json::Error),

    /// Configuration file could not be read.
    #[error("Failed to read {path}: {source}")]
    Io {
        /// Path being read.
        path: String,
        /// Underlying error.
        source: std::io::Error,
    },

    /// Report writing failed.
    #[error(transparent)]
    Output(#[from] moat_output::OutputError),

    /// A threshold sweep was requested without market data to evaluate against.
    #[error("Threshold sweep requires market data")]
    MissingMarketData,

    /// A sweep threshold was not a finite number.
    #[error("Invalid score threshold: {0}")]
    InvalidThreshold(f64),
}

/// A specialized Result type for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;
