//! Error types for the moat pipeline.
//!
//! Validation failures are raised when value objects are constructed. The
//! scoring, portfolio and evaluation stages themselves resolve degenerate input
//! with fallbacks and do not return these errors.

use thiserror::Error;

/// The main error type for moat operations.
#[derive(Debug, Error)]
pub enum MoatError {
    /// A ticker string failed validation.
    #[error("Invalid ticker {0:?}")]
    InvalidTicker(String),

    /// A probability-like field fell outside `[0, 1]` or was not finite.
    #[error("{field} must be within [0, 1], got {value}")]
    OutOfUnitRange {
        /// Name of the offending field.
        field: &'static str,
        /// The rejected value.
        value: f64,
    },

    /// A confidence adjustment fell outside `[-1, 1]` or was not finite.
    #[error("Adjustment from {source_name:?} must be within [-1, 1], got {value}")]
    InvalidAdjustment {
        /// Source that produced the adjustment.
        source_name: String,
        /// The rejected value.
        value: f64,
    },

    /// A rule identifier could not be parsed.
    #[error("Unknown rule identifier: {0}")]
    InvalidRule(String),

    /// A required text field was empty.
    #[error("Empty field: {0}")]
    EmptyField(&'static str),

    /// Error due to invalid or malformed data.
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Error when a required column is missing from a frame.
    #[error("Missing required column: {0}")]
    MissingColumn(String),

    /// Error from Polars operations.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),
}

/// A specialized Result type for moat operations.
pub type Result<T> = std::result::Result<T, MoatError>;

/// Reject values outside `[0, 1]`, including NaN and infinities.
pub(crate) fn ensure_unit(field: &'static str, value: f64) -> Result<f64> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(MoatError::OutOfUnitRange { field, value })
    }
}
