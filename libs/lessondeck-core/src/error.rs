//! Error types for lessondeck-core.

use thiserror::Error;

/// Result type alias using CoreError.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Errors raised while validating domain input.
#[derive(Debug, Error, PartialEq)]
pub enum CoreError {
    #[error("quality rating {0} is outside 0..=5")]
    InvalidQuality(i32),

    #[error("response time must not be negative: {0}ms")]
    NegativeResponseTime(i64),

    #[error("unknown {kind}: {value}")]
    UnknownVariant { kind: &'static str, value: String },

    #[error("{field} must not be empty")]
    EmptyField { field: &'static str },
}
