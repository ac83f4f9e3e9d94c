//! Error types for plane extraction and classification.

use thiserror::Error;

/// Result type for plane operations.
pub type PlaneResult<T> = Result<T, PlaneError>;

/// Errors that can occur during plane extraction or classification.
///
/// Empty or degenerate geometry is never an error: it simply produces no
/// planes. Only misconfiguration is reported.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PlaneError {
    /// A parameter is outside its valid range.
    #[error("invalid parameter: {reason}")]
    InvalidParameter {
        /// Description of why the parameter is invalid.
        reason: String,
    },
}

impl PlaneError {
    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            reason: reason.into(),
        }
    }
}
