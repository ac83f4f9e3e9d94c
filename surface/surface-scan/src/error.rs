//! Error types for scan sessions and surface passes.

use surface_planes::PlaneError;
use thiserror::Error;

/// Result type for scan operations.
pub type ScanResult<T> = Result<T, ScanError>;

/// Errors that can occur while running a surface pass.
///
/// An unavailable scan provider is not an error; the pass is reported as
/// skipped instead.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ScanError {
    /// Another pass is still running.
    #[error("a surface pass is already in flight")]
    PassInFlight,

    /// The pass was cancelled before it could publish its planes.
    #[error("surface pass cancelled")]
    Cancelled,

    /// A parameter is outside its valid range.
    #[error("invalid parameter: {reason}")]
    InvalidParameter {
        /// Description of why the parameter is invalid.
        reason: String,
    },

    /// Plane extraction or classification failed.
    #[error(transparent)]
    Plane(#[from] PlaneError),
}

impl ScanError {
    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            reason: reason.into(),
        }
    }
}
