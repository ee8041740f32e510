//! Power curve engine error types.

use thiserror::Error;
use uuid::Uuid;

use crate::storage::database::DatabaseError;

/// Errors that can occur while computing or persisting power curves.
///
/// Missing or insufficient data is never an error; it yields an empty curve.
#[derive(Debug, Error)]
pub enum CurveError {
    /// Unexpected numeric fault during the rolling calculation.
    #[error("Calculation failed: {0}")]
    CalculationFailed(String),

    /// The recording's sample payload could not be read.
    #[error("Sample source unavailable: {0}")]
    SourceUnavailable(String),

    /// No recording with this identifier exists.
    #[error("Recording not found: {0}")]
    RecordingNotFound(Uuid),

    /// Date range with start after end.
    #[error("Invalid range: {0}")]
    InvalidRange(String),

    /// Storage error.
    #[error("Storage error: {0}")]
    Storage(#[from] DatabaseError),
}

/// Result type for power curve operations.
pub type CurveResult<T> = Result<T, CurveError>;
