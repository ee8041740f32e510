//! Persistence seam for recordings and their curve points.
//!
//! The engine never talks to a concrete storage engine. Implementations must
//! make [`CurveStore::commit_curve`] and [`CurveStore::commit_failure`]
//! atomic per recording so a reader never observes a half-replaced curve.

use chrono::NaiveDate;
use uuid::Uuid;

use crate::curve::types::PowerCurve;
use crate::recording::types::{ProcessingStatus, Recording};
use crate::storage::database::DatabaseError;

/// Storage for recordings and their per-duration curve points.
pub trait CurveStore {
    /// Register a new recording.
    fn insert_recording(&self, recording: &Recording) -> Result<(), DatabaseError>;

    /// Get a recording by ID.
    fn get_recording(&self, id: &Uuid) -> Result<Option<Recording>, DatabaseError>;

    /// Delete a recording together with its curve points.
    fn delete_recording(&self, id: &Uuid) -> Result<(), DatabaseError>;

    /// Move a recording to `status`, rejecting invalid transitions.
    fn set_status(&self, id: &Uuid, status: ProcessingStatus) -> Result<(), DatabaseError>;

    /// Replace the recording's points with `curve`, mark it `processed` and
    /// bump its curve generation, as one unit.
    fn commit_curve(&self, id: &Uuid, curve: &PowerCurve) -> Result<(), DatabaseError>;

    /// Remove the recording's points and mark it `failed`, as one unit.
    fn commit_failure(&self, id: &Uuid) -> Result<(), DatabaseError>;

    /// Stored curve of a recording (empty if it has no points).
    fn load_curve(&self, id: &Uuid) -> Result<PowerCurve, DatabaseError>;

    /// Recordings dated within `[start, end]` with their stored curves,
    /// regardless of status.
    fn curves_between(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<(Recording, PowerCurve)>, DatabaseError>;
}

/// Reject a status change that the state machine does not allow.
pub(crate) fn check_transition(
    id: &Uuid,
    from: ProcessingStatus,
    to: ProcessingStatus,
) -> Result<(), DatabaseError> {
    if from.can_transition_to(to) {
        Ok(())
    } else {
        Err(DatabaseError::ConstraintViolation(format!(
            "recording {} cannot move from {} to {}",
            id, from, to
        )))
    }
}
