//! In-process curve store.
//!
//! Thread-safe, so independent recordings can be processed from several
//! threads at once. Each commit happens under a single write lock.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::NaiveDate;
use uuid::Uuid;

use crate::curve::types::PowerCurve;
use crate::recording::types::{ProcessingStatus, Recording};
use crate::storage::database::DatabaseError;
use crate::storage::store::CurveStore;

#[derive(Debug, Clone)]
struct Entry {
    recording: Recording,
    curve: PowerCurve,
}

/// Curve store kept entirely in memory.
#[derive(Debug, Default)]
pub struct MemoryCurveStore {
    entries: RwLock<HashMap<Uuid, Entry>>,
}

impl MemoryCurveStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of recordings held.
    pub fn len(&self) -> Result<usize, DatabaseError> {
        Ok(self.read()?.len())
    }

    /// Check if the store holds no recordings.
    pub fn is_empty(&self) -> Result<bool, DatabaseError> {
        Ok(self.read()?.is_empty())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, HashMap<Uuid, Entry>>, DatabaseError> {
        self.entries
            .read()
            .map_err(|e| DatabaseError::TransactionFailed(e.to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, HashMap<Uuid, Entry>>, DatabaseError> {
        self.entries
            .write()
            .map_err(|e| DatabaseError::TransactionFailed(e.to_string()))
    }

    /// Apply a status transition (and optional new curve) to one entry.
    fn update(
        &self,
        id: &Uuid,
        status: ProcessingStatus,
        curve: Option<PowerCurve>,
    ) -> Result<(), DatabaseError> {
        let mut entries = self.write()?;
        let entry = entries
            .get_mut(id)
            .ok_or_else(|| DatabaseError::NotFound(id.to_string()))?;

        entry
            .recording
            .transition(status)
            .map_err(DatabaseError::ConstraintViolation)?;

        if let Some(curve) = curve {
            entry.curve = curve;
            entry.recording.curve_generation += 1;
        } else if status == ProcessingStatus::Failed {
            entry.curve = PowerCurve::new();
        }

        Ok(())
    }
}

impl CurveStore for MemoryCurveStore {
    fn insert_recording(&self, recording: &Recording) -> Result<(), DatabaseError> {
        let mut entries = self.write()?;
        if entries.contains_key(&recording.id) {
            return Err(DatabaseError::ConstraintViolation(format!(
                "recording {} already exists",
                recording.id
            )));
        }
        entries.insert(
            recording.id,
            Entry {
                recording: recording.clone(),
                curve: PowerCurve::new(),
            },
        );
        Ok(())
    }

    fn get_recording(&self, id: &Uuid) -> Result<Option<Recording>, DatabaseError> {
        Ok(self.read()?.get(id).map(|entry| entry.recording.clone()))
    }

    fn delete_recording(&self, id: &Uuid) -> Result<(), DatabaseError> {
        self.write()?
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| DatabaseError::NotFound(id.to_string()))
    }

    fn set_status(&self, id: &Uuid, status: ProcessingStatus) -> Result<(), DatabaseError> {
        self.update(id, status, None)
    }

    fn commit_curve(&self, id: &Uuid, curve: &PowerCurve) -> Result<(), DatabaseError> {
        self.update(id, ProcessingStatus::Processed, Some(curve.clone()))
    }

    fn commit_failure(&self, id: &Uuid) -> Result<(), DatabaseError> {
        self.update(id, ProcessingStatus::Failed, None)
    }

    fn load_curve(&self, id: &Uuid) -> Result<PowerCurve, DatabaseError> {
        Ok(self
            .read()?
            .get(id)
            .map(|entry| entry.curve.clone())
            .unwrap_or_default())
    }

    fn curves_between(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<(Recording, PowerCurve)>, DatabaseError> {
        let entries = self.read()?;
        let mut result: Vec<(Recording, PowerCurve)> = entries
            .values()
            .filter(|entry| {
                entry
                    .recording
                    .activity_date
                    .is_some_and(|d| start <= d && d <= end)
            })
            .map(|entry| (entry.recording.clone(), entry.curve.clone()))
            .collect();

        result.sort_by_key(|(recording, _)| (recording.activity_date, recording.created_at));
        Ok(result)
    }
}
