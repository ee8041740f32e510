//! SQLite-backed curve store.
//!
//! Persists:
//! - Recordings with their processing status and curve generation
//! - Per-duration curve points, at most one row per (recording, duration)

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use crate::curve::types::{CurvePoint, PowerCurve};
use crate::recording::types::{ProcessingStatus, Recording};
use crate::storage::database::DatabaseError;
use crate::storage::store::{check_transition, CurveStore};

/// Curve store over a SQLite connection.
pub struct SqliteCurveStore<'a> {
    conn: &'a Connection,
}

impl<'a> SqliteCurveStore<'a> {
    /// Create a new curve store with the given connection.
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// List all recordings, newest activity first.
    pub fn list_recordings(&self) -> Result<Vec<Recording>, DatabaseError> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT id, label, activity_date, processing_status, curve_generation,
                 created_at, updated_at FROM recordings
                 ORDER BY activity_date DESC, created_at DESC",
            )
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

        let rows = stmt
            .query_map([], RecordingRow::from_row)
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

        let mut recordings = Vec::new();
        for row in rows {
            let row = row.map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;
            recordings.push(row.into_recording()?);
        }
        Ok(recordings)
    }

    /// Current status of a recording.
    fn current_status(
        conn: &Connection,
        id: &Uuid,
    ) -> Result<ProcessingStatus, DatabaseError> {
        let status: Option<String> = conn
            .query_row(
                "SELECT processing_status FROM recordings WHERE id = ?1",
                params![id.to_string()],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

        status
            .ok_or_else(|| DatabaseError::NotFound(id.to_string()))?
            .parse()
            .map_err(DatabaseError::DeserializationError)
    }

    fn update_status(
        conn: &Connection,
        id: &Uuid,
        status: ProcessingStatus,
    ) -> Result<(), DatabaseError> {
        conn.execute(
            "UPDATE recordings SET processing_status = ?2, updated_at = ?3 WHERE id = ?1",
            params![id.to_string(), status.as_str(), Utc::now().to_rfc3339()],
        )
        .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;
        Ok(())
    }

    fn delete_points(conn: &Connection, id: &Uuid) -> Result<usize, DatabaseError> {
        conn.execute(
            "DELETE FROM curve_points WHERE recording_id = ?1",
            params![id.to_string()],
        )
        .map_err(|e| DatabaseError::QueryFailed(e.to_string()))
    }
}

impl CurveStore for SqliteCurveStore<'_> {
    fn insert_recording(&self, recording: &Recording) -> Result<(), DatabaseError> {
        self.conn
            .execute(
                "INSERT INTO recordings (id, label, activity_date, processing_status,
                 curve_generation, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    recording.id.to_string(),
                    recording.label,
                    recording.activity_date.map(|d| d.to_string()),
                    recording.status.as_str(),
                    recording.curve_generation as i64,
                    recording.created_at.to_rfc3339(),
                    recording.updated_at.to_rfc3339(),
                ],
            )
            .map_err(|e| match e {
                rusqlite::Error::SqliteFailure(err, _)
                    if err.code == rusqlite::ErrorCode::ConstraintViolation =>
                {
                    DatabaseError::ConstraintViolation(format!(
                        "recording {} already exists",
                        recording.id
                    ))
                }
                other => DatabaseError::QueryFailed(other.to_string()),
            })?;

        Ok(())
    }

    fn get_recording(&self, id: &Uuid) -> Result<Option<Recording>, DatabaseError> {
        let row = self
            .conn
            .query_row(
                "SELECT id, label, activity_date, processing_status, curve_generation,
                 created_at, updated_at FROM recordings WHERE id = ?1",
                params![id.to_string()],
                RecordingRow::from_row,
            )
            .optional()
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

        row.map(RecordingRow::into_recording).transpose()
    }

    fn delete_recording(&self, id: &Uuid) -> Result<(), DatabaseError> {
        let tx = self
            .conn
            .unchecked_transaction()
            .map_err(|e| DatabaseError::TransactionFailed(e.to_string()))?;

        Self::delete_points(&tx, id)?;
        let deleted = tx
            .execute("DELETE FROM recordings WHERE id = ?1", params![id.to_string()])
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

        if deleted == 0 {
            return Err(DatabaseError::NotFound(id.to_string()));
        }

        tx.commit()
            .map_err(|e| DatabaseError::TransactionFailed(e.to_string()))?;
        Ok(())
    }

    fn set_status(&self, id: &Uuid, status: ProcessingStatus) -> Result<(), DatabaseError> {
        let tx = self
            .conn
            .unchecked_transaction()
            .map_err(|e| DatabaseError::TransactionFailed(e.to_string()))?;

        let current = Self::current_status(&tx, id)?;
        check_transition(id, current, status)?;
        Self::update_status(&tx, id, status)?;

        tx.commit()
            .map_err(|e| DatabaseError::TransactionFailed(e.to_string()))?;
        Ok(())
    }

    fn commit_curve(&self, id: &Uuid, curve: &PowerCurve) -> Result<(), DatabaseError> {
        let tx = self
            .conn
            .unchecked_transaction()
            .map_err(|e| DatabaseError::TransactionFailed(e.to_string()))?;

        let current = Self::current_status(&tx, id)?;
        check_transition(id, current, ProcessingStatus::Processed)?;

        tx.execute(
            "UPDATE recordings SET curve_generation = curve_generation + 1 WHERE id = ?1",
            params![id.to_string()],
        )
        .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

        let generation: i64 = tx
            .query_row(
                "SELECT curve_generation FROM recordings WHERE id = ?1",
                params![id.to_string()],
                |row| row.get(0),
            )
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

        Self::delete_points(&tx, id)?;
        {
            let mut stmt = tx
                .prepare(
                    "INSERT INTO curve_points (recording_id, duration_secs, power_watts, generation)
                     VALUES (?1, ?2, ?3, ?4)",
                )
                .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

            for point in curve.iter() {
                stmt.execute(params![
                    id.to_string(),
                    point.duration_secs,
                    point.power_watts,
                    generation,
                ])
                .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;
            }
        }

        Self::update_status(&tx, id, ProcessingStatus::Processed)?;

        tx.commit()
            .map_err(|e| DatabaseError::TransactionFailed(e.to_string()))?;
        Ok(())
    }

    fn commit_failure(&self, id: &Uuid) -> Result<(), DatabaseError> {
        let tx = self
            .conn
            .unchecked_transaction()
            .map_err(|e| DatabaseError::TransactionFailed(e.to_string()))?;

        let current = Self::current_status(&tx, id)?;
        check_transition(id, current, ProcessingStatus::Failed)?;

        Self::delete_points(&tx, id)?;
        Self::update_status(&tx, id, ProcessingStatus::Failed)?;

        tx.commit()
            .map_err(|e| DatabaseError::TransactionFailed(e.to_string()))?;
        Ok(())
    }

    fn load_curve(&self, id: &Uuid) -> Result<PowerCurve, DatabaseError> {
        // Only points of the recording's current generation form its curve
        let mut stmt = self
            .conn
            .prepare(
                "SELECT p.duration_secs, p.power_watts FROM curve_points p
                 JOIN recordings r ON r.id = p.recording_id
                 WHERE p.recording_id = ?1 AND p.generation = r.curve_generation
                 ORDER BY p.duration_secs",
            )
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

        let rows = stmt
            .query_map(params![id.to_string()], |row| {
                Ok(CurvePoint {
                    duration_secs: row.get(0)?,
                    power_watts: row.get(1)?,
                })
            })
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

        let points = rows
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;
        Ok(PowerCurve::from_points(points))
    }

    fn curves_between(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<(Recording, PowerCurve)>, DatabaseError> {
        // One read transaction so every recording is seen with a complete curve
        let tx = self
            .conn
            .unchecked_transaction()
            .map_err(|e| DatabaseError::TransactionFailed(e.to_string()))?;

        let recordings = {
            let mut stmt = tx
                .prepare(
                    "SELECT id, label, activity_date, processing_status, curve_generation,
                     created_at, updated_at FROM recordings
                     WHERE activity_date >= ?1 AND activity_date <= ?2
                     ORDER BY activity_date, created_at",
                )
                .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

            let rows = stmt
                .query_map(
                    params![start.to_string(), end.to_string()],
                    RecordingRow::from_row,
                )
                .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

            let mut recordings = Vec::new();
            for row in rows {
                let row = row.map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;
                recordings.push(row.into_recording()?);
            }
            recordings
        };

        let mut result = Vec::with_capacity(recordings.len());
        for recording in recordings {
            let curve = SqliteCurveStore::new(&tx).load_curve(&recording.id)?;
            result.push((recording, curve));
        }

        tx.commit()
            .map_err(|e| DatabaseError::TransactionFailed(e.to_string()))?;
        Ok(result)
    }
}

/// Intermediate struct for reading recording rows.
struct RecordingRow {
    id: String,
    label: Option<String>,
    activity_date: Option<String>,
    processing_status: String,
    curve_generation: i64,
    created_at: String,
    updated_at: String,
}

impl RecordingRow {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            label: row.get(1)?,
            activity_date: row.get(2)?,
            processing_status: row.get(3)?,
            curve_generation: row.get(4)?,
            created_at: row.get(5)?,
            updated_at: row.get(6)?,
        })
    }

    fn into_recording(self) -> Result<Recording, DatabaseError> {
        let id = Uuid::parse_str(&self.id)
            .map_err(|e| DatabaseError::DeserializationError(e.to_string()))?;

        let activity_date = self
            .activity_date
            .map(|d| NaiveDate::parse_from_str(&d, "%Y-%m-%d"))
            .transpose()
            .map_err(|e| DatabaseError::DeserializationError(e.to_string()))?;

        let status = self
            .processing_status
            .parse()
            .map_err(DatabaseError::DeserializationError)?;

        Ok(Recording {
            id,
            label: self.label,
            activity_date,
            status,
            curve_generation: self.curve_generation.max(0) as u64,
            created_at: parse_timestamp(&self.created_at)?,
            updated_at: parse_timestamp(&self.updated_at)?,
        })
    }
}

fn parse_timestamp(text: &str) -> Result<DateTime<Utc>, DatabaseError> {
    DateTime::parse_from_rfc3339(text)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| DatabaseError::DeserializationError(e.to_string()))
}
