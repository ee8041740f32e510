//! Recording types and processing status.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Processing status of a recording.
///
/// `pending -> processing -> {processed | failed}`. Entering `processing` is
/// always allowed so terminal recordings can be reprocessed and a recording
/// left `processing` by an interrupted run can be retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessingStatus {
    /// Created, not yet processed
    #[default]
    Pending,
    /// Curve calculation in progress
    Processing,
    /// Curve points stored (possibly none)
    Processed,
    /// Calculation or sample loading failed
    Failed,
}

impl ProcessingStatus {
    /// Database/string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessingStatus::Pending => "pending",
            ProcessingStatus::Processing => "processing",
            ProcessingStatus::Processed => "processed",
            ProcessingStatus::Failed => "failed",
        }
    }

    /// Whether moving from `self` to `next` is a valid transition.
    pub fn can_transition_to(&self, next: ProcessingStatus) -> bool {
        matches!(
            (self, next),
            (_, ProcessingStatus::Processing)
                | (
                    ProcessingStatus::Processing,
                    ProcessingStatus::Processed | ProcessingStatus::Failed
                )
        )
    }

    /// Whether the status is final until reprocessing is requested.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ProcessingStatus::Processed | ProcessingStatus::Failed)
    }
}

impl std::fmt::Display for ProcessingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ProcessingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ProcessingStatus::Pending),
            "processing" => Ok(ProcessingStatus::Processing),
            "processed" => Ok(ProcessingStatus::Processed),
            "failed" => Ok(ProcessingStatus::Failed),
            other => Err(format!("unknown processing status: {}", other)),
        }
    }
}

/// An activity recording whose power curve is managed by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recording {
    /// Unique identifier
    pub id: Uuid,
    /// Optional display name (e.g. the uploaded file name)
    pub label: Option<String>,
    /// Date of the activity, used for range queries
    pub activity_date: Option<NaiveDate>,
    /// Current processing status
    pub status: ProcessingStatus,
    /// Incremented every time a new curve snapshot is committed
    pub curve_generation: u64,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp
    pub updated_at: DateTime<Utc>,
}

impl Recording {
    /// Create a new pending recording.
    pub fn new(activity_date: Option<NaiveDate>) -> Self {
        Self::with_id(Uuid::new_v4(), activity_date)
    }

    /// Create a new pending recording with a caller-chosen identifier.
    pub fn with_id(id: Uuid, activity_date: Option<NaiveDate>) -> Self {
        let now = Utc::now();
        Self {
            id,
            label: None,
            activity_date,
            status: ProcessingStatus::Pending,
            curve_generation: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Attach a display name.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Move to `next`, rejecting invalid transitions.
    pub fn transition(&mut self, next: ProcessingStatus) -> Result<(), String> {
        if !self.status.can_transition_to(next) {
            return Err(format!(
                "recording {} cannot move from {} to {}",
                self.id, self.status, next
            ));
        }
        self.status = next;
        self.updated_at = Utc::now();
        Ok(())
    }
}
