//! Cross-recording aggregation.
//!
//! Reduces the stored curves of every processed recording in a date range to
//! a single curve holding, per duration, the best value any recording
//! reached. Raw samples are never re-read.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::error::{CurveError, CurveResult};
use super::types::PowerCurve;
use crate::recording::types::ProcessingStatus;
use crate::storage::store::CurveStore;

/// Inclusive range of activity dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    /// Create a range; `start` must not be after `end`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> CurveResult<Self> {
        if start > end {
            return Err(CurveError::InvalidRange(format!(
                "start date {} is after end date {}",
                start, end
            )));
        }
        Ok(Self { start, end })
    }

    /// First day of the range.
    pub fn start(&self) -> NaiveDate {
        self.start
    }

    /// Last day of the range.
    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Whether a date falls inside the range.
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// Per-duration maximum over a set of curves.
pub fn merge_curves<'c>(curves: impl IntoIterator<Item = &'c PowerCurve>) -> PowerCurve {
    let mut merged = PowerCurve::new();
    for curve in curves {
        merged.merge_max(curve);
    }
    merged
}

/// Computes range curves from persisted per-recording points.
pub struct RangeAggregator<'a, S: CurveStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: CurveStore + ?Sized> RangeAggregator<'a, S> {
    /// Create an aggregator reading from the given store.
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Best value per duration across processed recordings in `range`.
    ///
    /// Recordings that are not `processed`, or whose activity date is
    /// unknown or outside the range, are ignored. No qualifying data yields
    /// an empty curve.
    pub fn aggregate(&self, range: &DateRange) -> CurveResult<PowerCurve> {
        let candidates = self.store.curves_between(range.start(), range.end())?;

        let qualifying: Vec<&PowerCurve> = candidates
            .iter()
            .filter(|(recording, _)| {
                recording.status == ProcessingStatus::Processed
                    && recording.activity_date.is_some_and(|d| range.contains(d))
            })
            .map(|(_, curve)| curve)
            .collect();

        let merged = merge_curves(qualifying.iter().copied());

        tracing::info!(
            "Aggregated {} of {} recordings between {} and {} into {} curve points",
            qualifying.len(),
            candidates.len(),
            range.start(),
            range.end(),
            merged.len()
        );

        Ok(merged)
    }
}
