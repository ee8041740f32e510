//! Core data types for power curve computation.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Window durations (seconds) for which a power curve is computed, ascending.
pub const STANDARD_DURATIONS: [u32; 31] = [
    1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 12, 15, 20, 30, 45, // seconds
    60, 75, 90, 120, 150, 180, 240, 300, 420, 600, 900, // 1-15 min
    1200, 1800, 2700, 3600, 5400, // 20-90 min
];

/// A single cleaned power reading.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Instant the reading was taken.
    pub timestamp: DateTime<Utc>,
    /// Instantaneous power in watts (non-negative).
    pub power_watts: f64,
}

impl Sample {
    /// Create a sample at the given instant.
    pub fn new(timestamp: DateTime<Utc>, power_watts: f64) -> Self {
        Self {
            timestamp,
            power_watts,
        }
    }

    /// Synthetic zero-power sample used to fill sensor silences.
    pub fn zero(timestamp: DateTime<Utc>) -> Self {
        Self::new(timestamp, 0.0)
    }
}

/// A reading as handed over by an external parser, before validation.
///
/// Either field may be missing or malformed; see [`crate::curve::ingest`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawSample {
    /// ISO-8601 / RFC 3339 timestamp.
    #[serde(default)]
    pub timestamp: Option<String>,
    /// Power as a JSON number or numeric string.
    #[serde(default)]
    pub power: Option<serde_json::Value>,
}

impl RawSample {
    /// Build a well-formed raw sample from typed values.
    pub fn new(timestamp: DateTime<Utc>, power_watts: f64) -> Self {
        Self {
            timestamp: Some(timestamp.to_rfc3339()),
            power: Some(serde_json::Value::from(power_watts)),
        }
    }
}

impl From<Sample> for RawSample {
    fn from(sample: Sample) -> Self {
        Self::new(sample.timestamp, sample.power_watts)
    }
}

/// Best average power for one window duration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurvePoint {
    /// Window duration in seconds.
    pub duration_secs: u32,
    /// Maximum average power over any window of that duration (watts).
    pub power_watts: f64,
}

/// Power curve: duration (seconds) to maximum average power (watts).
///
/// Serializes as a JSON object keyed by the decimal duration string,
/// e.g. `{"1": 200.0, "60": 250.5}`. Durations without enough data are
/// absent, never zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PowerCurve {
    points: BTreeMap<u32, f64>,
}

impl PowerCurve {
    /// Create an empty curve.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a curve from points. Later points win on duplicate durations.
    pub fn from_points(points: impl IntoIterator<Item = CurvePoint>) -> Self {
        Self {
            points: points
                .into_iter()
                .map(|p| (p.duration_secs, p.power_watts))
                .collect(),
        }
    }

    /// Set the value for a duration.
    pub fn insert(&mut self, duration_secs: u32, power_watts: f64) {
        self.points.insert(duration_secs, power_watts);
    }

    /// Value at an exact duration, if present.
    pub fn get(&self, duration_secs: u32) -> Option<f64> {
        self.points.get(&duration_secs).copied()
    }

    /// Whether a value exists for the duration.
    pub fn contains(&self, duration_secs: u32) -> bool {
        self.points.contains_key(&duration_secs)
    }

    /// Points ordered by duration.
    pub fn points(&self) -> Vec<CurvePoint> {
        self.iter().collect()
    }

    /// Iterate points ordered by duration.
    pub fn iter(&self) -> impl Iterator<Item = CurvePoint> + '_ {
        self.points.iter().map(|(&duration_secs, &power_watts)| CurvePoint {
            duration_secs,
            power_watts,
        })
    }

    /// Durations present, ascending.
    pub fn durations(&self) -> impl Iterator<Item = u32> + '_ {
        self.points.keys().copied()
    }

    /// Longest duration with data.
    pub fn max_duration(&self) -> Option<u32> {
        self.points.keys().next_back().copied()
    }

    /// Raise each duration to `other`'s value where `other` is higher.
    ///
    /// Returns the points that changed.
    pub fn merge_max(&mut self, other: &PowerCurve) -> Vec<CurvePoint> {
        let mut changed = Vec::new();

        for point in other.iter() {
            match self.points.get_mut(&point.duration_secs) {
                Some(existing) if point.power_watts > *existing => {
                    *existing = point.power_watts;
                    changed.push(point);
                }
                Some(_) => {}
                None => {
                    self.points.insert(point.duration_secs, point.power_watts);
                    changed.push(point);
                }
            }
        }

        changed
    }

    /// Check if the curve is empty.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Number of durations with data.
    pub fn len(&self) -> usize {
        self.points.len()
    }
}

impl FromIterator<(u32, f64)> for PowerCurve {
    fn from_iter<I: IntoIterator<Item = (u32, f64)>>(iter: I) -> Self {
        Self {
            points: iter.into_iter().collect(),
        }
    }
}
