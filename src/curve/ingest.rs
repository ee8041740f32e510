//! Validation of raw sensor readings.
//!
//! Readings with a missing or unparsable timestamp, or a missing,
//! non-numeric, non-finite or negative power value are dropped. They are
//! never treated as zero.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::Value;

use super::types::{RawSample, Sample};

/// Naive timestamp layouts accepted in addition to RFC 3339 (taken as UTC).
const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Convert raw readings into valid samples, preserving input order.
pub fn clean_samples(raw: &[RawSample]) -> Vec<Sample> {
    let samples: Vec<Sample> = raw.iter().filter_map(clean_sample).collect();

    let dropped = raw.len() - samples.len();
    if dropped > 0 {
        tracing::warn!(
            "Dropped {} of {} readings with invalid timestamp or power",
            dropped,
            raw.len()
        );
    }

    samples
}

/// Validate a single reading.
pub fn clean_sample(raw: &RawSample) -> Option<Sample> {
    let timestamp = parse_timestamp(raw.timestamp.as_deref()?)?;
    let power_watts = parse_power(raw.power.as_ref()?)?;
    Some(Sample::new(timestamp, power_watts))
}

/// Parse an RFC 3339 or naive ISO-8601 timestamp.
pub fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }

    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .map(|naive| naive.and_utc())
}

/// Parse a power value from a JSON number or numeric string.
pub fn parse_power(value: &Value) -> Option<f64> {
    let power = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };

    (power.is_finite() && power >= 0.0).then_some(power)
}
