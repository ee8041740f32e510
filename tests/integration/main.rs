//! Integration tests for the power curve engine.

mod aggregation_test;
mod concurrency_test;
mod processing_test;
mod properties_test;

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use powercurve::curve::RawSample;

/// Ride start used by every fixture.
pub fn ride_start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 15, 8, 0, 0).unwrap()
}

/// One reading per second starting at [`ride_start`].
pub fn one_hz(powers: &[f64]) -> Vec<RawSample> {
    powers
        .iter()
        .enumerate()
        .map(|(i, &p)| RawSample::new(ride_start() + Duration::seconds(i as i64), p))
        .collect()
}

/// Readings at explicit second offsets from [`ride_start`].
pub fn at_offsets(readings: &[(i64, f64)]) -> Vec<RawSample> {
    readings
        .iter()
        .map(|&(secs, p)| RawSample::new(ride_start() + Duration::seconds(secs), p))
        .collect()
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}
