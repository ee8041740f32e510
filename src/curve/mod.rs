//! Power curve computation engine.
//!
//! This module provides:
//! - Validation of raw readings and gap filling of sensor silences
//! - Mean maximal power extraction for a fixed set of window durations
//! - Aggregation of per-recording curves over a date range

pub mod aggregate;
pub mod error;
pub mod gap_fill;
pub mod ingest;
pub mod pipeline;
pub mod rolling;
pub mod types;

// Re-exports for convenience
pub use aggregate::{merge_curves, DateRange, RangeAggregator};
pub use error::{CurveError, CurveResult};
pub use gap_fill::GapFiller;
pub use ingest::clean_samples;
pub use pipeline::{CurveConfig, CurvePipeline};
pub use rolling::RollingCurveCalculator;
pub use types::{CurvePoint, PowerCurve, RawSample, Sample, STANDARD_DURATIONS};
