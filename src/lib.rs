//! PowerCurve - Mean Maximal Power Engine
//!
//! Turns timestamped cycling power readings into per-recording power curves
//! (best average power for a set of window durations), persists them, and
//! merges stored curves across a date range into an all-time-best curve.

pub mod curve;
pub mod recording;
pub mod storage;

// Re-export commonly used types
pub use curve::{
    CurveError, CurvePipeline, DateRange, GapFiller, PowerCurve, RangeAggregator,
    RollingCurveCalculator,
};
pub use recording::{ProcessingStatus, Recording, RecordingProcessor};
pub use storage::{CurveStore, Database, MemoryCurveStore, SqliteCurveStore};
