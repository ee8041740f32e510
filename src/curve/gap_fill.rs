//! Sensor silence handling.
//!
//! Power meters often stop transmitting while coasting or stopped. Those
//! silences must count as zero output, otherwise the rolling averages over
//! a sparse recording would overstate sustained power.

use chrono::Duration;

use super::error::{CurveError, CurveResult};
use super::types::Sample;

/// Default gap (seconds) above which zero-power samples are inserted.
pub const DEFAULT_GAP_THRESHOLD_SECS: f64 = 1.0;

/// Default cap on synthetic samples per recording (one week at 1 Hz).
pub const DEFAULT_MAX_FILL_SAMPLES: usize = 7 * 24 * 3600;

/// Spacing of inserted zero-power samples (seconds).
const FILL_STEP_SECS: i64 = 1;

/// Normalizes an irregular sample sequence by filling silences with zeros.
#[derive(Debug, Clone, Copy)]
pub struct GapFiller {
    threshold: Duration,
    max_fill_samples: usize,
}

impl GapFiller {
    /// Create a filler that treats gaps longer than `threshold_secs` as silence.
    pub fn new(threshold_secs: f64) -> Self {
        let millis = (threshold_secs.max(0.0) * 1000.0).round() as i64;
        Self {
            threshold: Duration::milliseconds(millis),
            max_fill_samples: DEFAULT_MAX_FILL_SAMPLES,
        }
    }

    /// Limit the number of zero samples a single recording may receive.
    pub fn with_max_fill_samples(mut self, max_fill_samples: usize) -> Self {
        self.max_fill_samples = max_fill_samples;
        self
    }

    /// Gap threshold in use.
    pub fn threshold(&self) -> Duration {
        self.threshold
    }

    /// Maximum number of zero samples inserted per recording.
    pub fn max_fill_samples(&self) -> usize {
        self.max_fill_samples
    }

    /// Sort, fill and deduplicate samples.
    ///
    /// For consecutive samples `t` and `t'` more than the threshold apart,
    /// zero-power samples are inserted at `t+1s, t+2s, ...` as long as each
    /// lands at least one second before `t'`. Only the first sample for any
    /// timestamp is kept.
    ///
    /// Fails with [`CurveError::CalculationFailed`] when filling would need
    /// more than the configured number of zero samples, e.g. when a stray
    /// timestamp sits years away from the rest of the recording.
    pub fn fill(&self, mut samples: Vec<Sample>) -> CurveResult<Vec<Sample>> {
        if samples.len() < 2 {
            return Ok(samples);
        }

        // Stable, so the first occurrence of a duplicated timestamp stays first
        samples.sort_by_key(|s| s.timestamp);

        let step = Duration::seconds(FILL_STEP_SECS);
        let needed = samples
            .windows(2)
            .map(|pair| self.zeros_between(pair[0], pair[1], step))
            .try_fold(0u64, u64::checked_add)
            .unwrap_or(u64::MAX);
        if needed > self.max_fill_samples as u64 {
            return Err(CurveError::CalculationFailed(format!(
                "gap filling needs {} zero samples, limit is {}",
                needed, self.max_fill_samples
            )));
        }

        let mut filled = Vec::with_capacity(samples.len() + needed as usize);

        for pair in samples.windows(2) {
            let (prev, next) = (pair[0], pair[1]);
            filled.push(prev);

            if next.timestamp - prev.timestamp > self.threshold {
                let mut t = prev.timestamp + step;
                while next.timestamp - t >= step {
                    filled.push(Sample::zero(t));
                    t += step;
                }
            }
        }
        if let Some(last) = samples.last() {
            filled.push(*last);
        }

        let before_dedup = filled.len();
        filled.dedup_by_key(|s| s.timestamp);

        tracing::debug!(
            "Gap filling inserted {} zero samples, dropped {} duplicate timestamps",
            needed,
            before_dedup - filled.len()
        );

        Ok(filled)
    }

    /// Number of zero samples inserted between two sorted samples.
    fn zeros_between(&self, prev: Sample, next: Sample, step: Duration) -> u64 {
        let gap = next.timestamp - prev.timestamp;
        if gap <= self.threshold || gap < step + step {
            return 0;
        }
        // k steps fit while gap - k * step >= step
        let step_millis = step.num_milliseconds();
        ((gap.num_milliseconds() - step_millis) / step_millis) as u64
    }
}

impl Default for GapFiller {
    fn default() -> Self {
        Self::new(DEFAULT_GAP_THRESHOLD_SECS)
    }
}
