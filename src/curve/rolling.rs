//! Mean maximal power extraction over time-based rolling windows.
//!
//! For each configured duration `d`, a window covering `(t - d, t]` is slid
//! across the samples. A window position only counts once it holds at least
//! `d` samples, so a short recording cannot report an inflated value for a
//! duration it never actually covered. All durations are advanced together
//! in a single pass, each with its own two-pointer window and running sum.

use super::error::{CurveError, CurveResult};
use super::types::{PowerCurve, Sample, STANDARD_DURATIONS};

/// Default number of decimal places for reported wattages.
pub const DEFAULT_ROUNDING_DECIMALS: u32 = 1;

/// Evictions after which a window sum is recomputed from its samples.
const RESYNC_INTERVAL: usize = 8192;

/// Finest supported rounding precision.
pub const MAX_ROUNDING_DECIMALS: u32 = 6;

/// Round to a fixed number of decimal places (at most [`MAX_ROUNDING_DECIMALS`]).
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let decimals = decimals.min(MAX_ROUNDING_DECIMALS);
    if decimals == 0 {
        return value.round();
    }
    let factor = 10_f64.powi(decimals as i32);
    let scaled = value * factor;
    if !scaled.is_finite() {
        return value;
    }
    scaled.round() / factor
}

/// Neumaier-compensated running sum.
#[derive(Debug, Clone, Copy, Default)]
struct CompensatedSum {
    sum: f64,
    compensation: f64,
}

impl CompensatedSum {
    fn add(&mut self, x: f64) {
        let t = self.sum + x;
        if self.sum.abs() >= x.abs() {
            self.compensation += (self.sum - t) + x;
        } else {
            self.compensation += (x - t) + self.sum;
        }
        self.sum = t;
    }

    fn sub(&mut self, x: f64) {
        self.add(-x);
    }

    fn value(&self) -> f64 {
        self.sum + self.compensation
    }

    fn of(values: &[f64]) -> Self {
        let mut acc = Self::default();
        for &v in values {
            acc.add(v);
        }
        acc
    }
}

/// Sliding window state for one duration.
#[derive(Debug, Clone)]
struct WindowState {
    duration_secs: u32,
    span_millis: i64,
    /// Index of the oldest sample inside the window.
    start: usize,
    sum: CompensatedSum,
    evictions: usize,
    best: Option<f64>,
    non_finite: bool,
}

impl WindowState {
    fn new(duration_secs: u32) -> Self {
        Self {
            duration_secs,
            span_millis: i64::from(duration_secs) * 1000,
            start: 0,
            sum: CompensatedSum::default(),
            evictions: 0,
            best: None,
            non_finite: false,
        }
    }

    /// Extend the window to end at sample `end` and record its average.
    fn advance(&mut self, end: usize, offsets: &[i64], powers: &[f64]) {
        self.sum.add(powers[end]);

        let cutoff = offsets[end] - self.span_millis;
        while offsets[self.start] <= cutoff {
            self.sum.sub(powers[self.start]);
            self.start += 1;
            self.evictions += 1;
        }

        if self.evictions >= RESYNC_INTERVAL {
            self.sum = CompensatedSum::of(&powers[self.start..=end]);
            self.evictions = 0;
        }

        let count = end - self.start + 1;
        if count >= self.duration_secs as usize {
            let avg = self.sum.value() / count as f64;
            if avg.is_finite() {
                self.best = Some(self.best.map_or(avg, |best| best.max(avg)));
            } else {
                self.non_finite = true;
            }
        }
    }
}

/// Calculator for the maximum average power at each window duration.
#[derive(Debug, Clone)]
pub struct RollingCurveCalculator {
    /// Durations to calculate (seconds), ascending.
    durations: Vec<u32>,
    /// Decimal places of reported values.
    rounding_decimals: u32,
}

impl RollingCurveCalculator {
    /// Create a calculator for the given durations.
    pub fn new(durations: &[u32]) -> Self {
        let mut durations: Vec<u32> = durations.iter().copied().filter(|&d| d > 0).collect();
        durations.sort_unstable();
        durations.dedup();
        Self {
            durations,
            rounding_decimals: DEFAULT_ROUNDING_DECIMALS,
        }
    }

    /// Create with the standard durations (1s to 90min).
    pub fn standard() -> Self {
        Self::new(&STANDARD_DURATIONS)
    }

    /// Report values rounded to `decimals` places, capped at
    /// [`MAX_ROUNDING_DECIMALS`].
    pub fn with_rounding(mut self, decimals: u32) -> Self {
        self.rounding_decimals = decimals.min(MAX_ROUNDING_DECIMALS);
        self
    }

    /// Configured durations.
    pub fn durations(&self) -> &[u32] {
        &self.durations
    }

    /// Configured rounding precision.
    pub fn rounding_decimals(&self) -> u32 {
        self.rounding_decimals
    }

    /// Calculate the curve from time-ordered samples.
    ///
    /// Durations no window qualifies for are absent. An empty input yields an
    /// empty curve. Unordered input or a non-finite average is reported as
    /// [`CurveError::CalculationFailed`].
    pub fn calculate(&self, samples: &[Sample]) -> CurveResult<PowerCurve> {
        let Some(first) = samples.first() else {
            return Ok(PowerCurve::new());
        };

        if samples.windows(2).any(|w| w[1].timestamp < w[0].timestamp) {
            return Err(CurveError::CalculationFailed(
                "samples are not in time order".to_string(),
            ));
        }

        let offsets: Vec<i64> = samples
            .iter()
            .map(|s| (s.timestamp - first.timestamp).num_milliseconds())
            .collect();
        let powers: Vec<f64> = samples.iter().map(|s| s.power_watts).collect();

        // A duration needing more samples than exist can never qualify
        let mut states: Vec<WindowState> = self
            .durations
            .iter()
            .filter(|&&d| d as usize <= samples.len())
            .map(|&d| WindowState::new(d))
            .collect();

        for end in 0..samples.len() {
            for state in &mut states {
                state.advance(end, &offsets, &powers);
            }
        }

        let mut curve = PowerCurve::new();
        for state in states {
            if state.non_finite {
                return Err(CurveError::CalculationFailed(format!(
                    "non-finite average for {}s window",
                    state.duration_secs
                )));
            }
            let Some(best) = state.best else {
                continue;
            };
            curve.insert(state.duration_secs, round_to(best, self.rounding_decimals));
        }

        tracing::debug!(
            "Calculated {} curve points from {} samples",
            curve.len(),
            samples.len()
        );

        Ok(curve)
    }

    /// Calculate a single duration (for focused queries).
    pub fn calculate_single(
        &self,
        samples: &[Sample],
        duration_secs: u32,
    ) -> CurveResult<Option<f64>> {
        let curve = Self::new(&[duration_secs])
            .with_rounding(self.rounding_decimals)
            .calculate(samples)?;
        Ok(curve.get(duration_secs))
    }
}

impl Default for RollingCurveCalculator {
    fn default() -> Self {
        Self::standard()
    }
}
