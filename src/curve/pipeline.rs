//! Raw readings to power curve: validation, gap filling, rolling maxima.

use super::error::CurveResult;
use super::gap_fill::{GapFiller, DEFAULT_GAP_THRESHOLD_SECS, DEFAULT_MAX_FILL_SAMPLES};
use super::ingest::clean_samples;
use super::rolling::{RollingCurveCalculator, DEFAULT_ROUNDING_DECIMALS};
use super::types::{PowerCurve, RawSample, Sample, STANDARD_DURATIONS};

/// Tunables of the curve computation.
#[derive(Debug, Clone, PartialEq)]
pub struct CurveConfig {
    /// Window durations in seconds.
    pub durations: Vec<u32>,
    /// Decimal places of reported wattages.
    pub rounding_decimals: u32,
    /// Silences longer than this (seconds) are filled with zero power.
    pub gap_threshold_secs: f64,
    /// Most zero samples gap filling may insert into one recording.
    pub max_fill_samples: usize,
}

impl Default for CurveConfig {
    fn default() -> Self {
        Self {
            durations: STANDARD_DURATIONS.to_vec(),
            rounding_decimals: DEFAULT_ROUNDING_DECIMALS,
            gap_threshold_secs: DEFAULT_GAP_THRESHOLD_SECS,
            max_fill_samples: DEFAULT_MAX_FILL_SAMPLES,
        }
    }
}

/// GapFiller followed by RollingCurveCalculator.
#[derive(Debug, Clone)]
pub struct CurvePipeline {
    filler: GapFiller,
    calculator: RollingCurveCalculator,
}

impl CurvePipeline {
    /// Build a pipeline from configuration.
    pub fn new(config: &CurveConfig) -> Self {
        Self {
            filler: GapFiller::new(config.gap_threshold_secs)
                .with_max_fill_samples(config.max_fill_samples),
            calculator: RollingCurveCalculator::new(&config.durations)
                .with_rounding(config.rounding_decimals),
        }
    }

    /// Pipeline with default settings.
    pub fn standard() -> Self {
        Self::new(&CurveConfig::default())
    }

    /// Compute a curve from unvalidated readings.
    pub fn run(&self, raw: &[RawSample]) -> CurveResult<PowerCurve> {
        self.run_samples(clean_samples(raw))
    }

    /// Compute a curve from validated, possibly unordered samples.
    pub fn run_samples(&self, samples: Vec<Sample>) -> CurveResult<PowerCurve> {
        let filled = self.filler.fill(samples)?;
        self.calculator.calculate(&filled)
    }
}

impl Default for CurvePipeline {
    fn default() -> Self {
        Self::standard()
    }
}
