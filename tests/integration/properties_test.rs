//! Property tests for the curve pipeline.

use proptest::prelude::*;

use powercurve::curve::{CurvePipeline, RawSample};

use super::at_offsets;

/// Readings with strictly increasing whole-second offsets.
fn ride() -> impl Strategy<Value = Vec<RawSample>> {
    prop::collection::vec((1i64..=4, 0u16..=1500), 1..400).prop_map(|steps| {
        let mut offset = 0;
        let readings: Vec<(i64, f64)> = steps
            .into_iter()
            .map(|(gap, power)| {
                offset += gap;
                (offset, power as f64)
            })
            .collect();
        at_offsets(&readings)
    })
}

proptest! {
    #[test]
    fn test_longer_multiple_never_beats_shorter(samples in ride()) {
        let curve = CurvePipeline::standard().run(&samples).unwrap();

        for short in curve.durations() {
            for long in curve.durations().filter(|d| *d > short && *d % short == 0) {
                let short_power = curve.get(short).unwrap();
                let long_power = curve.get(long).unwrap();
                prop_assert!(
                    long_power <= short_power + 0.1,
                    "MMP({}) = {} exceeds MMP({}) = {}",
                    long, long_power, short, short_power
                );
            }
        }
    }

    #[test]
    fn test_peak_bounds_every_window(samples in ride()) {
        let curve = CurvePipeline::standard().run(&samples).unwrap();
        let peak = samples
            .iter()
            .filter_map(|s| s.power.as_ref().and_then(|p| p.as_f64()))
            .fold(0.0_f64, f64::max);

        prop_assert_eq!(curve.get(1), Some(peak));
        for point in curve.iter() {
            prop_assert!(point.power_watts >= 0.0);
            prop_assert!(point.power_watts <= peak + 0.05);
        }
    }

    #[test]
    fn test_processing_is_deterministic(samples in ride()) {
        let pipeline = CurvePipeline::standard();
        let first = pipeline.run(&samples).unwrap();
        let second = pipeline.run(&samples).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn test_input_order_is_irrelevant(
        (samples, shuffled) in ride().prop_flat_map(|s| (Just(s.clone()), Just(s).prop_shuffle()))
    ) {
        let pipeline = CurvePipeline::standard();
        prop_assert_eq!(pipeline.run(&samples).unwrap(), pipeline.run(&shuffled).unwrap());
    }
}
