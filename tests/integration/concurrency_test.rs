//! Processing independent recordings from several threads.

use std::sync::Arc;
use std::thread;

use powercurve::curve::{DateRange, RangeAggregator};
use powercurve::recording::{ProcessingStatus, Recording, RecordingProcessor};
use powercurve::storage::{CurveStore, MemoryCurveStore};

use super::{date, one_hz};

#[test]
fn test_parallel_processing_of_distinct_recordings() {
    let store = Arc::new(MemoryCurveStore::new());
    let recordings: Vec<Recording> = (1..=8)
        .map(|day| Recording::new(Some(date(2024, 7, day))))
        .collect();
    for recording in &recordings {
        store.insert_recording(recording).unwrap();
    }

    let handles: Vec<_> = recordings
        .iter()
        .enumerate()
        .map(|(i, recording)| {
            let store = Arc::clone(&store);
            let id = recording.id;
            let power = 200.0 + 10.0 * i as f64;
            thread::spawn(move || {
                RecordingProcessor::new(store.as_ref())
                    .process_samples(&id, &one_hz(&vec![power; 120]))
                    .unwrap()
            })
        })
        .collect();

    for handle in handles {
        let curve = handle.join().unwrap();
        assert_eq!(curve.len(), 19);
    }

    for (i, recording) in recordings.iter().enumerate() {
        let stored = store.get_recording(&recording.id).unwrap().unwrap();
        assert_eq!(stored.status, ProcessingStatus::Processed);
        let curve = store.load_curve(&recording.id).unwrap();
        assert_eq!(curve.get(120), Some(200.0 + 10.0 * i as f64));
    }

    let july = DateRange::new(date(2024, 7, 1), date(2024, 7, 31)).unwrap();
    let best = RangeAggregator::new(store.as_ref()).aggregate(&july).unwrap();
    assert_eq!(best.get(60), Some(270.0));
}

#[test]
fn test_reads_never_see_partial_curves() {
    let store = Arc::new(MemoryCurveStore::new());
    let recording = Recording::new(Some(date(2024, 7, 1)));
    store.insert_recording(&recording).unwrap();
    let id = recording.id;

    let writer = {
        let store = Arc::clone(&store);
        thread::spawn(move || {
            let processor = RecordingProcessor::new(store.as_ref());
            for round in 0..50 {
                let len = if round % 2 == 0 { 30 } else { 600 };
                processor
                    .process_samples(&id, &one_hz(&vec![250.0; len]))
                    .unwrap();
            }
        })
    };

    for _ in 0..200 {
        let curve = store.load_curve(&id).unwrap();
        // Either empty (not yet processed), the 30 s curve or the 600 s curve
        assert!(matches!(curve.len(), 0 | 14 | 25), "torn curve of {} points", curve.len());
    }

    writer.join().unwrap();
}
