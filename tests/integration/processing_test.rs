//! End-to-end processing against the SQLite store.

use powercurve::curve::{CurveError, RawSample};
use powercurve::recording::{JsonFileSource, ProcessingStatus, Recording, RecordingProcessor};
use powercurve::storage::{CurveStore, Database, SqliteCurveStore};
use tempfile::tempdir;

use super::{at_offsets, date, one_hz};

#[test]
fn test_reference_ride_curve() {
    let db = Database::open_in_memory().unwrap();
    let store = SqliteCurveStore::new(db.connection());
    let recording = Recording::new(Some(date(2024, 6, 15)));
    store.insert_recording(&recording).unwrap();

    let samples = one_hz(&[100.0, 200.0, 150.0, 250.0, 100.0, 300.0, 50.0, 200.0]);
    let curve = RecordingProcessor::new(&store)
        .process_samples(&recording.id, &samples)
        .unwrap();

    assert_eq!(curve.get(1), Some(300.0));
    assert_eq!(curve.get(2), Some(200.0));
    assert_eq!(curve.get(3), Some(216.7));
    assert_eq!(curve.get(4), Some(200.0));
    assert_eq!(curve.get(5), Some(200.0));
    assert_eq!(curve.get(8), Some(168.8));
    assert!(!curve.contains(9));

    let stored = store.load_curve(&recording.id).unwrap();
    assert_eq!(stored, curve);
}

#[test]
fn test_silence_is_filled_with_zeros() {
    let db = Database::open_in_memory().unwrap();
    let store = SqliteCurveStore::new(db.connection());
    let recording = Recording::new(Some(date(2024, 6, 15)));
    store.insert_recording(&recording).unwrap();

    // Sensor drops out for 10 seconds mid-ride
    let samples = at_offsets(&[(0, 300.0), (1, 300.0), (12, 300.0), (13, 300.0)]);
    let curve = RecordingProcessor::new(&store)
        .process_samples(&recording.id, &samples)
        .unwrap();

    assert_eq!(curve.get(2), Some(300.0));
    assert_eq!(curve.get(3), Some(200.0));
    // 14 samples after filling: 300, 300, ten zeros, 300, 300
    assert_eq!(curve.get(12), Some(50.0));
    assert!(!curve.contains(15));
}

#[test]
fn test_malformed_readings_are_dropped() {
    let db = Database::open_in_memory().unwrap();
    let store = SqliteCurveStore::new(db.connection());
    let recording = Recording::new(None);
    store.insert_recording(&recording).unwrap();

    let mut samples = one_hz(&[200.0, 220.0, 240.0]);
    samples.push(RawSample {
        timestamp: Some("not a time".to_string()),
        power: Some(serde_json::json!(1000)),
    });
    samples.push(RawSample {
        timestamp: samples[0].timestamp.clone(),
        power: None,
    });

    let curve = RecordingProcessor::new(&store)
        .process_samples(&recording.id, &samples)
        .unwrap();

    assert_eq!(curve.get(1), Some(240.0));
    assert_eq!(curve.get(3), Some(220.0));
}

#[test]
fn test_reprocess_replaces_previous_curve() {
    let db = Database::open_in_memory().unwrap();
    let store = SqliteCurveStore::new(db.connection());
    let recording = Recording::new(Some(date(2024, 6, 15)));
    store.insert_recording(&recording).unwrap();
    let processor = RecordingProcessor::new(&store);

    processor
        .process_samples(&recording.id, &one_hz(&[400.0; 30]))
        .unwrap();
    let curve = processor
        .process_samples(&recording.id, &one_hz(&[150.0; 5]))
        .unwrap();

    let stored = store.load_curve(&recording.id).unwrap();
    assert_eq!(stored, curve);
    assert_eq!(stored.max_duration(), Some(5));
    assert_eq!(stored.get(1), Some(150.0));

    let loaded = store.get_recording(&recording.id).unwrap().unwrap();
    assert_eq!(loaded.curve_generation, 2);
    assert_eq!(loaded.status, ProcessingStatus::Processed);
}

#[test]
fn test_sample_file_round_trip_through_disk() {
    let dir = tempdir().unwrap();
    let samples_path = dir.path().join("ride.json");
    let db_path = dir.path().join("curves.db");

    let samples = one_hz(&[250.0, 260.0, 270.0, 280.0, 290.0]);
    std::fs::write(&samples_path, serde_json::to_string(&samples).unwrap()).unwrap();

    let recording = Recording::new(Some(date(2024, 6, 15)));
    {
        let db = Database::open(&db_path).unwrap();
        let store = SqliteCurveStore::new(db.connection());
        RecordingProcessor::new(&store)
            .ingest(&recording, &JsonFileSource::new(&samples_path))
            .unwrap();
    }

    let db = Database::open(&db_path).unwrap();
    let store = SqliteCurveStore::new(db.connection());
    let curve = store.load_curve(&recording.id).unwrap();
    assert_eq!(curve.get(5), Some(270.0));
    assert_eq!(curve.get(1), Some(290.0));
}

#[test]
fn test_missing_sample_file_fails_recording() {
    let dir = tempdir().unwrap();
    let db = Database::open_in_memory().unwrap();
    let store = SqliteCurveStore::new(db.connection());
    let recording = Recording::new(Some(date(2024, 6, 15)));
    let processor = RecordingProcessor::new(&store);

    processor
        .ingest(&recording, &one_hz(&[200.0; 10]))
        .unwrap();

    let result = processor.process(
        &recording.id,
        &JsonFileSource::new(dir.path().join("gone.json")),
    );

    assert!(matches!(result, Err(CurveError::SourceUnavailable(_))));
    assert!(store.load_curve(&recording.id).unwrap().is_empty());
    let loaded = store.get_recording(&recording.id).unwrap().unwrap();
    assert_eq!(loaded.status, ProcessingStatus::Failed);
}
