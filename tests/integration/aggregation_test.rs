//! Range aggregation over stored curves.

use powercurve::curve::{CurveError, DateRange, PowerCurve, RangeAggregator};
use powercurve::recording::{ProcessingStatus, Recording, RecordingProcessor};
use powercurve::storage::{CurveStore, Database, MemoryCurveStore, SqliteCurveStore};

use super::{date, one_hz};

fn store_curve<S: CurveStore + ?Sized>(store: &S, recording: &Recording, points: &[(u32, f64)]) {
    let curve: PowerCurve = points.iter().copied().collect();
    store.insert_recording(recording).unwrap();
    store
        .set_status(&recording.id, ProcessingStatus::Processing)
        .unwrap();
    store.commit_curve(&recording.id, &curve).unwrap();
}

fn january() -> DateRange {
    DateRange::new(date(2024, 1, 1), date(2024, 1, 31)).unwrap()
}

fn seed<S: CurveStore + ?Sized>(store: &S) {
    let a = Recording::new(Some(date(2024, 1, 5)));
    let b = Recording::new(Some(date(2024, 1, 20)));
    let outside = Recording::new(Some(date(2024, 2, 1)));
    let undated = Recording::new(None);

    store_curve(store, &a, &[(1, 300.0), (60, 250.0)]);
    store_curve(store, &b, &[(1, 290.0), (60, 260.0), (300, 210.0)]);
    store_curve(store, &outside, &[(1, 900.0), (60, 900.0)]);
    store_curve(store, &undated, &[(1, 950.0)]);

    // Registered but never processed
    let pending = Recording::new(Some(date(2024, 1, 10)));
    store.insert_recording(&pending).unwrap();
}

fn assert_january(curve: &PowerCurve) {
    assert_eq!(curve.get(1), Some(300.0));
    assert_eq!(curve.get(60), Some(260.0));
    assert_eq!(curve.get(300), Some(210.0));
    assert_eq!(curve.len(), 3);
}

#[test]
fn test_best_per_duration_sqlite() {
    let db = Database::open_in_memory().unwrap();
    let store = SqliteCurveStore::new(db.connection());
    seed(&store);

    let curve = RangeAggregator::new(&store).aggregate(&january()).unwrap();
    assert_january(&curve);
}

#[test]
fn test_best_per_duration_memory() {
    let store = MemoryCurveStore::new();
    seed(&store);

    let curve = RangeAggregator::new(&store).aggregate(&january()).unwrap();
    assert_january(&curve);
}

#[test]
fn test_failed_recordings_are_excluded() {
    let db = Database::open_in_memory().unwrap();
    let store = SqliteCurveStore::new(db.connection());
    let processor = RecordingProcessor::new(&store);

    let good = Recording::new(Some(date(2024, 1, 3)));
    processor.ingest(&good, &one_hz(&[200.0; 10])).unwrap();

    let bad = Recording::new(Some(date(2024, 1, 4)));
    let result = processor.ingest(&bad, &one_hz(&[f64::MAX; 10]));
    assert!(matches!(result, Err(CurveError::CalculationFailed(_))));

    let curve = RangeAggregator::new(&store).aggregate(&january()).unwrap();
    assert_eq!(curve.get(1), Some(200.0));
    assert_eq!(curve.get(10), Some(200.0));
}

#[test]
fn test_range_bounds_are_inclusive() {
    let store = MemoryCurveStore::new();
    store_curve(&store, &Recording::new(Some(date(2024, 1, 1))), &[(1, 310.0)]);
    store_curve(&store, &Recording::new(Some(date(2024, 1, 31))), &[(5, 280.0)]);

    let curve = RangeAggregator::new(&store).aggregate(&january()).unwrap();
    assert_eq!(curve.get(1), Some(310.0));
    assert_eq!(curve.get(5), Some(280.0));

    let single_day = DateRange::new(date(2024, 1, 31), date(2024, 1, 31)).unwrap();
    let curve = RangeAggregator::new(&store).aggregate(&single_day).unwrap();
    assert!(!curve.contains(1));
    assert_eq!(curve.get(5), Some(280.0));
}

#[test]
fn test_empty_range_yields_empty_curve() {
    let db = Database::open_in_memory().unwrap();
    let store = SqliteCurveStore::new(db.connection());
    seed(&store);

    let march = DateRange::new(date(2024, 3, 1), date(2024, 3, 31)).unwrap();
    let curve = RangeAggregator::new(&store).aggregate(&march).unwrap();
    assert!(curve.is_empty());
}

#[test]
fn test_inverted_range_rejected() {
    let result = DateRange::new(date(2024, 2, 1), date(2024, 1, 1));
    assert!(matches!(result, Err(CurveError::InvalidRange(_))));
}

#[test]
fn test_deleted_recording_leaves_aggregate() {
    let db = Database::open_in_memory().unwrap();
    let store = SqliteCurveStore::new(db.connection());
    let a = Recording::new(Some(date(2024, 1, 5)));
    let b = Recording::new(Some(date(2024, 1, 6)));
    store_curve(&store, &a, &[(1, 500.0)]);
    store_curve(&store, &b, &[(1, 320.0)]);

    store.delete_recording(&a.id).unwrap();

    let curve = RangeAggregator::new(&store).aggregate(&january()).unwrap();
    assert_eq!(curve.get(1), Some(320.0));
}

/// A recording holding a higher committed curve, moved back to `processing`.
fn seed_reprocessing<S: CurveStore + ?Sized>(store: &S) -> Recording {
    let reprocessing = Recording::new(Some(date(2024, 1, 15)));
    store_curve(store, &reprocessing, &[(1, 999.0), (60, 999.0), (300, 999.0)]);
    store
        .set_status(&reprocessing.id, ProcessingStatus::Processing)
        .unwrap();
    reprocessing
}

#[test]
fn test_unprocessed_recordings_excluded_sqlite() {
    let db = Database::open_in_memory().unwrap();
    let store = SqliteCurveStore::new(db.connection());
    seed(&store);
    let reprocessing = seed_reprocessing(&store);

    // Its points are still stored, only its status keeps it out
    assert_eq!(store.load_curve(&reprocessing.id).unwrap().get(1), Some(999.0));

    let curve = RangeAggregator::new(&store).aggregate(&january()).unwrap();
    assert_january(&curve);
}

#[test]
fn test_unprocessed_recordings_excluded_memory() {
    let store = MemoryCurveStore::new();
    seed(&store);
    let reprocessing = seed_reprocessing(&store);

    assert_eq!(store.load_curve(&reprocessing.id).unwrap().get(1), Some(999.0));

    let curve = RangeAggregator::new(&store).aggregate(&january()).unwrap();
    assert_january(&curve);
}
