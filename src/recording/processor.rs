//! Recording processing: load samples, compute the curve, persist it.
//!
//! Every attempt ends in exactly one of two durable outcomes: the recording
//! is `processed` with its new curve, or `failed` with no curve points.

use std::path::{Path, PathBuf};

use uuid::Uuid;

use crate::curve::error::{CurveError, CurveResult};
use crate::curve::pipeline::{CurveConfig, CurvePipeline};
use crate::curve::types::{PowerCurve, RawSample};
use crate::recording::types::{ProcessingStatus, Recording};
use crate::storage::store::CurveStore;

/// Provider of a recording's raw samples.
pub trait SampleSource {
    /// Load every raw sample of the recording.
    fn load_samples(&self, id: &Uuid) -> CurveResult<Vec<RawSample>>;
}

/// Samples stored as a JSON array of `{"timestamp", "power"}` objects.
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    /// Source reading from `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the sample file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SampleSource for JsonFileSource {
    fn load_samples(&self, _id: &Uuid) -> CurveResult<Vec<RawSample>> {
        let content = std::fs::read_to_string(&self.path).map_err(|e| {
            CurveError::SourceUnavailable(format!("{}: {}", self.path.display(), e))
        })?;

        serde_json::from_str(&content).map_err(|e| {
            CurveError::SourceUnavailable(format!("{}: {}", self.path.display(), e))
        })
    }
}

impl SampleSource for Vec<RawSample> {
    fn load_samples(&self, _id: &Uuid) -> CurveResult<Vec<RawSample>> {
        Ok(self.clone())
    }
}

/// Drives a recording through `processing` to `processed` or `failed`.
pub struct RecordingProcessor<'a, S: CurveStore + ?Sized> {
    store: &'a S,
    pipeline: CurvePipeline,
}

impl<'a, S: CurveStore + ?Sized> RecordingProcessor<'a, S> {
    /// Processor using the default curve settings.
    pub fn new(store: &'a S) -> Self {
        Self {
            store,
            pipeline: CurvePipeline::standard(),
        }
    }

    /// Processor using custom curve settings.
    pub fn with_config(store: &'a S, config: &CurveConfig) -> Self {
        Self {
            store,
            pipeline: CurvePipeline::new(config),
        }
    }

    /// Register a new recording and process it from `source`.
    pub fn ingest(
        &self,
        recording: &Recording,
        source: &dyn SampleSource,
    ) -> CurveResult<PowerCurve> {
        self.store.insert_recording(recording)?;
        tracing::info!("Registered recording {}", recording.id);
        self.process(&recording.id, source)
    }

    /// Compute and store the curve of an existing recording.
    ///
    /// Existing curve points are replaced on success and removed on failure.
    /// Reprocessing unchanged samples yields an identical curve.
    pub fn process(&self, id: &Uuid, source: &dyn SampleSource) -> CurveResult<PowerCurve> {
        self.begin(id)?;

        let raw = match source.load_samples(id) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!("Could not load samples for {}: {}", id, e);
                self.fail(id);
                return Err(e);
            }
        };

        self.finish(id, &raw)
    }

    /// Compute and store the curve of an existing recording from in-memory samples.
    pub fn process_samples(&self, id: &Uuid, raw: &[RawSample]) -> CurveResult<PowerCurve> {
        self.begin(id)?;
        self.finish(id, raw)
    }

    fn begin(&self, id: &Uuid) -> CurveResult<()> {
        let recording = self
            .store
            .get_recording(id)?
            .ok_or(CurveError::RecordingNotFound(*id))?;

        self.store.set_status(id, ProcessingStatus::Processing)?;
        if recording.status.is_terminal() {
            tracing::info!("Reprocessing recording {} (was {})", id, recording.status);
        } else {
            tracing::info!("Processing recording {}", id);
        }
        Ok(())
    }

    fn finish(&self, id: &Uuid, raw: &[RawSample]) -> CurveResult<PowerCurve> {
        let curve = match self.pipeline.run(raw) {
            Ok(curve) => curve,
            Err(e) => {
                tracing::error!("Curve calculation failed for {}: {}", id, e);
                self.fail(id);
                return Err(e);
            }
        };

        if let Err(e) = self.store.commit_curve(id, &curve) {
            tracing::error!("Could not store curve for {}: {}", id, e);
            self.fail(id);
            return Err(e.into());
        }

        tracing::info!(
            "Processed recording {} with {} curve points",
            id,
            curve.len()
        );
        Ok(curve)
    }

    fn fail(&self, id: &Uuid) {
        if let Err(e) = self.store.commit_failure(id) {
            tracing::warn!("Could not mark {} as failed: {}", id, e);
        }
    }
}
