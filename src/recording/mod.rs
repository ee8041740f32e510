//! Recording lifecycle and curve processing.

pub mod processor;
pub mod types;

pub use processor::{JsonFileSource, RecordingProcessor, SampleSource};
pub use types::{ProcessingStatus, Recording};
