//! Wiring of the background model, segmenter and focus stacker into
//! per-field and per-stack runs.

pub mod config;
mod processor;
mod runner;
mod session;
mod types;

pub use config::PipelineConfig;
pub use processor::{FieldProcessor, FieldResult};
pub use runner::{process_fields, stack_frames, FieldSummary};
pub use session::SessionControl;
pub use types::{NoOpReporter, PipelineStage, ProgressReporter, RegionMetadata, RegionSink};
