use serde::{Deserialize, Serialize};

use crate::align::DriftOffset;
use crate::error::Result;
use crate::geometry::Point;
use crate::segment::{MaskedRegion, RegionMeasurement};

/// Pipeline processing stage, used for progress reporting.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PipelineStage {
    Reading,
    Correcting,
    Fusing,
    Segmenting,
    Writing,
}

impl std::fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Reading => write!(f, "Reading frames"),
            Self::Correcting => write!(f, "Correcting drift"),
            Self::Fusing => write!(f, "Fusing stack"),
            Self::Segmenting => write!(f, "Segmenting"),
            Self::Writing => write!(f, "Writing output"),
        }
    }
}

/// Thread-safe progress reporting.
///
/// All methods default to no-ops.
pub trait ProgressReporter: Send + Sync {
    /// A stage has started. `total_items` is the number of work items, if known.
    fn begin_stage(&self, _stage: PipelineStage, _total_items: Option<usize>) {}

    /// `items_done` work items of the current stage are complete.
    fn advance(&self, _items_done: usize) {}

    fn finish_stage(&self) {}
}

pub struct NoOpReporter;
impl ProgressReporter for NoOpReporter {}

/// Where a segmented particle came from.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RegionMetadata {
    /// Index of the field of view in the processed sequence.
    pub field_index: usize,
    /// Index of the region within its field.
    pub region_index: usize,
    /// Contour centroid in frame coordinates.
    pub frame_centroid: Point,
    /// Contour area in square pixels.
    pub area: f64,
    /// Background drift of the field at segmentation time.
    pub offset: DriftOffset,
    pub measurement: Option<RegionMeasurement>,
}

/// Consumer of segmented particles, e.g. a file writer or classifier.
pub trait RegionSink {
    fn accept(&mut self, region: &MaskedRegion, metadata: &RegionMetadata) -> Result<()>;
}

impl RegionSink for Vec<(MaskedRegion, RegionMetadata)> {
    fn accept(&mut self, region: &MaskedRegion, metadata: &RegionMetadata) -> Result<()> {
        self.push((region.clone(), metadata.clone()));
        Ok(())
    }
}
