use tracing::debug;

use crate::align::DriftOffset;
use crate::background::{BackgroundModel, UpdateOutcome};
use crate::buffer::ImageBuffer;
use crate::error::Result;
use crate::frame::StackedFrame;
use crate::geometry::Contour;
use crate::segment::{measure_region, segment, SegmentConfig, SegmentResult};

use super::{PipelineConfig, RegionMetadata, RegionSink, SessionControl};

/// Outcome of one processed field of view.
#[derive(Clone, Debug)]
pub struct FieldResult {
    pub field_index: usize,
    pub segmentation: SegmentResult,
    /// Residual the segmentation ran on.
    pub difference: ImageBuffer,
    /// Drift between the field and the background model.
    pub offset: DriftOffset,
    pub outcome: UpdateOutcome,
}

/// Runs difference, segmentation and background update for successive
/// fields of view against one background model.
pub struct FieldProcessor {
    model: BackgroundModel,
    segmentation: SegmentConfig,
    pixel_area_mm: Option<f64>,
    session: SessionControl,
    fields_processed: usize,
}

impl FieldProcessor {
    pub fn new(config: &PipelineConfig, session: SessionControl) -> Result<Self> {
        config.validate()?;
        let model = BackgroundModel::new(0, config.width, config.height, config.background.clone())?;
        Ok(Self {
            model,
            segmentation: config.segmentation.clone(),
            pixel_area_mm: config.pixel_area_mm,
            session,
            fields_processed: 0,
        })
    }

    /// Segment `frame` against the background, then add it to the
    /// background with every detected particle excluded.
    ///
    /// Returns `None` without touching the model while the session is
    /// paused.
    pub fn process(&mut self, frame: &StackedFrame) -> Result<Option<FieldResult>> {
        if !self.session.is_enabled() {
            debug!("Session paused, field skipped");
            return Ok(None);
        }
        let (difference, offset) = self.model.difference(&frame.colour)?;
        let segmentation = segment(frame, Some(&difference), &self.segmentation)?;
        let excluded: Vec<Contour> = segmentation.all_contours().cloned().collect();
        let outcome = self.model.update(&frame.colour, &excluded, Some(offset))?;

        let field_index = self.fields_processed;
        self.fields_processed += 1;
        Ok(Some(FieldResult {
            field_index,
            segmentation,
            difference,
            offset,
            outcome,
        }))
    }

    /// Hand every valid region of `result` to `sink`, measured when a pixel
    /// area is configured. Returns the number of regions sent.
    pub fn emit(&self, result: &FieldResult, sink: &mut dyn RegionSink) -> Result<usize> {
        let seg = &result.segmentation;
        for (region_index, (crop, contour)) in seg.crops.iter().zip(&seg.contours).enumerate() {
            let metadata = RegionMetadata {
                field_index: result.field_index,
                region_index,
                frame_centroid: contour.centroid(),
                area: crop.area,
                offset: result.offset,
                measurement: self.pixel_area_mm.map(|a| measure_region(crop, a)),
            };
            sink.accept(crop, &metadata)?;
        }
        Ok(seg.crops.len())
    }

    pub fn model(&self) -> &BackgroundModel {
        &self.model
    }

    pub fn model_mut(&mut self) -> &mut BackgroundModel {
        &mut self.model
    }

    pub fn into_model(self) -> BackgroundModel {
        self.model
    }

    pub fn session(&self) -> &SessionControl {
        &self.session
    }

    pub fn fields_processed(&self) -> usize {
        self.fields_processed
    }
}
