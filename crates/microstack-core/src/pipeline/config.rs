use serde::{Deserialize, Serialize};

use crate::background::BackgroundConfig;
use crate::error::{MicrostackError, Result};
use crate::segment::SegmentConfig;
use crate::stacking::StackerConfig;

/// Every tunable of the pipeline in one place.
///
/// `width` and `height` may be left at zero and filled in from the first
/// frame with [`with_size`](Self::with_size).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default)]
    pub width: usize,
    #[serde(default)]
    pub height: usize,
    #[serde(default)]
    pub background: BackgroundConfig,
    #[serde(default)]
    pub segmentation: SegmentConfig,
    /// Frame size fields here are ignored in favour of `width`/`height`.
    #[serde(default)]
    pub stacker: StackerConfig,
    /// Physical area of one pixel in mm², enabling region measurements.
    pub pixel_area_mm: Option<f64>,
}

impl PipelineConfig {
    pub fn with_size(mut self, width: usize, height: usize) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Stacker settings at the pipeline frame size.
    pub fn stacker_config(&self) -> StackerConfig {
        StackerConfig {
            width: self.width,
            height: self.height,
            ..self.stacker.clone()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(MicrostackError::Configuration(format!(
                "pipeline frame size must be non-zero, got {}x{}",
                self.width, self.height
            )));
        }
        if let Some(area) = self.pixel_area_mm {
            if !(area.is_finite() && area > 0.0) {
                return Err(MicrostackError::Configuration(format!(
                    "pixel_area_mm must be positive, got {area}"
                )));
            }
        }
        self.background.validate()?;
        self.segmentation.validate()?;
        self.stacker_config().validate()
    }
}
