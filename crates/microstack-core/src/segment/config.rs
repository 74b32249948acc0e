use serde::{Deserialize, Serialize};

use crate::consts::{
    DEFAULT_AREA_THRESHOLD, DEFAULT_CLOSING_KERNEL_SIZE, DEFAULT_CONVEXITY_THRESHOLD,
    DEFAULT_CROP_BUFFER, DEFAULT_MASK_KERNEL_SIZE, DEFAULT_SEGMENT_THRESHOLD,
};
use crate::error::{MicrostackError, Result};

/// Thresholds and crop geometry for [`segment`](super::segment).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SegmentConfig {
    /// Difference level above which a pixel is foreground.
    #[serde(default = "default_threshold")]
    pub threshold: f32,
    /// Minimum contour area in square pixels.
    #[serde(default = "default_area_threshold")]
    pub area_threshold: f64,
    /// Minimum convex-hull perimeter over perimeter.
    #[serde(default = "default_convexity_threshold")]
    pub convexity_threshold: f64,
    /// Crop half-width as a multiple of the contour's largest radius.
    #[serde(default = "default_crop_buffer")]
    pub crop_buffer: f64,
    /// Width of the border band whose centroids are rejected.
    #[serde(default)]
    pub search_buffer: usize,
    /// When non-zero, open with a kernel of this size instead of closing.
    #[serde(default)]
    pub opening_radius: usize,
    #[serde(default = "default_closing_kernel_size")]
    pub closing_kernel_size: usize,
    #[serde(default = "default_mask_kernel_size")]
    pub mask_kernel_size: usize,
}

fn default_threshold() -> f32 {
    DEFAULT_SEGMENT_THRESHOLD
}
fn default_area_threshold() -> f64 {
    DEFAULT_AREA_THRESHOLD
}
fn default_convexity_threshold() -> f64 {
    DEFAULT_CONVEXITY_THRESHOLD
}
fn default_crop_buffer() -> f64 {
    DEFAULT_CROP_BUFFER
}
fn default_closing_kernel_size() -> usize {
    DEFAULT_CLOSING_KERNEL_SIZE
}
fn default_mask_kernel_size() -> usize {
    DEFAULT_MASK_KERNEL_SIZE
}

impl Default for SegmentConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_SEGMENT_THRESHOLD,
            area_threshold: DEFAULT_AREA_THRESHOLD,
            convexity_threshold: DEFAULT_CONVEXITY_THRESHOLD,
            crop_buffer: DEFAULT_CROP_BUFFER,
            search_buffer: 0,
            opening_radius: 0,
            closing_kernel_size: DEFAULT_CLOSING_KERNEL_SIZE,
            mask_kernel_size: DEFAULT_MASK_KERNEL_SIZE,
        }
    }
}

impl SegmentConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.crop_buffer.is_finite() && self.crop_buffer > 0.0) {
            return Err(MicrostackError::Configuration(format!(
                "crop_buffer must be positive, got {}",
                self.crop_buffer
            )));
        }
        if !self.threshold.is_finite() || !self.area_threshold.is_finite() {
            return Err(MicrostackError::Configuration(
                "segmentation thresholds must be finite".into(),
            ));
        }
        Ok(())
    }
}
