//! Drift correction: sub-pixel translation estimates by phase correlation
//! and their application to buffers.

pub mod phase_correlation;
pub mod subpixel;

use serde::{Deserialize, Serialize};

use crate::buffer::{translate, BorderPolicy, ImageBuffer};

pub use phase_correlation::{estimate_offset, estimate_offset_array, estimate_offset_or_zero};

/// Translation of one image relative to another, in pixels.
///
/// A target that is the reference moved right by 3 and up by 2 has
/// offset `(3, -2)`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DriftOffset {
    pub dx: f64,
    pub dy: f64,
}

impl DriftOffset {
    pub const fn new(dx: f64, dy: f64) -> Self {
        Self { dx, dy }
    }

    pub const fn zero() -> Self {
        Self { dx: 0.0, dy: 0.0 }
    }

    pub fn magnitude(&self) -> f64 {
        self.dx.hypot(self.dy)
    }

    pub fn inverted(&self) -> Self {
        Self::new(-self.dx, -self.dy)
    }

    pub fn is_zero(&self) -> bool {
        self.dx == 0.0 && self.dy == 0.0
    }
}

/// Move the content of `buffer` by `offset`.
pub fn apply_offset(buffer: &ImageBuffer, offset: DriftOffset, border: BorderPolicy) -> ImageBuffer {
    translate(buffer, offset.dx, offset.dy, border)
}
