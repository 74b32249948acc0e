use ndarray::Array2;

use crate::buffer::ImageBuffer;
use crate::geometry::{Contour, Point};

/// One segmented particle: its crop, mask and contour in crop coordinates.
#[derive(Clone, Debug, PartialEq)]
pub struct MaskedRegion {
    /// Colour crop of the source frame.
    pub image: ImageBuffer,
    /// 0/255 single-channel mask, same size as `image`.
    pub mask: ImageBuffer,
    /// Particle contour in crop coordinates.
    pub contour: Contour,
    /// Particle centroid inside the crop.
    pub centroid: Point,
    /// Area of the originating contour, square pixels.
    pub area: f64,
}

impl MaskedRegion {
    pub fn mask_bits(&self) -> Array2<bool> {
        self.mask.to_mask(0)
    }

    pub fn mask_area(&self) -> usize {
        self.mask.plane(0).iter().filter(|&&v| v != 0.0).count()
    }
}
