use serde::{Deserialize, Serialize};

use crate::buffer::{warp_affine, Affine2, BorderPolicy, ImageBuffer};
use crate::geometry::PointF;

use super::MaskedRegion;

/// Size and shape of a segmented particle.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RegionMeasurement {
    /// Mask pixel count.
    pub area_px: usize,
    pub area_mm: f64,
    /// Diameter of the circle with the same area.
    pub mean_diameter_mm: f64,
    /// Mask centroid in crop coordinates.
    pub centroid: PointF,
    /// Principal axis angle from second-order mask moments, radians.
    pub orientation: f64,
}

/// Measure `region` given the physical area of one pixel.
pub fn measure_region(region: &MaskedRegion, pixel_area_mm: f64) -> RegionMeasurement {
    let moments = MaskMoments::of(region);
    let area_px = moments.m00 as usize;
    let area_mm = area_px as f64 * pixel_area_mm;
    RegionMeasurement {
        area_px,
        area_mm,
        mean_diameter_mm: 2.0 * (area_mm / std::f64::consts::PI).sqrt(),
        centroid: moments.centroid(),
        orientation: moments.orientation(),
    }
}

/// Resample the crop into a square of side `2 * max_radius * buffer` with
/// the mask centroid at its centre, optionally rotated so the principal
/// axis lies along x. Out-of-crop samples mirror the crop.
pub fn centre_region(region: &MaskedRegion, buffer: f64, rotate: bool) -> ImageBuffer {
    let moments = MaskMoments::of(region);
    let centroid = moments.centroid();
    let (max_radius, _) = region.contour.max_radius(centroid);
    let side = ((max_radius * 2.0 * buffer).round() as usize).max(1);
    let half = side as f64 / 2.0;
    let angle = if rotate { -moments.orientation() } else { 0.0 };
    let transform = Affine2::rotation_about((half, half), (centroid.x, centroid.y), angle, 1.0);
    warp_affine(&region.image, &transform, (side, side), BorderPolicy::Reflect101)
}

struct MaskMoments {
    m00: f64,
    m10: f64,
    m01: f64,
    mu20: f64,
    mu02: f64,
    mu11: f64,
}

impl MaskMoments {
    fn of(region: &MaskedRegion) -> Self {
        let mask = region.mask_bits();
        let (mut m00, mut m10, mut m01) = (0.0, 0.0, 0.0);
        for ((row, col), &m) in mask.indexed_iter() {
            if m {
                m00 += 1.0;
                m10 += col as f64;
                m01 += row as f64;
            }
        }
        if m00 == 0.0 {
            let c = region.centroid.to_f64();
            return Self {
                m00,
                m10: c.x,
                m01: c.y,
                mu20: 0.0,
                mu02: 0.0,
                mu11: 0.0,
            };
        }
        let (cx, cy) = (m10 / m00, m01 / m00);
        let (mut mu20, mut mu02, mut mu11) = (0.0, 0.0, 0.0);
        for ((row, col), &m) in mask.indexed_iter() {
            if m {
                let dx = col as f64 - cx;
                let dy = row as f64 - cy;
                mu20 += dx * dx;
                mu02 += dy * dy;
                mu11 += dx * dy;
            }
        }
        Self {
            m00,
            m10,
            m01,
            mu20,
            mu02,
            mu11,
        }
    }

    fn centroid(&self) -> PointF {
        if self.m00 == 0.0 {
            PointF::new(self.m10, self.m01)
        } else {
            PointF::new(self.m10 / self.m00, self.m01 / self.m00)
        }
    }

    fn orientation(&self) -> f64 {
        0.5 * (2.0 * self.mu11).atan2(self.mu20 - self.mu02)
    }
}
