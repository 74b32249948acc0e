//! Affine resampling with explicit border handling.

use ndarray::{Array3, Axis};
use rayon::prelude::*;

use crate::consts::PARALLEL_PIXEL_THRESHOLD;

use super::ImageBuffer;

/// How samples outside the image are produced.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum BorderPolicy {
    /// `fedcba|abcdefgh|hgfedcb`
    Reflect,
    /// `gfedcb|abcdefgh|gfedcba`
    Reflect101,
    /// `aaaaaa|abcdefgh|hhhhhhh`
    Replicate,
    /// A fixed value everywhere outside.
    Constant(f32),
}

impl BorderPolicy {
    /// Map a possibly out-of-range index into `0..n`, or `None` when the
    /// policy supplies a constant instead.
    pub fn map_index(self, i: i64, n: usize) -> Option<usize> {
        if n == 0 {
            return None;
        }
        let n_i = n as i64;
        if (0..n_i).contains(&i) {
            return Some(i as usize);
        }
        match self {
            BorderPolicy::Constant(_) => None,
            BorderPolicy::Replicate => Some(i.clamp(0, n_i - 1) as usize),
            BorderPolicy::Reflect => {
                let period = 2 * n_i;
                let m = i.rem_euclid(period);
                Some(if m < n_i { m } else { period - 1 - m } as usize)
            }
            BorderPolicy::Reflect101 => {
                if n == 1 {
                    return Some(0);
                }
                let period = 2 * n_i - 2;
                let m = i.rem_euclid(period);
                Some(if m < n_i { m } else { period - m } as usize)
            }
        }
    }

    fn constant(self) -> f32 {
        match self {
            BorderPolicy::Constant(v) => v,
            _ => 0.0,
        }
    }
}

/// A 2x3 affine matrix mapping source coordinates to destination
/// coordinates: `(x', y') = M * (x, y, 1)`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Affine2 {
    pub m: [[f64; 3]; 2],
}

impl Affine2 {
    pub fn identity() -> Self {
        Self {
            m: [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
        }
    }

    pub fn translation(dx: f64, dy: f64) -> Self {
        Self {
            m: [[1.0, 0.0, dx], [0.0, 1.0, dy]],
        }
    }

    /// Move `rotation_centre` to the origin, rotate by `angle` radians,
    /// scale, then move the origin to `image_centre`.
    pub fn rotation_about(
        image_centre: (f64, f64),
        rotation_centre: (f64, f64),
        angle: f64,
        scale: f64,
    ) -> Self {
        let (sin, cos) = angle.sin_cos();
        let a = scale * cos;
        let b = -scale * sin;
        let c = scale * sin;
        let d = scale * cos;
        let (rx, ry) = rotation_centre;
        let (cx, cy) = image_centre;
        Self {
            m: [
                [a, b, cx - a * rx - b * ry],
                [c, d, cy - c * rx - d * ry],
            ],
        }
    }

    pub fn apply(&self, x: f64, y: f64) -> (f64, f64) {
        let m = &self.m;
        (
            m[0][0] * x + m[0][1] * y + m[0][2],
            m[1][0] * x + m[1][1] * y + m[1][2],
        )
    }

    /// Inverse transform, or `None` for a singular matrix.
    pub fn invert(&self) -> Option<Self> {
        let m = &self.m;
        let det = m[0][0] * m[1][1] - m[0][1] * m[1][0];
        if det.abs() < f64::EPSILON {
            return None;
        }
        let inv_det = 1.0 / det;
        let a = m[1][1] * inv_det;
        let b = -m[0][1] * inv_det;
        let c = -m[1][0] * inv_det;
        let d = m[0][0] * inv_det;
        Some(Self {
            m: [
                [a, b, -(a * m[0][2] + b * m[1][2])],
                [c, d, -(c * m[0][2] + d * m[1][2])],
            ],
        })
    }
}

/// Resample `src` into a `width x height` image under `transform` with
/// bilinear interpolation. A singular transform yields a constant image.
pub fn warp_affine(
    src: &ImageBuffer,
    transform: &Affine2,
    size: (usize, usize),
    border: BorderPolicy,
) -> ImageBuffer {
    let (width, height) = size;
    let channels = src.channels();
    let depth = src.depth();
    let Some(inverse) = transform.invert() else {
        return ImageBuffer::filled(width, height, channels, depth, border.constant());
    };

    let (sw, sh) = src.size();
    let data = src.data();
    let sample = |c: usize, r: i64, col: i64| -> f32 {
        match (border.map_index(r, sh), border.map_index(col, sw)) {
            (Some(r), Some(col)) => data[[c, r, col]],
            _ => border.constant(),
        }
    };

    let mut out = Array3::<f32>::zeros((height, width, channels));
    let fill_row = |row: usize, mut out_row: ndarray::ArrayViewMut2<'_, f32>| {
        for col in 0..width {
            let (x, y) = inverse.apply(col as f64, row as f64);
            let x0 = x.floor();
            let y0 = y.floor();
            let fx = (x - x0) as f32;
            let fy = (y - y0) as f32;
            let (x0, y0) = (x0 as i64, y0 as i64);
            for c in 0..channels {
                let v00 = sample(c, y0, x0);
                let v01 = sample(c, y0, x0 + 1);
                let v10 = sample(c, y0 + 1, x0);
                let v11 = sample(c, y0 + 1, x0 + 1);
                // Skip neighbours with zero weight so exact integer shifts stay exact.
                let top = if fx == 0.0 { v00 } else { v00 * (1.0 - fx) + v01 * fx };
                let bottom = if fx == 0.0 { v10 } else { v10 * (1.0 - fx) + v11 * fx };
                out_row[[col, c]] = if fy == 0.0 { top } else { top * (1.0 - fy) + bottom * fy };
            }
        }
    };

    if width * height >= PARALLEL_PIXEL_THRESHOLD {
        out.axis_iter_mut(Axis(0))
            .into_par_iter()
            .enumerate()
            .for_each(|(row, out_row)| fill_row(row, out_row));
    } else {
        for (row, out_row) in out.axis_iter_mut(Axis(0)).enumerate() {
            fill_row(row, out_row);
        }
    }

    let data = out.permuted_axes([2, 0, 1]).as_standard_layout().into_owned();
    ImageBuffer::from_array(data, depth)
}

/// Shift content by `(dx, dy)`: `out(x, y) = in(x - dx, y - dy)`.
pub fn translate(src: &ImageBuffer, dx: f64, dy: f64, border: BorderPolicy) -> ImageBuffer {
    if dx == 0.0 && dy == 0.0 {
        return src.clone();
    }
    warp_affine(src, &Affine2::translation(dx, dy), src.size(), border)
}
