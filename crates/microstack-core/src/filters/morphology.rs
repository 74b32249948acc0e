use ndarray::{Array2, ArrayViewMut1, Axis};
use rayon::prelude::*;

use crate::consts::PARALLEL_PIXEL_THRESHOLD;

/// A binary structuring element stored as offsets from its centre anchor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StructuringElement {
    offsets: Vec<(i32, i32)>,
}

impl StructuringElement {
    /// Full `size x size` square.
    pub fn rect(size: usize) -> Self {
        let size = size.max(1);
        let lo = -((size / 2) as i32);
        let hi = lo + size as i32 - 1;
        let offsets = (lo..=hi)
            .flat_map(|dy| (lo..=hi).map(move |dx| (dy, dx)))
            .collect();
        Self { offsets }
    }

    /// Ellipse inscribed in a `size x size` box; each row spans
    /// `round(c * sqrt(1 - dy^2 / r^2))` columns either side of the centre.
    pub fn ellipse(size: usize) -> Self {
        let size = size.max(1);
        let r = (size / 2) as i32;
        let c = (size / 2) as f64;
        let inv_r2 = if r > 0 { 1.0 / (r * r) as f64 } else { 0.0 };
        let mut offsets = Vec::new();
        for i in 0..size as i32 {
            let dy = i - r;
            if dy.abs() > r {
                continue;
            }
            let dx = (c * (((r * r - dy * dy) as f64) * inv_r2).sqrt()).round() as i32;
            let lo = (-dx).max(-(size as i32 / 2));
            let hi = dx.min(size as i32 - 1 - size as i32 / 2);
            for x in lo..=hi {
                offsets.push((dy, x));
            }
        }
        Self { offsets }
    }

    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }
}

/// Binary erosion: a pixel survives only if every element position is set.
/// Positions outside the mask count as set, so objects touching the edge
/// are not eaten away from it.
pub fn erode(mask: &Array2<bool>, element: &StructuringElement) -> Array2<bool> {
    apply(mask, element, true)
}

/// Binary dilation: a pixel is set if any element position is set.
pub fn dilate(mask: &Array2<bool>, element: &StructuringElement) -> Array2<bool> {
    apply(mask, element, false)
}

/// Erosion followed by dilation.
pub fn open(mask: &Array2<bool>, element: &StructuringElement) -> Array2<bool> {
    dilate(&erode(mask, element), element)
}

/// Dilation followed by erosion.
pub fn close(mask: &Array2<bool>, element: &StructuringElement) -> Array2<bool> {
    erode(&dilate(mask, element), element)
}

fn apply(mask: &Array2<bool>, element: &StructuringElement, all: bool) -> Array2<bool> {
    let (h, w) = mask.dim();
    let mut result = Array2::from_elem((h, w), false);

    let sample = |row: usize, col: usize, dy: i32, dx: i32| -> bool {
        let r = row as i64 + dy as i64;
        let c = col as i64 + dx as i64;
        if r < 0 || c < 0 || r as usize >= h || c as usize >= w {
            return all;
        }
        mask[[r as usize, c as usize]]
    };

    let fill = |row: usize, mut out: ArrayViewMut1<'_, bool>| {
        for col in 0..w {
            out[col] = if all {
                mask[[row, col]] && element.offsets.iter().all(|&(dy, dx)| sample(row, col, dy, dx))
            } else {
                element.offsets.iter().any(|&(dy, dx)| sample(row, col, dy, dx))
            };
        }
    };

    if h * w >= PARALLEL_PIXEL_THRESHOLD {
        result
            .axis_iter_mut(Axis(0))
            .into_par_iter()
            .enumerate()
            .for_each(|(row, out)| fill(row, out));
    } else {
        for (row, out) in result.axis_iter_mut(Axis(0)).enumerate() {
            fill(row, out);
        }
    }
    result
}
