//! Order statistics along the stack dimension of a set of same-size planes.
//!
//! A "stack" is a slice of planes; every function here treats the values at
//! one `(row, col)` across all planes as a small vector.

use ndarray::{Array2, Array3, Axis};
use rayon::prelude::*;

use crate::consts::PARALLEL_PIXEL_THRESHOLD;

use super::{Depth, ImageBuffer};

fn stack_dim(planes: &[Array2<f32>]) -> (usize, usize) {
    planes.first().map(|p| p.dim()).unwrap_or((0, 0))
}

/// Fill a `(h, w, n)` array row by row, in parallel for large images.
fn per_pixel<T, F>(h: usize, w: usize, n: usize, fill: F) -> Array3<T>
where
    T: Copy + Default + Send + Sync,
    F: Fn(usize, usize, &mut [T]) + Sync,
{
    let mut out = Array3::<T>::default((h, w, n));
    let body = |row: usize, mut out_row: ndarray::ArrayViewMut2<'_, T>| {
        let mut scratch = vec![T::default(); n];
        for col in 0..w {
            fill(row, col, &mut scratch);
            for (k, v) in scratch.iter().enumerate() {
                out_row[[col, k]] = *v;
            }
        }
    };
    if h * w >= PARALLEL_PIXEL_THRESHOLD {
        out.axis_iter_mut(Axis(0))
            .into_par_iter()
            .enumerate()
            .for_each(|(row, out_row)| body(row, out_row));
    } else {
        for (row, out_row) in out.axis_iter_mut(Axis(0)).enumerate() {
            body(row, out_row);
        }
    }
    out
}

fn unstack<T: Clone>(cube: &Array3<T>) -> Vec<Array2<T>> {
    (0..cube.dim().2)
        .map(|k| cube.index_axis(Axis(2), k).to_owned())
        .collect()
}

/// Per-pixel ascending sort. Plane `k` of the result holds rank `k`.
pub fn sort_along_stack(planes: &[Array2<f32>]) -> Vec<Array2<f32>> {
    let (h, w) = stack_dim(planes);
    let n = planes.len();
    let cube = per_pixel(h, w, n, |row, col, out: &mut [f32]| {
        for (k, plane) in planes.iter().enumerate() {
            out[k] = plane[[row, col]];
        }
        out.sort_unstable_by(|a, b| a.total_cmp(b));
    });
    unstack(&cube)
}

/// Per-pixel stable ascending argsort. Plane `k` of the result holds the
/// index of the plane ranked `k`; equal values keep their plane order.
pub fn argsort_along_stack(planes: &[Array2<f32>]) -> Vec<Array2<usize>> {
    let (h, w) = stack_dim(planes);
    let n = planes.len();
    let cube = per_pixel(h, w, n, |row, col, out: &mut [usize]| {
        for (k, slot) in out.iter_mut().enumerate() {
            *slot = k;
        }
        out.sort_by(|&a, &b| planes[a][[row, col]].total_cmp(&planes[b][[row, col]]));
    });
    unstack(&cube)
}

/// Per-pixel index of the maximum value. Ties resolve to the earliest plane.
pub fn argmax_along_stack(planes: &[Array2<f32>]) -> Array2<usize> {
    let (h, w) = stack_dim(planes);
    let mut out = Array2::<usize>::zeros((h, w));
    let body = |row: usize, mut out_row: ndarray::ArrayViewMut1<'_, usize>| {
        for col in 0..w {
            let mut best = 0usize;
            let mut best_val = f32::NEG_INFINITY;
            for (k, plane) in planes.iter().enumerate() {
                let v = plane[[row, col]];
                if v > best_val {
                    best_val = v;
                    best = k;
                }
            }
            out_row[col] = best;
        }
    };
    if h * w >= PARALLEL_PIXEL_THRESHOLD {
        out.axis_iter_mut(Axis(0))
            .into_par_iter()
            .enumerate()
            .for_each(|(row, out_row)| body(row, out_row));
    } else {
        for (row, out_row) in out.axis_iter_mut(Axis(0)).enumerate() {
            body(row, out_row);
        }
    }
    out
}

/// Blend between the two planes bracketing a fractional index.
///
/// A depth of 4.2 yields `0.8 * planes[4] + 0.2 * planes[5]`. Indices are
/// clamped to the stack.
pub fn interpolate_from_index(planes: &[Array2<f32>], index: &Array2<f32>) -> Array2<f32> {
    let last = planes.len().saturating_sub(1);
    let mut out = Array2::<f32>::zeros(index.dim());
    for ((row, col), v) in out.indexed_iter_mut() {
        let d = index[[row, col]];
        let d = if d.is_finite() {
            d.clamp(0.0, last as f32)
        } else {
            0.0
        };
        let lo = (d.floor() as usize).min(last);
        let hi = (lo + 1).min(last);
        let t = d - lo as f32;
        *v = (1.0 - t) * planes[lo][[row, col]] + t * planes[hi][[row, col]];
    }
    out
}

/// Pick each pixel from the buffer named by `index`.
///
/// All slices must share size and channel count; indices past the end are
/// clamped to the last slice.
pub fn slice_from_index(slices: &[ImageBuffer], index: &Array2<usize>, depth: Depth) -> ImageBuffer {
    let Some(first) = slices.first() else {
        let (h, w) = index.dim();
        return ImageBuffer::zeros(w, h, 1, depth);
    };
    let last = slices.len() - 1;
    let channels = first.channels();
    let (h, w) = index.dim();
    let mut data = Array3::<f32>::zeros((channels, h, w));
    for ((row, col), &k) in index.indexed_iter() {
        let src = &slices[k.min(last)];
        for c in 0..channels {
            data[[c, row, col]] = src.get(c, row, col);
        }
    }
    ImageBuffer::from_array(data, depth)
}

impl ImageBuffer {
    /// Per-pixel ascending sort of this buffer's channels.
    pub fn sort_channels(&self) -> ImageBuffer {
        let sorted = sort_along_stack(&self.split());
        let mut data = Array3::<f32>::zeros((self.channels(), self.height(), self.width()));
        for (k, plane) in sorted.iter().enumerate() {
            data.index_axis_mut(Axis(0), k).assign(plane);
        }
        ImageBuffer::from_array(data, self.depth())
    }
}
