use ndarray::{Array2, ArrayViewMut1, Axis};
use rayon::prelude::*;

use crate::buffer::{BorderPolicy, ImageBuffer};
use crate::consts::PARALLEL_PIXEL_THRESHOLD;

const BORDER: BorderPolicy = BorderPolicy::Reflect101;

/// Blur every channel of `image` with a separable Gaussian of `sigma`.
pub fn gaussian_blur(image: &ImageBuffer, sigma: f32) -> ImageBuffer {
    let mut data = image.data().clone();
    for mut plane in data.axis_iter_mut(Axis(0)) {
        let blurred = gaussian_blur_array(&plane.to_owned(), sigma);
        plane.assign(&blurred);
    }
    ImageBuffer::from_array(data, image.depth())
}

/// Separable Gaussian blur of a plane with mirrored (reflect-101) borders.
/// A non-positive sigma returns a copy.
pub fn gaussian_blur_array(data: &Array2<f32>, sigma: f32) -> Array2<f32> {
    if sigma <= 0.0 || data.is_empty() {
        return data.clone();
    }
    let kernel = make_gaussian_kernel(sigma);
    let row_pass = convolve_rows(data, &kernel);
    let transposed = row_pass.t().as_standard_layout().into_owned();
    let col_pass = convolve_rows(&transposed, &kernel);
    col_pass.t().as_standard_layout().into_owned()
}

fn make_gaussian_kernel(sigma: f32) -> Vec<f32> {
    let radius = (sigma * 3.0).ceil() as usize;
    let s2 = 2.0 * sigma * sigma;
    let mut kernel: Vec<f32> = (0..2 * radius + 1)
        .map(|i| {
            let x = i as f32 - radius as f32;
            (-x * x / s2).exp()
        })
        .collect();
    let sum: f32 = kernel.iter().sum();
    for v in &mut kernel {
        *v /= sum;
    }
    kernel
}

/// Convolve each row with `kernel`, mirroring at both ends.
fn convolve_rows(data: &Array2<f32>, kernel: &[f32]) -> Array2<f32> {
    let (h, w) = data.dim();
    let radius = kernel.len() / 2;
    let mut result = Array2::<f32>::zeros((h, w));

    let taps: Vec<Vec<usize>> = (0..w)
        .map(|col| {
            (0..kernel.len())
                .map(|ki| {
                    let src = col as i64 + ki as i64 - radius as i64;
                    BORDER.map_index(src, w).unwrap_or(0)
                })
                .collect()
        })
        .collect();

    let fill = |row: usize, mut out: ArrayViewMut1<'_, f32>| {
        let src = data.row(row);
        for (col, idx) in taps.iter().enumerate() {
            out[col] = idx.iter().zip(kernel).map(|(&i, &k)| src[i] * k).sum::<f32>();
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
