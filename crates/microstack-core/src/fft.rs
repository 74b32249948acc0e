//! Separable 2-D FFT helpers over `ndarray` planes.

use ndarray::{Array2, Axis};
use num_complex::Complex;
use rustfft::{Fft, FftPlanner};

/// Forward 2-D FFT of a real plane.
pub fn fft2d(data: &Array2<f32>) -> Array2<Complex<f64>> {
    let mut work = data.mapv(|v| Complex::new(v as f64, 0.0));
    transform(&mut work, false);
    work
}

/// Inverse 2-D FFT, normalised by the element count.
pub fn ifft2d(data: &Array2<Complex<f64>>) -> Array2<Complex<f64>> {
    let (h, w) = data.dim();
    let mut work = data.clone();
    transform(&mut work, true);
    let scale = 1.0 / (h * w).max(1) as f64;
    work.mapv_inplace(|v| v * scale);
    work
}

/// Real part of the normalised inverse 2-D FFT.
pub fn ifft2d_real(data: &Array2<Complex<f64>>) -> Array2<f64> {
    ifft2d(data).mapv(|v| v.re)
}

fn transform(work: &mut Array2<Complex<f64>>, inverse: bool) {
    let (h, w) = work.dim();
    if h == 0 || w == 0 {
        return;
    }
    let mut planner = FftPlanner::new();
    let (row_fft, col_fft) = if inverse {
        (planner.plan_fft_inverse(w), planner.plan_fft_inverse(h))
    } else {
        (planner.plan_fft_forward(w), planner.plan_fft_forward(h))
    };
    process_lanes(work, Axis(0), row_fft.as_ref(), w);
    process_lanes(work, Axis(1), col_fft.as_ref(), h);
}

/// Run `fft` over every 1-D lane obtained by iterating along `axis`.
fn process_lanes(
    work: &mut Array2<Complex<f64>>,
    axis: Axis,
    fft: &dyn Fft<f64>,
    len: usize,
) {
    let mut buf = vec![Complex::new(0.0, 0.0); len];
    for mut lane in work.axis_iter_mut(axis) {
        for (dst, src) in buf.iter_mut().zip(lane.iter()) {
            *dst = *src;
        }
        fft.process(&mut buf);
        for (dst, src) in lane.iter_mut().zip(buf.iter()) {
            *dst = *src;
        }
    }
}

/// Signed frequency of bin `k` in an `n`-point transform, in cycles per
/// sample.
pub fn frequency(k: usize, n: usize) -> f64 {
    let k = k as f64;
    let n_f = n as f64;
    if k <= n_f / 2.0 {
        k / n_f
    } else {
        (k - n_f) / n_f
    }
}
