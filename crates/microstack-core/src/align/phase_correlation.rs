use ndarray::Array2;
use num_complex::Complex;
use tracing::warn;

use crate::buffer::ImageBuffer;
use crate::consts::EPSILON;
use crate::error::{MicrostackError, Result};
use crate::fft::{fft2d, ifft2d_real};

use super::subpixel::refine_peak_parabolic;
use super::DriftOffset;

/// Smallest value range for a plane to carry usable structure.
const MIN_DYNAMIC_RANGE: f32 = 1e-6;

/// Translation of `target` relative to `reference` by normalised
/// cross-power phase correlation with parabolic sub-pixel refinement.
///
/// Both buffers must be single-channel and the same size.
pub fn estimate_offset(reference: &ImageBuffer, target: &ImageBuffer) -> Result<DriftOffset> {
    reference.check_channels(1)?;
    target.check_channels(1)?;
    target.check_same_size(reference)?;
    estimate_offset_array(&reference.channel_array(0), &target.channel_array(0))
}

/// [`estimate_offset`] that degrades every failure to a zero offset.
pub fn estimate_offset_or_zero(reference: &ImageBuffer, target: &ImageBuffer) -> DriftOffset {
    match estimate_offset(reference, target) {
        Ok(offset) => offset,
        Err(e) => {
            warn!(error = %e, "Drift estimate failed, assuming no shift");
            DriftOffset::zero()
        }
    }
}

/// Phase correlation on raw planes.
pub fn estimate_offset_array(reference: &Array2<f32>, target: &Array2<f32>) -> Result<DriftOffset> {
    let (h, w) = reference.dim();
    if target.dim() != (h, w) {
        return Err(MicrostackError::DimensionMismatch {
            expected: (w, h),
            actual: (target.ncols(), target.nrows()),
        });
    }
    if h < 2 || w < 2 {
        return Err(MicrostackError::CorrelationFailure(format!(
            "image {w}x{h} is too small to correlate"
        )));
    }
    check_dynamic_range(reference, "reference")?;
    check_dynamic_range(target, "target")?;

    let ref_fft = fft2d(&apply_hann(reference));
    let tgt_fft = fft2d(&apply_hann(target));
    let correlation = ifft2d_real(&normalized_cross_power(&ref_fft, &tgt_fft));

    let (peak_row, peak_col, peak_val) = find_peak(&correlation);
    if !peak_val.is_finite() {
        return Err(MicrostackError::CorrelationFailure(
            "correlation surface has no finite peak".into(),
        ));
    }

    let wrap = |p: usize, n: usize| if p > n / 2 { p as f64 - n as f64 } else { p as f64 };
    let (sub_dy, sub_dx) = refine_peak_parabolic(&correlation, peak_row, peak_col);

    Ok(DriftOffset {
        dx: wrap(peak_col, w) + sub_dx,
        dy: wrap(peak_row, h) + sub_dy,
    })
}

fn check_dynamic_range(plane: &Array2<f32>, name: &str) -> Result<()> {
    let (min, max) = plane
        .iter()
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    if !(max - min).is_finite() || max - min < MIN_DYNAMIC_RANGE {
        return Err(MicrostackError::CorrelationFailure(format!(
            "{name} image is constant"
        )));
    }
    Ok(())
}

/// Subtract the mean, then taper with a separable Hann window.
fn apply_hann(data: &Array2<f32>) -> Array2<f32> {
    let (h, w) = data.dim();
    let mean = data.mean().unwrap_or(0.0);
    let wy: Vec<f64> = (0..h)
        .map(|r| 0.5 * (1.0 - (std::f64::consts::TAU * r as f64 / h as f64).cos()))
        .collect();
    let wx: Vec<f64> = (0..w)
        .map(|c| 0.5 * (1.0 - (std::f64::consts::TAU * c as f64 / w as f64).cos()))
        .collect();
    Array2::from_shape_fn((h, w), |(r, c)| ((data[[r, c]] - mean) as f64 * wy[r] * wx[c]) as f32)
}

/// `conj(R) * T / |conj(R) * T|`, whose inverse transform peaks at the
/// displacement of the target.
fn normalized_cross_power(
    ref_fft: &Array2<Complex<f64>>,
    tgt_fft: &Array2<Complex<f64>>,
) -> Array2<Complex<f64>> {
    let mut result = Array2::<Complex<f64>>::zeros(ref_fft.dim());
    ndarray::Zip::from(&mut result)
        .and(ref_fft)
        .and(tgt_fft)
        .for_each(|out, r, t| {
            let cross = r.conj() * t;
            let mag = cross.norm();
            *out = if mag > EPSILON {
                cross / mag
            } else {
                Complex::new(0.0, 0.0)
            };
        });
    result
}

fn find_peak(data: &Array2<f64>) -> (usize, usize, f64) {
    let mut best = (0, 0, f64::NEG_INFINITY);
    for ((row, col), &v) in data.indexed_iter() {
        if v > best.2 {
            best = (row, col, v);
        }
    }
    best
}
