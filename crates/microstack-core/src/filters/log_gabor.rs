//! Quadrature log-Gabor derivative filters applied in the frequency domain.
//!
//! Each filter is a radial log-Gabor band-pass multiplied by an odd
//! directional term (`i * fx / |f|` or `i * fy / |f|`), which makes it a
//! smoothed first-derivative operator along that axis.

use ndarray::Array2;
use num_complex::Complex;
use serde::{Deserialize, Serialize};

use crate::buffer::BorderPolicy;
use crate::consts::{LOG_GABOR_PADDING, LOG_GABOR_SIGMA_ON_F, LOG_GABOR_WAVELENGTH};
use crate::fft::{fft2d, frequency, ifft2d};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogGaborParams {
    /// Centre wavelength in pixels.
    pub wavelength: f64,
    /// Ratio of the Gaussian width (in log frequency) to the centre frequency.
    pub sigma_on_f: f64,
    /// Mirrored border added before transforming, in pixels.
    pub padding: usize,
}

impl Default for LogGaborParams {
    fn default() -> Self {
        Self {
            wavelength: LOG_GABOR_WAVELENGTH,
            sigma_on_f: LOG_GABOR_SIGMA_ON_F,
            padding: LOG_GABOR_PADDING,
        }
    }
}

impl LogGaborParams {
    fn radial(&self, radius: f64) -> f64 {
        if radius <= 0.0 {
            return 0.0;
        }
        let f0 = 1.0 / self.wavelength;
        let log_sigma = self.sigma_on_f.ln();
        let log_ratio = (radius / f0).ln();
        (-(log_ratio * log_ratio) / (2.0 * log_sigma * log_sigma)).exp()
    }
}

/// Horizontal and vertical filter responses of `plane`.
pub fn log_gabor_pair(plane: &Array2<f32>, params: &LogGaborParams) -> (Array2<f32>, Array2<f32>) {
    let (h, w) = plane.dim();
    if h == 0 || w == 0 {
        return (plane.clone(), plane.clone());
    }
    let pad = params.padding;
    let padded = pad_reflect(plane, pad);
    let (ph, pw) = padded.dim();
    let spectrum = fft2d(&padded);

    let mut hx = Array2::<Complex<f64>>::zeros((ph, pw));
    let mut hy = Array2::<Complex<f64>>::zeros((ph, pw));
    for ((r, c), s) in spectrum.indexed_iter() {
        let fy = frequency(r, ph);
        let fx = frequency(c, pw);
        let radius = fx.hypot(fy);
        if radius <= 0.0 {
            continue;
        }
        let g = params.radial(radius);
        hx[[r, c]] = s * Complex::new(0.0, g * fx / radius);
        hy[[r, c]] = s * Complex::new(0.0, g * fy / radius);
    }

    let crop = |freq: &Array2<Complex<f64>>| -> Array2<f32> {
        let spatial = ifft2d(freq);
        Array2::from_shape_fn((h, w), |(r, c)| spatial[[r + pad, c + pad]].re as f32)
    };
    (crop(&hx), crop(&hy))
}

fn pad_reflect(plane: &Array2<f32>, pad: usize) -> Array2<f32> {
    let (h, w) = plane.dim();
    let border = BorderPolicy::Reflect101;
    Array2::from_shape_fn((h + 2 * pad, w + 2 * pad), |(r, c)| {
        let sr = border.map_index(r as i64 - pad as i64, h).unwrap_or(0);
        let sc = border.map_index(c as i64 - pad as i64, w).unwrap_or(0);
        plane[[sr, sc]]
    })
}
