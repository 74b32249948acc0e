#![allow(dead_code)]

use ndarray::Array2;

use microstack_core::buffer::{Depth, ImageBuffer};
use microstack_core::filters::gaussian_blur_array;

/// Smooth deterministic texture in `[low, high]`.
pub fn textured_plane(width: usize, height: usize, seed: u64, low: f32, high: f32) -> Array2<f32> {
    let mut state = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
    let noise = Array2::from_shape_fn((height, width), |_| {
        state = state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        ((state >> 33) as f32) / (u32::MAX >> 1) as f32
    });
    let smooth = gaussian_blur_array(&noise, 2.0);
    let (lo, hi) = smooth
        .iter()
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(a, b), &v| (a.min(v), b.max(v)));
    let span = (hi - lo).max(1e-6);
    smooth.mapv(|v| low + (v - lo) / span * (high - low))
}

/// `128 + a*cos(2*pi*x/8) + a*cos(2*pi*y/8)` on an `n x n` grid.
pub fn cosine_plane(n: usize, amplitude: f32) -> Array2<f32> {
    let w = std::f32::consts::TAU / 8.0;
    Array2::from_shape_fn((n, n), |(r, c)| {
        128.0 + amplitude * (w * c as f32).cos() + amplitude * (w * r as f32).cos()
    })
}

/// 8-bit colour frame with the same plane in every channel.
pub fn grey_colour_frame(plane: &Array2<f32>) -> ImageBuffer {
    ImageBuffer::from_planes(&[plane.clone(), plane.clone(), plane.clone()], Depth::U8)
        .expect("planes share a size")
}

/// 8-bit colour frame of value `background` with filled disks of value
/// `foreground`, given as `(cx, cy, radius)`.
pub fn disk_frame(
    width: usize,
    height: usize,
    background: f32,
    foreground: f32,
    disks: &[(f64, f64, f64)],
) -> ImageBuffer {
    let plane = Array2::from_shape_fn((height, width), |(r, c)| {
        let inside = disks.iter().any(|&(cx, cy, radius)| {
            let dx = c as f64 - cx;
            let dy = r as f64 - cy;
            dx * dx + dy * dy <= radius * radius
        });
        if inside {
            foreground
        } else {
            background
        }
    });
    grey_colour_frame(&plane)
}

pub fn max_abs_diff(a: &Array2<f32>, b: &Array2<f32>) -> f32 {
    a.iter()
        .zip(b.iter())
        .fold(0.0f32, |m, (x, y)| m.max((x - y).abs()))
}
