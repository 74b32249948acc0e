use ndarray::{Array2, Zip};

use crate::filters::{gaussian_blur_array, log_gabor_pair, LogGaborParams};

/// Local focus energy of one plane.
///
/// The plane is filtered with horizontal and vertical first-order
/// log-Gabor kernels; the root of the summed squared responses is blurred
/// with `sigma`. Sharp regions score high.
pub fn calculate_energy(plane: &Array2<f32>, sigma: f32, params: &LogGaborParams) -> Array2<f32> {
    let (hx, hy) = log_gabor_pair(plane, params);
    let mut energy = Array2::<f32>::zeros(plane.dim());
    Zip::from(&mut energy)
        .and(&hx)
        .and(&hy)
        .for_each(|e, &x, &y| *e = (x * x + y * y).sqrt());
    gaussian_blur_array(&energy, sigma)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cosine_pattern(n: usize, amplitude: f32) -> Array2<f32> {
        let w = 2.0 * std::f32::consts::PI / 8.0;
        Array2::from_shape_fn((n, n), |(r, c)| {
            128.0 + amplitude * (w * c as f32).cos() + amplitude * (w * r as f32).cos()
        })
    }

    #[test]
    fn flat_plane_has_no_energy() {
        let plane = Array2::from_elem((32, 32), 90.0f32);
        let energy = calculate_energy(&plane, 3.0, &LogGaborParams::default());
        assert!(energy.iter().all(|&e| e.abs() < 1e-3));
    }

    #[test]
    fn stronger_texture_scores_higher() {
        let params = LogGaborParams::default();
        let strong = calculate_energy(&cosine_pattern(33, 60.0), 3.0, &params);
        let weak = calculate_energy(&cosine_pattern(33, 20.0), 3.0, &params);
        for (s, w) in strong.iter().zip(weak.iter()) {
            assert!(s > w);
        }
    }
}
