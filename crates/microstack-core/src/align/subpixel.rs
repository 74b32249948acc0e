use ndarray::Array2;

use crate::consts::EPSILON;

/// Fractional `(row, col)` position of a correlation peak from a parabola
/// through the peak and its two neighbours along each axis.
///
/// Neighbours wrap around the surface edges, since a correlation surface is
/// periodic and a zero shift peaks at the origin.
pub fn refine_peak_parabolic(correlation: &Array2<f64>, peak_row: usize, peak_col: usize) -> (f64, f64) {
    let (h, w) = correlation.dim();
    if h < 3 || w < 3 {
        return (0.0, 0.0);
    }
    let centre = correlation[[peak_row, peak_col]];

    let up = correlation[[(peak_row + h - 1) % h, peak_col]];
    let down = correlation[[(peak_row + 1) % h, peak_col]];
    let left = correlation[[peak_row, (peak_col + w - 1) % w]];
    let right = correlation[[peak_row, (peak_col + 1) % w]];

    (vertex(up, centre, down), vertex(left, centre, right))
}

fn vertex(prev: f64, centre: f64, next: f64) -> f64 {
    let denom = prev - 2.0 * centre + next;
    if denom.abs() <= EPSILON {
        return 0.0;
    }
    ((prev - next) / (2.0 * denom)).clamp(-0.5, 0.5)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symmetric_peak_has_no_offset() {
        let mut c = Array2::<f64>::zeros((5, 5));
        c[[2, 2]] = 1.0;
        c[[1, 2]] = 0.5;
        c[[3, 2]] = 0.5;
        assert_eq!(refine_peak_parabolic(&c, 2, 2), (0.0, 0.0));
    }

    #[test]
    fn edge_peak_uses_wrapped_neighbour() {
        let mut c = Array2::<f64>::zeros((8, 8));
        c[[0, 0]] = 1.0;
        c[[0, 7]] = 0.6;
        c[[0, 1]] = 0.2;
        let (_, dx) = refine_peak_parabolic(&c, 0, 0);
        assert!(dx < 0.0);
    }
}
