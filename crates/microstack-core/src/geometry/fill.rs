use ndarray::Array2;

use super::Point;

/// Set every pixel inside or on the polygon `points` to `true`.
///
/// Interior pixels come from an even-odd scanline pass sampled at pixel
/// centres; the edges are then drawn so thin shapes and boundaries are
/// always covered. Parts of the polygon outside the mask are clipped.
pub fn fill_poly(mask: &mut Array2<bool>, points: &[Point]) {
    if points.is_empty() {
        return;
    }
    let (h, w) = mask.dim();
    let n = points.len();

    let y_min = points.iter().map(|p| p.y).min().unwrap_or(0).max(0);
    let y_max = points.iter().map(|p| p.y).max().unwrap_or(-1).min(h as i32 - 1);
    let mut crossings: Vec<f64> = Vec::with_capacity(n);
    for y in y_min..=y_max {
        crossings.clear();
        let yf = y as f64;
        for i in 0..n {
            let a = points[i];
            let b = points[(i + 1) % n];
            if a.y == b.y {
                continue;
            }
            let (lo, hi) = if a.y < b.y { (a, b) } else { (b, a) };
            if y >= lo.y && y < hi.y {
                let t = (yf - lo.y as f64) / (hi.y - lo.y) as f64;
                crossings.push(lo.x as f64 + t * (hi.x - lo.x) as f64);
            }
        }
        crossings.sort_by(|a, b| a.total_cmp(b));
        for pair in crossings.chunks_exact(2) {
            let x0 = pair[0].ceil().max(0.0) as i64;
            let x1 = pair[1].floor().min(w as f64 - 1.0) as i64;
            for x in x0..=x1 {
                mask[[y as usize, x as usize]] = true;
            }
        }
    }

    for i in 0..n {
        draw_line(mask, points[i], points[(i + 1) % n]);
    }
}

/// Bresenham segment, clipped to the mask.
fn draw_line(mask: &mut Array2<bool>, a: Point, b: Point) {
    let (h, w) = mask.dim();
    let (mut x, mut y) = (a.x, a.y);
    let dx = (b.x - a.x).abs();
    let dy = -(b.y - a.y).abs();
    let sx = if a.x < b.x { 1 } else { -1 };
    let sy = if a.y < b.y { 1 } else { -1 };
    let mut err = dx + dy;
    loop {
        if x >= 0 && y >= 0 && (x as usize) < w && (y as usize) < h {
            mask[[y as usize, x as usize]] = true;
        }
        if x == b.x && y == b.y {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x += sx;
        }
        if e2 <= dx {
            err += dx;
            y += sy;
        }
    }
}
