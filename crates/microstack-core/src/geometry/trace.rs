//! Outer boundary extraction from a binary mask.
//!
//! Foreground is 8-connected and background 4-connected. Only components
//! that touch the background region reaching the image border are traced;
//! holes and anything nested inside them are ignored.

use std::collections::VecDeque;

use ndarray::Array2;

use super::{Contour, Point};

/// Clockwise neighbour ring in image coordinates (y down), starting west.
const RING: [(i32, i32); 8] = [
    (-1, 0),
    (-1, -1),
    (0, -1),
    (1, -1),
    (1, 0),
    (1, 1),
    (0, 1),
    (-1, 1),
];

/// Trace the outer boundary of every external component in `mask`.
///
/// Contours come back in raster order of their top-left pixel, with runs of
/// collinear boundary pixels compressed to their end points.
pub fn find_external_contours(mask: &Array2<bool>) -> Vec<Contour> {
    let (h, w) = mask.dim();
    if h == 0 || w == 0 {
        return Vec::new();
    }

    let (labels, starts) = label_components(mask);
    let outside = exterior_background(mask);

    starts
        .into_iter()
        .filter(|&(row, col)| row == 0 || outside[[row - 1, col]])
        .map(|(row, col)| {
            let label = labels[[row, col]];
            let boundary = trace_boundary(&labels, label, Point::new(col as i32, row as i32));
            Contour::new(compress_chain(boundary))
        })
        .collect()
}

/// 8-connected two-pass labelling. Returns resolved labels and the first
/// pixel of each component in raster order.
fn label_components(mask: &Array2<bool>) -> (Array2<u32>, Vec<(usize, usize)>) {
    let (h, w) = mask.dim();
    let mut labels = Array2::<u32>::zeros((h, w));
    let mut parent: Vec<u32> = vec![0];

    for row in 0..h {
        for col in 0..w {
            if !mask[[row, col]] {
                continue;
            }
            let mut neighbours = [0u32; 4];
            if col > 0 {
                neighbours[0] = labels[[row, col - 1]];
            }
            if row > 0 {
                if col > 0 {
                    neighbours[1] = labels[[row - 1, col - 1]];
                }
                neighbours[2] = labels[[row - 1, col]];
                if col + 1 < w {
                    neighbours[3] = labels[[row - 1, col + 1]];
                }
            }
            let smallest = neighbours.iter().copied().filter(|&l| l > 0).min();
            match smallest {
                None => {
                    let next = parent.len() as u32;
                    parent.push(next);
                    labels[[row, col]] = next;
                }
                Some(min) => {
                    labels[[row, col]] = min;
                    for &l in neighbours.iter().filter(|&&l| l > 0 && l != min) {
                        union(&mut parent, min, l);
                    }
                }
            }
        }
    }

    let mut starts = Vec::new();
    let mut seen = vec![false; parent.len()];
    for row in 0..h {
        for col in 0..w {
            let l = labels[[row, col]];
            if l == 0 {
                continue;
            }
            let root = find(&parent, l);
            labels[[row, col]] = root;
            if !seen[root as usize] {
                seen[root as usize] = true;
                starts.push((row, col));
            }
        }
    }
    (labels, starts)
}

fn find(parent: &[u32], mut x: u32) -> u32 {
    while parent[x as usize] != x {
        x = parent[x as usize];
    }
    x
}

fn union(parent: &mut [u32], a: u32, b: u32) {
    let ra = find(parent, a);
    let rb = find(parent, b);
    if ra != rb {
        let (small, big) = if ra < rb { (ra, rb) } else { (rb, ra) };
        parent[big as usize] = small;
    }
}

/// Background pixels 4-connected to the image border.
fn exterior_background(mask: &Array2<bool>) -> Array2<bool> {
    let (h, w) = mask.dim();
    let mut outside = Array2::<bool>::from_elem((h, w), false);
    let mut queue = VecDeque::new();

    let mut seed = |row: usize, col: usize, outside: &mut Array2<bool>| {
        if !mask[[row, col]] && !outside[[row, col]] {
            outside[[row, col]] = true;
            queue.push_back((row, col));
        }
    };
    for col in 0..w {
        seed(0, col, &mut outside);
        seed(h - 1, col, &mut outside);
    }
    for row in 0..h {
        seed(row, 0, &mut outside);
        seed(row, w - 1, &mut outside);
    }

    while let Some((row, col)) = queue.pop_front() {
        let candidates = [
            (row.wrapping_sub(1), col),
            (row + 1, col),
            (row, col.wrapping_sub(1)),
            (row, col + 1),
        ];
        for (r, c) in candidates {
            if r < h && c < w && !mask[[r, c]] && !outside[[r, c]] {
                outside[[r, c]] = true;
                queue.push_back((r, c));
            }
        }
    }
    outside
}

/// Moore-neighbour tracing from the component's top-left pixel, whose west
/// neighbour is always background.
fn trace_boundary(labels: &Array2<u32>, label: u32, start: Point) -> Vec<Point> {
    let (h, w) = labels.dim();
    let inside = |p: Point| {
        p.x >= 0
            && p.y >= 0
            && (p.x as usize) < w
            && (p.y as usize) < h
            && labels[[p.y as usize, p.x as usize]] == label
    };
    let step = |p: Point, backtrack: usize| -> Option<usize> {
        (1..=8)
            .map(|k| (backtrack + k) % 8)
            .find(|&d| inside(p.offset(RING[d].0, RING[d].1)))
    };

    let Some(first_dir) = step(start, 0) else {
        return vec![start];
    };

    let mut boundary = vec![start];
    let mut current = start.offset(RING[first_dir].0, RING[first_dir].1);
    let mut backtrack = back_direction(first_dir);
    // Each boundary pixel is visited at most twice per side it borders.
    let limit = 4 * h * w + 8;
    while boundary.len() < limit {
        let Some(dir) = step(current, backtrack) else {
            break;
        };
        if current == start && dir == first_dir {
            break;
        }
        boundary.push(current);
        current = current.offset(RING[dir].0, RING[dir].1);
        backtrack = back_direction(dir);
    }
    boundary
}

/// After moving along `dir`, the last background cell checked sits at this
/// ring index relative to the new pixel.
fn back_direction(dir: usize) -> usize {
    if dir % 2 == 0 {
        (dir + 6) % 8
    } else {
        (dir + 5) % 8
    }
}

/// Keep only the points where the chain changes direction.
fn compress_chain(points: Vec<Point>) -> Vec<Point> {
    let n = points.len();
    if n < 3 {
        return points;
    }
    let direction = |a: Point, b: Point| ((b.x - a.x).signum(), (b.y - a.y).signum());
    let kept: Vec<Point> = (0..n)
        .filter(|&i| {
            let prev = points[(i + n - 1) % n];
            let cur = points[i];
            let next = points[(i + 1) % n];
            direction(prev, cur) != direction(cur, next)
        })
        .map(|i| points[i])
        .collect();
    if kept.is_empty() {
        points
    } else {
        kept
    }
}
