use serde::{Deserialize, Serialize};

use super::{Point, PointF, Rect};

const DEGENERATE_TOLERANCE: f64 = 1e-9;

/// A closed polygon boundary with its shape descriptors computed once at
/// construction.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Contour {
    points: Vec<Point>,
    area: f64,
    perimeter: f64,
    convex_perimeter: f64,
    centroid_f: PointF,
}

impl Contour {
    pub fn new(points: Vec<Point>) -> Self {
        let area = polygon_area(&points).abs();
        let perimeter = closed_length(&points);
        let convex_perimeter = closed_length(&convex_hull(&points));
        let centroid_f = polygon_centroid(&points);
        Self {
            points,
            area,
            perimeter,
            convex_perimeter,
            centroid_f,
        }
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Enclosed area in square pixels (shoelace formula on the vertices).
    pub fn area(&self) -> f64 {
        self.area
    }

    pub fn perimeter(&self) -> f64 {
        self.perimeter
    }

    pub fn convex_perimeter(&self) -> f64 {
        self.convex_perimeter
    }

    /// Convex hull perimeter over perimeter. Zero for a contour with no
    /// length.
    pub fn convexity_ratio(&self) -> f64 {
        if self.perimeter <= 0.0 {
            0.0
        } else {
            self.convex_perimeter / self.perimeter
        }
    }

    /// A ratio above one cannot come from a simple polygon.
    pub fn is_degenerate(&self) -> bool {
        self.convexity_ratio() > 1.0 + DEGENERATE_TOLERANCE
    }

    pub fn centroid_f(&self) -> PointF {
        self.centroid_f
    }

    pub fn centroid(&self) -> Point {
        self.centroid_f.round()
    }

    /// Largest vertex distance from `centre`, and that vertex's angle in
    /// radians.
    pub fn max_radius(&self, centre: PointF) -> (f64, f64) {
        self.points
            .iter()
            .map(|p| {
                let dx = p.x as f64 - centre.x;
                let dy = p.y as f64 - centre.y;
                (dx.hypot(dy), dy.atan2(dx))
            })
            .fold((0.0, 0.0), |best, cur| if cur.0 > best.0 { cur } else { best })
    }

    /// Tight bounding rectangle of the vertices clipped to non-negative
    /// coordinates.
    pub fn bounding_rect(&self) -> Rect {
        let Some(first) = self.points.first() else {
            return Rect::default();
        };
        let (mut x0, mut y0, mut x1, mut y1) = (first.x, first.y, first.x, first.y);
        for p in &self.points {
            x0 = x0.min(p.x);
            y0 = y0.min(p.y);
            x1 = x1.max(p.x);
            y1 = y1.max(p.y);
        }
        let (x0, y0) = (x0.max(0), y0.max(0));
        Rect::new(
            x0 as usize,
            y0 as usize,
            (x1 - x0 + 1).max(0) as usize,
            (y1 - y0 + 1).max(0) as usize,
        )
    }

    pub fn translated(&self, dx: i32, dy: i32) -> Contour {
        Contour::new(self.points.iter().map(|p| p.offset(dx, dy)).collect())
    }
}

fn polygon_area(points: &[Point]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let mut twice = 0.0;
    for (i, p) in points.iter().enumerate() {
        let q = points[(i + 1) % points.len()];
        twice += p.x as f64 * q.y as f64 - q.x as f64 * p.y as f64;
    }
    twice * 0.5
}

fn closed_length(points: &[Point]) -> f64 {
    if points.len() < 2 {
        return 0.0;
    }
    points
        .iter()
        .enumerate()
        .map(|(i, p)| p.to_f64().distance(points[(i + 1) % points.len()].to_f64()))
        .sum()
}

fn polygon_centroid(points: &[Point]) -> PointF {
    if points.is_empty() {
        return PointF::default();
    }
    let signed = polygon_area(points);
    if signed.abs() < f64::EPSILON {
        let n = points.len() as f64;
        let (sx, sy) = points
            .iter()
            .fold((0.0, 0.0), |(sx, sy), p| (sx + p.x as f64, sy + p.y as f64));
        return PointF::new(sx / n, sy / n);
    }
    let (mut cx, mut cy) = (0.0, 0.0);
    for (i, p) in points.iter().enumerate() {
        let q = points[(i + 1) % points.len()];
        let (px, py, qx, qy) = (p.x as f64, p.y as f64, q.x as f64, q.y as f64);
        let cross = px * qy - qx * py;
        cx += (px + qx) * cross;
        cy += (py + qy) * cross;
    }
    PointF::new(cx / (6.0 * signed), cy / (6.0 * signed))
}

/// Monotone chain hull, counter-clockwise, without collinear points.
fn convex_hull(points: &[Point]) -> Vec<Point> {
    let mut pts: Vec<Point> = points.to_vec();
    pts.sort_by_key(|p| (p.x, p.y));
    pts.dedup();
    if pts.len() < 3 {
        return pts;
    }
    let cross = |o: Point, a: Point, b: Point| -> i64 {
        (a.x - o.x) as i64 * (b.y - o.y) as i64 - (a.y - o.y) as i64 * (b.x - o.x) as i64
    };
    let mut hull: Vec<Point> = Vec::with_capacity(pts.len() * 2);
    for &p in pts.iter().chain(pts.iter().rev().skip(1)) {
        while hull.len() >= 2 && cross(hull[hull.len() - 2], hull[hull.len() - 1], p) <= 0 {
            hull.pop();
        }
        hull.push(p);
    }
    hull.pop();
    hull
}
