use super::{Point, Rect};

/// A square crop window around a centroid, clipped to the image, together
/// with the centroid's position inside the crop.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CropSquare {
    pub rect: Rect,
    pub centroid: Point,
}

impl CropSquare {
    /// Window of `2 * half_width + 1` pixels centred on `centroid`, clipped
    /// to a `width x height` image. The centroid is clamped into the image
    /// first so the window always holds at least one pixel.
    pub fn new(centroid: Point, half_width: usize, width: usize, height: usize) -> Self {
        let cx = centroid.x.clamp(0, width.saturating_sub(1) as i32) as usize;
        let cy = centroid.y.clamp(0, height.saturating_sub(1) as i32) as usize;
        let start_x = cx.saturating_sub(half_width);
        let start_y = cy.saturating_sub(half_width);
        let end_x = (cx + half_width).min(width.saturating_sub(1));
        let end_y = (cy + half_width).min(height.saturating_sub(1));
        let rect = Rect::new(start_x, start_y, end_x - start_x + 1, end_y - start_y + 1);
        let local = Point::new(cx.min(half_width) as i32, cy.min(half_width) as i32);
        Self {
            rect,
            centroid: local,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interior_square_is_full_size() {
        let sq = CropSquare::new(Point::new(50, 40), 10, 100, 100);
        assert_eq!(sq.rect, Rect::new(40, 30, 21, 21));
        assert_eq!(sq.centroid, Point::new(10, 10));
    }

    #[test]
    fn corner_square_is_never_empty() {
        let sq = CropSquare::new(Point::new(0, 0), 0, 8, 8);
        assert_eq!(sq.rect, Rect::new(0, 0, 1, 1));
        let sq = CropSquare::new(Point::new(-4, 20), 2, 8, 8);
        assert_eq!(sq.rect, Rect::new(0, 5, 3, 3));
        assert_eq!(sq.centroid, Point::new(0, 2));
    }
}
