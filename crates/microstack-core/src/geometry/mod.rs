//! Integer-plane geometry: points, rectangles, contours and their tracing
//! and rasterisation.

mod contour;
mod fill;
mod primitives;
mod square;
mod trace;

pub use contour::Contour;
pub use fill::fill_poly;
pub use primitives::{Point, PointF, Rect, RectF};
pub use square::CropSquare;
pub use trace::find_external_contours;
