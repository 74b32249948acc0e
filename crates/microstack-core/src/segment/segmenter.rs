use ndarray::Array2;
use tracing::debug;

use crate::buffer::ImageBuffer;
use crate::error::Result;
use crate::filters::{close, StructuringElement};
use crate::frame::StackedFrame;
use crate::geometry::{fill_poly, Contour, CropSquare, Point, RectF};

use super::{classify, find_binary_contours, find_binary_contours_opening, MaskedRegion, SegmentConfig};

/// Everything [`segment`] found in one frame.
#[derive(Clone, Debug)]
pub struct SegmentResult {
    /// One colour crop per valid contour.
    pub crops: Vec<MaskedRegion>,
    /// The same crops taken from every layer of the input frame, each with
    /// its particle mask.
    pub stacked_crops: Vec<StackedFrame>,
    /// Valid contours in frame coordinates.
    pub contours: Vec<Contour>,
    /// Rejected contours in frame coordinates.
    pub invalid: Vec<Contour>,
    /// Union of all particle masks, 0/255.
    pub frame_mask: ImageBuffer,
}

impl SegmentResult {
    /// Every detected contour, valid first.
    pub fn all_contours(&self) -> impl Iterator<Item = &Contour> {
        self.contours.iter().chain(self.invalid.iter())
    }
}

/// Find particles in `frame`.
///
/// `difference` is thresholded when given, otherwise the frame's greyscale
/// layer. Each valid contour yields a square crop of half-width
/// `max_radius * crop_buffer` around its centroid, clipped to the frame but
/// never empty, and a closed mask of the filled contour.
pub fn segment(
    frame: &StackedFrame,
    difference: Option<&ImageBuffer>,
    config: &SegmentConfig,
) -> Result<SegmentResult> {
    config.validate()?;
    let (width, height) = (frame.width(), frame.height());
    let source = difference.unwrap_or(&frame.greyscale);
    source.check_size(width, height)?;

    let contours = if config.opening_radius > 0 {
        find_binary_contours_opening(source, config.threshold, config.opening_radius)
    } else {
        find_binary_contours(source, config.threshold, config.closing_kernel_size)
    };

    let valid_region = RectF::inset(width, height, config.search_buffer);
    let (valid, invalid) = classify(
        contours,
        config.area_threshold,
        config.convexity_threshold,
        &valid_region,
    );

    let element = StructuringElement::ellipse(config.mask_kernel_size);
    let mut frame_mask = Array2::from_elem((height, width), false);
    let mut crops = Vec::with_capacity(valid.len());
    let mut stacked_crops = Vec::with_capacity(valid.len());

    for contour in &valid {
        let centroid = contour.centroid();
        let (max_radius, _) = contour.max_radius(centroid.to_f64());
        let half_width = (max_radius * config.crop_buffer).round() as usize;
        let square = CropSquare::new(centroid, half_width, width, height);
        let rect = square.rect;

        let origin = Point::new(rect.x as i32, rect.y as i32);
        let local = contour.translated(-origin.x, -origin.y);
        let mut mask = Array2::from_elem((rect.height, rect.width), false);
        fill_poly(&mut mask, local.points());
        let mask = ImageBuffer::from_mask(&close(&mask, &element));
        fill_poly(&mut frame_mask, contour.points());

        crops.push(MaskedRegion {
            image: frame.colour.crop(&rect),
            mask: mask.clone(),
            contour: local,
            centroid: square.centroid,
            area: contour.area(),
        });

        let mut stacked = frame.crop(&rect);
        stacked.mask = Some(mask);
        stacked_crops.push(stacked);
    }

    let frame_mask = ImageBuffer::from_mask(&close(&frame_mask, &element));
    debug!(valid = valid.len(), invalid = invalid.len(), "Segmentation complete");

    Ok(SegmentResult {
        crops,
        stacked_crops,
        contours: valid,
        invalid,
        frame_mask,
    })
}
