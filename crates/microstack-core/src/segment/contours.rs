use tracing::debug;

use crate::buffer::{ImageBuffer, ThresholdKind};
use crate::consts::{DEFAULT_CLOSING_KERNEL_SIZE, U8_MAX};
use crate::filters::{close, open, StructuringElement};
use crate::geometry::{find_external_contours, Contour, RectF};

/// Outer contours of the pixels above `threshold` in channel 0, after a
/// closing with a `kernel_size` square merges nearby fragments.
pub fn find_binary_contours(image: &ImageBuffer, threshold: f32, kernel_size: usize) -> Vec<Contour> {
    let mask = binary_mask(image, threshold);
    let closed = close(&mask, &StructuringElement::rect(kernel_size));
    find_external_contours(&closed)
}

/// As [`find_binary_contours`] but opening instead, which drops thin
/// bridges and specks smaller than the kernel.
pub fn find_binary_contours_opening(
    image: &ImageBuffer,
    threshold: f32,
    kernel_size: usize,
) -> Vec<Contour> {
    let mask = binary_mask(image, threshold);
    let opened = open(&mask, &StructuringElement::rect(kernel_size));
    find_external_contours(&opened)
}

fn binary_mask(image: &ImageBuffer, threshold: f32) -> ndarray::Array2<bool> {
    image
        .threshold(threshold, U8_MAX, ThresholdKind::Binary)
        .to_mask(0)
}

/// Split `contours` into `(valid, invalid)`.
///
/// Valid contours have at least `area_threshold` area, a convexity ratio of
/// at least `convexity_threshold` (and no more than one), and a sub-pixel
/// centroid inside `valid_region`, edges included. Every contour lands in
/// exactly one list, order preserved.
pub fn classify(
    contours: Vec<Contour>,
    area_threshold: f64,
    convexity_threshold: f64,
    valid_region: &RectF,
) -> (Vec<Contour>, Vec<Contour>) {
    contours.into_iter().partition(|c| {
        c.area() >= area_threshold
            && c.convexity_ratio() >= convexity_threshold
            && !c.is_degenerate()
            && valid_region.contains(c.centroid_f())
    })
}

/// Whether `difference` holds at least one valid particle in a
/// `width x height` frame, ignoring centroids within `buffer` of the edge.
pub fn check_for_particle(
    width: usize,
    height: usize,
    difference: &ImageBuffer,
    threshold: f32,
    area_threshold: f64,
    convexity_threshold: f64,
    buffer: usize,
) -> bool {
    let contours = find_binary_contours(difference, threshold, DEFAULT_CLOSING_KERNEL_SIZE);
    let region = RectF::inset(width, height, buffer);
    let (valid, invalid) = classify(contours, area_threshold, convexity_threshold, &region);
    debug!(valid = valid.len(), invalid = invalid.len(), "Particle check");
    !valid.is_empty()
}
