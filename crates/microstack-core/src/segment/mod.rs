//! Particle segmentation from background-difference images.

mod config;
mod contours;
mod masked;
mod measure;
mod segmenter;

pub use config::SegmentConfig;
pub use contours::{
    check_for_particle, classify, find_binary_contours, find_binary_contours_opening,
};
pub use masked::MaskedRegion;
pub use measure::{centre_region, measure_region, RegionMeasurement};
pub use segmenter::{segment, SegmentResult};
