mod image_buffer;
pub mod ops;
pub mod order;
pub mod warp;

pub use image_buffer::{Depth, ImageBuffer};
pub use ops::ThresholdKind;
pub use warp::{translate, warp_affine, Affine2, BorderPolicy};
