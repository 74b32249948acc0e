pub mod gaussian_blur;
pub mod log_gabor;
pub mod morphology;

pub use gaussian_blur::{gaussian_blur, gaussian_blur_array};
pub use log_gabor::{log_gabor_pair, LogGaborParams};
pub use morphology::{close, dilate, erode, open, StructuringElement};
