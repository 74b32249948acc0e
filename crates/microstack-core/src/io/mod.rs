pub mod image_io;

pub use image_io::{load_image, load_image_greyscale, save_image};
