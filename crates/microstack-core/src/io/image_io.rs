use std::path::Path;

use image::{ColorType, DynamicImage, GrayImage, Luma, Rgb, RgbImage};
use ndarray::Array3;

use crate::buffer::{Depth, ImageBuffer};
use crate::consts::COLOR_CHANNEL_COUNT;
use crate::error::{MicrostackError, Result};

/// Load an image file as an 8-bit buffer: greyscale files become one
/// channel, everything else three RGB channels.
pub fn load_image(path: &Path) -> Result<ImageBuffer> {
    let img = image::open(path)?;
    Ok(from_dynamic(&img))
}

/// Load an image file as a single 8-bit luma channel.
pub fn load_image_greyscale(path: &Path) -> Result<ImageBuffer> {
    let img = image::open(path)?;
    Ok(luma_buffer(&img.to_luma8()))
}

fn from_dynamic(img: &DynamicImage) -> ImageBuffer {
    match img.color() {
        ColorType::L8 | ColorType::L16 | ColorType::La8 | ColorType::La16 => {
            luma_buffer(&img.to_luma8())
        }
        _ => rgb_buffer(&img.to_rgb8()),
    }
}

fn luma_buffer(gray: &GrayImage) -> ImageBuffer {
    let (w, h) = gray.dimensions();
    let mut data = Array3::<f32>::zeros((1, h as usize, w as usize));
    for (col, row, pixel) in gray.enumerate_pixels() {
        data[[0, row as usize, col as usize]] = pixel.0[0] as f32;
    }
    ImageBuffer::from_array(data, Depth::U8)
}

fn rgb_buffer(rgb: &RgbImage) -> ImageBuffer {
    let (w, h) = rgb.dimensions();
    let mut data = Array3::<f32>::zeros((COLOR_CHANNEL_COUNT, h as usize, w as usize));
    for (col, row, pixel) in rgb.enumerate_pixels() {
        for c in 0..COLOR_CHANNEL_COUNT {
            data[[c, row as usize, col as usize]] = pixel.0[c] as f32;
        }
    }
    ImageBuffer::from_array(data, Depth::U8)
}

/// Save a one- or three-channel buffer as 8-bit, format chosen from the
/// file extension. Float buffers are saturated to `[0, 255]`.
pub fn save_image(buffer: &ImageBuffer, path: &Path) -> Result<()> {
    let (w, h) = buffer.size();
    let to_u8 = |v: f32| Depth::U8.saturate(v) as u8;
    match buffer.channels() {
        1 => {
            let mut img = GrayImage::new(w as u32, h as u32);
            for row in 0..h {
                for col in 0..w {
                    let v = to_u8(buffer.get(0, row, col));
                    img.put_pixel(col as u32, row as u32, Luma([v]));
                }
            }
            img.save(path)?;
        }
        COLOR_CHANNEL_COUNT => {
            let mut img = RgbImage::new(w as u32, h as u32);
            for row in 0..h {
                for col in 0..w {
                    let px = [
                        to_u8(buffer.get(0, row, col)),
                        to_u8(buffer.get(1, row, col)),
                        to_u8(buffer.get(2, row, col)),
                    ];
                    img.put_pixel(col as u32, row as u32, Rgb(px));
                }
            }
            img.save(path)?;
        }
        n => {
            return Err(MicrostackError::ChannelMismatch {
                expected: COLOR_CHANNEL_COUNT,
                actual: n,
            })
        }
    }
    Ok(())
}
