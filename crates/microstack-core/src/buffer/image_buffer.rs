use ndarray::{s, Array2, Array3, ArrayView2, Axis};
use serde::{Deserialize, Serialize};

use crate::consts::{COLOR_CHANNEL_COUNT, U8_MAX};
use crate::error::{MicrostackError, Result};
use crate::geometry::Rect;

/// Element type of an image. Storage is always `f32`; `U8` buffers keep
/// every value rounded and saturated to `[0, 255]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Depth {
    U8,
    F32,
}

impl Depth {
    /// Bring a value into the representable range of this depth.
    #[inline]
    pub fn saturate(self, value: f32) -> f32 {
        match self {
            Depth::U8 => {
                if value.is_nan() {
                    0.0
                } else {
                    value.round().clamp(0.0, U8_MAX)
                }
            }
            Depth::F32 => value,
        }
    }
}

/// A 2-D image with one or more channels.
///
/// Pixel data is a single contiguous array of shape
/// `(channels, height, width)`, so each channel is a plane that can be
/// viewed or copied without reshaping.
#[derive(Clone, Debug, PartialEq)]
pub struct ImageBuffer {
    data: Array3<f32>,
    depth: Depth,
}

impl ImageBuffer {
    /// Create a buffer with every element set to `value`.
    pub fn filled(width: usize, height: usize, channels: usize, depth: Depth, value: f32) -> Self {
        Self {
            data: Array3::from_elem((channels, height, width), depth.saturate(value)),
            depth,
        }
    }

    pub fn zeros(width: usize, height: usize, channels: usize, depth: Depth) -> Self {
        Self::filled(width, height, channels, depth, 0.0)
    }

    /// Wrap a `(channels, height, width)` array, saturating to `depth`.
    pub fn from_array(mut data: Array3<f32>, depth: Depth) -> Self {
        if depth == Depth::U8 {
            data.mapv_inplace(|v| depth.saturate(v));
        }
        Self { data, depth }
    }

    /// Single-channel buffer from one plane.
    pub fn from_plane(plane: Array2<f32>, depth: Depth) -> Self {
        let data = plane.insert_axis(Axis(0));
        Self::from_array(data, depth)
    }

    /// Multi-channel buffer from same-size planes.
    pub fn from_planes(planes: &[Array2<f32>], depth: Depth) -> Result<Self> {
        let first = planes.first().ok_or_else(|| {
            MicrostackError::Configuration("cannot build an image from zero planes".into())
        })?;
        let (h, w) = first.dim();
        let mut data = Array3::<f32>::zeros((planes.len(), h, w));
        for (c, plane) in planes.iter().enumerate() {
            if plane.dim() != (h, w) {
                return Err(MicrostackError::DimensionMismatch {
                    expected: (w, h),
                    actual: (plane.ncols(), plane.nrows()),
                });
            }
            data.index_axis_mut(Axis(0), c).assign(plane);
        }
        Ok(Self::from_array(data, depth))
    }

    /// A 0/255 8-bit mask image.
    pub fn from_mask(mask: &Array2<bool>) -> Self {
        Self::from_plane(mask.mapv(|m| if m { U8_MAX } else { 0.0 }), Depth::U8)
    }

    pub fn width(&self) -> usize {
        self.data.dim().2
    }

    pub fn height(&self) -> usize {
        self.data.dim().1
    }

    pub fn channels(&self) -> usize {
        self.data.dim().0
    }

    pub fn depth(&self) -> Depth {
        self.depth
    }

    /// `(width, height)`.
    pub fn size(&self) -> (usize, usize) {
        (self.width(), self.height())
    }

    pub fn data(&self) -> &Array3<f32> {
        &self.data
    }

    pub fn into_data(self) -> Array3<f32> {
        self.data
    }

    pub fn plane(&self, channel: usize) -> ArrayView2<'_, f32> {
        self.data.index_axis(Axis(0), channel)
    }

    pub fn get(&self, channel: usize, row: usize, col: usize) -> f32 {
        self.data[[channel, row, col]]
    }

    pub fn set(&mut self, channel: usize, row: usize, col: usize, value: f32) {
        self.data[[channel, row, col]] = self.depth.saturate(value);
    }

    /// Copy of one channel as a plain array.
    pub fn channel_array(&self, channel: usize) -> Array2<f32> {
        self.plane(channel).to_owned()
    }

    /// Copy of one channel as a single-channel buffer.
    pub fn extract_channel(&self, channel: usize) -> Result<ImageBuffer> {
        self.check_channel(channel)?;
        Ok(Self {
            data: self.data.slice(s![channel..channel + 1, .., ..]).to_owned(),
            depth: self.depth,
        })
    }

    /// Overwrite one channel with `plane`.
    pub fn insert_channel(&mut self, channel: usize, plane: ArrayView2<'_, f32>) -> Result<()> {
        self.check_channel(channel)?;
        if plane.dim() != (self.height(), self.width()) {
            return Err(MicrostackError::DimensionMismatch {
                expected: self.size(),
                actual: (plane.ncols(), plane.nrows()),
            });
        }
        let depth = self.depth;
        self.data
            .index_axis_mut(Axis(0), channel)
            .zip_mut_with(&plane, |dst, &src| *dst = depth.saturate(src));
        Ok(())
    }

    /// Split into owned per-channel planes.
    pub fn split(&self) -> Vec<Array2<f32>> {
        (0..self.channels()).map(|c| self.channel_array(c)).collect()
    }

    /// Same pixels at another depth.
    pub fn convert(&self, depth: Depth) -> ImageBuffer {
        Self::from_array(self.data.clone(), depth)
    }

    /// Greyscale as the mean of the red and green channels (RGB order).
    /// Single-channel buffers are cloned.
    pub fn greyscale_red_green(&self) -> ImageBuffer {
        if self.channels() < 2 {
            return self.clone();
        }
        let plane = (&self.plane(0) + &self.plane(1)) * 0.5;
        Self::from_plane(plane, self.depth)
    }

    /// Greyscale as the mean of all channels.
    pub fn sum_channels(&self) -> ImageBuffer {
        let n = self.channels().max(1) as f32;
        let plane = self.data.sum_axis(Axis(0)) / n;
        Self::from_plane(plane, self.depth)
    }

    /// Three-channel view of this image: colour buffers are cloned,
    /// single-channel buffers are replicated.
    pub fn to_colour(&self) -> Result<ImageBuffer> {
        match self.channels() {
            COLOR_CHANNEL_COUNT => Ok(self.clone()),
            1 => {
                let plane = self.channel_array(0);
                Self::from_planes(&[plane.clone(), plane.clone(), plane], self.depth)
            }
            n => Err(MicrostackError::ChannelMismatch {
                expected: COLOR_CHANNEL_COUNT,
                actual: n,
            }),
        }
    }

    /// Copy of the pixels inside `rect`, clipped to the image.
    pub fn crop(&self, rect: &Rect) -> ImageBuffer {
        let clipped = rect.clip(self.width(), self.height());
        Self {
            data: self
                .data
                .slice(s![
                    ..,
                    clipped.y..clipped.y + clipped.height,
                    clipped.x..clipped.x + clipped.width
                ])
                .to_owned(),
            depth: self.depth,
        }
    }

    /// Nonzero pixels of `channel` as a boolean mask.
    pub fn to_mask(&self, channel: usize) -> Array2<bool> {
        self.plane(channel).mapv(|v| v != 0.0)
    }

    pub fn check_same_size(&self, other: &ImageBuffer) -> Result<()> {
        self.check_size(other.width(), other.height())
    }

    pub fn check_size(&self, width: usize, height: usize) -> Result<()> {
        if self.size() != (width, height) {
            return Err(MicrostackError::DimensionMismatch {
                expected: (width, height),
                actual: self.size(),
            });
        }
        Ok(())
    }

    pub fn check_channels(&self, expected: usize) -> Result<()> {
        if self.channels() != expected {
            return Err(MicrostackError::ChannelMismatch {
                expected,
                actual: self.channels(),
            });
        }
        Ok(())
    }

    fn check_channel(&self, channel: usize) -> Result<()> {
        if channel >= self.channels() {
            return Err(MicrostackError::ChannelMismatch {
                expected: channel + 1,
                actual: self.channels(),
            });
        }
        Ok(())
    }

    pub(crate) fn data_mut(&mut self) -> &mut Array3<f32> {
        &mut self.data
    }
}
