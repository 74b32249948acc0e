use crate::buffer::{Depth, ImageBuffer};
use crate::error::Result;
use crate::geometry::Rect;

/// A field-of-view image with the auxiliary layers produced alongside it.
///
/// `greyscale` and `colour` share one spatial layout; every optional layer
/// and every entry of `stack` has the same width and height.
#[derive(Clone, Debug, PartialEq)]
pub struct StackedFrame {
    pub greyscale: ImageBuffer,
    pub colour: ImageBuffer,
    /// 8-bit depth visualisation (source frame index times a display scale).
    pub depth: Option<ImageBuffer>,
    pub background: Option<ImageBuffer>,
    pub mask: Option<ImageBuffer>,
    /// Drift-corrected source frames in acquisition order.
    pub stack: Vec<ImageBuffer>,
}

impl StackedFrame {
    /// Wrap a single frame: the colour layer is the frame itself (single
    /// channel frames are replicated) and greyscale is the red-green mean.
    pub fn from_frame(frame: &ImageBuffer) -> Result<Self> {
        let colour = frame.to_colour()?;
        let greyscale = colour.greyscale_red_green().convert(Depth::U8);
        Ok(Self {
            greyscale,
            colour,
            depth: None,
            background: None,
            mask: None,
            stack: Vec::new(),
        })
    }

    pub fn width(&self) -> usize {
        self.colour.width()
    }

    pub fn height(&self) -> usize {
        self.colour.height()
    }

    /// Crop every layer to `rect`.
    pub fn crop(&self, rect: &Rect) -> StackedFrame {
        StackedFrame {
            greyscale: self.greyscale.crop(rect),
            colour: self.colour.crop(rect),
            depth: self.depth.as_ref().map(|d| d.crop(rect)),
            background: self.background.as_ref().map(|b| b.crop(rect)),
            mask: self.mask.as_ref().map(|m| m.crop(rect)),
            stack: self.stack.iter().map(|s| s.crop(rect)).collect(),
        }
    }
}
