use ndarray::Array2;
use rayon::prelude::*;
use tracing::debug;

use crate::buffer::order::{argmax_along_stack, interpolate_from_index};
use crate::buffer::{Depth, ImageBuffer};
use crate::consts::U8_MAX;
use crate::error::{MicrostackError, Result};
use crate::filters::gaussian_blur_array;
use crate::frame::StackedFrame;

use super::{DepthMode, StackerConfig};

/// One drift-corrected frame of a z-stack and its per-channel focus energy.
#[derive(Clone, Debug)]
pub struct FocusLayer {
    pub colour: ImageBuffer,
    pub energies: Vec<Array2<f32>>,
}

/// Output of [`fuse`].
#[derive(Clone, Debug)]
pub struct FusedStack {
    /// Fused greyscale and colour, the depth visualisation and the
    /// corrected source frames.
    pub frame: StackedFrame,
    /// Per-pixel frame index of maximum energy in the depth channel.
    pub raw_depth: Array2<usize>,
    /// `raw_depth` after smoothing; the fractional index used for blending.
    pub depth_index: Array2<f32>,
}

impl FusedStack {
    pub fn frame_count(&self) -> usize {
        self.frame.stack.len()
    }
}

/// Fuse a z-stack.
///
/// Per channel, each pixel's raw depth is the earliest frame with the
/// highest energy. The depth map is smoothed with `depth_sigma` and every
/// channel is linearly blended between the two frames bracketing the
/// smoothed depth. The greyscale output is the fused depth channel.
pub fn fuse(layers: Vec<FocusLayer>, config: &StackerConfig) -> Result<FusedStack> {
    let first = layers.first().ok_or(MicrostackError::EmptyStack)?;
    let channels = first.colour.channels();
    let depth = first.colour.depth();
    let (width, height) = first.colour.size();
    if config.depth_channel >= channels {
        return Err(MicrostackError::ChannelMismatch {
            expected: config.depth_channel + 1,
            actual: channels,
        });
    }

    let n = layers.len();
    let mut planes: Vec<Vec<Array2<f32>>> = (0..channels).map(|_| Vec::with_capacity(n)).collect();
    let mut energies: Vec<Vec<Array2<f32>>> = (0..channels).map(|_| Vec::with_capacity(n)).collect();
    let mut frames = Vec::with_capacity(n);
    for layer in layers {
        layer.colour.check_size(width, height)?;
        layer.colour.check_channels(channels)?;
        if layer.energies.len() != channels {
            return Err(MicrostackError::ChannelMismatch {
                expected: channels,
                actual: layer.energies.len(),
            });
        }
        for (c, plane) in layer.colour.split().into_iter().enumerate() {
            planes[c].push(plane);
        }
        for (c, energy) in layer.energies.into_iter().enumerate() {
            energies[c].push(energy);
        }
        frames.push(layer.colour);
    }

    let raw: Vec<Array2<usize>> = energies
        .par_iter()
        .map(|stack| argmax_along_stack(stack))
        .collect();
    drop(energies);

    let smooth = |d: &Array2<usize>| gaussian_blur_array(&d.mapv(|v| v as f32), config.depth_sigma);
    let smoothed: Vec<Array2<f32>> = match config.depth_mode {
        DepthMode::Canonical => vec![smooth(&raw[config.depth_channel])],
        DepthMode::PerChannel => raw.par_iter().map(smooth).collect(),
    };
    let index_for = |c: usize| match config.depth_mode {
        DepthMode::Canonical => &smoothed[0],
        DepthMode::PerChannel => &smoothed[c],
    };

    let fused: Vec<Array2<f32>> = (0..channels)
        .into_par_iter()
        .map(|c| interpolate_from_index(&planes[c], index_for(c)))
        .collect();
    drop(planes);

    let factor = config.depth_to_image_factor;
    let raw_depth = raw[config.depth_channel].clone();
    let depth_image = ImageBuffer::from_plane(
        raw_depth.mapv(|d| (d as f32 * factor).min(U8_MAX)),
        Depth::U8,
    );
    let greyscale = ImageBuffer::from_plane(fused[config.depth_channel].clone(), depth);
    let colour = ImageBuffer::from_planes(&fused, depth)?;
    let depth_index = index_for(config.depth_channel).clone();

    debug!(frames = n, width, height, "Fused focus stack");

    Ok(FusedStack {
        frame: StackedFrame {
            greyscale,
            colour,
            depth: Some(depth_image),
            background: None,
            mask: None,
            stack: frames,
        },
        raw_depth,
        depth_index,
    })
}
