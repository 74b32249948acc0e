use serde::{Deserialize, Serialize};

use crate::consts::{
    COLOR_CHANNEL_COUNT, DEPTH_CHANNEL, DEPTH_SIGMA, DEPTH_TO_IMAGE_FACTOR, ENERGY_SIGMA,
    REFERENCE_CHANNEL, STACKER_QUEUE_CAPACITY,
};
use crate::error::{MicrostackError, Result};
use crate::filters::LogGaborParams;

/// Which smoothed depth map drives the per-channel interpolation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DepthMode {
    /// Every channel follows the depth of `depth_channel`.
    #[default]
    Canonical,
    /// Every channel follows its own depth map.
    PerChannel,
}

/// Focus stacker parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StackerConfig {
    /// Frame width; zero until a frame size is known.
    #[serde(default)]
    pub width: usize,
    #[serde(default)]
    pub height: usize,
    /// Frames that may wait for processing before new ones are dropped.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
    #[serde(default = "default_energy_sigma")]
    pub energy_sigma: f32,
    #[serde(default = "default_depth_sigma")]
    pub depth_sigma: f32,
    /// Depth index to 8-bit scale for the depth visualisation.
    #[serde(default = "default_depth_to_image_factor")]
    pub depth_to_image_factor: f32,
    #[serde(default = "default_depth_channel")]
    pub depth_channel: usize,
    /// Channel used for frame-to-frame drift correction.
    #[serde(default = "default_reference_channel")]
    pub reference_channel: usize,
    #[serde(default)]
    pub depth_mode: DepthMode,
    #[serde(default = "default_correct_drift")]
    pub correct_drift: bool,
    #[serde(default)]
    pub log_gabor: LogGaborParams,
}

fn default_queue_capacity() -> usize {
    STACKER_QUEUE_CAPACITY
}
fn default_energy_sigma() -> f32 {
    ENERGY_SIGMA
}
fn default_depth_sigma() -> f32 {
    DEPTH_SIGMA
}
fn default_depth_to_image_factor() -> f32 {
    DEPTH_TO_IMAGE_FACTOR
}
fn default_depth_channel() -> usize {
    DEPTH_CHANNEL
}
fn default_reference_channel() -> usize {
    REFERENCE_CHANNEL
}
fn default_correct_drift() -> bool {
    true
}

impl Default for StackerConfig {
    fn default() -> Self {
        Self::new(0, 0)
    }
}

impl StackerConfig {
    /// Defaults for frames of the given size.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            queue_capacity: STACKER_QUEUE_CAPACITY,
            energy_sigma: ENERGY_SIGMA,
            depth_sigma: DEPTH_SIGMA,
            depth_to_image_factor: DEPTH_TO_IMAGE_FACTOR,
            depth_channel: DEPTH_CHANNEL,
            reference_channel: REFERENCE_CHANNEL,
            depth_mode: DepthMode::default(),
            correct_drift: true,
            log_gabor: LogGaborParams::default(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(MicrostackError::Configuration(format!(
                "stacker frame size must be non-zero, got {}x{}",
                self.width, self.height
            )));
        }
        if self.queue_capacity == 0 {
            return Err(MicrostackError::Configuration(
                "stacker queue capacity must be at least 1".into(),
            ));
        }
        for (name, channel) in [
            ("depth_channel", self.depth_channel),
            ("reference_channel", self.reference_channel),
        ] {
            if channel >= COLOR_CHANNEL_COUNT {
                return Err(MicrostackError::Configuration(format!(
                    "{name} must be below {COLOR_CHANNEL_COUNT}, got {channel}"
                )));
            }
        }
        for (name, sigma) in [
            ("energy_sigma", self.energy_sigma),
            ("depth_sigma", self.depth_sigma),
        ] {
            if !(sigma.is_finite() && sigma >= 0.0) {
                return Err(MicrostackError::Configuration(format!(
                    "{name} must be a non-negative number, got {sigma}"
                )));
            }
        }
        let gabor = &self.log_gabor;
        if !(gabor.wavelength > 1.0 && gabor.sigma_on_f > 0.0 && gabor.sigma_on_f < 1.0) {
            return Err(MicrostackError::Configuration(format!(
                "log-Gabor wavelength must exceed 1 and sigma_on_f lie in (0, 1), got {} and {}",
                gabor.wavelength, gabor.sigma_on_f
            )));
        }
        Ok(())
    }
}
