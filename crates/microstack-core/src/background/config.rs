use serde::{Deserialize, Serialize};

use crate::consts::{
    DEFAULT_INITIAL_THRESHOLD, DEFAULT_SELECTION_INDEX, DEFAULT_STACK_SIZE,
    MAXIMUM_COUNT_BEFORE_RESET, MAXIMUM_OFFSET_BEFORE_RESET,
};
use crate::error::{MicrostackError, Result};

/// Parameters of one background model.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BackgroundConfig {
    /// Number of frames in the rolling window.
    #[serde(default = "default_stack_size")]
    pub stack_size: usize,
    /// Rank taken from the per-pixel sorted window (`stack_size / 2` is the median).
    #[serde(default = "default_selection_index")]
    pub selection_index: usize,
    /// Seed value of an empty model and truncation level for bright pixels
    /// during drift estimation.
    #[serde(default = "default_initial_threshold")]
    pub initial_threshold: u8,
    /// Supplied offsets longer than this (pixels) count as bad.
    #[serde(default = "default_max_offset")]
    pub max_offset: f64,
    /// Consecutive bad offsets that reset the model.
    #[serde(default = "default_max_bad_count")]
    pub max_bad_count: u32,
}

fn default_stack_size() -> usize {
    DEFAULT_STACK_SIZE
}
fn default_selection_index() -> usize {
    DEFAULT_SELECTION_INDEX
}
fn default_initial_threshold() -> u8 {
    DEFAULT_INITIAL_THRESHOLD
}
fn default_max_offset() -> f64 {
    MAXIMUM_OFFSET_BEFORE_RESET
}
fn default_max_bad_count() -> u32 {
    MAXIMUM_COUNT_BEFORE_RESET
}

impl Default for BackgroundConfig {
    fn default() -> Self {
        Self {
            stack_size: DEFAULT_STACK_SIZE,
            selection_index: DEFAULT_SELECTION_INDEX,
            initial_threshold: DEFAULT_INITIAL_THRESHOLD,
            max_offset: MAXIMUM_OFFSET_BEFORE_RESET,
            max_bad_count: MAXIMUM_COUNT_BEFORE_RESET,
        }
    }
}

impl BackgroundConfig {
    pub fn validate(&self) -> Result<()> {
        if self.stack_size == 0 {
            return Err(MicrostackError::Configuration(
                "background stack size must be at least 1".into(),
            ));
        }
        if self.selection_index >= self.stack_size {
            return Err(MicrostackError::InvalidSelectionIndex {
                index: self.selection_index,
                stack_size: self.stack_size,
            });
        }
        if !(self.max_offset.is_finite() && self.max_offset >= 0.0) {
            return Err(MicrostackError::Configuration(format!(
                "max_offset must be a non-negative number, got {}",
                self.max_offset
            )));
        }
        if self.max_bad_count == 0 {
            return Err(MicrostackError::Configuration(
                "max_bad_count must be at least 1".into(),
            ));
        }
        Ok(())
    }
}
