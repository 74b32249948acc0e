use thiserror::Error;

#[derive(Error, Debug)]
pub enum MicrostackError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    Configuration(String),

    #[error("Selection index {index} must be less than stack size {stack_size}")]
    InvalidSelectionIndex { index: usize, stack_size: usize },

    #[error("Image size mismatch: expected {}x{}, got {}x{}", expected.0, expected.1, actual.0, actual.1)]
    DimensionMismatch {
        expected: (usize, usize),
        actual: (usize, usize),
    },

    #[error("Channel count mismatch: expected {expected}, got {actual}")]
    ChannelMismatch { expected: usize, actual: usize },

    #[error("Phase correlation failed: {0}")]
    CorrelationFailure(String),

    #[error("No frames available to stack")]
    EmptyStack,

    #[error("Focus stacker has been stopped")]
    StackerStopped,

    #[error("Image format error: {0}")]
    Image(#[from] image::ImageError),
}

pub type Result<T> = std::result::Result<T, MicrostackError>;
