/// Minimum pixel count (h*w) to use row-level Rayon parallelism.
pub const PARALLEL_PIXEL_THRESHOLD: usize = 65_536;

/// Small epsilon to avoid division by zero in floating-point comparisons.
pub const EPSILON: f64 = 1e-12;

/// Largest value representable by an 8-bit pixel.
pub const U8_MAX: f32 = 255.0;

/// Number of channels in a colour frame (R, G, B).
pub const COLOR_CHANNEL_COUNT: usize = 3;

/// Default number of frames held by the background ring buffer.
pub const DEFAULT_STACK_SIZE: usize = 9;

/// Default rank taken from the sorted background stack (median of 9).
pub const DEFAULT_SELECTION_INDEX: usize = 4;

/// Default seed value of an uninitialised background model. Also the
/// truncation level used to suppress bright particles before correlation.
pub const DEFAULT_INITIAL_THRESHOLD: u8 = 40;

/// Offset magnitude (pixels) above which a supplied drift counts as bad.
pub const MAXIMUM_OFFSET_BEFORE_RESET: f64 = 150.0;

/// Consecutive bad offsets that force a background reset.
pub const MAXIMUM_COUNT_BEFORE_RESET: u32 = 2;

/// Default binary threshold applied to difference images.
pub const DEFAULT_SEGMENT_THRESHOLD: f32 = 20.0;

/// Default minimum contour area (pixels) for a valid particle.
pub const DEFAULT_AREA_THRESHOLD: f64 = 100.0;

/// Default minimum convexity ratio for a valid particle.
pub const DEFAULT_CONVEXITY_THRESHOLD: f64 = 0.9;

/// Default multiplier applied to a contour's maximum radius for crops.
pub const DEFAULT_CROP_BUFFER: f64 = 1.2;

/// Square kernel size used to close thresholded difference images.
pub const DEFAULT_CLOSING_KERNEL_SIZE: usize = 7;

/// Elliptical kernel size used to clean up per-particle masks.
pub const DEFAULT_MASK_KERNEL_SIZE: usize = 5;

/// Capacity of the focus stacker input queue.
pub const STACKER_QUEUE_CAPACITY: usize = 10;

/// Gaussian sigma applied to structure-tensor energy maps.
pub const ENERGY_SIGMA: f32 = 9.0;

/// Gaussian sigma applied to the depth map before interpolation.
pub const DEPTH_SIGMA: f32 = 5.0;

/// Scale from depth index to 8-bit depth visualisation (works for up to 13 frames).
pub const DEPTH_TO_IMAGE_FACTOR: f32 = 20.0;

/// Channel whose depth map is canonical (green in RGB order).
pub const DEPTH_CHANNEL: usize = 1;

/// Channel used for inter-frame drift correction (red in RGB order).
pub const REFERENCE_CHANNEL: usize = 0;

/// Log-Gabor centre wavelength (pixels) for the focus energy filters.
pub const LOG_GABOR_WAVELENGTH: f64 = 8.0;

/// Log-Gabor bandwidth ratio (sigma / f0) for the focus energy filters.
pub const LOG_GABOR_SIGMA_ON_F: f64 = 0.5;

/// Reflected border added around a plane before frequency-domain filtering.
pub const LOG_GABOR_PADDING: usize = 16;
