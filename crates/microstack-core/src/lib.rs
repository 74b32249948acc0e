pub mod align;
pub mod background;
pub mod buffer;
pub mod consts;
pub mod error;
pub mod fft;
pub mod filters;
pub mod frame;
pub mod geometry;
pub mod io;
pub mod pipeline;
pub mod segment;
pub mod stacking;
