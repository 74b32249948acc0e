//! Focus stacking: fuse a z-stack of frames into one all-in-focus image
//! with a depth map.

mod config;
mod energy;
mod fusion;
mod stacker;

pub use config::{DepthMode, StackerConfig};
pub use energy::calculate_energy;
pub use fusion::{fuse, FocusLayer, FusedStack};
pub use stacker::{AddOutcome, FocusStacker};
