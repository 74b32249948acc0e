//! Rank-statistic background estimation over a rolling window of frames.

mod config;
mod manager;
mod model;
mod notify;
mod ring;

pub use config::BackgroundConfig;
pub use manager::BackgroundModelManager;
pub use model::{BackgroundModel, UpdateOutcome};
pub use notify::ModelUpdate;
pub use ring::RingStack;
