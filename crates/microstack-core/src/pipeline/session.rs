use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared on/off switch between an acquisition producer and its consumers.
///
/// Clones share one flag. `pause` publishes everything written before it
/// to any thread that later observes `is_enabled() == false`, and likewise
/// for `resume`.
#[derive(Clone, Debug)]
pub struct SessionControl {
    enabled: Arc<AtomicBool>,
}

impl Default for SessionControl {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionControl {
    /// A running session.
    pub fn new() -> Self {
        Self {
            enabled: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn pause(&self) {
        self.enabled.store(false, Ordering::Release);
    }

    pub fn resume(&self) {
        self.enabled.store(true, Ordering::Release);
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }
}
