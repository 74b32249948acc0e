use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use ndarray::Array2;
use parking_lot::{Condvar, Mutex};
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::align::{estimate_offset_array, DriftOffset};
use crate::buffer::{translate, BorderPolicy, Depth, ImageBuffer};
use crate::error::{MicrostackError, Result};

use super::fusion::{fuse, FocusLayer, FusedStack};
use super::{calculate_energy, StackerConfig};

/// What [`FocusStacker::add`] did with a frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AddOutcome {
    Queued,
    /// The input queue was full; the frame was discarded.
    Dropped,
    /// [`FocusStacker::stop`] has been called.
    Stopped,
}

struct QueuedFrame {
    frame: ImageBuffer,
    is_new_stack: bool,
}

#[derive(Default)]
struct Shared {
    pending: Mutex<usize>,
    drained: Condvar,
    layers: Mutex<Vec<FocusLayer>>,
    reference: Mutex<Option<Array2<f32>>>,
    reset_pending: AtomicBool,
    dropped: AtomicU64,
    processed: AtomicU64,
}

impl Shared {
    fn finish_one(&self) {
        let mut pending = self.pending.lock();
        *pending = pending.saturating_sub(1);
        if *pending == 0 {
            self.drained.notify_all();
        }
    }
}

/// Asynchronous focus-stacking session.
///
/// Frames are queued without blocking and corrected on one worker thread in
/// submission order: each frame's per-channel energy is computed in
/// parallel, and its drift against the previous frame's reference channel
/// is removed from the frame and its energies. [`stack`](Self::stack)
/// waits for the queue to drain, fuses everything collected so far and
/// starts a fresh session.
pub struct FocusStacker {
    config: StackerConfig,
    sender: Mutex<Option<Sender<QueuedFrame>>>,
    receiver: Mutex<Option<Receiver<QueuedFrame>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
    shared: Arc<Shared>,
}

impl FocusStacker {
    pub fn new(config: StackerConfig) -> Result<Self> {
        config.validate()?;
        let (sender, receiver) = bounded(config.queue_capacity);
        Ok(Self {
            config,
            sender: Mutex::new(Some(sender)),
            receiver: Mutex::new(Some(receiver)),
            worker: Mutex::new(None),
            shared: Arc::new(Shared::default()),
        })
    }

    pub fn config(&self) -> &StackerConfig {
        &self.config
    }

    /// Spawn the worker. Frames added earlier wait in the queue until now.
    pub fn start(&self) -> Result<()> {
        let Some(receiver) = self.receiver.lock().take() else {
            return Ok(());
        };
        let shared = Arc::clone(&self.shared);
        let config = self.config.clone();
        let handle = std::thread::Builder::new()
            .name("focus-stacker".into())
            .spawn(move || run_worker(receiver, shared, config))?;
        *self.worker.lock() = Some(handle);
        info!(
            width = self.config.width,
            height = self.config.height,
            capacity = self.config.queue_capacity,
            "Focus stacker started"
        );
        Ok(())
    }

    /// Refuse further frames. Frames already queued are still processed.
    pub fn stop(&self) {
        if self.sender.lock().take().is_some() {
            info!("Focus stacker stopped");
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.sender.lock().is_none()
    }

    /// Queue `frame` without blocking. `is_new_stack` restarts drift
    /// correction at this frame.
    pub fn add(&self, frame: ImageBuffer, is_new_stack: bool) -> Result<AddOutcome> {
        frame.check_size(self.config.width, self.config.height)?;
        let guard = self.sender.lock();
        let Some(sender) = guard.as_ref() else {
            return Ok(AddOutcome::Stopped);
        };

        // Count before sending so the worker never sees a frame it has not
        // been told about.
        *self.shared.pending.lock() += 1;
        match sender.try_send(QueuedFrame {
            frame,
            is_new_stack,
        }) {
            Ok(()) => Ok(AddOutcome::Queued),
            Err(TrySendError::Full(dropped)) => {
                self.shared.finish_one();
                if dropped.is_new_stack {
                    self.shared.reset_pending.store(true, Ordering::Release);
                }
                let count = self.shared.dropped.fetch_add(1, Ordering::Relaxed) + 1;
                warn!(dropped = count, "Focus stacker queue full, frame dropped");
                Ok(AddOutcome::Dropped)
            }
            Err(TrySendError::Disconnected(_)) => {
                self.shared.finish_one();
                Ok(AddOutcome::Stopped)
            }
        }
    }

    /// Like [`add`](Self::add), but waits for queue space instead of
    /// dropping. For offline stacks where no frame may be lost. Starts the
    /// worker if needed so the queue always drains.
    pub fn add_blocking(&self, frame: ImageBuffer, is_new_stack: bool) -> Result<AddOutcome> {
        frame.check_size(self.config.width, self.config.height)?;
        self.start()?;
        // Send on a clone so `stop` and `start` are not blocked behind us.
        let Some(sender) = self.sender.lock().clone() else {
            return Ok(AddOutcome::Stopped);
        };
        *self.shared.pending.lock() += 1;
        match sender.send(QueuedFrame {
            frame,
            is_new_stack,
        }) {
            Ok(()) => Ok(AddOutcome::Queued),
            Err(_) => {
                self.shared.finish_one();
                Ok(AddOutcome::Stopped)
            }
        }
    }

    /// Fuse every frame added so far and reset for the next stack.
    ///
    /// Blocks until all queued frames are corrected, starting the worker
    /// first if needed.
    pub fn stack(&self) -> Result<FusedStack> {
        self.start()?;
        self.wait_until_drained();

        let layers = std::mem::take(&mut *self.shared.layers.lock());
        *self.shared.reference.lock() = None;
        if layers.is_empty() {
            return Err(MicrostackError::EmptyStack);
        }
        fuse(layers, &self.config)
    }

    /// Discard corrected frames and the drift reference once the queue has
    /// drained.
    pub fn reset(&self) -> Result<()> {
        self.start()?;
        self.wait_until_drained();
        self.shared.layers.lock().clear();
        *self.shared.reference.lock() = None;
        Ok(())
    }

    /// Frames corrected and waiting for [`stack`](Self::stack).
    pub fn corrected_count(&self) -> usize {
        self.shared.layers.lock().len()
    }

    /// Frames queued or being corrected.
    pub fn pending_count(&self) -> usize {
        *self.shared.pending.lock()
    }

    pub fn dropped_count(&self) -> u64 {
        self.shared.dropped.load(Ordering::Relaxed)
    }

    pub fn processed_count(&self) -> u64 {
        self.shared.processed.load(Ordering::Relaxed)
    }

    fn wait_until_drained(&self) {
        let mut pending = self.shared.pending.lock();
        while *pending > 0 {
            self.shared.drained.wait(&mut pending);
        }
    }
}

impl Drop for FocusStacker {
    fn drop(&mut self) {
        self.sender.get_mut().take();
        self.receiver.get_mut().take();
        if let Some(handle) = self.worker.get_mut().take() {
            if handle.join().is_err() {
                warn!("Focus stacker worker panicked");
            }
        }
    }
}

fn run_worker(receiver: Receiver<QueuedFrame>, shared: Arc<Shared>, config: StackerConfig) {
    for queued in receiver.iter() {
        match correct_frame(&shared, &config, queued) {
            Ok(layer) => shared.layers.lock().push(layer),
            Err(e) => warn!(error = %e, "Focus stacker skipped a frame"),
        }
        shared.processed.fetch_add(1, Ordering::Relaxed);
        shared.finish_one();
    }
    debug!("Focus stacker worker finished");
}

/// Energy and drift correction of one frame.
fn correct_frame(shared: &Shared, config: &StackerConfig, queued: QueuedFrame) -> Result<FocusLayer> {
    let colour = queued.frame.to_colour()?;
    let planes = colour.split();
    let energies: Vec<Array2<f32>> = planes
        .par_iter()
        .map(|plane| calculate_energy(plane, config.energy_sigma, &config.log_gabor))
        .collect();

    let restart = shared.reset_pending.swap(false, Ordering::AcqRel) || queued.is_new_stack;
    let mut reference = shared.reference.lock();
    let current = &planes[config.reference_channel];
    let offset = match reference.as_ref() {
        Some(previous) if config.correct_drift && !restart => {
            estimate_offset_array(previous, current).unwrap_or_else(|e| {
                warn!(error = %e, "Stack drift estimate failed, using zero offset");
                DriftOffset::zero()
            })
        }
        _ => DriftOffset::zero(),
    };

    if offset.is_zero() {
        *reference = Some(current.clone());
        return Ok(FocusLayer { colour, energies });
    }

    let back = offset.inverted();
    let energy_stack = ImageBuffer::from_planes(&energies, Depth::F32)?;
    let (colour, energy_stack) = rayon::join(
        || translate(&colour, back.dx, back.dy, BorderPolicy::Reflect101),
        || translate(&energy_stack, back.dx, back.dy, BorderPolicy::Reflect101),
    );
    *reference = Some(colour.channel_array(config.reference_channel));
    debug!(dx = offset.dx, dy = offset.dy, "Stack frame drift corrected");
    Ok(FocusLayer {
        colour,
        energies: energy_stack.split(),
    })
}
