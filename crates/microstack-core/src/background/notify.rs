use std::sync::Arc;

use crossbeam_channel::{unbounded, Receiver, Sender};

use crate::buffer::ImageBuffer;

/// Published after every model recomputation or reset.
///
/// The model buffers are immutable snapshots; a later update publishes new
/// ones instead of mutating these.
#[derive(Clone, Debug)]
pub struct ModelUpdate {
    pub model_id: usize,
    /// Increases by one on every publication of a given model.
    pub generation: u64,
    /// Set when the model was reinitialised rather than updated.
    pub reset: bool,
    pub greyscale: Arc<ImageBuffer>,
    pub colour: Arc<ImageBuffer>,
}

/// Subscriber list. Disconnected receivers are pruned on the next send.
#[derive(Default)]
pub(crate) struct Observers {
    senders: Vec<Sender<ModelUpdate>>,
}

impl Observers {
    pub(crate) fn subscribe(&mut self) -> Receiver<ModelUpdate> {
        let (tx, rx) = unbounded();
        self.senders.push(tx);
        rx
    }

    pub(crate) fn attach(&mut self, sender: Sender<ModelUpdate>) {
        self.senders.push(sender);
    }

    pub(crate) fn notify(&mut self, update: &ModelUpdate) {
        self.senders.retain(|tx| tx.send(update.clone()).is_ok());
    }

    pub(crate) fn len(&self) -> usize {
        self.senders.len()
    }
}
