use crossbeam_channel::{unbounded, Receiver};

use crate::error::{MicrostackError, Result};

use super::{BackgroundConfig, BackgroundModel, ModelUpdate};

/// A set of same-size background models sharing stack parameters, e.g.
/// one per field of view.
pub struct BackgroundModelManager {
    models: Vec<BackgroundModel>,
    config: BackgroundConfig,
}

impl BackgroundModelManager {
    /// `count` models with ids `0..count`.
    pub fn new(count: usize, width: usize, height: usize, config: BackgroundConfig) -> Result<Self> {
        config.validate()?;
        let models = (0..count)
            .map(|id| BackgroundModel::new(id, width, height, config.clone()))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { models, config })
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    pub fn models(&self) -> &[BackgroundModel] {
        &self.models
    }

    pub fn model(&self, id: usize) -> Option<&BackgroundModel> {
        self.models.get(id)
    }

    pub fn model_mut(&mut self, id: usize) -> Option<&mut BackgroundModel> {
        self.models.get_mut(id)
    }

    pub fn config(&self) -> &BackgroundConfig {
        &self.config
    }

    pub fn initialise_all(&mut self) {
        for model in &mut self.models {
            model.initialise();
        }
    }

    /// Resize every model's window. A selection index that no longer fits
    /// is lowered to `stack_size - 1`.
    pub fn set_stack_size(&mut self, stack_size: usize) -> Result<()> {
        if stack_size == 0 {
            return Err(MicrostackError::Configuration(
                "background stack size must be at least 1".into(),
            ));
        }
        for model in &mut self.models {
            model.set_stack_size(stack_size)?;
        }
        self.config.stack_size = stack_size;
        self.config.selection_index = self.config.selection_index.min(stack_size - 1);
        Ok(())
    }

    pub fn set_selection_index(&mut self, index: usize) -> Result<()> {
        if index >= self.config.stack_size {
            return Err(MicrostackError::InvalidSelectionIndex {
                index,
                stack_size: self.config.stack_size,
            });
        }
        for model in &mut self.models {
            model.set_selection_index(index)?;
        }
        self.config.selection_index = index;
        Ok(())
    }

    pub fn set_initial_threshold(&mut self, threshold: u8) {
        for model in &mut self.models {
            model.set_initial_threshold(threshold);
        }
        self.config.initial_threshold = threshold;
    }

    /// One receiver fed by every model; updates carry their `model_id`.
    pub fn subscribe(&mut self) -> Receiver<ModelUpdate> {
        let (tx, rx) = unbounded();
        for model in &mut self.models {
            model.attach_observer(tx.clone());
        }
        rx
    }
}
