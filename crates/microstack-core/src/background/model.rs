use std::sync::Arc;

use crossbeam_channel::{Receiver, Sender};
use ndarray::Array2;
use tracing::{debug, info, warn};

use crate::align::{apply_offset, estimate_offset_or_zero, DriftOffset};
use crate::buffer::order::{argsort_along_stack, slice_from_index, sort_along_stack};
use crate::buffer::{BorderPolicy, Depth, ImageBuffer, ThresholdKind};
use crate::consts::{COLOR_CHANNEL_COUNT, U8_MAX};
use crate::error::{MicrostackError, Result};
use crate::geometry::{fill_poly, Contour};

use super::notify::{ModelUpdate, Observers};
use super::{BackgroundConfig, RingStack};

/// What an [`BackgroundModel::update`] call did with its frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// The model was empty; the frame seeded every slot.
    Seeded,
    /// The frame was aligned and written into the next slot.
    Inserted,
    /// Too many large offsets in a row; the model was reinitialised and the
    /// frame discarded.
    Reset,
}

/// Per-pixel rank background over the last `stack_size` frames.
///
/// Greyscale (mean of red and green) frames fill a ring of planes; each
/// recomputation sorts every pixel across the ring and takes the value at
/// `selection_index`. The colour model takes, per pixel, the colour frame
/// whose greyscale value holds that rank.
///
/// Every buffer is 8-bit. Published models are shared snapshots that are
/// replaced, never mutated.
pub struct BackgroundModel {
    id: usize,
    width: usize,
    height: usize,
    config: BackgroundConfig,
    grey_stack: RingStack<Array2<f32>>,
    colour_stack: RingStack<ImageBuffer>,
    sorted_grey: Vec<Array2<f32>>,
    greyscale_model: Arc<ImageBuffer>,
    colour_model: Arc<ImageBuffer>,
    bad_offset_count: u32,
    initialised: bool,
    generation: u64,
    observers: Observers,
}

impl BackgroundModel {
    pub fn new(id: usize, width: usize, height: usize, config: BackgroundConfig) -> Result<Self> {
        config.validate()?;
        if width == 0 || height == 0 {
            return Err(MicrostackError::Configuration(format!(
                "background model size must be non-zero, got {width}x{height}"
            )));
        }
        let seed = config.initial_threshold as f32;
        let n = config.stack_size;
        let mut model = Self {
            id,
            width,
            height,
            grey_stack: RingStack::filled(n, Array2::from_elem((height, width), seed)),
            colour_stack: RingStack::filled(
                n,
                ImageBuffer::filled(width, height, COLOR_CHANNEL_COUNT, Depth::U8, seed),
            ),
            sorted_grey: vec![Array2::from_elem((height, width), seed); n],
            greyscale_model: Arc::new(ImageBuffer::filled(width, height, 1, Depth::U8, seed)),
            colour_model: Arc::new(ImageBuffer::filled(
                width,
                height,
                COLOR_CHANNEL_COUNT,
                Depth::U8,
                seed,
            )),
            config,
            bad_offset_count: 0,
            initialised: false,
            generation: 0,
            observers: Observers::default(),
        };
        model.initialise();
        Ok(model)
    }

    /// Discard all history and return to the seeded, uninitialised state.
    pub fn initialise(&mut self) {
        let seed = self.config.initial_threshold as f32;
        let (w, h) = (self.width, self.height);
        let n = self.config.stack_size;

        self.grey_stack = RingStack::filled(n, Array2::from_elem((h, w), seed));
        self.colour_stack = RingStack::filled(
            n,
            ImageBuffer::filled(w, h, COLOR_CHANNEL_COUNT, Depth::U8, seed),
        );
        self.sorted_grey = vec![Array2::from_elem((h, w), seed); n];
        self.greyscale_model = Arc::new(ImageBuffer::filled(w, h, 1, Depth::U8, seed));
        self.colour_model = Arc::new(ImageBuffer::filled(
            w,
            h,
            COLOR_CHANNEL_COUNT,
            Depth::U8,
            seed,
        ));
        self.bad_offset_count = 0;
        self.initialised = false;
        debug!(model_id = self.id, "Background model initialised");
        self.publish(true);
    }

    /// Add `frame` to the model, ignoring pixels inside `excluded`.
    ///
    /// `known_offset` is the frame's drift relative to the model when the
    /// caller already measured it; otherwise it is estimated here. Supplied
    /// offsets longer than `max_offset` on `max_bad_count` consecutive calls
    /// reset the model instead.
    pub fn update(
        &mut self,
        frame: &ImageBuffer,
        excluded: &[Contour],
        known_offset: Option<DriftOffset>,
    ) -> Result<UpdateOutcome> {
        frame.check_size(self.width, self.height)?;

        if let Some(offset) = known_offset {
            if offset.magnitude() > self.config.max_offset {
                self.bad_offset_count += 1;
            } else {
                self.bad_offset_count = 0;
            }
            if self.bad_offset_count >= self.config.max_bad_count {
                warn!(
                    model_id = self.id,
                    offset = offset.magnitude(),
                    "Background reset after repeated large offsets"
                );
                self.initialise();
                return Ok(UpdateOutcome::Reset);
            }
        }

        let mut grey = self.greyscale_of(frame);
        let mut rgb = frame.to_colour()?.convert(Depth::U8);
        let mask = self.exclusion_mask(excluded);

        let outcome = if self.initialised {
            let offset = known_offset.unwrap_or_else(|| self.calculate_offset(&grey, None));
            let back = offset.inverted();
            grey = apply_offset(&grey, back, BorderPolicy::Reflect101);
            rgb = apply_offset(&rgb, back, BorderPolicy::Reflect101);
            let mask = apply_offset(&ImageBuffer::from_mask(&mask), back, BorderPolicy::Constant(0.0))
                .to_mask(0);

            grey.copy_from_where(&self.greyscale_model, &mask)?;
            rgb.copy_from_where(&self.colour_model, &mask)?;
            self.grey_stack.push(grey.channel_array(0));
            self.colour_stack.push(rgb);
            UpdateOutcome::Inserted
        } else {
            self.seed(&mut grey, &mut rgb, &mask);
            self.grey_stack.fill(&grey.channel_array(0));
            self.colour_stack.fill(&rgb);
            self.initialised = true;
            info!(model_id = self.id, "Background model seeded");
            UpdateOutcome::Seeded
        };

        self.recalculate_model();
        Ok(outcome)
    }

    /// Lift shadows and excluded pixels of a seed frame to
    /// `mean + 0.5 * stddev` of the unexcluded pixels.
    fn seed(&self, grey: &mut ImageBuffer, rgb: &mut ImageBuffer, mask: &Array2<bool>) {
        let outside = mask.mapv(|m| !m);
        let (mean, std) = grey.mean_stddev(Some(&outside))[0];
        let lower = (mean + 0.5 * std) as f32;

        let dark = grey
            .threshold(lower, U8_MAX, ThresholdKind::BinaryInv)
            .to_mask(0);
        let lifted = &dark | mask;
        grey.fill_where(&lifted, lower);
        rgb.fill_where(&lifted, lower);
    }

    /// Re-sort the ring and republish both models.
    pub fn recalculate_model(&mut self) {
        let planes = self.grey_stack.slots();
        let n = planes.len();
        let index = self.config.selection_index.min(n - 1);

        let sorted = sort_along_stack(planes);
        let order = argsort_along_stack(planes);
        let grey = ImageBuffer::from_plane(sorted[index].clone(), Depth::U8);
        let colour = slice_from_index(self.colour_stack.slots(), &order[index], Depth::U8);

        self.sorted_grey = sorted;
        self.greyscale_model = Arc::new(grey);
        self.colour_model = Arc::new(colour);
        self.publish(false);
    }

    /// Greyscale residual of `frame` against the model, and the drift used
    /// to align the model with it.
    ///
    /// Before the first update the residual is taken against the mean of
    /// the frame's pixels at or below `initial_threshold`.
    pub fn difference(&self, frame: &ImageBuffer) -> Result<(ImageBuffer, DriftOffset)> {
        frame.check_size(self.width, self.height)?;
        let grey = self.greyscale_of(frame);
        if !self.initialised {
            let mask = self.dim_pixels(&grey);
            let (mean, _) = grey.mean_stddev(Some(&mask))[0];
            return Ok((grey.subtract_scalars(&[mean]), DriftOffset::zero()));
        }
        let offset = self.calculate_offset(&grey, None);
        let background = apply_offset(&self.greyscale_model, offset, BorderPolicy::Reflect101);
        Ok((grey.subtract(&background)?, offset))
    }

    /// Colour residual averaged over channels into an 8-bit greyscale
    /// image, plus the drift used.
    pub fn colour_difference(&self, frame: &ImageBuffer) -> Result<(ImageBuffer, DriftOffset)> {
        frame.check_size(self.width, self.height)?;
        let grey = self.greyscale_of(frame);
        let rgb = frame.to_colour()?.convert(Depth::U8);
        if !self.initialised {
            let mask = self.dim_pixels(&grey);
            let means: Vec<f64> = rgb.mean_stddev(Some(&mask)).into_iter().map(|(m, _)| m).collect();
            return Ok((rgb.subtract_scalars(&means).sum_channels(), DriftOffset::zero()));
        }
        let offset = self.calculate_offset(&grey, None);
        let background = apply_offset(&self.colour_model, offset, BorderPolicy::Reflect101);
        Ok((rgb.subtract(&background)?.sum_channels(), offset))
    }

    /// Drift of a greyscale frame relative to the greyscale model.
    ///
    /// Bright pixels are truncated to `initial_threshold` first, or with a
    /// mask, the masked pixels are set to it. A failed correlation yields a
    /// zero offset.
    pub fn calculate_offset(&self, grey: &ImageBuffer, mask: Option<&Array2<bool>>) -> DriftOffset {
        let level = self.config.initial_threshold as f32;
        let bright_removed = match mask {
            None => grey.threshold(level, level, ThresholdKind::Trunc),
            Some(mask) => {
                let mut g = grey.clone();
                g.fill_where(mask, level);
                g
            }
        };
        let target = bright_removed.convert(Depth::F32);
        let reference = self.greyscale_model.convert(Depth::F32);
        estimate_offset_or_zero(&reference, &target)
    }

    /// Change the rank used for the model and recompute from the current
    /// ring.
    pub fn set_selection_index(&mut self, index: usize) -> Result<()> {
        if index >= self.config.stack_size {
            return Err(MicrostackError::InvalidSelectionIndex {
                index,
                stack_size: self.config.stack_size,
            });
        }
        self.config.selection_index = index;
        self.recalculate_model();
        Ok(())
    }

    /// Change the window length, keeping the newest frames. Growing pads
    /// with the current model as the oldest entries; shrinking refills
    /// every colour slot with the current colour model. The selection index
    /// is clamped to the new size.
    pub fn set_stack_size(&mut self, stack_size: usize) -> Result<()> {
        if stack_size == 0 {
            return Err(MicrostackError::Configuration(
                "background stack size must be at least 1".into(),
            ));
        }
        let old = self.config.stack_size;
        let grey_pad = self.greyscale_model.channel_array(0);
        let colour_pad = (*self.colour_model).clone();
        self.grey_stack.resize(stack_size, &grey_pad);
        self.colour_stack.resize(stack_size, &colour_pad);
        if stack_size < old {
            self.colour_stack.fill(&colour_pad);
        }
        self.config.stack_size = stack_size;
        self.config.selection_index = self.config.selection_index.min(stack_size - 1);
        debug!(model_id = self.id, old, new = stack_size, "Background stack resized");
        self.recalculate_model();
        Ok(())
    }

    /// Takes effect at the next [`initialise`](Self::initialise) and in
    /// subsequent offset estimates.
    pub fn set_initial_threshold(&mut self, threshold: u8) {
        self.config.initial_threshold = threshold;
    }

    /// New receiver of [`ModelUpdate`]s for this model.
    pub fn subscribe(&mut self) -> Receiver<ModelUpdate> {
        self.observers.subscribe()
    }

    /// Forward updates to an existing channel.
    pub fn attach_observer(&mut self, sender: Sender<ModelUpdate>) {
        self.observers.attach(sender);
    }

    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    pub fn id(&self) -> usize {
        self.id
    }

    /// `(width, height)`.
    pub fn size(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    pub fn config(&self) -> &BackgroundConfig {
        &self.config
    }

    pub fn stack_size(&self) -> usize {
        self.config.stack_size
    }

    pub fn selection_index(&self) -> usize {
        self.config.selection_index
    }

    pub fn current_index(&self) -> usize {
        self.grey_stack.current_index()
    }

    pub fn bad_offset_count(&self) -> u32 {
        self.bad_offset_count
    }

    pub fn is_initialised(&self) -> bool {
        self.initialised
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn greyscale_model(&self) -> Arc<ImageBuffer> {
        Arc::clone(&self.greyscale_model)
    }

    pub fn colour_model(&self) -> Arc<ImageBuffer> {
        Arc::clone(&self.colour_model)
    }

    /// The ring sorted per pixel, rank 0 first.
    pub fn sorted_stack(&self) -> &[Array2<f32>] {
        &self.sorted_grey
    }

    fn greyscale_of(&self, frame: &ImageBuffer) -> ImageBuffer {
        frame.greyscale_red_green().convert(Depth::U8)
    }

    fn dim_pixels(&self, grey: &ImageBuffer) -> Array2<bool> {
        let level = self.config.initial_threshold as f32;
        grey.plane(0).mapv(|v| v <= level)
    }

    fn exclusion_mask(&self, excluded: &[Contour]) -> Array2<bool> {
        let mut mask = Array2::from_elem((self.height, self.width), false);
        for contour in excluded {
            fill_poly(&mut mask, contour.points());
        }
        mask
    }

    fn publish(&mut self, reset: bool) {
        self.generation += 1;
        let update = ModelUpdate {
            model_id: self.id,
            generation: self.generation,
            reset,
            greyscale: Arc::clone(&self.greyscale_model),
            colour: Arc::clone(&self.colour_model),
        };
        self.observers.notify(&update);
    }
}
