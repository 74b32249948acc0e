use tracing::info;

use crate::background::UpdateOutcome;
use crate::buffer::ImageBuffer;
use crate::error::{MicrostackError, Result};
use crate::frame::StackedFrame;
use crate::stacking::{AddOutcome, FocusStacker, FusedStack, StackerConfig};

use super::{FieldProcessor, PipelineConfig, PipelineStage, ProgressReporter, RegionSink, SessionControl};

/// Counts from a [`process_fields`] run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FieldSummary {
    pub fields: usize,
    /// Fields skipped while the session was paused.
    pub skipped: usize,
    /// Valid regions handed to the sink.
    pub regions: usize,
    pub rejected: usize,
    pub resets: usize,
}

/// Focus-stack a finite sequence of frames. The first frame starts the
/// stack; frames wait for queue space instead of being dropped.
pub fn stack_frames<I>(
    frames: I,
    config: &StackerConfig,
    reporter: &dyn ProgressReporter,
) -> Result<FusedStack>
where
    I: IntoIterator<Item = Result<ImageBuffer>>,
{
    let frames = frames.into_iter();
    let stacker = FocusStacker::new(config.clone())?;
    stacker.start()?;

    reporter.begin_stage(PipelineStage::Correcting, frames.size_hint().1);
    let mut queued = 0usize;
    for (i, frame) in frames.enumerate() {
        match stacker.add_blocking(frame?, i == 0)? {
            AddOutcome::Queued => queued += 1,
            AddOutcome::Stopped => return Err(MicrostackError::StackerStopped),
            AddOutcome::Dropped => {}
        }
        reporter.advance(i + 1);
    }
    reporter.finish_stage();

    reporter.begin_stage(PipelineStage::Fusing, None);
    let fused = stacker.stack()?;
    reporter.finish_stage();
    stacker.stop();

    info!(frames = queued, "Focus stack complete");
    Ok(fused)
}

/// Segment a sequence of fields against a rolling background, sending
/// every valid region to `sink`. Returns the counts and the processor, whose
/// background model holds the final state.
pub fn process_fields<I>(
    frames: I,
    config: &PipelineConfig,
    session: SessionControl,
    sink: &mut dyn RegionSink,
    reporter: &dyn ProgressReporter,
) -> Result<(FieldSummary, FieldProcessor)>
where
    I: IntoIterator<Item = Result<ImageBuffer>>,
{
    let frames = frames.into_iter();
    let mut processor = FieldProcessor::new(config, session)?;
    let mut summary = FieldSummary::default();

    reporter.begin_stage(PipelineStage::Segmenting, frames.size_hint().1);
    for (i, frame) in frames.enumerate() {
        let frame = StackedFrame::from_frame(&frame?)?;
        match processor.process(&frame)? {
            Some(result) => {
                summary.fields += 1;
                summary.rejected += result.segmentation.invalid.len();
                if result.outcome == UpdateOutcome::Reset {
                    summary.resets += 1;
                }
                summary.regions += processor.emit(&result, sink)?;
            }
            None => summary.skipped += 1,
        }
        reporter.advance(i + 1);
    }
    reporter.finish_stage();

    info!(
        fields = summary.fields,
        regions = summary.regions,
        rejected = summary.rejected,
        resets = summary.resets,
        "Field sequence processed"
    );
    Ok((summary, processor))
}
