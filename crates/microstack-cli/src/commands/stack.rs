use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use microstack_core::io::save_image;
use microstack_core::pipeline::{stack_frames, PipelineStage, ProgressReporter};
use microstack_core::stacking::DepthMode;

use super::{list_images, load_all, load_config};
use crate::progress::BarReporter;
use crate::summary::{print_stack_result, print_stack_summary};

#[derive(Args)]
pub struct StackArgs {
    /// Directory of z-stack images, fused in file name order
    pub dir: PathBuf,

    /// Pipeline config file (TOML)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Gaussian sigma applied to focus energy maps
    #[arg(long)]
    pub energy_sigma: Option<f32>,

    /// Gaussian sigma applied to the depth map
    #[arg(long)]
    pub depth_sigma: Option<f32>,

    /// Blend each channel by its own depth map
    #[arg(long)]
    pub per_channel: bool,

    /// Skip frame-to-frame drift correction
    #[arg(long)]
    pub no_drift: bool,

    /// Output directory
    #[arg(short, long, default_value = "stacked")]
    pub output: PathBuf,
}

pub fn run(args: &StackArgs) -> Result<()> {
    let paths = list_images(&args.dir)?;
    println!("Reading {} frames...", paths.len());
    let reporter = BarReporter::new()?;
    let frames = load_all(&paths, &reporter)?;
    let (width, height) = frames[0].size();

    let config = load_config(args.config.as_deref())?.with_size(width, height);
    let mut stacker = config.stacker_config();
    if let Some(sigma) = args.energy_sigma {
        stacker.energy_sigma = sigma;
    }
    if let Some(sigma) = args.depth_sigma {
        stacker.depth_sigma = sigma;
    }
    if args.per_channel {
        stacker.depth_mode = DepthMode::PerChannel;
    }
    if args.no_drift {
        stacker.correct_drift = false;
    }
    reporter.suspend(|| print_stack_summary(&args.dir, frames.len(), &stacker));

    let fused = stack_frames(frames.into_iter().map(Ok), &stacker, &reporter)?;

    std::fs::create_dir_all(&args.output)
        .with_context(|| format!("Failed to create {}", args.output.display()))?;
    let mut outputs = vec![
        (&fused.frame.colour, args.output.join("fused_colour.png")),
        (&fused.frame.greyscale, args.output.join("fused_greyscale.png")),
    ];
    if let Some(ref depth) = fused.frame.depth {
        outputs.push((depth, args.output.join("depth.png")));
    }
    reporter.begin_stage(PipelineStage::Writing, Some(outputs.len()));
    for (i, (image, path)) in outputs.iter().enumerate() {
        save_image(image, path)?;
        reporter.advance(i + 1);
    }
    reporter.finish_stage();
    reporter.finish();

    print_stack_result(&fused, &args.output);
    Ok(())
}
