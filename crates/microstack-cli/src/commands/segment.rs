use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use microstack_core::error::Result as CoreResult;
use microstack_core::io::save_image;
use microstack_core::pipeline::{
    process_fields, PipelineStage, ProgressReporter, RegionMetadata, RegionSink, SessionControl,
};
use microstack_core::segment::{centre_region, MaskedRegion};
use serde::Serialize;
use tracing::info;

use super::{list_images, load_all, load_config};
use crate::progress::BarReporter;
use crate::summary::{print_segment_result, print_segment_summary};

#[derive(Args)]
pub struct SegmentArgs {
    /// Directory of field-of-view images, processed in file name order
    pub dir: PathBuf,

    /// Pipeline config file (TOML)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Binary threshold applied to the background difference
    #[arg(long)]
    pub threshold: Option<f32>,

    /// Minimum particle area in pixels
    #[arg(long)]
    pub min_area: Option<f64>,

    /// Physical area of one pixel in mm², enables measurements
    #[arg(long)]
    pub pixel_area: Option<f64>,

    /// Also write crops centred and rotated to the particle's principal axis
    #[arg(long)]
    pub centred: bool,

    /// Output directory
    #[arg(short, long, default_value = "particles")]
    pub output: PathBuf,
}

#[derive(Serialize)]
struct RegionIndex {
    regions: Vec<RegionMetadata>,
}

/// Writes each region as `field_NNNN_region_NNN.png` plus its mask.
struct CropWriter {
    dir: PathBuf,
    centred_buffer: Option<f64>,
    regions: Vec<RegionMetadata>,
}

impl CropWriter {
    fn path(&self, metadata: &RegionMetadata, suffix: &str) -> PathBuf {
        self.dir.join(format!(
            "field_{:04}_region_{:03}{suffix}.png",
            metadata.field_index, metadata.region_index
        ))
    }
}

impl RegionSink for CropWriter {
    fn accept(&mut self, region: &MaskedRegion, metadata: &RegionMetadata) -> CoreResult<()> {
        save_image(&region.image, &self.path(metadata, ""))?;
        save_image(&region.mask, &self.path(metadata, "_mask"))?;
        if let Some(buffer) = self.centred_buffer {
            let centred = centre_region(region, buffer, true);
            save_image(&centred, &self.path(metadata, "_centred"))?;
        }
        self.regions.push(metadata.clone());
        Ok(())
    }
}

pub fn run(args: &SegmentArgs) -> Result<()> {
    let paths = list_images(&args.dir)?;
    println!("Reading {} fields...", paths.len());
    let reporter = BarReporter::new()?;
    let frames = load_all(&paths, &reporter)?;
    let (width, height) = frames[0].size();

    let mut config = load_config(args.config.as_deref())?.with_size(width, height);
    if let Some(threshold) = args.threshold {
        config.segmentation.threshold = threshold;
    }
    if let Some(area) = args.min_area {
        config.segmentation.area_threshold = area;
    }
    if args.pixel_area.is_some() {
        config.pixel_area_mm = args.pixel_area;
    }
    reporter.suspend(|| print_segment_summary(&args.dir, frames.len(), &config));

    create_dir(&args.output)?;
    let mut writer = CropWriter {
        dir: args.output.clone(),
        centred_buffer: args.centred.then_some(config.segmentation.crop_buffer),
        regions: Vec::new(),
    };

    let (summary, processor) = process_fields(
        frames.into_iter().map(Ok),
        &config,
        SessionControl::new(),
        &mut writer,
        &reporter,
    )?;

    reporter.begin_stage(PipelineStage::Writing, Some(3));
    let model = processor.model();
    save_image(&model.greyscale_model(), &args.output.join("background_greyscale.png"))?;
    reporter.advance(1);
    save_image(&model.colour_model(), &args.output.join("background_colour.png"))?;
    reporter.advance(2);
    info!(
        generation = model.generation(),
        dir = %args.output.display(),
        "Background models written"
    );

    let index_path = args.output.join("regions.toml");
    let index = toml::to_string_pretty(&RegionIndex {
        regions: writer.regions,
    })?;
    std::fs::write(&index_path, index)
        .with_context(|| format!("Failed to write {}", index_path.display()))?;
    reporter.finish_stage();
    reporter.finish();

    print_segment_result(&summary, &args.output);
    Ok(())
}

fn create_dir(path: &Path) -> Result<()> {
    std::fs::create_dir_all(path).with_context(|| format!("Failed to create {}", path.display()))
}
