pub mod config;
pub mod segment;
pub mod stack;

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::{bail, Context, Result};
use microstack_core::buffer::ImageBuffer;
use microstack_core::io::load_image;
use microstack_core::pipeline::{PipelineConfig, PipelineStage, ProgressReporter};
use rayon::prelude::*;

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "tif", "tiff", "bmp"];

/// Image files directly inside `dir`, sorted by file name.
pub fn list_images(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for entry in std::fs::read_dir(dir)
        .with_context(|| format!("Failed to read directory {}", dir.display()))?
    {
        let path = entry?.path();
        let is_image = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
            .unwrap_or(false);
        if path.is_file() && is_image {
            paths.push(path);
        }
    }
    paths.sort();
    if paths.is_empty() {
        bail!("No images found in {}", dir.display());
    }
    Ok(paths)
}

/// Decode every image in parallel, keeping input order.
pub fn load_all(paths: &[PathBuf], reporter: &dyn ProgressReporter) -> Result<Vec<ImageBuffer>> {
    reporter.begin_stage(PipelineStage::Reading, Some(paths.len()));
    let done = AtomicUsize::new(0);
    let frames = paths
        .par_iter()
        .map(|p| {
            let frame =
                load_image(p).with_context(|| format!("Failed to load {}", p.display()))?;
            reporter.advance(done.fetch_add(1, Ordering::Relaxed) + 1);
            Ok(frame)
        })
        .collect::<Result<Vec<_>>>()?;
    reporter.finish_stage();
    Ok(frames)
}

/// Pipeline config from a TOML file, or defaults.
pub fn load_config(path: Option<&Path>) -> Result<PipelineConfig> {
    match path {
        Some(path) => {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config {}", path.display()))?;
            toml::from_str(&contents).context("Invalid pipeline config")
        }
        None => Ok(PipelineConfig::default()),
    }
}
