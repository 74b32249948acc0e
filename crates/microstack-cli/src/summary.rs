use std::path::Path;

use console::Style;
use microstack_core::pipeline::{FieldSummary, PipelineConfig};
use microstack_core::stacking::{FusedStack, StackerConfig};

struct Styles {
    title: Style,
    header: Style,
    label: Style,
    value: Style,
    method: Style,
    disabled: Style,
    path: Style,
}

impl Styles {
    fn new() -> Self {
        Self {
            title: Style::new().cyan().bold(),
            header: Style::new().cyan().bold(),
            label: Style::new().dim(),
            value: Style::new().bold().white(),
            method: Style::new().green(),
            disabled: Style::new().dim().yellow(),
            path: Style::new().underlined(),
        }
    }

    fn banner(&self, title: &str) {
        println!();
        println!("  {}", self.title.apply_to(title));
        println!(
            "  {}",
            self.title.apply_to("\u{2550}".repeat(title.chars().count()))
        );
        println!();
    }
}

pub fn print_stack_summary(dir: &Path, frames: usize, config: &StackerConfig) {
    let s = Styles::new();
    s.banner("Focus Stack");

    println!("  {:<14}{}", s.label.apply_to("Input"), s.path.apply_to(dir.display()));
    println!("  {:<14}{}", s.label.apply_to("Frames"), s.value.apply_to(frames));
    println!(
        "  {:<14}{}",
        s.label.apply_to("Size"),
        s.value.apply_to(format!("{}x{}", config.width, config.height))
    );
    println!();

    println!("  {}", s.header.apply_to("Fusion"));
    println!(
        "    {:<12}{}",
        s.label.apply_to("Energy"),
        s.value.apply_to(format!("sigma {}", config.energy_sigma))
    );
    println!(
        "    {:<12}{}",
        s.label.apply_to("Depth"),
        s.value.apply_to(format!("sigma {}", config.depth_sigma))
    );
    println!(
        "    {:<12}{}",
        s.label.apply_to("Mode"),
        s.method.apply_to(format!("{:?}", config.depth_mode))
    );
    if config.correct_drift {
        println!(
            "    {:<12}{}",
            s.label.apply_to("Drift"),
            s.method.apply_to(format!("channel {}", config.reference_channel))
        );
    } else {
        println!("    {:<12}{}", s.label.apply_to("Drift"), s.disabled.apply_to("disabled"));
    }
    println!();
}

pub fn print_stack_result(fused: &FusedStack, output: &Path) {
    let s = Styles::new();
    let (lo, hi) = fused
        .depth_index
        .iter()
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &d| {
            (lo.min(d), hi.max(d))
        });
    println!();
    println!(
        "  {:<14}{}",
        s.label.apply_to("Fused"),
        s.value.apply_to(format!("{} frames", fused.frame_count()))
    );
    println!(
        "  {:<14}{}",
        s.label.apply_to("Depth range"),
        s.value.apply_to(format!("{lo:.2} .. {hi:.2}"))
    );
    println!("  {:<14}{}", s.label.apply_to("Output"), s.path.apply_to(output.display()));
    println!();
}

pub fn print_segment_summary(dir: &Path, fields: usize, config: &PipelineConfig) {
    let s = Styles::new();
    s.banner("Segmentation");

    println!("  {:<14}{}", s.label.apply_to("Input"), s.path.apply_to(dir.display()));
    println!("  {:<14}{}", s.label.apply_to("Fields"), s.value.apply_to(fields));
    println!(
        "  {:<14}{}",
        s.label.apply_to("Size"),
        s.value.apply_to(format!("{}x{}", config.width, config.height))
    );
    println!();

    let bg = &config.background;
    println!("  {}", s.header.apply_to("Background"));
    println!(
        "    {:<12}{}",
        s.label.apply_to("Window"),
        s.value.apply_to(format!("{} frames, rank {}", bg.stack_size, bg.selection_index))
    );
    println!(
        "    {:<12}{}",
        s.label.apply_to("Reset"),
        s.value.apply_to(format!("{} x offset > {}", bg.max_bad_count, bg.max_offset))
    );
    println!();

    let seg = &config.segmentation;
    println!("  {}", s.header.apply_to("Particles"));
    println!(
        "    {:<12}{}",
        s.label.apply_to("Threshold"),
        s.value.apply_to(seg.threshold)
    );
    println!(
        "    {:<12}{}",
        s.label.apply_to("Min area"),
        s.value.apply_to(seg.area_threshold)
    );
    println!(
        "    {:<12}{}",
        s.label.apply_to("Convexity"),
        s.value.apply_to(seg.convexity_threshold)
    );
    match config.pixel_area_mm {
        Some(area) => println!(
            "    {:<12}{}",
            s.label.apply_to("Pixel area"),
            s.method.apply_to(format!("{area} mm²"))
        ),
        None => println!(
            "    {:<12}{}",
            s.label.apply_to("Measure"),
            s.disabled.apply_to("disabled")
        ),
    }
    println!();
}

pub fn print_segment_result(summary: &FieldSummary, output: &Path) {
    let s = Styles::new();
    println!();
    println!("  {:<14}{}", s.label.apply_to("Fields"), s.value.apply_to(summary.fields));
    println!("  {:<14}{}", s.label.apply_to("Particles"), s.value.apply_to(summary.regions));
    println!("  {:<14}{}", s.label.apply_to("Rejected"), s.value.apply_to(summary.rejected));
    if summary.resets > 0 {
        println!(
            "  {:<14}{}",
            s.label.apply_to("Resets"),
            s.disabled.apply_to(summary.resets)
        );
    }
    println!("  {:<14}{}", s.label.apply_to("Output"), s.path.apply_to(output.display()));
    println!();
}
