//! Video segmentation command.

use super::{build_pipeline, get_paths, load_config, print_outputs, GlobalOptions, Reporter};
use anyhow::{Context, Result};
use colored::Colorize;
use ffbox_process::SplitVideoParams;
use std::path::Path;

pub fn run(
    options: &GlobalOptions,
    input: &Path,
    output_dir: &Path,
    segment_time: Option<u32>,
    prefix: Option<String>,
    extension: Option<String>,
) -> Result<()> {
    let paths = get_paths()?;
    let config = load_config(&paths)?;

    let params = SplitVideoParams::new(
        input,
        output_dir,
        segment_time.unwrap_or(config.split.segment_time),
        prefix.unwrap_or_else(|| config.split.output_prefix.clone()),
    )
    .with_extension(extension.unwrap_or_else(|| config.split.extension.clone()));

    let reporter = Reporter::new(options, &config, "Splitting")?;
    let ffmpeg = build_pipeline(options, &config, &paths, Some(reporter.callback()))?;

    let segments = reporter
        .track(ffmpeg.split_video(&params))
        .context("Failed to split video")?;

    if reporter.is_json() {
        return Ok(());
    }

    println!(
        "{} {} segments of {}s in {}",
        "Split:".green().bold(),
        segments.len(),
        params.segment_time,
        output_dir.display()
    );
    print_outputs(output_dir, &segments);

    Ok(())
}
