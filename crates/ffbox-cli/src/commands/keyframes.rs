//! Keyframe extraction command.

use super::{build_pipeline, get_paths, load_config, print_outputs, GlobalOptions, Reporter};
use anyhow::{Context, Result};
use colored::Colorize;
use ffbox_process::ExtractKeyFramesParams;
use std::path::Path;

pub fn run(
    options: &GlobalOptions,
    input: &Path,
    output_dir: &Path,
    interval: Option<u32>,
    prefix: Option<String>,
) -> Result<()> {
    let paths = get_paths()?;
    let config = load_config(&paths)?;

    let params = ExtractKeyFramesParams::new(
        input,
        output_dir,
        interval.unwrap_or(config.keyframes.frame_interval),
        prefix.unwrap_or_else(|| config.keyframes.output_prefix.clone()),
    );

    let reporter = Reporter::new(options, &config, "Extracting keyframes")?;
    let ffmpeg = build_pipeline(options, &config, &paths, Some(reporter.callback()))?;

    let frames = reporter
        .track(ffmpeg.extract_key_frames(&params))
        .context("Failed to extract keyframes")?;

    if reporter.is_json() {
        return Ok(());
    }

    if frames.is_empty() {
        println!("{} No keyframes were written.", "Note:".yellow());
        return Ok(());
    }

    println!(
        "{} {} keyframes in {}",
        "Extracted:".green().bold(),
        frames.len(),
        output_dir.display()
    );
    print_outputs(output_dir, &frames);

    Ok(())
}
