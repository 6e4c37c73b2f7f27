//! Audio extraction command.

use super::{build_pipeline, get_paths, load_config, GlobalOptions, Reporter};
use anyhow::{Context, Result};
use colored::Colorize;
use ffbox_process::ExtractAudioParams;
use std::path::Path;

pub fn run(options: &GlobalOptions, input: &Path, output: &Path) -> Result<()> {
    let paths = get_paths()?;
    let config = load_config(&paths)?;

    let reporter = Reporter::new(options, &config, "Extracting audio")?;
    let ffmpeg = build_pipeline(options, &config, &paths, Some(reporter.callback()))?;

    reporter
        .track(ffmpeg.extract_audio(&ExtractAudioParams::new(input, output)))
        .context("Failed to extract audio")?;

    if !reporter.is_json() {
        println!("{} {}", "Extracted:".green().bold(), output.display());
    }

    Ok(())
}
