//! Split a video, then extract keyframes from each segment.

use super::{build_pipeline, get_paths, load_config, GlobalOptions, Reporter};
use anyhow::{Context, Result};
use colored::Colorize;
use ffbox_process::{ExtractKeyFramesParams, SplitVideoParams};
use std::path::{Path, PathBuf};
use tracing::warn;

pub fn run(
    options: &GlobalOptions,
    input: &Path,
    output_dir: &Path,
    segment_time: Option<u32>,
    interval: Option<u32>,
) -> Result<()> {
    let paths = get_paths()?;
    let config = load_config(&paths)?;
    let interval = interval.unwrap_or(config.keyframes.frame_interval);

    let split = SplitVideoParams::new(
        input,
        output_dir.join("segments"),
        segment_time.unwrap_or(config.split.segment_time),
        config.split.output_prefix.clone(),
    )
    .with_extension(config.split.extension.clone());

    let reporter = Reporter::new(options, &config, "Splitting")?;
    let mut ffmpeg = build_pipeline(options, &config, &paths, Some(reporter.callback()))?;

    let segments = reporter
        .track(ffmpeg.split_video(&split))
        .context("Failed to split video")?;

    if !reporter.is_json() {
        println!(
            "{} {} segments in {}",
            "Split:".green().bold(),
            segments.len(),
            split.output_dir.display()
        );
    }

    let mut failed = 0;
    for (i, segment) in segments.iter().enumerate() {
        let params = keyframe_params(output_dir, i, segment, interval);

        let reporter = Reporter::new(options, &config, &format!("Segment {:03}", i))?;
        ffmpeg.set_progress_callback(reporter.callback());

        match reporter.track(ffmpeg.extract_key_frames(&params)) {
            Ok(_) if reporter.is_json() => {}
            Ok(frames) if frames.is_empty() => {
                println!("  {} No keyframes for segment {:03}", "Note:".yellow(), i);
            }
            Ok(frames) => {
                println!(
                    "  {} {} keyframes for segment {:03} in {}",
                    "✓".green(),
                    frames.len(),
                    i,
                    params.output_dir.display()
                );
            }
            Err(e) => {
                failed += 1;
                warn!("Keyframe extraction failed for {:?}: {}", segment, e);
                if !reporter.is_json() {
                    println!("  {} Segment {:03}: {}", "✗".red(), i, e);
                }
            }
        }
    }

    if failed > 0 {
        anyhow::bail!(
            "Keyframe extraction failed for {} of {} segments",
            failed,
            segments.len()
        );
    }

    if !reporter.is_json() {
        println!("{}", "All segments processed.".green().bold());
    }

    Ok(())
}

/// Keyframes of segment `index` go to their own directory under `output_dir`.
fn keyframe_params(
    output_dir: &Path,
    index: usize,
    segment: &Path,
    interval: u32,
) -> ExtractKeyFramesParams {
    ExtractKeyFramesParams::new(
        segment,
        segment_frames_dir(output_dir, index),
        interval,
        format!("keyframe_segment_{:03}_", index),
    )
}

fn segment_frames_dir(output_dir: &Path, index: usize) -> PathBuf {
    output_dir.join(format!("keyframes_segment_{:03}", index))
}
