//! CLI command implementations.

pub mod audio;
pub mod config;
pub mod duration;
pub mod init;
pub mod keyframes;
pub mod provision;
pub mod split;
pub mod workflow;

use anyhow::{Context, Result};
use ffbox_config::{AppPaths, Config};
use ffbox_process::{Ffmpeg, Progress, ProgressCallback};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Flags accepted by every command.
pub struct GlobalOptions {
    pub json: bool,
    pub ffmpeg: Option<PathBuf>,
}

/// Get the application paths.
pub fn get_paths() -> Result<AppPaths> {
    AppPaths::new().context("Failed to determine application directories")
}

/// Load the config file (defaults when there is none) and apply its UI settings.
pub fn load_config(paths: &AppPaths) -> Result<Config> {
    let config = Config::load_from(&paths.config_file).context("Failed to load config")?;
    if !config.ui.color {
        colored::control::set_override(false);
    }
    Ok(config)
}

/// Expand `~` and `$VARS` in a configured path.
pub fn expand_path(path: &str) -> PathBuf {
    match shellexpand::full(path) {
        Ok(expanded) => PathBuf::from(expanded.into_owned()),
        Err(_) => PathBuf::from(path),
    }
}

/// Directory the embedded executables are extracted into.
pub fn extract_dir(config: &Config, paths: &AppPaths) -> PathBuf {
    config
        .binary
        .extract_dir
        .as_deref()
        .map(expand_path)
        .unwrap_or_else(|| paths.bin_dir.clone())
}

/// Build the pipeline. ffmpeg comes from `--ffmpeg`, then `binary.ffmpeg_path`,
/// then the embedded copy, then `PATH`.
pub fn build_pipeline(
    options: &GlobalOptions,
    config: &Config,
    paths: &AppPaths,
    callback: Option<ProgressCallback>,
) -> Result<Ffmpeg> {
    let explicit = options
        .ffmpeg
        .clone()
        .or_else(|| config.binary.ffmpeg_path.as_deref().map(expand_path));

    let mut ffmpeg = match explicit {
        Some(path) => Ffmpeg::with_path(&path, callback)
            .with_context(|| format!("Cannot use ffmpeg at {}", path.display()))?,
        None => {
            let mut ffmpeg = Ffmpeg::with_extract_path(extract_dir(config, paths), callback)
                .context("Failed to provision ffmpeg")?;
            if ffmpeg.ffmpeg_path().is_none() {
                if let Ok(found) = which::which("ffmpeg") {
                    debug!("Using ffmpeg from PATH: {:?}", found);
                    ffmpeg.set_ffmpeg_path(found);
                }
            }
            ffmpeg
        }
    };

    if let Some(ffprobe) = config.binary.ffprobe_path.as_deref() {
        ffmpeg.set_ffprobe_path(expand_path(ffprobe));
    }
    ffmpeg.set_remember_duration(config.progress.remember_duration);

    Ok(ffmpeg)
}

/// Shows progress snapshots as a bar, or as JSON lines on stdout.
pub struct Reporter {
    bar: Option<ProgressBar>,
}

impl Reporter {
    pub fn new(options: &GlobalOptions, config: &Config, label: &str) -> Result<Self> {
        if options.json || config.ui.json {
            return Ok(Self { bar: None });
        }

        let bar = ProgressBar::new(100);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} {msg} [{bar:40.cyan/blue}] {pos:>3}% ({elapsed_precise})")?
                .progress_chars("█▓░"),
        );
        bar.set_message(label.to_string());
        Ok(Self { bar: Some(bar) })
    }

    pub fn is_json(&self) -> bool {
        self.bar.is_none()
    }

    pub fn callback(&self) -> ProgressCallback {
        match &self.bar {
            Some(bar) => {
                let bar = bar.clone();
                Box::new(move |p: &Progress| bar.set_position(bar_position(p)))
            }
            None => Box::new(|p: &Progress| {
                if let Ok(line) = serde_json::to_string(p) {
                    println!("{}", line);
                }
            }),
        }
    }

    /// Close the bar according to how the operation ended.
    pub fn track<T, E>(&self, result: Result<T, E>) -> Result<T, E> {
        if let Some(bar) = &self.bar {
            if result.is_ok() {
                bar.finish_and_clear();
            } else {
                bar.abandon();
            }
        }
        result
    }
}

fn bar_position(progress: &Progress) -> u64 {
    progress.percentage.clamp(0.0, 100.0).round() as u64
}

/// Print a list of produced files, relative to `dir` when possible.
pub fn print_outputs(dir: &Path, files: &[PathBuf]) {
    for file in files {
        let shown = file.strip_prefix(dir).unwrap_or(file);
        println!("  {}", shown.display());
    }
}
