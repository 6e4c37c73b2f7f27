//! Media duration command.

use super::{build_pipeline, get_paths, load_config, GlobalOptions};
use anyhow::{Context, Result};
use colored::Colorize;
use std::path::Path;

pub fn run(options: &GlobalOptions, input: &Path) -> Result<()> {
    let paths = get_paths()?;
    let config = load_config(&paths)?;
    let ffmpeg = build_pipeline(options, &config, &paths, None)?;

    let millis = ffmpeg
        .video_duration(input)
        .with_context(|| format!("Failed to read duration of {}", input.display()))?;

    if options.json || config.ui.json {
        let line = serde_json::json!({
            "input": input.display().to_string(),
            "duration_ms": millis,
        });
        println!("{}", line);
    } else {
        println!(
            "{} {} ({} ms)",
            "Duration:".cyan().bold(),
            format_millis(millis),
            millis
        );
    }

    Ok(())
}

/// Format milliseconds as `HH:MM:SS.mmm`.
fn format_millis(millis: i64) -> String {
    let total_seconds = millis / 1000;
    format!(
        "{:02}:{:02}:{:02}.{:03}",
        total_seconds / 3600,
        (total_seconds % 3600) / 60,
        total_seconds % 60,
        millis % 1000
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_millis() {
        assert_eq!(format_millis(0), "00:00:00.000");
        assert_eq!(format_millis(62_500), "00:01:02.500");
        assert_eq!(format_millis(3_723_450), "01:02:03.450");
    }
}
