//! Extract the embedded executables.

use super::{extract_dir, get_paths, load_config};
use anyhow::{Context, Result};
use colored::Colorize;
use ffbox_process::{check_dependencies, BinaryLocator, BinaryProvider};
use std::path::PathBuf;

pub fn run(dir: Option<PathBuf>) -> Result<()> {
    let paths = get_paths()?;
    let config = load_config(&paths)?;
    let dir = dir.unwrap_or_else(|| extract_dir(&config, &paths));

    println!("{}", "Provisioning executables".cyan().bold());
    println!("{}", "─".repeat(50));

    let locator = BinaryLocator::embedded();
    for tool in [locator.ffmpeg(), locator.ffprobe()] {
        let name = tool.file_name();
        match tool
            .provide(Some(dir.as_path()))
            .with_context(|| format!("Failed to provision {}", name))?
        {
            Some(path) => println!("  {} {}: {}", "✓".green(), name, path.display()),
            None => println!("  {} {}: not embedded in this build", "-".yellow(), name),
        }
    }

    println!();
    println!("{}", "Availability".cyan().bold());
    for (tool, embedded, on_path) in check_dependencies() {
        println!(
            "  {:<8} embedded: {}  PATH: {}",
            tool,
            yes_no(embedded),
            yes_no(on_path)
        );
    }

    Ok(())
}

fn yes_no(value: bool) -> colored::ColoredString {
    if value {
        "yes".green()
    } else {
        "no".red()
    }
}
