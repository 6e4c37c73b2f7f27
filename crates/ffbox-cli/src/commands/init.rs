//! Initialize ffbox.

use super::get_paths;
use anyhow::{Context, Result};
use colored::Colorize;
use ffbox_config::Config;

pub fn run() -> Result<()> {
    let paths = get_paths()?;

    if paths.is_initialized() {
        println!("{} ffbox is already initialized.", "Note:".yellow().bold());
        println!("  Config: {}", paths.config_file.display());
        println!("  Binaries: {}", paths.bin_dir.display());
        return Ok(());
    }

    println!("{}", "Initializing ffbox...".cyan().bold());

    paths.ensure_dirs().context("Failed to create directories")?;
    println!("  {} Created directories", "✓".green());

    Config::create_default_file(&paths.config_file).context("Failed to create config file")?;
    println!(
        "  {} Created config: {}",
        "✓".green(),
        paths.config_file.display()
    );

    println!();
    println!("{}", "ffbox initialized successfully!".green().bold());
    println!();
    println!("Next steps:");
    println!("  1. Extract the embedded tools: {}", "ffbox provision".cyan());
    println!(
        "  2. Split a video: {}",
        "ffbox split input.mp4 segments/".cyan()
    );

    Ok(())
}
