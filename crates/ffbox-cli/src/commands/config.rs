//! Configuration commands.

use super::get_paths;
use anyhow::{Context, Result};
use colored::Colorize;
use ffbox_config::Config;

pub fn show() -> Result<()> {
    let paths = get_paths()?;

    if !paths.config_file.exists() {
        anyhow::bail!("Config file not found. Run 'ffbox init' first.");
    }

    let contents =
        std::fs::read_to_string(&paths.config_file).context("Failed to read config file")?;

    println!("{}", "Current Configuration".cyan().bold());
    println!("{}", "─".repeat(50));
    println!("{}", contents);

    Ok(())
}

pub fn set(key: &str, value: &str) -> Result<()> {
    let mut config = Config::load().context("Failed to load config")?;
    config.set(key, value)?;
    config.save().context("Failed to save config")?;

    if value.is_empty() {
        println!("{} Cleared {}", "✓".green(), key.cyan());
    } else {
        println!("{} Set {} = {}", "✓".green(), key.cyan(), value);
    }

    Ok(())
}
