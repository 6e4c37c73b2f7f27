//! Application paths management.

use directories::ProjectDirs;
use std::path::PathBuf;

/// Platform-conventional locations used by ffbox.
#[derive(Debug, Clone)]
pub struct AppPaths {
    pub config_dir: PathBuf,
    pub cache_dir: PathBuf,
    pub config_file: PathBuf,
    /// Default extraction directory for embedded binaries.
    pub bin_dir: PathBuf,
}

impl AppPaths {
    /// Create paths using platform-specific directories.
    pub fn new() -> Option<Self> {
        let proj_dirs = ProjectDirs::from("com", "ffbox", "ffbox")?;
        Some(Self::from_dirs(
            proj_dirs.config_dir().to_path_buf(),
            proj_dirs.cache_dir().to_path_buf(),
        ))
    }

    /// Build the layout below explicit config and cache roots.
    pub fn from_dirs(config_dir: PathBuf, cache_dir: PathBuf) -> Self {
        Self {
            config_file: config_dir.join("config.toml"),
            bin_dir: cache_dir.join("bin"),
            config_dir,
            cache_dir,
        }
    }

    /// Create the config and cache directories.
    pub fn ensure_dirs(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.config_dir)?;
        std::fs::create_dir_all(&self.bin_dir)?;
        Ok(())
    }

    /// Whether `ffbox init` has written a config file.
    pub fn is_initialized(&self) -> bool {
        self.config_file.exists()
    }
}
