//! Configuration structures and loading.

use crate::error::{ConfigError, ConfigResult};
use crate::paths::AppPaths;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub binary: BinaryConfig,

    #[serde(default)]
    pub progress: ProgressConfig,

    #[serde(default)]
    pub split: SplitConfig,

    #[serde(default)]
    pub keyframes: KeyframesConfig,

    #[serde(default)]
    pub ui: UiConfig,
}

impl Config {
    /// Load configuration from the default location.
    pub fn load() -> ConfigResult<Self> {
        let paths = AppPaths::new().ok_or(ConfigError::NoConfigDir)?;
        Self::load_from(&paths.config_file)
    }

    /// Load configuration from a specific path, falling back to defaults if it is missing.
    pub fn load_from(path: &Path) -> ConfigResult<Self> {
        if !path.exists() {
            debug!("No config at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Save configuration to the default location.
    pub fn save(&self) -> ConfigResult<()> {
        let paths = AppPaths::new().ok_or(ConfigError::NoConfigDir)?;
        self.save_to(&paths.config_file)
    }

    /// Save configuration to a specific path.
    pub fn save_to(&self, path: &Path) -> ConfigResult<()> {
        let contents = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Create a default config file with comments.
    pub fn create_default_file(path: &Path) -> ConfigResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, Self::default_config_string())?;
        Ok(())
    }

    /// Generate a default config file with helpful comments.
    pub fn default_config_string() -> String {
        r#"# ffbox Configuration

[binary]
# Where the embedded ffmpeg/ffprobe get extracted (default: the ffbox cache dir)
# extract_dir = "~/.cache/ffbox/bin"

# Use existing executables instead of the embedded ones
# ffmpeg_path = "/usr/local/bin/ffmpeg"
# ffprobe_path = "/usr/local/bin/ffprobe"

[progress]
# Keep the total duration once ffmpeg prints it, so every later
# time= line produces a progress update
remember_duration = true

[split]
segment_time = 10              # Seconds per segment
output_prefix = "segment_"
extension = "mp4"

[keyframes]
frame_interval = 1             # Seconds between extracted keyframes
output_prefix = "keyframe_"

[ui]
# Enable colored output
color = true

# Print progress snapshots as JSON lines instead of a progress bar
json = false
"#
        .to_string()
    }

    /// Set a single value by its dotted key (e.g. `split.segment_time`).
    pub fn set(&mut self, key: &str, value: &str) -> ConfigResult<()> {
        let invalid = || ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
        };
        let optional = |v: &str| (!v.is_empty()).then(|| v.to_string());

        let parts: Vec<&str> = key.split('.').collect();
        match parts.as_slice() {
            ["binary", "extract_dir"] => self.binary.extract_dir = optional(value),
            ["binary", "ffmpeg_path"] => self.binary.ffmpeg_path = optional(value),
            ["binary", "ffprobe_path"] => self.binary.ffprobe_path = optional(value),
            ["progress", "remember_duration"] => {
                self.progress.remember_duration = value.parse().map_err(|_| invalid())?;
            }
            ["split", "segment_time"] => {
                self.split.segment_time = parse_positive(value).ok_or_else(invalid)?;
            }
            ["split", "output_prefix"] => self.split.output_prefix = value.to_string(),
            ["split", "extension"] => {
                self.split.extension = value.trim_start_matches('.').to_string();
            }
            ["keyframes", "frame_interval"] => {
                self.keyframes.frame_interval = parse_positive(value).ok_or_else(invalid)?;
            }
            ["keyframes", "output_prefix"] => self.keyframes.output_prefix = value.to_string(),
            ["ui", "color"] => self.ui.color = value.parse().map_err(|_| invalid())?,
            ["ui", "json"] => self.ui.json = value.parse().map_err(|_| invalid())?,
            _ => return Err(ConfigError::UnknownKey(key.to_string())),
        }

        Ok(())
    }
}

fn parse_positive(value: &str) -> Option<u32> {
    value.parse::<u32>().ok().filter(|v| *v > 0)
}

/// Where the executables come from.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BinaryConfig {
    pub extract_dir: Option<String>,
    pub ffmpeg_path: Option<String>,
    pub ffprobe_path: Option<String>,
}

/// Progress parsing behaviour.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressConfig {
    pub remember_duration: bool,
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self {
            remember_duration: true,
        }
    }
}

/// Defaults for `ffbox split`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitConfig {
    pub segment_time: u32,
    pub output_prefix: String,
    pub extension: String,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            segment_time: 10,
            output_prefix: "segment_".to_string(),
            extension: "mp4".to_string(),
        }
    }
}

/// Defaults for `ffbox keyframes`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyframesConfig {
    pub frame_interval: u32,
    pub output_prefix: String,
}

impl Default for KeyframesConfig {
    fn default() -> Self {
        Self {
            frame_interval: 1,
            output_prefix: "keyframe_".to_string(),
        }
    }
}

/// UI/Display settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    pub color: bool,
    pub json: bool,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            color: true,
            json: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.split.segment_time, 10);
        assert_eq!(config.split.output_prefix, "segment_");
        assert_eq!(config.keyframes.frame_interval, 1);
        assert!(config.progress.remember_duration);
        assert!(config.binary.ffmpeg_path.is_none());
    }

    #[test]
    fn test_default_string_parses() {
        let config: Config = toml::from_str(&Config::default_config_string()).unwrap();
        assert_eq!(config.split.extension, "mp4");
        assert_eq!(config.keyframes.output_prefix, "keyframe_");
        assert!(!config.ui.json);
    }

    #[test]
    fn test_load_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(
            temp_file,
            r#"
            [split]
            segment_time = 30
            "#
        )
        .unwrap();

        let config = Config::load_from(temp_file.path()).unwrap();

        assert_eq!(config.split.segment_time, 30);
        // Defaults should still work
        assert_eq!(config.split.output_prefix, "segment_");
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.split.segment_time, 10);
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.binary.ffmpeg_path = Some("/opt/ffmpeg/bin/ffmpeg".to_string());
        config.save_to(&path).unwrap();

        let reloaded = Config::load_from(&path).unwrap();
        assert_eq!(
            reloaded.binary.ffmpeg_path.as_deref(),
            Some("/opt/ffmpeg/bin/ffmpeg")
        );
    }

    #[test]
    fn test_set_values() {
        let mut config = Config::default();
        config.set("split.segment_time", "45").unwrap();
        config.set("split.extension", ".mkv").unwrap();
        config.set("progress.remember_duration", "false").unwrap();
        config.set("binary.extract_dir", "/tmp/ffbox").unwrap();

        assert_eq!(config.split.segment_time, 45);
        assert_eq!(config.split.extension, "mkv");
        assert!(!config.progress.remember_duration);
        assert_eq!(config.binary.extract_dir.as_deref(), Some("/tmp/ffbox"));

        config.set("binary.extract_dir", "").unwrap();
        assert!(config.binary.extract_dir.is_none());
    }

    #[test]
    fn test_set_rejects_bad_input() {
        let mut config = Config::default();
        assert!(matches!(
            config.set("split.segment_time", "0"),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(matches!(
            config.set("ui.color", "maybe"),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(matches!(
            config.set("split.codec", "h264"),
            Err(ConfigError::UnknownKey(_))
        ));
    }
}
