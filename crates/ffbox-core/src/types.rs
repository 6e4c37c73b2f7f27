//! Core domain types for ffbox.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Callback invoked with progress snapshots while an operation runs.
pub type ProgressCallback = Box<dyn Fn(&Progress) + Send + Sync>;

/// Status tag carried by a progress snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProgressStatus {
    #[default]
    Processing,
    Completed,
}

impl ProgressStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProgressStatus::Processing => "processing",
            ProgressStatus::Completed => "completed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "processing" => Some(ProgressStatus::Processing),
            "completed" => Some(ProgressStatus::Completed),
            _ => None,
        }
    }
}

impl std::fmt::Display for ProgressStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One progress update from a running ffmpeg process.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Progress {
    /// Percentage complete, 0-100 inclusive.
    pub percentage: f64,
    /// Elapsed media time in milliseconds.
    pub current_ms: i64,
    /// Total media duration in milliseconds.
    pub total_ms: i64,
    pub status: ProgressStatus,
}

impl Progress {
    /// Build a processing snapshot, deriving the percentage from the two times.
    pub fn processing(current_ms: i64, total_ms: i64) -> Self {
        let percentage = if total_ms > 0 {
            (current_ms as f64 / total_ms as f64 * 100.0).min(100.0)
        } else {
            0.0
        };

        Self {
            percentage,
            current_ms,
            total_ms,
            status: ProgressStatus::Processing,
        }
    }

    /// The terminal snapshot sent once an operation has finished successfully.
    pub fn completed() -> Self {
        Self {
            percentage: 100.0,
            current_ms: 0,
            total_ms: 0,
            status: ProgressStatus::Completed,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == ProgressStatus::Completed
    }
}

/// Parameters for pulling the audio stream out of a video.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractAudioParams {
    pub input_path: PathBuf,
    pub output_path: PathBuf,
}

impl ExtractAudioParams {
    pub fn new(input_path: impl Into<PathBuf>, output_path: impl Into<PathBuf>) -> Self {
        Self {
            input_path: input_path.into(),
            output_path: output_path.into(),
        }
    }
}

/// Parameters for cutting a video into fixed-length segments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitVideoParams {
    pub input_path: PathBuf,
    pub output_dir: PathBuf,
    /// Segment length in seconds.
    pub segment_time: u32,
    pub output_prefix: String,
    /// Container extension of the segments, without the dot.
    pub extension: String,
}

impl SplitVideoParams {
    pub fn new(
        input_path: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
        segment_time: u32,
        output_prefix: impl Into<String>,
    ) -> Self {
        Self {
            input_path: input_path.into(),
            output_dir: output_dir.into(),
            segment_time,
            output_prefix: output_prefix.into(),
            extension: "mp4".to_string(),
        }
    }

    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into().trim_start_matches('.').to_string();
        self
    }
}

/// Parameters for sampling keyframes into JPEG images.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractKeyFramesParams {
    pub input_path: PathBuf,
    pub output_dir: PathBuf,
    /// Seconds between extracted frames.
    pub frame_interval: u32,
    pub output_prefix: String,
}

impl ExtractKeyFramesParams {
    pub fn new(
        input_path: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
        frame_interval: u32,
        output_prefix: impl Into<String>,
    ) -> Self {
        Self {
            input_path: input_path.into(),
            output_dir: output_dir.into(),
            frame_interval,
            output_prefix: output_prefix.into(),
        }
    }
}
