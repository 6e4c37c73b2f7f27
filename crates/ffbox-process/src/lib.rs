//! ffbox Process - Driving an embedded ffmpeg as a subprocess.
//!
//! This crate provides:
//! - Provisioning of embedded ffmpeg/ffprobe executables (decompressed once, written once)
//! - A process runner that turns ffmpeg's stderr into progress snapshots
//! - Audio extraction, segmentation and keyframe extraction drivers
//! - Duration lookup through ffprobe
//!
//! When no executable is embedded in the build, one can be supplied by path.

mod error;
mod ffmpeg;
mod payload;
mod probe;
mod progress;
mod provision;
mod runner;

pub use error::{ProcessError, ProcessResult};
pub use ffbox_core::{
    ExtractAudioParams, ExtractKeyFramesParams, Progress, ProgressCallback, ProgressStatus,
    SplitVideoParams,
};
pub use ffmpeg::Ffmpeg;
pub use payload::{gunzip, Decoder, Payload, PayloadCache};
pub use probe::{parse_duration_output, DurationProbe, FfprobeDuration};
pub use progress::{timestamp_to_millis, ProgressParser};
pub use provision::{BinaryLocator, BinaryProvider, EmbeddedBinary};
pub use runner::{DiagnosticCapture, Runner, FFMPEG_PATH_ENV};

/// Report which tools this build embeds and which are on `PATH`.
pub fn check_dependencies() -> Vec<(&'static str, bool, bool)> {
    let locator = BinaryLocator::embedded();
    vec![
        (
            "ffmpeg",
            locator.ffmpeg().has_payload(),
            which::which("ffmpeg").is_ok(),
        ),
        (
            "ffprobe",
            locator.ffprobe().has_payload(),
            which::which("ffprobe").is_ok(),
        ),
    ]
}
