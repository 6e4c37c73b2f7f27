//! FFmpeg pipeline: audio extraction, segmentation and keyframe extraction.

use crate::error::{ProcessError, ProcessResult};
use crate::probe::{DurationProbe, FfprobeDuration};
use crate::provision::{BinaryLocator, BinaryProvider};
use crate::runner::{DiagnosticCapture, Runner};
use ffbox_core::{ExtractAudioParams, ExtractKeyFramesParams, ProgressCallback, SplitVideoParams};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// A resolved ffmpeg executable plus the progress callback its runs report to.
pub struct Ffmpeg {
    ffmpeg_path: Option<PathBuf>,
    ffprobe_path: Option<PathBuf>,
    extract_path: Option<PathBuf>,
    callback: Option<ProgressCallback>,
    remember_duration: bool,
}

impl std::fmt::Debug for Ffmpeg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ffmpeg")
            .field("ffmpeg_path", &self.ffmpeg_path)
            .field("ffprobe_path", &self.ffprobe_path)
            .field("extract_path", &self.extract_path)
            .field("callback", &self.callback.is_some())
            .field("remember_duration", &self.remember_duration)
            .finish()
    }
}

impl Ffmpeg {
    /// Use the embedded ffmpeg, extracted to the temp dir.
    pub fn new(callback: Option<ProgressCallback>) -> ProcessResult<Self> {
        Self::from_provider(BinaryLocator::embedded().ffmpeg(), None, callback)
    }

    /// Use the embedded ffmpeg, extracted to `dir`.
    pub fn with_extract_path(
        dir: impl Into<PathBuf>,
        callback: Option<ProgressCallback>,
    ) -> ProcessResult<Self> {
        let dir = dir.into();
        Self::from_provider(BinaryLocator::embedded().ffmpeg(), Some(dir.as_path()), callback)
    }

    /// Use an ffmpeg that already exists at `path`.
    pub fn with_path(
        path: impl Into<PathBuf>,
        callback: Option<ProgressCallback>,
    ) -> ProcessResult<Self> {
        let path = path.into();
        if !path.exists() {
            return Err(ProcessError::ExecutableNotFound(path));
        }

        Ok(Self {
            ffmpeg_path: Some(path),
            ffprobe_path: None,
            extract_path: None,
            callback,
            remember_duration: false,
        })
    }

    /// Ask `provider` for an executable. A provider with nothing to offer leaves the
    /// pipeline without a path; operations then fail with `NoExecutable`.
    pub fn from_provider(
        provider: &dyn BinaryProvider,
        extract_dir: Option<&Path>,
        callback: Option<ProgressCallback>,
    ) -> ProcessResult<Self> {
        let ffmpeg_path = provider.provide(extract_dir)?;
        if ffmpeg_path.is_none() {
            debug!("No ffmpeg provided for {:?}", extract_dir);
        }

        Ok(Self {
            ffmpeg_path,
            ffprobe_path: None,
            extract_path: extract_dir.map(Path::to_path_buf),
            callback,
            remember_duration: false,
        })
    }

    pub fn ffmpeg_path(&self) -> Option<&Path> {
        self.ffmpeg_path.as_deref()
    }

    pub fn ffprobe_path(&self) -> Option<&Path> {
        self.ffprobe_path.as_deref()
    }

    pub fn extract_path(&self) -> Option<&Path> {
        self.extract_path.as_deref()
    }

    pub fn set_ffmpeg_path(&mut self, path: impl Into<PathBuf>) {
        self.ffmpeg_path = Some(path.into());
    }

    pub fn set_ffprobe_path(&mut self, path: impl Into<PathBuf>) {
        self.ffprobe_path = Some(path.into());
    }

    pub fn set_progress_callback(&mut self, callback: ProgressCallback) {
        self.callback = Some(callback);
    }

    pub fn clear_progress_callback(&mut self) {
        self.callback = None;
    }

    /// Keep the last seen `Duration:` across stderr chunks.
    pub fn set_remember_duration(&mut self, remember: bool) {
        self.remember_duration = remember;
    }

    /// Copy the audio stream of `input_path` into `output_path`.
    pub fn extract_audio(&self, params: &ExtractAudioParams) -> ProcessResult<()> {
        info!(
            "Extracting audio from {:?} to {:?}",
            params.input_path, params.output_path
        );
        self.run(&audio_args(params), DiagnosticCapture::Discard)
    }

    /// Cut the input into `segment_time`-second pieces.
    ///
    /// Returns the segment paths, renamed to `{prefix}{index:03}_{start_seconds}.{ext}`.
    pub fn split_video(&self, params: &SplitVideoParams) -> ProcessResult<Vec<PathBuf>> {
        if params.segment_time == 0 {
            return Err(ProcessError::InvalidParameter(
                "segment_time must be greater than zero".to_string(),
            ));
        }
        create_output_dir(&params.output_dir)?;

        info!(
            "Splitting {:?} into {}s segments in {:?}",
            params.input_path, params.segment_time, params.output_dir
        );
        self.run(&split_args(params), DiagnosticCapture::Keep)?;

        let segments = list_outputs(&params.output_dir, &params.output_prefix, &params.extension)?;
        let mut renamed = Vec::with_capacity(segments.len());

        for (i, from) in segments.into_iter().enumerate() {
            let start = i as u64 * u64::from(params.segment_time);
            let to = params.output_dir.join(format!(
                "{}{:03}_{}.{}",
                params.output_prefix, i, start, params.extension
            ));
            std::fs::rename(&from, &to).map_err(|source| ProcessError::Rename {
                from: from.clone(),
                to: to.clone(),
                source,
            })?;
            renamed.push(to);
        }

        debug!("Produced {} segments", renamed.len());
        Ok(renamed)
    }

    /// Write one JPEG per `frame_interval` seconds, keeping I-frames only.
    pub fn extract_key_frames(&self, params: &ExtractKeyFramesParams) -> ProcessResult<Vec<PathBuf>> {
        if params.frame_interval == 0 {
            return Err(ProcessError::InvalidParameter(
                "frame_interval must be greater than zero".to_string(),
            ));
        }
        create_output_dir(&params.output_dir)?;

        info!(
            "Extracting keyframes from {:?} every {}s into {:?}",
            params.input_path, params.frame_interval, params.output_dir
        );
        self.run(&keyframe_args(params), DiagnosticCapture::Keep)?;

        let frames = list_outputs(&params.output_dir, &params.output_prefix, "jpg")?;
        debug!("Extracted {} keyframes", frames.len());
        Ok(frames)
    }

    /// Length of `input` in milliseconds, as reported by ffprobe.
    pub fn video_duration(&self, input: &Path) -> ProcessResult<i64> {
        FfprobeDuration::locate(self.ffprobe_path.as_deref(), self.extract_path.as_deref())?
            .probe_duration(input)
    }

    fn run(&self, args: &[OsString], capture: DiagnosticCapture) -> ProcessResult<()> {
        let program = self.ffmpeg_path.as_deref().ok_or(ProcessError::NoExecutable)?;
        Runner::new(self.callback.as_deref())
            .remember_duration(self.remember_duration)
            .run(program, args, capture)
    }
}

fn audio_args(params: &ExtractAudioParams) -> Vec<OsString> {
    vec![
        "-i".into(),
        params.input_path.clone().into(),
        "-vn".into(),
        "-acodec".into(),
        "copy".into(),
        params.output_path.clone().into(),
    ]
}

fn split_args(params: &SplitVideoParams) -> Vec<OsString> {
    let pattern = params.output_dir.join(format!(
        "{}%03d.{}",
        params.output_prefix, params.extension
    ));
    vec![
        "-i".into(),
        params.input_path.clone().into(),
        "-c".into(),
        "copy".into(),
        "-f".into(),
        "segment".into(),
        "-segment_time".into(),
        params.segment_time.to_string().into(),
        "-reset_timestamps".into(),
        "1".into(),
        pattern.into(),
    ]
}

fn keyframe_args(params: &ExtractKeyFramesParams) -> Vec<OsString> {
    let pattern = params
        .output_dir
        .join(format!("{}%06d.jpg", params.output_prefix));
    vec![
        "-i".into(),
        params.input_path.clone().into(),
        "-vf".into(),
        format!("select='eq(pict_type,I)',fps=1/{}", params.frame_interval).into(),
        "-vsync".into(),
        "vfr".into(),
        pattern.into(),
    ]
}

fn create_output_dir(dir: &Path) -> ProcessResult<()> {
    std::fs::create_dir_all(dir).map_err(|source| ProcessError::DirectoryCreation {
        path: dir.to_path_buf(),
        source,
    })
}

/// Regular files in `dir` that ffmpeg numbered as `{prefix}{digits}.{extension}`,
/// in numeric order. Files renamed by an earlier run are not matched.
fn list_outputs(dir: &Path, prefix: &str, extension: &str) -> ProcessResult<Vec<PathBuf>> {
    let listing_error = |source| ProcessError::OutputListing {
        path: dir.to_path_buf(),
        source,
    };
    let suffix = format!(".{}", extension);

    let mut numbered = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(listing_error)? {
        let entry = entry.map_err(listing_error)?;
        if !entry.file_type().map_err(listing_error)?.is_file() {
            continue;
        }

        let Ok(name) = entry.file_name().into_string() else {
            continue;
        };
        if let Some(index) = output_index(&name, prefix, &suffix) {
            numbered.push((index, name));
        }
    }

    numbered.sort();
    Ok(numbered
        .into_iter()
        .map(|(_, name)| dir.join(name))
        .collect())
}

/// The sequence number ffmpeg put between `prefix` and `suffix`.
fn output_index(name: &str, prefix: &str, suffix: &str) -> Option<u64> {
    let digits = name.strip_prefix(prefix)?.strip_suffix(suffix)?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}
