//! Media duration lookup through ffprobe.

use crate::error::{ProcessError, ProcessResult};
use crate::provision::{BinaryLocator, BinaryProvider};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::debug;

/// Anything that can report how long a media file is.
pub trait DurationProbe {
    /// Duration of `input` in milliseconds.
    fn probe_duration(&self, input: &Path) -> ProcessResult<i64>;
}

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    format: Option<FfprobeFormat>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
}

/// Duration probe backed by an ffprobe executable.
#[derive(Debug, Clone)]
pub struct FfprobeDuration {
    ffprobe_path: PathBuf,
}

impl FfprobeDuration {
    pub fn new(ffprobe_path: impl Into<PathBuf>) -> Self {
        Self {
            ffprobe_path: ffprobe_path.into(),
        }
    }

    /// Find ffprobe: an explicit path first, then the embedded copy, then `PATH`.
    pub fn locate(explicit: Option<&Path>, extract_dir: Option<&Path>) -> ProcessResult<Self> {
        if let Some(path) = explicit {
            if !path.exists() {
                return Err(ProcessError::ExecutableNotFound(path.to_path_buf()));
            }
            return Ok(Self::new(path));
        }

        if let Some(path) = BinaryLocator::embedded().ffprobe().provide(extract_dir)? {
            return Ok(Self::new(path));
        }

        which::which("ffprobe")
            .map(Self::new)
            .map_err(|_| ProcessError::ExecutableNotFound(PathBuf::from("ffprobe")))
    }

    pub fn path(&self) -> &Path {
        &self.ffprobe_path
    }
}

impl DurationProbe for FfprobeDuration {
    fn probe_duration(&self, input: &Path) -> ProcessResult<i64> {
        debug!("Probing duration of {:?}", input);

        let output = Command::new(&self.ffprobe_path)
            .args(["-v", "error", "-show_entries", "format=duration", "-of", "json"])
            .arg(input)
            .output()
            .map_err(|source| ProcessError::ProcessStart {
                path: self.ffprobe_path.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(ProcessError::OperationFailed {
                status: output.status.to_string(),
                diagnostics: Some(String::from_utf8_lossy(&output.stderr).to_string()),
            });
        }

        parse_duration_output(&String::from_utf8_lossy(&output.stdout))
    }
}

/// Extract `format.duration` (seconds) from ffprobe's JSON and convert to milliseconds.
pub fn parse_duration_output(json: &str) -> ProcessResult<i64> {
    let probe: FfprobeOutput = serde_json::from_str(json).map_err(|e| {
        ProcessError::DurationUnavailable(format!("Failed to parse ffprobe output: {}", e))
    })?;

    let raw = probe
        .format
        .and_then(|f| f.duration)
        .ok_or_else(|| ProcessError::DurationUnavailable("no duration field".to_string()))?;

    let seconds: f64 = raw
        .trim()
        .parse()
        .map_err(|_| ProcessError::DurationUnavailable(format!("unparsable duration {:?}", raw)))?;

    if !seconds.is_finite() || seconds < 0.0 {
        return Err(ProcessError::DurationUnavailable(format!(
            "invalid duration {}",
            seconds
        )));
    }

    Ok((seconds * 1000.0) as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_duration() {
        let json = r#"{ "format": { "duration": "35.250000" } }"#;
        assert_eq!(parse_duration_output(json).unwrap(), 35250);
    }

    #[test]
    fn test_missing_duration() {
        for json in [r#"{ "format": {} }"#, r#"{}"#, r#"{ "format": { "duration": "N/A" } }"#] {
            let err = parse_duration_output(json).unwrap_err();
            assert!(matches!(err, ProcessError::DurationUnavailable(_)), "{}", json);
        }
    }

    #[test]
    fn test_garbage_output() {
        assert!(matches!(
            parse_duration_output("not json"),
            Err(ProcessError::DurationUnavailable(_))
        ));
    }

    #[test]
    fn test_explicit_path_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("ffprobe");
        assert!(matches!(
            FfprobeDuration::locate(Some(&missing), None),
            Err(ProcessError::ExecutableNotFound(_))
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_probe_with_stub() {
        use crate::test_support::write_script;

        let dir = tempfile::tempdir().unwrap();
        let script = write_script(
            dir.path(),
            "ffprobe",
            "echo '{\"format\": {\"duration\": \"12.5\"}}'\n",
        );

        let probe = FfprobeDuration::locate(Some(&script), None).unwrap();
        assert_eq!(probe.path(), script.as_path());
        assert_eq!(probe.probe_duration(Path::new("in.mp4")).unwrap(), 12500);
    }

    #[cfg(unix)]
    #[test]
    fn test_probe_failure() {
        use crate::test_support::write_script;

        let dir = tempfile::tempdir().unwrap();
        let script = write_script(dir.path(), "ffprobe", "echo 'in.mp4: Invalid data' >&2\nexit 1\n");

        let err = FfprobeDuration::new(&script)
            .probe_duration(Path::new("in.mp4"))
            .unwrap_err();
        assert!(err.to_string().contains("Invalid data"));
    }
}
