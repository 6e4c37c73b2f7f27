//! Error types for media processing.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for processing operations.
pub type ProcessResult<T> = Result<T, ProcessError>;

/// Errors that can occur while provisioning or running ffmpeg.
#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to create directory {path:?}: {source}")]
    DirectoryCreation {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write executable {path:?}: {source}")]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to set executable permission on {path:?}: {source}")]
    Permission {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Executable not found at: {0}")]
    ExecutableNotFound(PathBuf),

    #[error("No ffmpeg executable available. Set one with set_ffmpeg_path or the binary.ffmpeg_path config key.")]
    NoExecutable,

    #[error("Failed to attach to the process diagnostic stream")]
    StreamSetup,

    #[error("Failed to start {path:?}: {source}")]
    ProcessStart {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("ffmpeg command failed: {status}{}", format_diagnostics(.diagnostics))]
    OperationFailed {
        status: String,
        diagnostics: Option<String>,
    },

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Failed to list output directory {path:?}: {source}")]
    OutputListing {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to rename {from:?} to {to:?}: {source}")]
    Rename {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Duration unavailable: {0}")]
    DurationUnavailable(String),
}

fn format_diagnostics(diagnostics: &Option<String>) -> String {
    match diagnostics {
        Some(text) => format!("\n{}", text),
        None => String::new(),
    }
}

impl ProcessError {
    /// Captured stderr of a failed run, if the operation kept it.
    pub fn diagnostics(&self) -> Option<&str> {
        match self {
            ProcessError::OperationFailed { diagnostics, .. } => diagnostics.as_deref(),
            _ => None,
        }
    }
}
