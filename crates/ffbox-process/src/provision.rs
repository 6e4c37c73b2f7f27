//! Materializing embedded executables on disk.

use crate::error::{ProcessError, ProcessResult};
use crate::payload::{Payload, PayloadCache};
use once_cell::sync::Lazy;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Something that can produce an executable path on demand.
pub trait BinaryProvider {
    /// Return the path of a usable executable, extracting it into `extract_dir`
    /// (or the temp dir) if needed. `Ok(None)` means no executable is available.
    fn provide(&self, extract_dir: Option<&Path>) -> ProcessResult<Option<PathBuf>>;
}

/// One tool's embedded payload and the file name it is written under.
pub struct EmbeddedBinary {
    name: &'static str,
    payload: PayloadCache,
}

impl EmbeddedBinary {
    pub fn new(name: &'static str, payload: PayloadCache) -> Self {
        Self { name, payload }
    }

    /// File name for the host platform (`ffmpeg`, `ffmpeg.exe`).
    pub fn file_name(&self) -> String {
        if cfg!(windows) {
            format!("{}.exe", self.name)
        } else {
            self.name.to_string()
        }
    }

    /// Where `provide` puts the executable for a given extraction directory.
    pub fn target_path(&self, extract_dir: Option<&Path>) -> PathBuf {
        extract_dir
            .map(Path::to_path_buf)
            .unwrap_or_else(std::env::temp_dir)
            .join(self.file_name())
    }

    pub fn has_payload(&self) -> bool {
        !self.payload.get().is_empty()
    }

    fn write_executable(&self, path: &Path, bytes: &[u8]) -> ProcessResult<()> {
        let mut file = match OpenOptions::new().write(true).create_new(true).open(path) {
            Ok(file) => file,
            // Someone else materialized it between our check and the create.
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => return Ok(()),
            Err(source) => {
                return Err(ProcessError::FileWrite {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        if let Err(source) = file.write_all(bytes).and_then(|_| file.flush()) {
            drop(file);
            if let Err(e) = std::fs::remove_file(path) {
                warn!("Could not remove partial executable {:?}: {}", path, e);
            }
            return Err(ProcessError::FileWrite {
                path: path.to_path_buf(),
                source,
            });
        }

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            file.set_permissions(std::fs::Permissions::from_mode(0o755))
                .map_err(|source| ProcessError::Permission {
                    path: path.to_path_buf(),
                    source,
                })?;
        }

        Ok(())
    }
}

impl BinaryProvider for EmbeddedBinary {
    fn provide(&self, extract_dir: Option<&Path>) -> ProcessResult<Option<PathBuf>> {
        let target = self.target_path(extract_dir);

        if target.exists() {
            debug!("Reusing {} at {:?}", self.name, target);
            return Ok(Some(target));
        }

        if let Some(dir) = target.parent() {
            std::fs::create_dir_all(dir).map_err(|source| ProcessError::DirectoryCreation {
                path: dir.to_path_buf(),
                source,
            })?;
        }

        let bytes = self.payload.get();
        if bytes.is_empty() {
            debug!("No embedded {} in this build", self.name);
            return Ok(None);
        }

        info!("Extracting embedded {} to {:?}", self.name, target);
        self.write_executable(&target, bytes)?;
        Ok(Some(target))
    }
}

/// The executables this build can provide, one per tool.
pub struct BinaryLocator {
    ffmpeg: EmbeddedBinary,
    ffprobe: EmbeddedBinary,
}

static EMBEDDED: Lazy<BinaryLocator> = Lazy::new(BinaryLocator::for_current_target);

impl BinaryLocator {
    pub fn new(ffmpeg: PayloadCache, ffprobe: PayloadCache) -> Self {
        Self {
            ffmpeg: EmbeddedBinary::new("ffmpeg", ffmpeg),
            ffprobe: EmbeddedBinary::new("ffprobe", ffprobe),
        }
    }

    /// Locator over the payloads compiled in for the current target.
    pub fn for_current_target() -> Self {
        Self::new(
            PayloadCache::new(Payload::embedded_ffmpeg()),
            PayloadCache::new(Payload::embedded_ffprobe()),
        )
    }

    /// Shared locator for the whole process, so each payload is decoded at most once.
    pub fn embedded() -> &'static BinaryLocator {
        &EMBEDDED
    }

    pub fn ffmpeg(&self) -> &EmbeddedBinary {
        &self.ffmpeg
    }

    pub fn ffprobe(&self) -> &EmbeddedBinary {
        &self.ffprobe
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn binary(bytes: &'static [u8]) -> EmbeddedBinary {
        EmbeddedBinary::new("ffmpeg", PayloadCache::new(Payload::Raw(bytes)))
    }

    #[test]
    fn test_target_path_uses_extract_dir() {
        let dir = tempfile::tempdir().unwrap();
        let target = binary(b"x").target_path(Some(dir.path()));

        assert!(target.starts_with(dir.path()));
        if cfg!(windows) {
            assert!(target.ends_with("ffmpeg.exe"));
        } else {
            assert!(target.ends_with("ffmpeg"));
        }
    }

    #[test]
    fn test_target_path_defaults_to_temp_dir() {
        let target = binary(b"x").target_path(None);
        assert!(target.starts_with(std::env::temp_dir()));
    }

    #[test]
    fn test_provide_writes_payload() {
        let dir = tempfile::tempdir().unwrap();
        let path = binary(b"#!/bin/sh\nexit 0\n")
            .provide(Some(dir.path()))
            .unwrap()
            .unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), b"#!/bin/sh\nexit 0\n");

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(&path).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o755);
        }
    }

    #[test]
    fn test_provide_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let first = binary(b"first payload").provide(Some(dir.path())).unwrap().unwrap();
        let modified = std::fs::metadata(&first).unwrap().modified().unwrap();

        // A different payload must not replace what is already on disk.
        let second = binary(b"second payload").provide(Some(dir.path())).unwrap().unwrap();

        assert_eq!(first, second);
        assert_eq!(std::fs::read(&second).unwrap(), b"first payload");
        assert_eq!(std::fs::metadata(&second).unwrap().modified().unwrap(), modified);
    }

    #[test]
    fn test_existing_file_is_trusted() {
        let dir = tempfile::tempdir().unwrap();
        let existing = binary(b"").target_path(Some(dir.path()));
        std::fs::write(&existing, b"user supplied").unwrap();

        let provided = binary(b"embedded").provide(Some(dir.path())).unwrap();
        assert_eq!(provided, Some(existing.clone()));
        assert_eq!(std::fs::read(&existing).unwrap(), b"user supplied");
    }

    #[test]
    fn test_empty_payload_provides_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let extract_dir = dir.path().join("nested").join("bin");

        let provided = binary(b"").provide(Some(&extract_dir)).unwrap();

        assert!(provided.is_none());
        assert!(extract_dir.is_dir());
        assert!(std::fs::read_dir(&extract_dir).unwrap().next().is_none());
    }

    #[test]
    fn test_directory_creation_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, b"file").unwrap();

        let err = binary(b"x").provide(Some(&blocker.join("bin"))).unwrap_err();
        assert!(matches!(err, ProcessError::DirectoryCreation { .. }));
    }

    #[test]
    fn test_locator_tools() {
        let locator = BinaryLocator::new(
            PayloadCache::new(Payload::Raw(b"ffmpeg")),
            PayloadCache::empty(),
        );
        assert!(locator.ffmpeg().has_payload());
        assert!(!locator.ffprobe().has_payload());
        assert!(locator.ffprobe().file_name().starts_with("ffprobe"));
    }
}
