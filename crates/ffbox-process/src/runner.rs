//! Running ffmpeg as a subprocess while streaming its stderr into progress updates.

use crate::error::{ProcessError, ProcessResult};
use crate::progress::ProgressParser;
use ffbox_core::Progress;
use std::ffi::OsString;
use std::io::Read;
use std::path::Path;
use std::process::{ChildStderr, Command, Stdio};
use std::sync::mpsc::{self, Receiver, SyncSender};
use std::thread;
use tracing::{debug, trace, warn};

/// Environment variable through which the child sees its own executable path.
pub const FFMPEG_PATH_ENV: &str = "FFMPEG_PATH";

const READ_CHUNK_SIZE: usize = 1024;
const CHUNK_QUEUE_CAPACITY: usize = 64;

/// Whether a run keeps the full stderr text for its error message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticCapture {
    Discard,
    Keep,
}

/// One ffmpeg session: spawn, stream stderr to the progress parser, wait.
pub struct Runner<'a> {
    callback: Option<&'a (dyn Fn(&Progress) + Send + Sync)>,
    remember_duration: bool,
}

impl<'a> Runner<'a> {
    pub fn new(callback: Option<&'a (dyn Fn(&Progress) + Send + Sync)>) -> Self {
        Self {
            callback,
            remember_duration: false,
        }
    }

    /// Keep the total duration across stderr chunks once it has been seen.
    pub fn remember_duration(mut self, remember: bool) -> Self {
        self.remember_duration = remember;
        self
    }

    /// Run `program` with `args` and block until it exits.
    ///
    /// Processing snapshots are delivered while the process runs. A single
    /// completed snapshot follows a successful exit; nothing follows a failure.
    /// Returns only once stderr reaches EOF, so any process that inherited the
    /// pipe (e.g. a wrapper script's children) holds the call open until it exits.
    pub fn run(
        &self,
        program: &Path,
        args: &[OsString],
        capture: DiagnosticCapture,
    ) -> ProcessResult<()> {
        debug!("Running {:?} {:?}", program, args);

        let mut child = Command::new(program)
            .args(args)
            .env(FFMPEG_PATH_ENV, program)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| ProcessError::ProcessStart {
                path: program.to_path_buf(),
                source,
            })?;

        let Some(stderr) = child.stderr.take() else {
            let _ = child.kill();
            let _ = child.wait();
            return Err(ProcessError::StreamSetup);
        };

        let (status, diagnostics) = thread::scope(|scope| {
            let (tx, rx) = mpsc::sync_channel(CHUNK_QUEUE_CAPACITY);

            let producer = scope.spawn(move || read_chunks(stderr, tx, capture));
            scope.spawn(move || self.consume(rx));

            let status = child.wait();
            let diagnostics = producer
                .join()
                .unwrap_or_else(|panic| std::panic::resume_unwind(panic));
            (status, diagnostics)
        });

        let status = status?;
        if !status.success() {
            warn!("{:?} exited unsuccessfully ({})", program, status);
            return Err(ProcessError::OperationFailed {
                status: status.to_string(),
                diagnostics,
            });
        }

        if let Some(callback) = self.callback {
            callback(&Progress::completed());
        }

        Ok(())
    }

    fn consume(&self, rx: Receiver<String>) {
        let mut parser = if self.remember_duration {
            ProgressParser::remembering_duration()
        } else {
            ProgressParser::new()
        };

        for chunk in rx {
            trace!("ffmpeg: {}", chunk.trim_end());
            let Some(callback) = self.callback else {
                continue;
            };
            if let Some(progress) = parser.parse(&chunk) {
                callback(&progress);
            }
        }
    }
}

/// Read stderr until EOF or error, forwarding each chunk to the consumer.
/// Dropping `tx` on return is what ends the consumer's loop.
fn read_chunks(
    mut stderr: ChildStderr,
    tx: SyncSender<String>,
    capture: DiagnosticCapture,
) -> Option<String> {
    let mut captured = (capture == DiagnosticCapture::Keep).then(String::new);
    let mut forwarding = true;
    let mut buf = [0u8; READ_CHUNK_SIZE];

    loop {
        let n = match stderr.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => {
                debug!("Stopped reading ffmpeg stderr: {}", e);
                break;
            }
        };

        let chunk = String::from_utf8_lossy(&buf[..n]).into_owned();
        if let Some(text) = captured.as_mut() {
            text.push_str(&chunk);
        }
        // Keep draining the pipe even if the consumer is gone, or ffmpeg blocks.
        if forwarding && tx.send(chunk).is_err() {
            forwarding = false;
        }
    }

    captured
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::test_support::write_script;
    use ffbox_core::ProgressStatus;
    use std::sync::{Arc, Mutex};

    type Recorded = Arc<Mutex<Vec<Progress>>>;

    fn recorder() -> (Recorded, impl Fn(&Progress) + Send + Sync) {
        let seen: Recorded = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        (seen, move |p: &Progress| sink.lock().unwrap().push(*p))
    }

    #[test]
    fn test_success_reports_progress_then_completion() {
        let dir = tempfile::tempdir().unwrap();
        let script = write_script(
            dir.path(),
            "ffmpeg",
            "printf 'Duration: 00:00:10.00, start: 0.0\\n' >&2\n\
             printf 'Duration: 00:00:10.00 frame=1 time=00:00:05.00 speed=1x\\n' >&2\n\
             exit 0\n",
        );

        let (seen, callback) = recorder();
        Runner::new(Some(&callback))
            .run(&script, &[], DiagnosticCapture::Discard)
            .unwrap();

        let seen = seen.lock().unwrap();
        let (last, processing) = seen.split_last().unwrap();
        assert_eq!(last.status, ProgressStatus::Completed);
        assert_eq!(last.percentage, 100.0);
        assert!(processing.iter().all(|p| p.status == ProgressStatus::Processing));
        assert!(processing
            .iter()
            .any(|p| (p.percentage - 50.0).abs() < f64::EPSILON));
        assert_eq!(seen.iter().filter(|p| p.is_completed()).count(), 1);
    }

    #[test]
    fn test_failure_keeps_diagnostics_and_skips_completion() {
        let dir = tempfile::tempdir().unwrap();
        let script = write_script(
            dir.path(),
            "ffmpeg",
            "echo 'missing.mp4: No such file or directory' >&2\nexit 1\n",
        );

        let (seen, callback) = recorder();
        let err = Runner::new(Some(&callback))
            .run(&script, &[], DiagnosticCapture::Keep)
            .unwrap_err();

        assert!(matches!(err, ProcessError::OperationFailed { .. }));
        assert!(err.to_string().contains("No such file or directory"));
        assert!(seen.lock().unwrap().is_empty());
    }

    #[test]
    fn test_failure_discards_diagnostics() {
        let dir = tempfile::tempdir().unwrap();
        let script = write_script(dir.path(), "ffmpeg", "echo 'codec not found' >&2\nexit 2\n");

        let err = Runner::new(None)
            .run(&script, &[], DiagnosticCapture::Discard)
            .unwrap_err();

        assert!(err.diagnostics().is_none());
        assert!(!err.to_string().contains("codec not found"));
    }

    #[test]
    fn test_large_stderr_does_not_block() {
        let dir = tempfile::tempdir().unwrap();
        let script = write_script(
            dir.path(),
            "ffmpeg",
            "i=0\nwhile [ $i -lt 2000 ]; do\n  echo \"frame=$i time=00:00:01.00\" >&2\n  i=$((i+1))\ndone\nexit 3\n",
        );

        let (_seen, callback) = recorder();
        let err = Runner::new(Some(&callback))
            .run(&script, &[], DiagnosticCapture::Keep)
            .unwrap_err();

        let diagnostics = err.diagnostics().unwrap();
        assert_eq!(diagnostics.lines().count(), 2000);
        assert!(diagnostics.contains("frame=1999 "));
    }

    #[test]
    fn test_executable_path_is_scoped_to_child() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("env.txt");
        let script = write_script(dir.path(), "ffmpeg", "printf '%s' \"$FFMPEG_PATH\" > \"$1\"\n");
        let before = std::env::var_os(FFMPEG_PATH_ENV);

        Runner::new(None)
            .run(&script, &[out.clone().into_os_string()], DiagnosticCapture::Discard)
            .unwrap();

        assert_eq!(
            std::fs::read_to_string(&out).unwrap(),
            script.to_string_lossy()
        );
        assert_eq!(std::env::var_os(FFMPEG_PATH_ENV), before);
    }

    #[test]
    fn test_missing_program() {
        let dir = tempfile::tempdir().unwrap();
        let err = Runner::new(None)
            .run(&dir.path().join("nope"), &[], DiagnosticCapture::Keep)
            .unwrap_err();
        assert!(matches!(err, ProcessError::ProcessStart { .. }));
    }
}
