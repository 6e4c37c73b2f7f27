//! Turning ffmpeg's stderr chatter into progress snapshots.

use ffbox_core::Progress;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

static TIME_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"time=(\d+):(\d+):(\d+)\.(\d+)").expect("valid time regex"));
static DURATION_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Duration: (\d+):(\d+):(\d+)\.(\d+)").expect("valid duration regex"));

/// Parses `Duration:` and `time=` markers out of stderr chunks.
#[derive(Debug, Clone, Default)]
pub struct ProgressParser {
    remember_duration: bool,
    total_ms: Option<i64>,
}

impl ProgressParser {
    /// A parser that only reports when a chunk carries both markers.
    pub fn new() -> Self {
        Self::default()
    }

    /// A parser that keeps the last `Duration:` it saw, so later chunks with only
    /// a `time=` marker still report progress.
    pub fn remembering_duration() -> Self {
        Self {
            remember_duration: true,
            total_ms: None,
        }
    }

    /// Parse one chunk, returning a processing snapshot if it yields one.
    pub fn parse(&mut self, chunk: &str) -> Option<Progress> {
        let chunk_total = DURATION_PATTERN.captures(chunk).and_then(|c| captures_to_millis(&c));
        if self.remember_duration && chunk_total.is_some() {
            self.total_ms = chunk_total;
        }

        let current = TIME_PATTERN.captures(chunk).and_then(|c| captures_to_millis(&c))?;
        let total = if self.remember_duration {
            self.total_ms?
        } else {
            chunk_total?
        };

        Some(Progress::processing(current, total))
    }
}

fn captures_to_millis(caps: &Captures<'_>) -> Option<i64> {
    let field = |i: usize| caps.get(i)?.as_str().parse::<i64>().ok();
    timestamp_to_millis(field(1)?, field(2)?, field(3)?, field(4)?)
}

/// Convert an `HH:MM:SS.hh` timestamp to milliseconds.
///
/// The fractional field is always scaled by 10, whatever its digit count.
/// Returns `None` if the result does not fit in an `i64`.
pub fn timestamp_to_millis(hours: i64, minutes: i64, seconds: i64, fraction: i64) -> Option<i64> {
    hours
        .checked_mul(3600)?
        .checked_add(minutes.checked_mul(60)?)?
        .checked_add(seconds)?
        .checked_mul(1000)?
        .checked_add(fraction.checked_mul(10)?)
}
