//! Embedded executable payloads and their one-time decompression.

use flate2::read::GzDecoder;
use once_cell::sync::OnceCell;
use std::io::Read;
use tracing::{debug, warn};

/// Decoder turning a compressed payload into the executable's bytes.
pub type Decoder = Box<dyn Fn(&[u8]) -> std::io::Result<Vec<u8>> + Send + Sync>;

/// Bytes of an executable compiled into this program.
#[derive(Debug, Clone, Copy)]
pub enum Payload {
    Raw(&'static [u8]),
    Gzip(&'static [u8]),
}

impl Payload {
    pub fn is_empty(&self) -> bool {
        match self {
            Payload::Raw(bytes) | Payload::Gzip(bytes) => bytes.is_empty(),
        }
    }
}

/// Gunzip a payload in full.
pub fn gunzip(bytes: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut decoded = Vec::new();
    GzDecoder::new(bytes).read_to_end(&mut decoded)?;
    Ok(decoded)
}

/// Memoizes the decompressed form of one payload.
///
/// The first `get` decodes and every later call returns the same bytes. A failed
/// decode is remembered as an empty payload and never attempted again.
pub struct PayloadCache {
    payload: Payload,
    decoder: Decoder,
    decoded: OnceCell<Vec<u8>>,
}

impl PayloadCache {
    pub fn new(payload: Payload) -> Self {
        Self::with_decoder(payload, Box::new(gunzip))
    }

    /// Use a custom decoder for `Gzip` payloads.
    pub fn with_decoder(payload: Payload, decoder: Decoder) -> Self {
        Self {
            payload,
            decoder,
            decoded: OnceCell::new(),
        }
    }

    /// An empty cache, for tools not embedded in this build.
    pub fn empty() -> Self {
        Self::new(Payload::Raw(&[]))
    }

    /// The executable's bytes, or an empty slice when none are available.
    pub fn get(&self) -> &[u8] {
        match self.payload {
            Payload::Raw(bytes) => bytes,
            Payload::Gzip(bytes) if bytes.is_empty() => &[],
            Payload::Gzip(bytes) => self.decoded.get_or_init(|| {
                debug!("Decompressing embedded payload ({} bytes)", bytes.len());
                match (self.decoder)(bytes) {
                    Ok(decoded) => decoded,
                    Err(e) => {
                        warn!("Embedded payload could not be decompressed: {}", e);
                        Vec::new()
                    }
                }
            })
            .as_slice(),
        }
    }
}

static FFMPEG_PAYLOAD: &[u8] = include_bytes!(concat!(env!("OUT_DIR"), "/ffmpeg.payload"));
static FFPROBE_PAYLOAD: &[u8] = include_bytes!(concat!(env!("OUT_DIR"), "/ffprobe.payload"));

impl Payload {
    /// ffmpeg as compiled into this build (empty when none was embedded).
    pub fn embedded_ffmpeg() -> Self {
        Self::compiled(FFMPEG_PAYLOAD, env!("FFBOX_FFMPEG_GZIP"))
    }

    /// ffprobe as compiled into this build (empty when none was embedded).
    pub fn embedded_ffprobe() -> Self {
        Self::compiled(FFPROBE_PAYLOAD, env!("FFBOX_FFPROBE_GZIP"))
    }

    fn compiled(bytes: &'static [u8], gzip_flag: &str) -> Self {
        if gzip_flag == "1" {
            Payload::Gzip(bytes)
        } else {
            Payload::Raw(bytes)
        }
    }
}
