//! FBIP Codecs - Event serialization formats
//!
//! This crate turns events into bytes and back:
//! - Four interchangeable codecs behind the [`Codec`] trait
//! - Format detection for received bytes
//! - Batch packets carrying several events
//! - Control packets (heartbeat, ack, error, state snapshots)

pub mod batch;
pub mod binary;
pub mod compact;
pub mod compressed;
pub mod control;
pub mod detect;
pub mod format;
pub mod raw;
pub mod text;

pub use batch::{decode_batch_packet, BatchEncoder, DecodedBatch};
pub use binary::{decode_event_packet, BinaryCodec};
pub use compressed::{CompressedCodec, CompressionSettings};
pub use control::{Ack, Control, ErrorReport, Heartbeat};
pub use detect::detect;
pub use format::Format;
pub use raw::RawCodec;
pub use text::TextCodec;

use fbip_core::{Event, FbipError, FbipResult, MAX_PACKET_SIZE};

/// Size accounting for a compressed payload
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CompressionInfo {
    pub original: usize,
    pub compressed: usize,
}

impl CompressionInfo {
    /// compressed / original
    pub fn ratio(&self) -> f64 {
        if self.original == 0 {
            1.0
        } else {
            self.compressed as f64 / self.original as f64
        }
    }
}

/// Encoder output
#[derive(Clone, Debug)]
pub struct Encoded {
    pub bytes: Vec<u8>,
    /// Set when the payload was deflated
    pub compression: Option<CompressionInfo>,
}

/// Decoder output
#[derive(Clone, Debug)]
pub struct Decoded {
    pub event: Event,
    /// Unknown enum values replaced by their defaults
    pub fallbacks: u32,
    /// Set when the payload was inflated
    pub compression: Option<CompressionInfo>,
}

/// Event codec
///
/// Implementations are stateless apart from immutable settings and can be
/// shared between threads.
pub trait Codec: Send + Sync {
    fn format(&self) -> Format;

    fn encode(&self, event: &Event) -> FbipResult<Encoded>;

    fn decode(&self, bytes: &[u8]) -> FbipResult<Decoded>;
}

/// Fail when `len` bytes would exceed the packet limit
pub(crate) fn check_size(len: usize) -> FbipResult<()> {
    if len > MAX_PACKET_SIZE {
        Err(FbipError::PacketTooLarge {
            size: len,
            max: MAX_PACKET_SIZE,
        })
    } else {
        Ok(())
    }
}

/// One codec per format
#[derive(Clone, Copy, Debug, Default)]
pub struct CodecSet {
    text: TextCodec,
    binary: BinaryCodec,
    raw: RawCodec,
    compressed: CompressedCodec,
}

impl CodecSet {
    pub fn new(compression: CompressionSettings) -> Self {
        CodecSet {
            compressed: CompressedCodec::new(compression),
            ..Default::default()
        }
    }

    pub fn get(&self, format: Format) -> &dyn Codec {
        match format {
            Format::Text => &self.text,
            Format::Binary => &self.binary,
            Format::Raw => &self.raw,
            Format::Compressed => &self.compressed,
        }
    }

    pub fn compression(&self) -> CompressionSettings {
        self.compressed.settings()
    }

    /// Detect the format of `bytes` and decode with the matching codec
    pub fn decode_auto(&self, bytes: &[u8]) -> FbipResult<(Format, Decoded)> {
        let format = detect(bytes)?;
        let decoded = self.get(format).decode(bytes)?;
        Ok((format, decoded))
    }
}
