//! Compressed codec
//!
//! Same compact map as the raw codec, zlib-compressed when it is larger than
//! the configured threshold and compression actually shrinks it. Output is
//! always framed; the `Compressed` flag says whether the payload is deflated.

use std::borrow::Cow;
use std::io::{Read, Write};

use fbip_core::{Event, FbipError, FbipResult, DEFAULT_COMPRESSION_THRESHOLD, MAX_PACKET_SIZE};
use fbip_core::PROTOCOL_MAGIC;
use fbip_wire::{frame, unframe, Packet, PacketFlags, PacketType};
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;

use crate::binary::decode_event_packet;
use crate::compact::{from_msgpack, to_msgpack};
use crate::{check_size, Codec, CompressionInfo, Decoded, Encoded, Format};

/// zlib level used unless configured otherwise
pub const DEFAULT_COMPRESSION_LEVEL: u32 = 6;

/// Threshold used by the high-performance preset
pub const HIGH_PERFORMANCE_THRESHOLD: usize = 256;

/// When and how hard to compress
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CompressionSettings {
    /// Payloads at or below this many bytes are sent as-is
    pub threshold: usize,
    /// zlib level, 0-9
    pub level: u32,
}

impl Default for CompressionSettings {
    fn default() -> Self {
        CompressionSettings {
            threshold: DEFAULT_COMPRESSION_THRESHOLD,
            level: DEFAULT_COMPRESSION_LEVEL,
        }
    }
}

impl CompressionSettings {
    pub fn high_performance() -> Self {
        CompressionSettings {
            threshold: HIGH_PERFORMANCE_THRESHOLD,
            ..Default::default()
        }
    }

    /// Compress `raw` if it is over the threshold and deflating helps
    pub fn apply(&self, raw: Vec<u8>) -> FbipResult<(Vec<u8>, Option<CompressionInfo>)> {
        check_size(raw.len())?;
        if raw.len() <= self.threshold {
            return Ok((raw, None));
        }

        let deflated = deflate(&raw, self.level)?;
        if deflated.len() >= raw.len() {
            return Ok((raw, None));
        }

        let info = CompressionInfo {
            original: raw.len(),
            compressed: deflated.len(),
        };
        Ok((deflated, Some(info)))
    }
}

/// zlib-compress `data`
pub fn deflate(data: &[u8], level: u32) -> FbipResult<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::with_capacity(data.len() / 2), Compression::new(level));
    encoder
        .write_all(data)
        .and_then(|_| encoder.finish())
        .map_err(|e| FbipError::malformed(format!("zlib encode: {}", e)))
}

/// Inflate a zlib stream, refusing output larger than a packet
pub fn inflate(data: &[u8]) -> FbipResult<Vec<u8>> {
    let mut out = Vec::with_capacity(data.len() * 4);
    ZlibDecoder::new(data)
        .take(MAX_PACKET_SIZE as u64 + 1)
        .read_to_end(&mut out)
        .map_err(|e| FbipError::DecompressionFailure(e.to_string()))?;

    if out.len() > MAX_PACKET_SIZE {
        return Err(FbipError::PacketTooLarge {
            size: out.len(),
            max: MAX_PACKET_SIZE,
        });
    }
    Ok(out)
}

/// Payload of a verified packet, inflated when flagged
pub fn open_payload<'a>(
    packet: &Packet<'a>,
) -> FbipResult<(Cow<'a, [u8]>, Option<CompressionInfo>)> {
    if !packet.flags().is_compressed() {
        return Ok((Cow::Borrowed(packet.payload), None));
    }
    let inflated = inflate(packet.payload)?;
    let info = CompressionInfo {
        original: inflated.len(),
        compressed: packet.payload.len(),
    };
    Ok((Cow::Owned(inflated), Some(info)))
}

/// Compressed codec
#[derive(Clone, Copy, Debug, Default)]
pub struct CompressedCodec {
    settings: CompressionSettings,
}

impl CompressedCodec {
    pub fn new(settings: CompressionSettings) -> Self {
        CompressedCodec { settings }
    }

    pub fn settings(&self) -> CompressionSettings {
        self.settings
    }
}

impl Codec for CompressedCodec {
    fn format(&self) -> Format {
        Format::Compressed
    }

    fn encode(&self, event: &Event) -> FbipResult<Encoded> {
        let (payload, compression) = self.settings.apply(to_msgpack(event)?)?;

        let mut flags = PacketFlags::NONE;
        flags.set_compressed(compression.is_some());
        flags.set_priority(event.priority().is_elevated());

        let bytes = frame(PacketType::SingleEvent, flags, &payload)?;
        Ok(Encoded { bytes, compression })
    }

    /// Accepts framed packets (flagged or not) and bare zlib streams
    fn decode(&self, bytes: &[u8]) -> FbipResult<Decoded> {
        if bytes.starts_with(&PROTOCOL_MAGIC) {
            return decode_event_packet(&unframe(bytes)?);
        }
        let inflated = inflate(bytes)?;
        let (event, fallbacks) = from_msgpack(&inflated)?;
        Ok(Decoded {
            event,
            fallbacks,
            compression: Some(CompressionInfo {
                original: inflated.len(),
                compressed: bytes.len(),
            }),
        })
    }
}
