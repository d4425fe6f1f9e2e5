//! Format detection
//!
//! Classifies received bytes before decode. Checked in order:
//! 1. `FBIP` magic: framed family, the Compressed flag picks the codec
//! 2. `{ ... }` that parses as the text wrapper
//! 3. zlib stream header
//! 4. MessagePack map marker
//!
//! A compressed-format packet whose payload stayed under the threshold
//! carries no Compressed flag and is byte-identical to a compact-binary
//! packet, so it is reported as `Binary`. Either codec decodes it.

use fbip_core::{FbipError, FbipResult, PROTOCOL_MAGIC};
use fbip_wire::PacketFlags;

use crate::text::TextProbe;
use crate::Format;

/// Second byte of a zlib header for each compression level class
const ZLIB_FLG: [u8; 4] = [0x01, 0x5e, 0x9c, 0xda];

/// zlib CMF byte: deflate, 32K window
const ZLIB_CMF: u8 = 0x78;

/// Detect the format of `bytes`
pub fn detect(bytes: &[u8]) -> FbipResult<Format> {
    if bytes.starts_with(&PROTOCOL_MAGIC) {
        let flags = PacketFlags::new(bytes.get(7).copied().unwrap_or(0));
        return Ok(if flags.is_compressed() {
            Format::Compressed
        } else {
            Format::Binary
        });
    }

    if looks_like_text(bytes) {
        return Ok(Format::Text);
    }

    if is_zlib_header(bytes) {
        return Ok(Format::Compressed);
    }

    match bytes.first().copied() {
        Some(0x80..=0x8f | 0xde | 0xdf) => Ok(Format::Raw),
        _ => Err(FbipError::UnknownFormat),
    }
}

fn looks_like_text(bytes: &[u8]) -> bool {
    bytes.first() == Some(&b'{')
        && bytes.last() == Some(&b'}')
        && serde_json::from_slice::<TextProbe>(bytes).is_ok()
}

fn is_zlib_header(bytes: &[u8]) -> bool {
    matches!(bytes, [ZLIB_CMF, flg, ..] if ZLIB_FLG.contains(flg))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compact::to_msgpack;
    use crate::compressed::deflate;
    use fbip_core::Event;
    use fbip_wire::{frame, PacketType};

    #[test]
    fn test_detect_framed() {
        let bytes = frame(PacketType::SingleEvent, PacketFlags::NONE, b"x").unwrap();
        assert_eq!(detect(&bytes), Ok(Format::Binary));

        let bytes = frame(
            PacketType::SingleEvent,
            PacketFlags::new(PacketFlags::COMPRESSED),
            b"x",
        )
        .unwrap();
        assert_eq!(detect(&bytes), Ok(Format::Compressed));

        // Magic alone is enough to pick the framed family
        assert_eq!(detect(b"FBIP"), Ok(Format::Binary));
    }

    #[test]
    fn test_detect_text() {
        let text = br#"{"protocol_version":"FBIP_v2.0","format":"text","event":{}}"#;
        assert_eq!(detect(text), Ok(Format::Text));

        // JSON without the wrapper keys is not text
        assert_eq!(detect(br#"{"hello":"world"}"#), Err(FbipError::UnknownFormat));
    }

    #[test]
    fn test_detect_zlib() {
        for level in [1, 3, 6, 9] {
            let stream = deflate(b"some payload worth compressing", level).unwrap();
            assert_eq!(detect(&stream), Ok(Format::Compressed), "level {}", level);
        }
    }

    #[test]
    fn test_detect_raw() {
        let bytes = to_msgpack(&Event::builder("r").build()).unwrap();
        assert_eq!(detect(&bytes), Ok(Format::Raw));
    }

    #[test]
    fn test_detect_unknown() {
        assert_eq!(detect(b""), Err(FbipError::UnknownFormat));
        assert_eq!(detect(b"GET / HTTP/1.1"), Err(FbipError::UnknownFormat));
        assert_eq!(detect(&[0x78, 0x00]), Err(FbipError::UnknownFormat));
    }
}
