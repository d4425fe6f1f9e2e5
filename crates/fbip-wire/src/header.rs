//! Fixed header for FBIP wire protocol
//!
//! Fixed header is 16 bytes, all integers big-endian:
//! - Bytes 0-3: Magic (`FBIP`)
//! - Bytes 4-5: Version (`major << 8 | minor`)
//! - Byte 6: Packet type
//! - Byte 7: Flags
//! - Bytes 8-11: Payload length
//! - Bytes 12-15: CRC-32 of the payload

use bytes::{Buf, BufMut, BytesMut};
use fbip_core::{FbipError, FbipResult, MAX_PACKET_SIZE, PROTOCOL_MAGIC, PROTOCOL_VERSION};

use crate::PacketFlags;

/// Fixed header size in bytes
pub const HEADER_SIZE: usize = 16;

/// Largest payload that still fits in one packet
pub const MAX_PAYLOAD_SIZE: usize = MAX_PACKET_SIZE - HEADER_SIZE;

/// Packet type identifiers
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum PacketType {
    SingleEvent = 0,
    BatchEvents = 1,
    Heartbeat = 2,
    Ack = 3,
    Error = 4,
    QuantumState = 5,
    ConsciousnessMetrics = 6,
}

impl PacketType {
    pub fn from_byte(b: u8) -> Option<Self> {
        match b {
            0 => Some(PacketType::SingleEvent),
            1 => Some(PacketType::BatchEvents),
            2 => Some(PacketType::Heartbeat),
            3 => Some(PacketType::Ack),
            4 => Some(PacketType::Error),
            5 => Some(PacketType::QuantumState),
            6 => Some(PacketType::ConsciousnessMetrics),
            _ => None,
        }
    }

    #[inline]
    pub fn to_byte(self) -> u8 {
        self as u8
    }

    /// Strict conversion
    pub fn try_from_byte(b: u8) -> FbipResult<Self> {
        Self::from_byte(b).ok_or(FbipError::UnknownEnumValue {
            kind: "packet_type",
            value: b as i64,
        })
    }
}

/// Fixed header structure
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PacketHeader {
    /// Protocol version of the sender
    pub version: u16,
    /// Packet type
    pub packet_type: PacketType,
    /// Packet flags
    pub flags: PacketFlags,
    /// Payload length (after compression)
    pub data_length: u32,
    /// CRC-32 (IEEE) of the payload
    pub checksum: u32,
}

impl PacketHeader {
    /// Header for `payload` under the current protocol version
    pub fn for_payload(packet_type: PacketType, flags: PacketFlags, payload: &[u8]) -> Self {
        PacketHeader {
            version: PROTOCOL_VERSION,
            packet_type,
            flags,
            data_length: payload.len() as u32,
            checksum: crc32fast::hash(payload),
        }
    }

    /// Read the magic and flags byte without validating anything else
    pub fn peek_flags(buf: &[u8]) -> Option<PacketFlags> {
        if buf.len() >= HEADER_SIZE && buf[0..4] == PROTOCOL_MAGIC {
            Some(PacketFlags::new(buf[7]))
        } else {
            None
        }
    }

    /// Parse header from bytes
    ///
    /// Checks, in order: length, magic, version, packet type, reserved flags.
    pub fn parse(buf: &[u8]) -> FbipResult<Self> {
        if buf.len() < HEADER_SIZE {
            return Err(FbipError::TruncatedPacket {
                expected: HEADER_SIZE,
                actual: buf.len(),
            });
        }

        let mut cur = &buf[..HEADER_SIZE];

        // Bytes 0-3: Magic
        let mut magic = [0u8; 4];
        cur.copy_to_slice(&mut magic);
        if magic != PROTOCOL_MAGIC {
            return Err(FbipError::InvalidMagic(magic));
        }

        // Bytes 4-5: Version
        let version = cur.get_u16();
        if version > PROTOCOL_VERSION {
            return Err(FbipError::UnsupportedVersion {
                got: version,
                supported: PROTOCOL_VERSION,
            });
        }

        // Byte 6: Packet type
        let packet_type = PacketType::try_from_byte(cur.get_u8())?;

        // Byte 7: Flags
        let flags = PacketFlags::new(cur.get_u8());
        if flags.unsupported() != 0 {
            return Err(FbipError::UnsupportedFlags(flags.unsupported()));
        }

        // Bytes 8-15: Length and checksum
        let data_length = cur.get_u32();
        let checksum = cur.get_u32();

        Ok(PacketHeader {
            version,
            packet_type,
            flags,
            data_length,
            checksum,
        })
    }

    /// Append the serialized header to `buf`
    pub fn serialize(&self, buf: &mut impl BufMut) {
        buf.put_slice(&PROTOCOL_MAGIC);
        buf.put_u16(self.version);
        buf.put_u8(self.packet_type.to_byte());
        buf.put_u8(self.flags.bits());
        buf.put_u32(self.data_length);
        buf.put_u32(self.checksum);
    }

    /// Serialize header to a new buffer
    pub fn to_bytes(&self) -> BytesMut {
        let mut buf = BytesMut::with_capacity(HEADER_SIZE);
        self.serialize(&mut buf);
        buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> PacketHeader {
        PacketHeader {
            version: PROTOCOL_VERSION,
            packet_type: PacketType::BatchEvents,
            flags: PacketFlags(PacketFlags::COMPRESSED | PacketFlags::PRIORITY),
            data_length: 0x0102_0304,
            checksum: 0xDEAD_BEEF,
        }
    }

    #[test]
    fn test_header_roundtrip() {
        let header = sample();
        let bytes = header.to_bytes();
        assert_eq!(bytes.len(), HEADER_SIZE);

        let parsed = PacketHeader::parse(&bytes).unwrap();
        assert_eq!(parsed, header);
    }

    #[test]
    fn test_header_layout_is_big_endian() {
        let bytes = sample().to_bytes();
        assert_eq!(&bytes[0..4], b"FBIP");
        assert_eq!(&bytes[4..6], &[0x02, 0x00]);
        assert_eq!(bytes[6], 1);
        assert_eq!(bytes[7], 0x05);
        assert_eq!(&bytes[8..12], &[0x01, 0x02, 0x03, 0x04]);
        assert_eq!(&bytes[12..16], &[0xDE, 0xAD, 0xBE, 0xEF]);
    }

    #[test]
    fn test_header_too_short() {
        let buf = [0u8; 10];
        let result = PacketHeader::parse(&buf);
        assert!(matches!(
            result,
            Err(FbipError::TruncatedPacket { expected: 16, actual: 10 })
        ));
    }

    #[test]
    fn test_header_bad_magic() {
        let mut bytes = sample().to_bytes();
        bytes[0] = b'X';
        assert_eq!(
            PacketHeader::parse(&bytes),
            Err(FbipError::InvalidMagic(*b"XBIP"))
        );
    }

    #[test]
    fn test_header_newer_version_rejected() {
        let mut header = sample();
        header.version = 0x0300;
        assert!(matches!(
            PacketHeader::parse(&header.to_bytes()),
            Err(FbipError::UnsupportedVersion { got: 0x0300, .. })
        ));

        // Older versions are accepted
        header.version = 0x0100;
        assert!(PacketHeader::parse(&header.to_bytes()).is_ok());
    }

    #[test]
    fn test_header_unknown_packet_type() {
        let mut bytes = sample().to_bytes();
        bytes[6] = 42;
        assert_eq!(
            PacketHeader::parse(&bytes),
            Err(FbipError::UnknownEnumValue {
                kind: "packet_type",
                value: 42
            })
        );
    }

    #[test]
    fn test_header_reserved_flags_rejected() {
        let mut bytes = sample().to_bytes();
        bytes[7] = PacketFlags::FRAGMENTED;
        assert_eq!(
            PacketHeader::parse(&bytes),
            Err(FbipError::UnsupportedFlags(PacketFlags::FRAGMENTED))
        );
    }

    #[test]
    fn test_peek_flags() {
        let bytes = sample().to_bytes();
        assert!(PacketHeader::peek_flags(&bytes).unwrap().is_compressed());
        assert!(PacketHeader::peek_flags(b"FBIP").is_none());
        assert!(PacketHeader::peek_flags(&[0u8; 16]).is_none());
    }

    #[test]
    fn test_packet_type_bytes() {
        for b in 0..=6u8 {
            assert_eq!(PacketType::from_byte(b).map(PacketType::to_byte), Some(b));
        }
        assert!(PacketType::from_byte(7).is_none());
    }
}
