//! Complete packet structure for FBIP wire protocol
//!
//! Packet = Fixed Header + Payload. The header checksum covers the payload
//! bytes only.

use bytes::BufMut;
use fbip_core::{FbipError, FbipResult, MAX_PACKET_SIZE};

use crate::{PacketFlags, PacketHeader, PacketType, HEADER_SIZE};

/// CRC-32 (IEEE) of a payload
#[inline]
pub fn checksum(payload: &[u8]) -> u32 {
    crc32fast::hash(payload)
}

/// Frame a payload into a complete packet
pub fn frame(packet_type: PacketType, flags: PacketFlags, payload: &[u8]) -> FbipResult<Vec<u8>> {
    let total_size = HEADER_SIZE + payload.len();
    if total_size > MAX_PACKET_SIZE {
        return Err(FbipError::PacketTooLarge {
            size: total_size,
            max: MAX_PACKET_SIZE,
        });
    }

    let header = PacketHeader::for_payload(packet_type, flags, payload);

    let mut buf = Vec::with_capacity(total_size);
    header.serialize(&mut buf);
    buf.put_slice(payload);
    Ok(buf)
}

/// Verify and split a packet (zero-copy)
///
/// Trailing bytes past `data_length` are ignored.
pub fn unframe(buf: &[u8]) -> FbipResult<Packet<'_>> {
    let header = PacketHeader::parse(buf)?;

    let data_length = header.data_length as usize;
    let total_size = HEADER_SIZE.saturating_add(data_length);
    if total_size > MAX_PACKET_SIZE {
        return Err(FbipError::PacketTooLarge {
            size: total_size,
            max: MAX_PACKET_SIZE,
        });
    }
    if total_size > buf.len() {
        return Err(FbipError::TruncatedPacket {
            expected: total_size,
            actual: buf.len(),
        });
    }

    let payload = &buf[HEADER_SIZE..total_size];
    let actual = checksum(payload);
    if actual != header.checksum {
        return Err(FbipError::ChecksumMismatch {
            expected: header.checksum,
            actual,
        });
    }

    Ok(Packet { header, payload })
}

/// Verified packet borrowing its payload from the input buffer
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Packet<'a> {
    pub header: PacketHeader,
    pub payload: &'a [u8],
}

impl<'a> Packet<'a> {
    #[inline]
    pub fn packet_type(&self) -> PacketType {
        self.header.packet_type
    }

    #[inline]
    pub fn flags(&self) -> PacketFlags {
        self.header.flags
    }

    /// Fail unless this packet has the expected type
    pub fn expect_type(&self, expected: PacketType) -> FbipResult<()> {
        if self.header.packet_type == expected {
            Ok(())
        } else {
            Err(FbipError::UnexpectedPacketType {
                expected: expected.to_byte(),
                actual: self.header.packet_type.to_byte(),
            })
        }
    }

    /// Size on the wire
    pub fn size(&self) -> usize {
        HEADER_SIZE + self.payload.len()
    }
}
