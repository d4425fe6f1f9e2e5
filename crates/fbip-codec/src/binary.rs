//! Compact-binary codec: MessagePack compact map in a `SingleEvent` packet

use fbip_core::{Event, FbipResult};
use fbip_wire::{frame, unframe, Packet, PacketFlags, PacketType};

use crate::compact::{from_msgpack, to_msgpack};
use crate::compressed::open_payload;
use crate::{Codec, Decoded, Encoded, Format};

/// Decode the event carried by a verified `SingleEvent` packet
///
/// Flagged payloads are inflated first.
pub fn decode_event_packet(packet: &Packet<'_>) -> FbipResult<Decoded> {
    packet.expect_type(PacketType::SingleEvent)?;
    let (payload, compression) = open_payload(packet)?;
    let (event, fallbacks) = from_msgpack(&payload)?;
    Ok(Decoded {
        event,
        fallbacks,
        compression,
    })
}

/// Compact-binary codec
#[derive(Clone, Copy, Debug, Default)]
pub struct BinaryCodec;

impl Codec for BinaryCodec {
    fn format(&self) -> Format {
        Format::Binary
    }

    fn encode(&self, event: &Event) -> FbipResult<Encoded> {
        let payload = to_msgpack(event)?;

        let mut flags = PacketFlags::NONE;
        flags.set_priority(event.priority().is_elevated());

        Ok(Encoded {
            bytes: frame(PacketType::SingleEvent, flags, &payload)?,
            compression: None,
        })
    }

    fn decode(&self, bytes: &[u8]) -> FbipResult<Decoded> {
        decode_event_packet(&unframe(bytes)?)
    }
}
