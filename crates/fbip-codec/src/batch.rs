//! Batch encoding
//!
//! Several events in one `BatchEvents` packet:
//! `{type: "batch", count: N, events: [compact map, ...]}` as MessagePack,
//! optionally compressed, under a single header and checksum.
//!
//! The envelope costs about 27 bytes against 16 for each header it saves,
//! so an uncompressed batch beats individual compact-binary packets from
//! three events on; with compression large batches win earlier.

use fbip_core::{Event, FbipError, FbipResult};
use fbip_wire::{frame, unframe, Packet, PacketFlags, PacketType};
use serde::{Deserialize, Serialize};

use crate::compact::BinaryEvent;
use crate::compressed::{open_payload, CompressionSettings};
use crate::{CompressionInfo, Encoded};

/// Value of the envelope's `type` key
pub const BATCH_TYPE_TAG: &str = "batch";

#[derive(Serialize, Deserialize)]
struct BatchEnvelope {
    #[serde(rename = "type")]
    kind: String,
    count: u32,
    events: Vec<BinaryEvent>,
}

/// Events recovered from a batch packet, in order
#[derive(Clone, Debug)]
pub struct DecodedBatch {
    pub events: Vec<Event>,
    /// Enum fallbacks applied across all events
    pub fallbacks: u32,
    /// Set when the payload was inflated
    pub compression: Option<CompressionInfo>,
}

/// Packs events into one framed packet
#[derive(Clone, Copy, Debug, Default)]
pub struct BatchEncoder {
    compression: Option<CompressionSettings>,
}

impl BatchEncoder {
    pub fn new(compression: Option<CompressionSettings>) -> Self {
        BatchEncoder { compression }
    }

    pub fn compression(&self) -> Option<CompressionSettings> {
        self.compression
    }

    pub fn encode_batch(&self, events: &[Event]) -> FbipResult<Encoded> {
        let envelope = BatchEnvelope {
            kind: BATCH_TYPE_TAG.to_string(),
            count: events.len() as u32,
            events: events.iter().map(BinaryEvent::from_event).collect(),
        };
        let raw = rmp_serde::to_vec_named(&envelope)
            .map_err(|e| FbipError::malformed(format!("batch encode: {}", e)))?;

        let (payload, compression) = match &self.compression {
            Some(settings) => settings.apply(raw)?,
            None => (raw, None),
        };

        let mut flags = PacketFlags::NONE;
        flags.set_compressed(compression.is_some());
        flags.set_priority(events.iter().any(|e| e.priority().is_elevated()));

        let bytes = frame(PacketType::BatchEvents, flags, &payload)?;
        Ok(Encoded { bytes, compression })
    }

    /// Decode a batch; any bad event fails the whole batch
    pub fn decode_batch(&self, bytes: &[u8]) -> FbipResult<DecodedBatch> {
        decode_batch_packet(&unframe(bytes)?)
    }
}

/// Decode the events carried by a verified `BatchEvents` packet
pub fn decode_batch_packet(packet: &Packet<'_>) -> FbipResult<DecodedBatch> {
    packet.expect_type(PacketType::BatchEvents)?;
    let (payload, compression) = open_payload(packet)?;

    let envelope: BatchEnvelope = rmp_serde::from_slice(&payload)
        .map_err(|e| FbipError::malformed(format!("batch decode: {}", e)))?;

    if envelope.kind != BATCH_TYPE_TAG {
        return Err(FbipError::malformed(format!(
            "batch envelope type {:?}",
            envelope.kind
        )));
    }
    if envelope.count as usize != envelope.events.len() {
        return Err(FbipError::malformed(format!(
            "batch count {} but {} events",
            envelope.count,
            envelope.events.len()
        )));
    }

    let mut fallbacks = 0;
    let events = envelope
        .events
        .into_iter()
        .map(|compact| {
            compact.into_event().map(|(event, n)| {
                fallbacks += n;
                event
            })
        })
        .collect::<FbipResult<Vec<_>>>()?;

    Ok(DecodedBatch {
        events,
        fallbacks,
        compression,
    })
}
