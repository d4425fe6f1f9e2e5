//! Control packets
//!
//! Bodies for the packet types that do not carry events. Each is a small
//! MessagePack map framed under its own packet type:
//! - Heartbeat `{sid, seq, ts}`
//! - Ack `{seq}`
//! - Error `{code, msg}`
//! - QuantumState: a compact `qs` map
//! - ConsciousnessMetrics: a compact `cm` map

use fbip_core::{ConsciousnessMetrics, FbipError, FbipResult, QuantumState};
use fbip_wire::{frame, unframe, Packet, PacketFlags, PacketType};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::compact::{CompactMetrics, CompactQuantum, F32Blob};
use crate::compressed::open_payload;

/// Liveness signal
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Heartbeat {
    #[serde(rename = "sid")]
    pub session_id: String,
    #[serde(rename = "seq")]
    pub sequence: u32,
    #[serde(rename = "ts")]
    pub timestamp: f64,
}

/// Acknowledges the packet sent under `sequence`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ack {
    #[serde(rename = "seq")]
    pub sequence: u32,
}

/// Error report sent back to a peer
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorReport {
    pub code: u16,
    #[serde(rename = "msg")]
    pub message: String,
}

impl ErrorReport {
    /// Report for a local failure; codes are stable per error kind
    pub fn from_error(err: &FbipError) -> Self {
        let code = match err {
            FbipError::Validation(_) => 1,
            FbipError::TruncatedPacket { .. } => 2,
            FbipError::ChecksumMismatch { .. } => 3,
            FbipError::InvalidMagic(_) => 4,
            FbipError::UnknownFormat => 5,
            FbipError::UnsupportedVersion { .. } => 6,
            FbipError::UnsupportedFlags(_) => 7,
            FbipError::UnexpectedPacketType { .. } => 8,
            FbipError::PacketTooLarge { .. } => 9,
            FbipError::DecompressionFailure(_) => 10,
            FbipError::MalformedPayload(_) => 11,
            FbipError::UnknownEnumValue { .. } => 12,
            FbipError::Config { .. } => 13,
        };
        ErrorReport {
            code,
            message: err.to_string(),
        }
    }
}

/// Any non-event packet body
#[derive(Clone, Debug, PartialEq)]
pub enum Control {
    Heartbeat(Heartbeat),
    Ack(Ack),
    Error(ErrorReport),
    QuantumState(QuantumState),
    Metrics(ConsciousnessMetrics),
}

fn pack<T: Serialize>(body: &T) -> FbipResult<Vec<u8>> {
    rmp_serde::to_vec_named(body)
        .map_err(|e| FbipError::malformed(format!("control encode: {}", e)))
}

fn unpack<T: DeserializeOwned>(payload: &[u8]) -> FbipResult<T> {
    rmp_serde::from_slice(payload)
        .map_err(|e| FbipError::malformed(format!("control decode: {}", e)))
}

impl Control {
    pub fn packet_type(&self) -> PacketType {
        match self {
            Control::Heartbeat(_) => PacketType::Heartbeat,
            Control::Ack(_) => PacketType::Ack,
            Control::Error(_) => PacketType::Error,
            Control::QuantumState(_) => PacketType::QuantumState,
            Control::Metrics(_) => PacketType::ConsciousnessMetrics,
        }
    }

    /// Serialize to a framed packet
    pub fn encode(&self) -> FbipResult<Vec<u8>> {
        let body = match self {
            Control::Heartbeat(hb) => pack(hb)?,
            Control::Ack(ack) => pack(ack)?,
            Control::Error(report) => pack(report)?,
            Control::QuantumState(state) => {
                pack(&CompactQuantum::<F32Blob>::from_state(state))?
            }
            Control::Metrics(metrics) => pack(&CompactMetrics::from_metrics(metrics))?,
        };
        frame(self.packet_type(), PacketFlags::NONE, &body)
    }

    /// Parse a framed control packet
    pub fn decode(bytes: &[u8]) -> FbipResult<Self> {
        Self::from_packet(&unframe(bytes)?)
    }

    /// Parse the body of a verified packet
    pub fn from_packet(packet: &Packet<'_>) -> FbipResult<Self> {
        let (payload, _) = open_payload(packet)?;
        match packet.packet_type() {
            PacketType::Heartbeat => unpack(&payload).map(Control::Heartbeat),
            PacketType::Ack => unpack(&payload).map(Control::Ack),
            PacketType::Error => unpack(&payload).map(Control::Error),
            PacketType::QuantumState => unpack::<CompactQuantum<F32Blob>>(&payload)?
                .into_state()
                .map(Control::QuantumState),
            PacketType::ConsciousnessMetrics => unpack::<CompactMetrics>(&payload)
                .map(|cm| Control::Metrics(cm.into_metrics())),
            other @ (PacketType::SingleEvent | PacketType::BatchEvents) => {
                Err(FbipError::UnexpectedPacketType {
                    expected: PacketType::Heartbeat.to_byte(),
                    actual: other.to_byte(),
                })
            }
        }
    }
}
