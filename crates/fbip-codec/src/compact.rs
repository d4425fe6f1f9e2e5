//! Compact event map
//!
//! The short-key map every format carries. Required keys are always written;
//! optional ones only when set. Enum fields travel as plain integers so an
//! unknown value from a newer peer still decodes (to the default variant).
//!
//! Float arrays (`qs.a`, `qs.p`, `mp`) are generic over their representation:
//! [`F32Blob`] packs them as little-endian f32 bytes for the binary family,
//! `Vec<f32>` keeps them as numeric arrays for text.

use std::collections::BTreeMap;
use std::fmt;

use fbip_core::{
    ActionType, ConsciousnessMetrics, Event, FbipError, FbipResult, Network, Priority,
    QuantumState, SignalType, ValueMap, WireEnum, PROTOCOL_VERSION,
};
use serde::de::{self, Deserializer, SeqAccess, Visitor};
use serde::{Deserialize, Serialize, Serializer};
use tracing::warn;

/// In-memory shape of a float array on the wire
pub trait FloatArray: Sized {
    fn from_slice(values: &[f32]) -> Self;
    fn into_vec(self) -> Vec<f32>;
}

impl FloatArray for Vec<f32> {
    fn from_slice(values: &[f32]) -> Self {
        values.to_vec()
    }

    fn into_vec(self) -> Vec<f32> {
        self
    }
}

/// f32 array carried as a byte string of little-endian floats
#[derive(Clone, Debug, Default, PartialEq)]
pub struct F32Blob(pub Vec<f32>);

impl FloatArray for F32Blob {
    fn from_slice(values: &[f32]) -> Self {
        F32Blob(values.to_vec())
    }

    fn into_vec(self) -> Vec<f32> {
        self.0
    }
}

impl Serialize for F32Blob {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let bytes: Vec<u8> = self.0.iter().flat_map(|v| v.to_le_bytes()).collect();
        serializer.serialize_bytes(&bytes)
    }
}

struct F32BlobVisitor;

impl<'de> Visitor<'de> for F32BlobVisitor {
    type Value = F32Blob;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a byte string of little-endian f32 values")
    }

    fn visit_bytes<E: de::Error>(self, bytes: &[u8]) -> Result<F32Blob, E> {
        if bytes.len() % 4 != 0 {
            return Err(E::invalid_length(bytes.len(), &"a multiple of 4 bytes"));
        }
        Ok(F32Blob(
            bytes
                .chunks_exact(4)
                .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
                .collect(),
        ))
    }

    // Peers that send a plain numeric array are accepted too
    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<F32Blob, A::Error> {
        let mut values = Vec::with_capacity(seq.size_hint().unwrap_or(0).min(4096));
        while let Some(v) = seq.next_element::<f32>()? {
            values.push(v);
        }
        Ok(F32Blob(values))
    }
}

impl<'de> Deserialize<'de> for F32Blob {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<F32Blob, D::Error> {
        deserializer.deserialize_bytes(F32BlobVisitor)
    }
}

fn current_version() -> u16 {
    PROTOCOL_VERSION
}

fn default_basis() -> String {
    "computational".to_string()
}

fn is_false(b: &bool) -> bool {
    !*b
}

/// Compact quantum state (`qs`)
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CompactQuantum<A> {
    pub a: A,
    pub p: A,
    pub c: f64,
    #[serde(default)]
    pub e: Vec<String>,
    #[serde(default = "default_basis")]
    pub m: String,
}

impl<A: FloatArray> CompactQuantum<A> {
    pub fn from_state(state: &QuantumState) -> Self {
        CompactQuantum {
            a: A::from_slice(state.amplitudes()),
            p: A::from_slice(state.phases()),
            c: state.coherence_time(),
            e: state.entanglements().to_vec(),
            m: state.measurement_basis().to_string(),
        }
    }

    pub fn into_state(self) -> FbipResult<QuantumState> {
        QuantumState::new(self.a.into_vec(), self.p.into_vec(), self.c, self.e, self.m)
            .map_err(|e| FbipError::malformed(format!("quantum state: {}", e)))
    }
}

/// Compact consciousness metrics (`cm`)
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CompactMetrics {
    pub cl: f64,
    pub ec: f64,
    #[serde(default)]
    pub na: BTreeMap<u8, f64>,
    pub fc: f64,
    pub ms: String,
}

impl CompactMetrics {
    pub fn from_metrics(metrics: &ConsciousnessMetrics) -> Self {
        CompactMetrics {
            cl: metrics.consciousness_level(),
            ec: metrics.energy_cost(),
            na: metrics.network_allocation().clone(),
            fc: metrics.field_coherence(),
            ms: metrics.metabolic_state().to_string(),
        }
    }

    pub fn into_metrics(self) -> ConsciousnessMetrics {
        ConsciousnessMetrics::new(self.cl, self.ec, self.na, self.fc, self.ms)
    }
}

/// Compact event map
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CompactEvent<A> {
    pub id: String,
    pub ts: f64,
    #[serde(default = "current_version")]
    pub v: u16,
    pub st: i64,
    pub i: f64,
    pub d: u64,
    pub at: i64,
    pub tn: i64,
    pub nodes: Vec<String>,
    pub params: ValueMap,
    pub p: i64,
    pub eb: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub f: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qs: Option<CompactQuantum<A>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sc: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub es: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cm: Option<CompactMetrics>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sdc: Option<Vec<u8>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mp: Option<A>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub rc: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uc: Option<ValueMap>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sx: Option<ValueMap>,
}

/// Resolve a wire integer, counting a fallback when it is unknown
fn resolve<E: WireEnum + fmt::Debug>(raw: i64, fallbacks: &mut u32) -> E {
    let (value, fell_back) = E::from_wire_or_default(raw);
    if fell_back {
        *fallbacks += 1;
        warn!("Unknown {} value {} on the wire, using {:?}", E::KIND, raw, value);
    }
    value
}

impl<A: FloatArray> CompactEvent<A> {
    pub fn from_event(event: &Event) -> Self {
        CompactEvent {
            id: event.id().to_string(),
            ts: event.timestamp(),
            v: event.version(),
            st: event.signal_type().to_wire(),
            i: event.intensity(),
            d: event.duration_ms(),
            at: event.action_type().to_wire(),
            tn: event.target_network().to_wire(),
            nodes: event.target_nodes().to_vec(),
            params: event.action_parameters().clone(),
            p: event.priority().to_wire(),
            eb: event.energy_budget(),
            f: event.frequency_hz(),
            qs: event.quantum_state().map(CompactQuantum::from_state),
            sc: event.superposition_count(),
            es: event.entanglement_strength(),
            cm: event.consciousness_metrics().map(CompactMetrics::from_metrics),
            sdc: event.sdc_chip_targets().map(<[u8]>::to_vec),
            mp: event.memristor_pattern().map(A::from_slice),
            rc: event.requires_confirmation(),
            uc: event.user_context().cloned(),
            sx: event.session_context().cloned(),
        }
    }

    /// Rebuild the event; the count is the number of enum fallbacks applied
    pub fn into_event(self) -> FbipResult<(Event, u32)> {
        if self.v > PROTOCOL_VERSION {
            return Err(FbipError::UnsupportedVersion {
                got: self.v,
                supported: PROTOCOL_VERSION,
            });
        }

        let mut fallbacks = 0;
        let signal: SignalType = resolve(self.st, &mut fallbacks);
        let action: ActionType = resolve(self.at, &mut fallbacks);
        let network: Network = resolve(self.tn, &mut fallbacks);
        let priority: Priority = resolve(self.p, &mut fallbacks);

        let quantum_state = self.qs.map(CompactQuantum::into_state).transpose()?;

        let event = Event::builder(self.id)
            .timestamp(self.ts)
            .version(self.v)
            .signal(signal)
            .intensity(self.i)
            .duration_ms(self.d)
            .frequency_hz(self.f)
            .quantum_state(quantum_state)
            .superposition_count(self.sc)
            .entanglement_strength(self.es)
            .consciousness_metrics(self.cm.map(CompactMetrics::into_metrics))
            .action(action)
            .network(network)
            .target_nodes(self.nodes)
            .parameters(self.params)
            .sdc_chip_targets(self.sdc)
            .memristor_pattern(self.mp.map(A::into_vec))
            .user_context(self.uc)
            .session_context(self.sx)
            .priority(priority)
            .requires_confirmation(self.rc)
            .energy_budget(self.eb)
            .build();

        Ok((event, fallbacks))
    }
}

/// Binary-family compact map
pub type BinaryEvent = CompactEvent<F32Blob>;

/// Encode an event as a MessagePack compact map
pub fn to_msgpack(event: &Event) -> FbipResult<Vec<u8>> {
    rmp_serde::to_vec_named(&BinaryEvent::from_event(event))
        .map_err(|e| FbipError::malformed(format!("messagepack encode: {}", e)))
}

/// Decode a MessagePack compact map
pub fn from_msgpack(bytes: &[u8]) -> FbipResult<(Event, u32)> {
    let compact: BinaryEvent = rmp_serde::from_slice(bytes)
        .map_err(|e| FbipError::malformed(format!("messagepack decode: {}", e)))?;
    compact.into_event()
}

#[cfg(test)]
mod tests {
    use super::*;
    use fbip_core::{SessionId, Value};
    use rmp_serde::decode::from_slice;

    fn rich_event() -> Event {
        let mut allocation = BTreeMap::new();
        allocation.insert(0, 0.5);
        allocation.insert(1, 0.3);

        let mut session = ValueMap::new();
        session.insert("session_id".into(), SessionId::new("s1").as_str().into());
        session.insert("sequence".into(), Value::Int(3));

        Event::builder("fbip_00000003_abcd")
            .timestamp(1_700_000_000.25)
            .signal(SignalType::EntanglementEvent)
            .intensity(0.75)
            .duration_ms(250)
            .frequency_hz(Some(40.0))
            .quantum_state(Some(
                QuantumState::new(
                    vec![0.6, 0.8],
                    vec![0.0, 1.5],
                    2.0,
                    vec!["n2".into()],
                    "consciousness",
                )
                .unwrap(),
            ))
            .superposition_count(Some(2))
            .entanglement_strength(Some(0.9))
            .consciousness_metrics(Some(ConsciousnessMetrics::new(
                0.9, 4.7, allocation, 0.8, "healthy",
            )))
            .action(ActionType::EntangleNodes)
            .network(Network::Integration)
            .target_nodes(vec!["n1".into(), "n2".into()])
            .parameter("gate", "cnot")
            .sdc_chip_targets(Some(vec![0, 1]))
            .memristor_pattern(Some(vec![0.25, -1.5, 3.0]))
            .session_context(Some(session))
            .priority(Priority::CRITICAL)
            .requires_confirmation(true)
            .energy_budget(12.5)
            .build()
    }

    #[test]
    fn test_msgpack_roundtrip_full_event() {
        let event = rich_event();
        let bytes = to_msgpack(&event).unwrap();
        let (back, fallbacks) = from_msgpack(&bytes).unwrap();
        assert_eq!(fallbacks, 0);
        assert!(back.approx_eq(&event, 1e-6), "{:?}\n{:?}", back, event);
    }

    #[test]
    fn test_optional_fields_omitted() {
        let event = Event::builder("bare").build();
        let bytes = to_msgpack(&event).unwrap();
        let map: ValueMap = from_slice(&bytes).unwrap();

        let keys: Vec<&str> = map.keys().map(String::as_str).collect();
        assert_eq!(
            keys,
            vec!["at", "d", "eb", "i", "id", "nodes", "p", "params", "st", "tn", "ts", "v"]
        );
    }

    #[test]
    fn test_float_arrays_are_byte_strings() {
        let blob = F32Blob(vec![1.0, -2.0]);
        let bytes = rmp_serde::to_vec(&blob).unwrap();
        // bin8 marker, 8 bytes of payload
        assert_eq!(bytes[0], 0xc4);
        assert_eq!(bytes[1], 8);
        assert_eq!(&bytes[2..6], &1.0f32.to_le_bytes());

        let back: F32Blob = from_slice(&bytes).unwrap();
        assert_eq!(back, blob);
    }

    #[test]
    fn test_blob_rejects_ragged_length() {
        // bin8 holding 3 bytes
        let bytes = [0xc4, 3, 1, 2, 3];
        assert!(from_slice::<F32Blob>(&bytes).is_err());

        // Numeric arrays are accepted
        let bytes = rmp_serde::to_vec(&vec![0.5f32, 1.0]).unwrap();
        assert_eq!(from_slice::<F32Blob>(&bytes).unwrap(), F32Blob(vec![0.5, 1.0]));
    }

    #[test]
    fn test_unknown_enum_values_fall_back() {
        let mut compact = BinaryEvent::from_event(&rich_event());
        compact.st = 9999;
        compact.p = 42;

        let (event, fallbacks) = compact.into_event().unwrap();
        assert_eq!(fallbacks, 2);
        assert_eq!(event.signal_type(), SignalType::AlphaPeak);
        assert_eq!(event.priority(), Priority::NORMAL);
        assert_eq!(event.action_type(), ActionType::EntangleNodes);
    }

    #[test]
    fn test_newer_event_version_rejected() {
        let mut compact = BinaryEvent::from_event(&rich_event());
        compact.v = 0x0900;
        assert!(matches!(
            compact.into_event(),
            Err(FbipError::UnsupportedVersion {
                got: 0x0900,
                supported: PROTOCOL_VERSION
            })
        ));

        // Older peers still decode
        let mut compact = BinaryEvent::from_event(&rich_event());
        compact.v = 0x0100;
        let (event, _) = compact.into_event().unwrap();
        assert_eq!(event.version(), 0x0100);
    }

    #[test]
    fn test_mismatched_quantum_arrays_rejected() {
        let mut compact = BinaryEvent::from_event(&rich_event());
        if let Some(qs) = compact.qs.as_mut() {
            qs.p = F32Blob(vec![0.0]);
        }
        assert!(matches!(
            compact.into_event(),
            Err(FbipError::MalformedPayload(_))
        ));
    }

    #[test]
    fn test_missing_required_key_is_malformed() {
        let mut map = ValueMap::new();
        map.insert("id".into(), "x".into());
        let bytes = rmp_serde::to_vec_named(&map).unwrap();
        assert!(matches!(
            from_msgpack(&bytes),
            Err(FbipError::MalformedPayload(_))
        ));
    }
}
