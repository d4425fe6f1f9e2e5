//! Event fixtures
//!
//! Deterministic events for tests and benches. Generated arrays come from
//! a seeded RNG so every run sees the same bytes.

use fbip_codec::compact::BinaryEvent;
use fbip_core::{
    ActionType, ConsciousnessMetrics, Event, EventFactory, FbipError, FbipResult, NamedEnum,
    Network, Priority, SessionId, SignalType, Value, ValueMap,
};
use fbip_wire::{frame, PacketFlags, PacketType};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Session id used by every fixture
pub const FIXTURE_SESSION: &str = "00112233445566778899aabbccddeeff";

/// Build a value map from literal pairs
pub fn value_map<const N: usize>(entries: [(&str, Value); N]) -> ValueMap {
    entries
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
}

/// Signal input for the gamma-sync scenario
pub fn gamma_sync_signal() -> ValueMap {
    value_map([
        ("signal", "gamma_sync".into()),
        ("intensity", 0.8.into()),
        ("duration_ms", Value::Int(400)),
        ("frequency_hz", 40.0.into()),
    ])
}

/// Action input for the gamma-sync scenario
pub fn gamma_sync_action() -> ValueMap {
    value_map([
        ("action_type", "create_superposition".into()),
        ("target_network", "executive".into()),
        ("target_nodes", vec!["n1"].into()),
        ("priority", Value::Int(8)),
        ("enable_hardware", true.into()),
        ("parameters", value_map([("mode", "sync".into())]).into()),
    ])
}

/// The gamma-sync event, built from a seeded RNG
pub fn gamma_sync_event(sequence: u32) -> Event {
    EventFactory::new(SessionId::new(FIXTURE_SESSION)).create_with_rng(
        &mut StdRng::seed_from_u64(u64::from(sequence)),
        sequence,
        &gamma_sync_signal(),
        &gamma_sync_action(),
        None,
    )
}

/// `n` varied events cycling through signals, actions and networks
pub fn sample_events(n: usize, seed: u64) -> Vec<Event> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n)
        .map(|i| {
            let signal = SignalType::ALL[i % SignalType::ALL.len()];
            let action = ActionType::ALL[i % ActionType::ALL.len()];
            let network = Network::ALL[i % Network::ALL.len()];
            let mut builder = Event::builder(format!("fbip_{:08x}_{:04x}", i, seed & 0xFFFF))
                .timestamp(1_700_000_000.0 + i as f64)
                .signal(signal)
                .intensity(rng.gen())
                .duration_ms(rng.gen_range(50..2000))
                .action(action)
                .network(network)
                .target_nodes(vec![format!("node_{}", i % 7)])
                .parameter("step", Value::Int(i as i64))
                .priority(Priority::clamped(rng.gen_range(1..=10)));
            if i % 3 == 0 {
                builder = builder.frequency_hz(Some(rng.gen_range(1.0..100.0)));
            }
            if i % 5 == 0 {
                builder = builder.memristor_pattern(Some(
                    (0..16).map(|_| rng.gen_range(-1.0f32..1.0)).collect(),
                ));
            }
            builder.build()
        })
        .collect()
}

/// An event big enough to cross the default compression threshold
pub fn large_event() -> Event {
    let mut allocation = std::collections::BTreeMap::new();
    allocation.insert(Network::Memory.to_byte(), 0.25);
    allocation.insert(Network::Integration.to_byte(), 0.75);
    Event::builder("fbip_large_0000")
        .signal(SignalType::FieldResonance)
        .parameter("notes", Value::Text("resonance ".repeat(200)))
        .consciousness_metrics(Some(ConsciousnessMetrics::new(
            0.6, 12.0, allocation, 0.4, "active",
        )))
        .memristor_pattern(Some(vec![0.5; 64]))
        .build()
}

/// Raw compact bytes for `event` with its signal integer replaced
pub fn raw_with_signal(event: &Event, st: i64) -> FbipResult<Vec<u8>> {
    let mut compact = BinaryEvent::from_event(event);
    compact.st = st;
    rmp_serde::to_vec_named(&compact).map_err(|e| FbipError::malformed(e.to_string()))
}

/// Framed single-event packet for `event` with its signal integer replaced
pub fn framed_with_signal(event: &Event, st: i64) -> FbipResult<Vec<u8>> {
    frame(
        PacketType::SingleEvent,
        PacketFlags::NONE,
        &raw_with_signal(event, st)?,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixtures_are_deterministic() {
        // Id and timestamp follow the clock; generated arrays follow the seed
        let (a, b) = (gamma_sync_event(3), gamma_sync_event(3));
        assert_eq!(a.quantum_state(), b.quantum_state());
        assert_eq!(a.memristor_pattern(), b.memristor_pattern());

        assert_eq!(sample_events(10, 1), sample_events(10, 1));
        assert_ne!(sample_events(10, 1), sample_events(10, 2));
    }

    #[test]
    fn test_gamma_sync_shape() {
        let event = gamma_sync_event(42);
        assert!(event.id().starts_with("fbip_0000002a_"));
        assert_eq!(event.signal_type(), SignalType::GammaSync);
        assert_eq!(event.priority(), Priority::HIGH);
        assert!(event.quantum_state().is_some());
        assert_eq!(event.memristor_pattern().map(|p| p.len()), Some(64));
        assert_eq!(
            event.action_parameters().get("mode"),
            Some(&Value::from("sync"))
        );
    }

    #[test]
    fn test_large_event_crosses_threshold() {
        let bytes = fbip_codec::compact::to_msgpack(&large_event()).unwrap();
        assert!(bytes.len() > fbip_core::DEFAULT_COMPRESSION_THRESHOLD);
    }
}
