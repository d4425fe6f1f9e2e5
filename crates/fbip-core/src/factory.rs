//! Event factory
//!
//! Turns semi-structured signal/action/context maps into validated events.
//! Malformed input never fails: unknown names fall back to the default
//! variant, numbers are clamped, unknown context keys are dropped.
//!
//! Recognised keys:
//! - signal: `signal`, `intensity`, `duration_ms`, `frequency_hz`,
//!   `superposition_count`, `entanglement_strength`, `coherence_time`
//! - action: `action_type`, `target_network`, `target_nodes`, `parameters`,
//!   `priority`, `requires_confirmation`, `energy_budget`, `enable_hardware`

use std::collections::BTreeMap;
use std::f32::consts::TAU;

use rand::Rng;
use tracing::warn;

use crate::{
    event_id, unix_millis, unix_seconds, ActionType, ConsciousnessMetrics, Event, NamedEnum,
    Network, Priority, QuantumState, SessionId, SignalType, Value, ValueMap,
    DEFAULT_COHERENCE_TIME,
};

/// Largest generated quantum state
pub const MAX_QUANTUM_DIMENSION: usize = 8;

/// Quantum dimension when the signal does not name one
pub const DEFAULT_QUANTUM_DIMENSION: u32 = 3;

/// Length of a generated memristor pattern (8x8)
pub const MEMRISTOR_PATTERN_LEN: usize = 64;

fn number(map: &ValueMap, key: &str) -> Option<f64> {
    map.get(key).and_then(Value::as_f64)
}

fn integer(map: &ValueMap, key: &str) -> Option<i64> {
    map.get(key).and_then(Value::as_i64)
}

fn text<'a>(map: &'a ValueMap, key: &str) -> Option<&'a str> {
    map.get(key).and_then(Value::as_str)
}

fn flag(map: &ValueMap, key: &str) -> bool {
    map.get(key).and_then(Value::as_bool).unwrap_or(false)
}

fn parse_named<E: NamedEnum + std::fmt::Debug>(raw: Option<&str>) -> E {
    let Some(name) = raw else {
        return E::DEFAULT;
    };
    let (value, fell_back) = E::from_name_or_default(name);
    if fell_back {
        warn!("Unknown {}: {:?}, using {:?}", E::KIND, name, value);
    }
    value
}

/// Builds events for one session
#[derive(Clone, Debug)]
pub struct EventFactory {
    session_id: SessionId,
}

impl EventFactory {
    pub fn new(session_id: SessionId) -> Self {
        EventFactory { session_id }
    }

    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    /// Create an event using the thread-local RNG for generated arrays
    pub fn create(
        &self,
        sequence: u32,
        signal_data: &ValueMap,
        action_data: &ValueMap,
        context: Option<&ValueMap>,
    ) -> Event {
        self.create_with_rng(
            &mut rand::thread_rng(),
            sequence,
            signal_data,
            action_data,
            context,
        )
    }

    /// Create an event drawing generated arrays from `rng`
    pub fn create_with_rng<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        sequence: u32,
        signal_data: &ValueMap,
        action_data: &ValueMap,
        context: Option<&ValueMap>,
    ) -> Event {
        let signal_type: SignalType = parse_named(text(signal_data, "signal"));
        let action_type: ActionType = parse_named(text(action_data, "action_type"));
        let target_network: Network = parse_named(text(action_data, "target_network"));

        let intensity = number(signal_data, "intensity").unwrap_or(0.5);
        let duration_ms = integer(signal_data, "duration_ms").unwrap_or(200).max(1) as u64;
        let superposition_count = integer(signal_data, "superposition_count")
            .map(|c| c.clamp(0, u32::MAX as i64) as u32);

        let quantum_state = if signal_type.is_quantum() {
            let coherence_time =
                number(signal_data, "coherence_time").unwrap_or(DEFAULT_COHERENCE_TIME);
            Some(generate_quantum_state(
                rng,
                superposition_count.unwrap_or(DEFAULT_QUANTUM_DIMENSION),
                coherence_time,
            ))
        } else {
            None
        };

        let metrics = derive_metrics(intensity, duration_ms);

        let (sdc_chip_targets, memristor_pattern) = if flag(action_data, "enable_hardware") {
            let (targets, pattern) = hardware_targeting(rng, target_network);
            (Some(targets), Some(pattern))
        } else {
            (None, None)
        };

        let target_nodes = action_data
            .get("target_nodes")
            .and_then(Value::as_list)
            .map(|nodes| {
                nodes
                    .iter()
                    .filter_map(|n| match n {
                        Value::Text(s) => Some(s.clone()),
                        Value::Int(i) => Some(i.to_string()),
                        _ => None,
                    })
                    .collect()
            })
            .unwrap_or_default();

        let parameters = action_data
            .get("parameters")
            .and_then(Value::as_map)
            .cloned()
            .unwrap_or_default();

        let priority = integer(action_data, "priority")
            .map(Priority::clamped)
            .unwrap_or_default();

        let mut session_context = ValueMap::new();
        session_context.insert("session_id".into(), self.session_id.as_str().into());
        session_context.insert("sequence".into(), Value::Int(sequence as i64));

        Event::builder(event_id(sequence, unix_millis()))
            .timestamp(unix_seconds())
            .signal(signal_type)
            .intensity(intensity)
            .duration_ms(duration_ms)
            .frequency_hz(number(signal_data, "frequency_hz"))
            .quantum_state(quantum_state)
            .superposition_count(superposition_count)
            .entanglement_strength(number(signal_data, "entanglement_strength"))
            .consciousness_metrics(Some(metrics))
            .action(action_type)
            .network(target_network)
            .target_nodes(target_nodes)
            .parameters(parameters)
            .sdc_chip_targets(sdc_chip_targets)
            .memristor_pattern(memristor_pattern)
            .user_context(context.cloned())
            .session_context(Some(session_context))
            .priority(priority)
            .requires_confirmation(flag(action_data, "requires_confirmation"))
            .energy_budget(number(action_data, "energy_budget").unwrap_or(0.0))
            .build()
    }
}

/// Random normalized amplitudes with uniform phases in [0, 2π)
fn generate_quantum_state<R: Rng + ?Sized>(
    rng: &mut R,
    requested: u32,
    coherence_time: f64,
) -> QuantumState {
    let size = (requested as usize).min(MAX_QUANTUM_DIMENSION);

    let mut amplitudes: Vec<f32> = (0..size).map(|_| rng.gen::<f32>()).collect();
    let norm = amplitudes.iter().map(|a| a * a).sum::<f32>().sqrt();
    if norm > f32::EPSILON {
        amplitudes.iter_mut().for_each(|a| *a /= norm);
    }
    let phases: Vec<f32> = (0..size).map(|_| rng.gen_range(0.0..TAU)).collect();

    QuantumState::from_parts(
        amplitudes,
        phases,
        coherence_time,
        Vec::new(),
        "consciousness".to_string(),
    )
}

fn derive_metrics(intensity: f64, duration_ms: u64) -> ConsciousnessMetrics {
    let intensity = if intensity.is_finite() {
        intensity.clamp(0.0, 1.0)
    } else {
        0.5
    };
    let energy_cost = intensity * 25.0 * (duration_ms as f64 / 1000.0);

    let allocation: BTreeMap<u8, f64> = [Network::Executive, Network::Memory, Network::Sensory]
        .into_iter()
        .map(|n| (n.to_byte(), n.energy_share()))
        .collect();

    ConsciousnessMetrics::new(
        (intensity * 1.2).min(1.0),
        energy_cost,
        allocation,
        0.8,
        "healthy",
    )
}

fn hardware_targeting<R: Rng + ?Sized>(rng: &mut R, network: Network) -> (Vec<u8>, Vec<f32>) {
    let targets = match network {
        Network::Executive => vec![0, 1],
        Network::Memory => vec![2, 3],
        _ => vec![0],
    };
    let pattern = (0..MEMRISTOR_PATTERN_LEN).map(|_| rng.gen::<f32>()).collect();
    (targets, pattern)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MIN_COHERENCE_TIME;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn map(entries: &[(&str, Value)]) -> ValueMap {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    fn factory() -> EventFactory {
        EventFactory::new(SessionId::new("session-under-test"))
    }

    #[test]
    fn test_gamma_sync_event() {
        let signal = map(&[
            ("signal", "gamma_sync".into()),
            ("intensity", 0.8.into()),
            ("duration_ms", 400.into()),
            ("frequency_hz", 40.0.into()),
        ]);
        let action = map(&[
            ("action_type", "create_superposition".into()),
            ("target_network", "executive".into()),
            ("target_nodes", vec!["n1"].into()),
            ("priority", 8.into()),
        ]);

        let event = factory().create(7, &signal, &action, None);

        assert!(event.id().starts_with("fbip_00000007_"));
        assert_eq!(event.signal_type(), SignalType::GammaSync);
        assert_eq!(event.intensity(), 0.8);
        assert_eq!(event.duration_ms(), 400);
        assert_eq!(event.frequency_hz(), Some(40.0));
        assert_eq!(event.action_type(), ActionType::CreateSuperposition);
        assert_eq!(event.target_network(), Network::Executive);
        assert_eq!(event.target_nodes(), &["n1".to_string()]);
        assert_eq!(event.priority(), Priority::HIGH);

        // Gamma sync is a quantum signal: default dimension 3
        let state = event.quantum_state().unwrap();
        assert_eq!(state.dimension(), 3);
        let norm: f32 = state.amplitudes().iter().map(|a| a * a).sum();
        assert!((norm - 1.0).abs() < 1e-4);
        assert!(state.phases().iter().all(|p| (0.0..TAU).contains(p)));
    }

    #[test]
    fn test_unknown_names_fall_back() {
        let signal = map(&[("signal", "brain_freeze".into())]);
        let action = map(&[
            ("action_type", "teleport".into()),
            ("target_network", "cerebellum".into()),
        ]);

        let event = factory().create(0, &signal, &action, None);
        assert_eq!(event.signal_type(), SignalType::AlphaPeak);
        assert_eq!(event.action_type(), ActionType::HighlightCluster);
        assert_eq!(event.target_network(), Network::Executive);
        assert!(event.quantum_state().is_none());
    }

    #[test]
    fn test_numeric_inputs_clamped() {
        let signal = map(&[
            ("signal", "beta_burst".into()),
            ("intensity", 4.2.into()),
            ("duration_ms", Value::Int(-50)),
            ("entanglement_strength", 7.into()),
        ]);
        let action = map(&[("priority", 42.into()), ("energy_budget", Value::Float(-3.0))]);

        let event = factory().create(1, &signal, &action, None);
        assert_eq!(event.intensity(), 1.0);
        assert_eq!(event.duration_ms(), 1);
        assert_eq!(event.entanglement_strength(), Some(1.0));
        assert_eq!(event.priority(), Priority::CRITICAL);
        assert_eq!(event.energy_budget(), 0.0);
    }

    #[test]
    fn test_derived_metrics() {
        let signal = map(&[
            ("signal", "alpha_peak".into()),
            ("intensity", 0.5.into()),
            ("duration_ms", 1000.into()),
        ]);
        let event = factory().create(2, &signal, &ValueMap::new(), None);
        let metrics = event.consciousness_metrics().unwrap();
        assert!((metrics.consciousness_level() - 0.6).abs() < 1e-12);
        assert!((metrics.energy_cost() - 12.5).abs() < 1e-12);
        assert_eq!(metrics.network_allocation().len(), 3);
        assert_eq!(metrics.metabolic_state(), "healthy");
    }

    #[test]
    fn test_hardware_targeting() {
        let mut rng = StdRng::seed_from_u64(42);
        let signal = map(&[("signal", "quantum_tunneling".into()), ("superposition_count", 20.into())]);
        let action = map(&[
            ("action_type", "quantum_gate".into()),
            ("target_network", "memory".into()),
            ("enable_hardware", true.into()),
        ]);

        let event = factory().create_with_rng(&mut rng, 3, &signal, &action, None);
        assert_eq!(event.sdc_chip_targets(), Some(&[2u8, 3][..]));
        assert_eq!(event.memristor_pattern().map(|p| p.len()), Some(MEMRISTOR_PATTERN_LEN));
        assert_eq!(event.quantum_state().unwrap().dimension(), MAX_QUANTUM_DIMENSION);
    }

    #[test]
    fn test_generated_quantum_state_edges() {
        let mut rng = StdRng::seed_from_u64(7);
        let signal = map(&[
            ("signal", "quantum_tunneling".into()),
            ("superposition_count", 0.into()),
            ("coherence_time", Value::Float(f64::NAN)),
        ]);
        let event = factory().create_with_rng(&mut rng, 4, &signal, &ValueMap::new(), None);
        let state = event.quantum_state().unwrap();
        assert_eq!(state.dimension(), 0);
        assert_eq!(state.coherence_time(), DEFAULT_COHERENCE_TIME);

        let signal = map(&[
            ("signal", "quantum_tunneling".into()),
            ("coherence_time", Value::Float(-1.0)),
        ]);
        let event = factory().create_with_rng(&mut rng, 5, &signal, &ValueMap::new(), None);
        let state = event.quantum_state().unwrap();
        assert_eq!(state.amplitudes().len(), state.phases().len());
        assert_eq!(state.coherence_time(), MIN_COHERENCE_TIME);
    }

    #[test]
    fn test_context_sanitized_and_session_context_attached() {
        let context = map(&[
            ("user_id", "performance_test".into()),
            ("emotional_state", "focused".into()),
            ("test_mode", true.into()),
        ]);
        let event = factory().create(9, &ValueMap::new(), &ValueMap::new(), Some(&context));

        let user = event.user_context().unwrap();
        assert_eq!(user.len(), 2);
        assert!(!user.contains_key("test_mode"));

        let session = event.session_context().unwrap();
        assert_eq!(session["session_id"].as_str(), Some("session-under-test"));
        assert_eq!(session["sequence"], Value::Int(9));
    }
}
