//! Event definitions
//!
//! An Event is one "signal → action" record, the unit of exchange. Events
//! are built once through `EventBuilder` (which clamps every numeric field
//! into its documented range), are immutable afterwards, and are compared
//! across the encode/decode boundary with `approx_eq`.

use std::collections::BTreeMap;

use crate::{
    finite_map, maps_approx_eq, ActionType, FbipError, FbipResult, Network, Priority, SignalType, Value,
    ValueMap, PROTOCOL_VERSION,
};

/// Keys retained in `user_context`
pub const USER_CONTEXT_KEYS: &[&str] = &["user_id", "session_id", "priority", "emotional_state"];

/// Keys retained in `session_context`
pub const SESSION_CONTEXT_KEYS: &[&str] = &["session_id", "sequence"];

/// Default coherence time in seconds
pub const DEFAULT_COHERENCE_TIME: f64 = 2.0;

/// Smallest coherence time kept after clamping
pub const MIN_COHERENCE_TIME: f64 = 1e-3;

/// Keep only allow-listed keys; an empty result becomes `None`
pub fn filter_context(context: &ValueMap, allowed: &[&str]) -> Option<ValueMap> {
    let filtered: ValueMap = context
        .iter()
        .filter(|(k, _)| allowed.contains(&k.as_str()))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    if filtered.is_empty() {
        None
    } else {
        Some(filtered)
    }
}

#[inline]
fn unit(x: f64) -> f64 {
    if x.is_finite() {
        x.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

#[inline]
fn non_negative(x: f64) -> f64 {
    if x.is_finite() {
        x.max(0.0)
    } else {
        0.0
    }
}

fn finite_or_zero(values: Vec<f32>) -> Vec<f32> {
    values
        .into_iter()
        .map(|x| if x.is_finite() { x } else { 0.0 })
        .collect()
}

#[inline]
fn floats_eq(a: f64, b: f64, eps: f64) -> bool {
    (a - b).abs() <= eps
}

fn f32s_eq(a: &[f32], b: &[f32], eps: f64) -> bool {
    a.len() == b.len()
        && a
            .iter()
            .zip(b)
            .all(|(x, y)| floats_eq(*x as f64, *y as f64, eps))
}

fn opt_eq<T>(a: &Option<T>, b: &Option<T>, eq: impl Fn(&T, &T) -> bool) -> bool {
    match (a, b) {
        (Some(x), Some(y)) => eq(x, y),
        (None, None) => true,
        _ => false,
    }
}

/// Quantum sub-record
#[derive(Clone, Debug, PartialEq)]
pub struct QuantumState {
    amplitudes: Vec<f32>,
    phases: Vec<f32>,
    coherence_time: f64,
    entanglements: Vec<String>,
    measurement_basis: String,
}

impl QuantumState {
    /// Amplitude and phase arrays must have equal length; non-finite
    /// entries become 0.0
    pub fn new(
        amplitudes: Vec<f32>,
        phases: Vec<f32>,
        coherence_time: f64,
        entanglements: Vec<String>,
        measurement_basis: impl Into<String>,
    ) -> FbipResult<Self> {
        if amplitudes.len() != phases.len() {
            return Err(FbipError::Validation(format!(
                "amplitudes ({}) and phases ({}) differ in length",
                amplitudes.len(),
                phases.len()
            )));
        }
        Ok(QuantumState::from_parts(
            amplitudes,
            phases,
            coherence_time,
            entanglements,
            measurement_basis.into(),
        ))
    }

    /// Caller guarantees equal-length arrays
    pub(crate) fn from_parts(
        amplitudes: Vec<f32>,
        phases: Vec<f32>,
        coherence_time: f64,
        entanglements: Vec<String>,
        measurement_basis: String,
    ) -> Self {
        let coherence_time = if coherence_time.is_finite() {
            coherence_time.max(MIN_COHERENCE_TIME)
        } else {
            DEFAULT_COHERENCE_TIME
        };
        QuantumState {
            amplitudes: finite_or_zero(amplitudes),
            phases: finite_or_zero(phases),
            coherence_time,
            entanglements,
            measurement_basis,
        }
    }

    pub fn amplitudes(&self) -> &[f32] {
        &self.amplitudes
    }

    pub fn phases(&self) -> &[f32] {
        &self.phases
    }

    pub fn coherence_time(&self) -> f64 {
        self.coherence_time
    }

    pub fn entanglements(&self) -> &[String] {
        &self.entanglements
    }

    pub fn measurement_basis(&self) -> &str {
        &self.measurement_basis
    }

    /// Number of basis states
    pub fn dimension(&self) -> usize {
        self.amplitudes.len()
    }

    pub fn approx_eq(&self, other: &QuantumState, eps: f64) -> bool {
        f32s_eq(&self.amplitudes, &other.amplitudes, eps)
            && f32s_eq(&self.phases, &other.phases, eps)
            && floats_eq(self.coherence_time, other.coherence_time, eps)
            && self.entanglements == other.entanglements
            && self.measurement_basis == other.measurement_basis
    }
}

/// Consciousness metrics sub-record
#[derive(Clone, Debug, PartialEq)]
pub struct ConsciousnessMetrics {
    consciousness_level: f64,
    energy_cost: f64,
    network_allocation: BTreeMap<u8, f64>,
    field_coherence: f64,
    metabolic_state: String,
}

impl ConsciousnessMetrics {
    /// Levels and fractions are clamped into [0, 1], cost to >= 0
    pub fn new(
        consciousness_level: f64,
        energy_cost: f64,
        network_allocation: BTreeMap<u8, f64>,
        field_coherence: f64,
        metabolic_state: impl Into<String>,
    ) -> Self {
        ConsciousnessMetrics {
            consciousness_level: unit(consciousness_level),
            energy_cost: non_negative(energy_cost),
            network_allocation: network_allocation
                .into_iter()
                .map(|(k, v)| (k, unit(v)))
                .collect(),
            field_coherence: unit(field_coherence),
            metabolic_state: metabolic_state.into(),
        }
    }

    pub fn consciousness_level(&self) -> f64 {
        self.consciousness_level
    }

    pub fn energy_cost(&self) -> f64 {
        self.energy_cost
    }

    pub fn network_allocation(&self) -> &BTreeMap<u8, f64> {
        &self.network_allocation
    }

    pub fn field_coherence(&self) -> f64 {
        self.field_coherence
    }

    pub fn metabolic_state(&self) -> &str {
        &self.metabolic_state
    }

    pub fn approx_eq(&self, other: &ConsciousnessMetrics, eps: f64) -> bool {
        floats_eq(self.consciousness_level, other.consciousness_level, eps)
            && floats_eq(self.energy_cost, other.energy_cost, eps)
            && self.network_allocation.len() == other.network_allocation.len()
            && self
                .network_allocation
                .iter()
                .zip(&other.network_allocation)
                .all(|((ka, va), (kb, vb))| ka == kb && floats_eq(*va, *vb, eps))
            && floats_eq(self.field_coherence, other.field_coherence, eps)
            && self.metabolic_state == other.metabolic_state
    }
}

/// FBIP event
#[derive(Clone, Debug, PartialEq)]
pub struct Event {
    id: String,
    timestamp: f64,
    version: u16,

    signal_type: SignalType,
    intensity: f64,
    duration_ms: u64,
    frequency_hz: Option<f64>,

    quantum_state: Option<QuantumState>,
    superposition_count: Option<u32>,
    entanglement_strength: Option<f64>,

    consciousness_metrics: Option<ConsciousnessMetrics>,

    action_type: ActionType,
    target_network: Network,
    target_nodes: Vec<String>,
    action_parameters: ValueMap,

    // Opaque hardware pass-through
    sdc_chip_targets: Option<Vec<u8>>,
    memristor_pattern: Option<Vec<f32>>,

    user_context: Option<ValueMap>,
    session_context: Option<ValueMap>,

    priority: Priority,
    requires_confirmation: bool,
    energy_budget: f64,
}

impl Event {
    /// Start building an event with the given id
    pub fn builder(id: impl Into<String>) -> EventBuilder {
        EventBuilder::new(id)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn timestamp(&self) -> f64 {
        self.timestamp
    }

    pub fn version(&self) -> u16 {
        self.version
    }

    pub fn signal_type(&self) -> SignalType {
        self.signal_type
    }

    pub fn intensity(&self) -> f64 {
        self.intensity
    }

    pub fn duration_ms(&self) -> u64 {
        self.duration_ms
    }

    pub fn frequency_hz(&self) -> Option<f64> {
        self.frequency_hz
    }

    pub fn quantum_state(&self) -> Option<&QuantumState> {
        self.quantum_state.as_ref()
    }

    pub fn superposition_count(&self) -> Option<u32> {
        self.superposition_count
    }

    pub fn entanglement_strength(&self) -> Option<f64> {
        self.entanglement_strength
    }

    pub fn consciousness_metrics(&self) -> Option<&ConsciousnessMetrics> {
        self.consciousness_metrics.as_ref()
    }

    pub fn action_type(&self) -> ActionType {
        self.action_type
    }

    pub fn target_network(&self) -> Network {
        self.target_network
    }

    pub fn target_nodes(&self) -> &[String] {
        &self.target_nodes
    }

    pub fn action_parameters(&self) -> &ValueMap {
        &self.action_parameters
    }

    pub fn sdc_chip_targets(&self) -> Option<&[u8]> {
        self.sdc_chip_targets.as_deref()
    }

    pub fn memristor_pattern(&self) -> Option<&[f32]> {
        self.memristor_pattern.as_deref()
    }

    pub fn user_context(&self) -> Option<&ValueMap> {
        self.user_context.as_ref()
    }

    pub fn session_context(&self) -> Option<&ValueMap> {
        self.session_context.as_ref()
    }

    pub fn priority(&self) -> Priority {
        self.priority
    }

    pub fn requires_confirmation(&self) -> bool {
        self.requires_confirmation
    }

    pub fn energy_budget(&self) -> f64 {
        self.energy_budget
    }

    /// Field-for-field equality, floats within `eps`
    pub fn approx_eq(&self, other: &Event, eps: f64) -> bool {
        self.id == other.id
            && floats_eq(self.timestamp, other.timestamp, eps)
            && self.version == other.version
            && self.signal_type == other.signal_type
            && floats_eq(self.intensity, other.intensity, eps)
            && self.duration_ms == other.duration_ms
            && opt_eq(&self.frequency_hz, &other.frequency_hz, |a, b| {
                floats_eq(*a, *b, eps)
            })
            && opt_eq(&self.quantum_state, &other.quantum_state, |a, b| {
                a.approx_eq(b, eps)
            })
            && self.superposition_count == other.superposition_count
            && opt_eq(&self.entanglement_strength, &other.entanglement_strength, |a, b| {
                floats_eq(*a, *b, eps)
            })
            && opt_eq(&self.consciousness_metrics, &other.consciousness_metrics, |a, b| {
                a.approx_eq(b, eps)
            })
            && self.action_type == other.action_type
            && self.target_network == other.target_network
            && self.target_nodes == other.target_nodes
            && maps_approx_eq(&self.action_parameters, &other.action_parameters, eps)
            && self.sdc_chip_targets == other.sdc_chip_targets
            && opt_eq(&self.memristor_pattern, &other.memristor_pattern, |a, b| {
                f32s_eq(a, b, eps)
            })
            && opt_eq(&self.user_context, &other.user_context, |a, b| {
                maps_approx_eq(a, b, eps)
            })
            && opt_eq(&self.session_context, &other.session_context, |a, b| {
                maps_approx_eq(a, b, eps)
            })
            && self.priority == other.priority
            && self.requires_confirmation == other.requires_confirmation
            && floats_eq(self.energy_budget, other.energy_budget, eps)
    }
}

/// Builder for events
///
/// Every setter normalizes its input; `build` cannot produce an event that
/// violates a range invariant.
#[derive(Clone, Debug)]
pub struct EventBuilder {
    event: Event,
}

impl EventBuilder {
    pub fn new(id: impl Into<String>) -> Self {
        EventBuilder {
            event: Event {
                id: id.into(),
                timestamp: 0.0,
                version: PROTOCOL_VERSION,
                signal_type: SignalType::default(),
                intensity: 0.5,
                duration_ms: 200,
                frequency_hz: None,
                quantum_state: None,
                superposition_count: None,
                entanglement_strength: None,
                consciousness_metrics: None,
                action_type: ActionType::default(),
                target_network: Network::default(),
                target_nodes: Vec::new(),
                action_parameters: ValueMap::new(),
                sdc_chip_targets: None,
                memristor_pattern: None,
                user_context: None,
                session_context: None,
                priority: Priority::default(),
                requires_confirmation: false,
                energy_budget: 0.0,
            },
        }
    }

    pub fn timestamp(mut self, timestamp: f64) -> Self {
        self.event.timestamp = non_negative(timestamp);
        self
    }

    pub fn version(mut self, version: u16) -> Self {
        self.event.version = version;
        self
    }

    pub fn signal(mut self, signal_type: SignalType) -> Self {
        self.event.signal_type = signal_type;
        self
    }

    pub fn intensity(mut self, intensity: f64) -> Self {
        self.event.intensity = unit(intensity);
        self
    }

    pub fn duration_ms(mut self, duration_ms: u64) -> Self {
        self.event.duration_ms = duration_ms.max(1);
        self
    }

    pub fn frequency_hz(mut self, frequency_hz: Option<f64>) -> Self {
        self.event.frequency_hz = frequency_hz.filter(|f| f.is_finite());
        self
    }

    pub fn quantum_state(mut self, state: Option<QuantumState>) -> Self {
        self.event.quantum_state = state;
        self
    }

    pub fn superposition_count(mut self, count: Option<u32>) -> Self {
        self.event.superposition_count = count;
        self
    }

    pub fn entanglement_strength(mut self, strength: Option<f64>) -> Self {
        self.event.entanglement_strength = strength.map(unit);
        self
    }

    pub fn consciousness_metrics(mut self, metrics: Option<ConsciousnessMetrics>) -> Self {
        self.event.consciousness_metrics = metrics;
        self
    }

    pub fn action(mut self, action_type: ActionType) -> Self {
        self.event.action_type = action_type;
        self
    }

    pub fn network(mut self, network: Network) -> Self {
        self.event.target_network = network;
        self
    }

    pub fn target_nodes(mut self, nodes: Vec<String>) -> Self {
        self.event.target_nodes = nodes;
        self
    }

    pub fn parameters(mut self, parameters: ValueMap) -> Self {
        self.event.action_parameters = finite_map(parameters);
        self
    }

    pub fn parameter(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.event
            .action_parameters
            .insert(key.into(), Value::into_finite(value.into()));
        self
    }

    pub fn sdc_chip_targets(mut self, targets: Option<Vec<u8>>) -> Self {
        self.event.sdc_chip_targets = targets;
        self
    }

    pub fn memristor_pattern(mut self, pattern: Option<Vec<f32>>) -> Self {
        self.event.memristor_pattern = pattern.map(finite_or_zero);
        self
    }

    /// Non allow-listed keys are dropped
    pub fn user_context(mut self, context: Option<ValueMap>) -> Self {
        self.event.user_context = context
            .and_then(|c| filter_context(&c, USER_CONTEXT_KEYS))
            .map(finite_map);
        self
    }

    /// Non allow-listed keys are dropped
    pub fn session_context(mut self, context: Option<ValueMap>) -> Self {
        self.event.session_context =
            context
                .and_then(|c| filter_context(&c, SESSION_CONTEXT_KEYS))
                .map(finite_map);
        self
    }

    pub fn priority(mut self, priority: Priority) -> Self {
        self.event.priority = priority;
        self
    }

    pub fn requires_confirmation(mut self, requires: bool) -> Self {
        self.event.requires_confirmation = requires;
        self
    }

    pub fn energy_budget(mut self, budget: f64) -> Self {
        self.event.energy_budget = non_negative(budget);
        self
    }

    pub fn build(self) -> Event {
        self.event
    }
}
