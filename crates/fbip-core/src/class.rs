//! Closed wire enums
//!
//! Every enum carried in the compact event map is an integer on the wire.
//! Conversion from the wire is total: `from_wire_or_default` always yields a
//! variant, substituting the designated default for unknown integers and
//! reporting that it did so. Strict callers use `try_from_wire`.
//!
//! Numbering leaves room per family:
//! - 0-15: traditional
//! - 16-31: quantum
//! - 32-47: field
//! - 48-63: metabolic
//! - 64-79: hardware (actions only)

use std::fmt;

use crate::{FbipError, FbipResult};

/// Integer-coded enum with a designated fallback variant
pub trait WireEnum: Copy + Sized + 'static {
    /// Name used in errors and logs
    const KIND: &'static str;
    /// Variant substituted for unknown input
    const DEFAULT: Self;

    fn from_wire(raw: i64) -> Option<Self>;

    fn to_wire(self) -> i64;

    /// Strict conversion
    fn try_from_wire(raw: i64) -> FbipResult<Self> {
        Self::from_wire(raw).ok_or(FbipError::UnknownEnumValue {
            kind: Self::KIND,
            value: raw,
        })
    }

    /// Total conversion. The flag is true when the default was substituted.
    fn from_wire_or_default(raw: i64) -> (Self, bool) {
        match Self::from_wire(raw) {
            Some(v) => (v, false),
            None => (Self::DEFAULT, true),
        }
    }
}

/// Enum addressable by a snake_case name
pub trait NamedEnum: WireEnum {
    const ALL: &'static [Self];

    fn name(self) -> &'static str;

    /// Case-insensitive lookup (`"gamma_sync"` and `"GAMMA_SYNC"` both match)
    fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|v| v.name().eq_ignore_ascii_case(name.trim()))
    }

    /// Total lookup. The flag is true when the default was substituted.
    fn from_name_or_default(name: &str) -> (Self, bool) {
        match Self::from_name(name) {
            Some(v) => (v, false),
            None => (Self::DEFAULT, true),
        }
    }
}

/// Signal classification
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum SignalType {
    // Traditional brainwave patterns
    #[default]
    AlphaPeak = 0,
    BetaBurst = 1,
    ThetaSurge = 2,
    DeltaDip = 3,
    GammaSync = 4,
    P300Response = 5,

    // Quantum signals
    SuperpositionCollapse = 16,
    EntanglementEvent = 17,
    DecoherenceDetected = 18,
    QuantumTunneling = 19,

    // Field fluctuations
    FieldResonance = 32,
    VacuumFluctuation = 33,
    ConsciousnessEmergence = 34,

    // Metabolic signals
    AtpDepletion = 48,
    EnergySurge = 49,
    MetabolicStress = 50,
    RecoveryPhase = 51,
}

impl SignalType {
    /// Does this signal carry a quantum state when built by the factory?
    pub fn is_quantum(self) -> bool {
        matches!(
            self,
            SignalType::GammaSync
                | SignalType::SuperpositionCollapse
                | SignalType::EntanglementEvent
                | SignalType::DecoherenceDetected
                | SignalType::QuantumTunneling
                | SignalType::ConsciousnessEmergence
        )
    }
}

impl WireEnum for SignalType {
    const KIND: &'static str = "signal_type";
    const DEFAULT: Self = SignalType::AlphaPeak;

    fn from_wire(raw: i64) -> Option<Self> {
        match raw {
            0 => Some(SignalType::AlphaPeak),
            1 => Some(SignalType::BetaBurst),
            2 => Some(SignalType::ThetaSurge),
            3 => Some(SignalType::DeltaDip),
            4 => Some(SignalType::GammaSync),
            5 => Some(SignalType::P300Response),
            16 => Some(SignalType::SuperpositionCollapse),
            17 => Some(SignalType::EntanglementEvent),
            18 => Some(SignalType::DecoherenceDetected),
            19 => Some(SignalType::QuantumTunneling),
            32 => Some(SignalType::FieldResonance),
            33 => Some(SignalType::VacuumFluctuation),
            34 => Some(SignalType::ConsciousnessEmergence),
            48 => Some(SignalType::AtpDepletion),
            49 => Some(SignalType::EnergySurge),
            50 => Some(SignalType::MetabolicStress),
            51 => Some(SignalType::RecoveryPhase),
            _ => None,
        }
    }

    #[inline]
    fn to_wire(self) -> i64 {
        self as i64
    }
}

impl NamedEnum for SignalType {
    const ALL: &'static [Self] = &[
        SignalType::AlphaPeak,
        SignalType::BetaBurst,
        SignalType::ThetaSurge,
        SignalType::DeltaDip,
        SignalType::GammaSync,
        SignalType::P300Response,
        SignalType::SuperpositionCollapse,
        SignalType::EntanglementEvent,
        SignalType::DecoherenceDetected,
        SignalType::QuantumTunneling,
        SignalType::FieldResonance,
        SignalType::VacuumFluctuation,
        SignalType::ConsciousnessEmergence,
        SignalType::AtpDepletion,
        SignalType::EnergySurge,
        SignalType::MetabolicStress,
        SignalType::RecoveryPhase,
    ];

    fn name(self) -> &'static str {
        match self {
            SignalType::AlphaPeak => "alpha_peak",
            SignalType::BetaBurst => "beta_burst",
            SignalType::ThetaSurge => "theta_surge",
            SignalType::DeltaDip => "delta_dip",
            SignalType::GammaSync => "gamma_sync",
            SignalType::P300Response => "p300_response",
            SignalType::SuperpositionCollapse => "superposition_collapse",
            SignalType::EntanglementEvent => "entanglement_event",
            SignalType::DecoherenceDetected => "decoherence_detected",
            SignalType::QuantumTunneling => "quantum_tunneling",
            SignalType::FieldResonance => "field_resonance",
            SignalType::VacuumFluctuation => "vacuum_fluctuation",
            SignalType::ConsciousnessEmergence => "consciousness_emergence",
            SignalType::AtpDepletion => "atp_depletion",
            SignalType::EnergySurge => "energy_surge",
            SignalType::MetabolicStress => "metabolic_stress",
            SignalType::RecoveryPhase => "recovery_phase",
        }
    }
}

/// Action requested in response to a signal
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum ActionType {
    // Traditional actions
    #[default]
    HighlightCluster = 0,
    GenerateNode = 1,
    LinkNodes = 2,
    ExpandNode = 3,
    PulseFeedback = 4,

    // Quantum actions
    CreateSuperposition = 16,
    CollapseState = 17,
    EntangleNodes = 18,
    MeasureCoherence = 19,

    // Field actions
    AdjustFieldStrength = 32,
    PropagateResonance = 33,
    SpawnVacuumNode = 34,

    // Metabolic actions
    AllocateEnergy = 48,
    TriggerRecovery = 49,
    InduceStress = 50,
    BalanceNetworks = 51,

    // Hardware actions
    SdcWork = 64,
    MemristorUpdate = 65,
    QuantumGate = 66,
}

impl ActionType {
    /// Hardware actions address the external chip collaborator
    pub fn is_hardware(self) -> bool {
        (self as u8) >= 64
    }
}

impl WireEnum for ActionType {
    const KIND: &'static str = "action_type";
    const DEFAULT: Self = ActionType::HighlightCluster;

    fn from_wire(raw: i64) -> Option<Self> {
        match raw {
            0 => Some(ActionType::HighlightCluster),
            1 => Some(ActionType::GenerateNode),
            2 => Some(ActionType::LinkNodes),
            3 => Some(ActionType::ExpandNode),
            4 => Some(ActionType::PulseFeedback),
            16 => Some(ActionType::CreateSuperposition),
            17 => Some(ActionType::CollapseState),
            18 => Some(ActionType::EntangleNodes),
            19 => Some(ActionType::MeasureCoherence),
            32 => Some(ActionType::AdjustFieldStrength),
            33 => Some(ActionType::PropagateResonance),
            34 => Some(ActionType::SpawnVacuumNode),
            48 => Some(ActionType::AllocateEnergy),
            49 => Some(ActionType::TriggerRecovery),
            50 => Some(ActionType::InduceStress),
            51 => Some(ActionType::BalanceNetworks),
            64 => Some(ActionType::SdcWork),
            65 => Some(ActionType::MemristorUpdate),
            66 => Some(ActionType::QuantumGate),
            _ => None,
        }
    }

    #[inline]
    fn to_wire(self) -> i64 {
        self as i64
    }
}

impl NamedEnum for ActionType {
    const ALL: &'static [Self] = &[
        ActionType::HighlightCluster,
        ActionType::GenerateNode,
        ActionType::LinkNodes,
        ActionType::ExpandNode,
        ActionType::PulseFeedback,
        ActionType::CreateSuperposition,
        ActionType::CollapseState,
        ActionType::EntangleNodes,
        ActionType::MeasureCoherence,
        ActionType::AdjustFieldStrength,
        ActionType::PropagateResonance,
        ActionType::SpawnVacuumNode,
        ActionType::AllocateEnergy,
        ActionType::TriggerRecovery,
        ActionType::InduceStress,
        ActionType::BalanceNetworks,
        ActionType::SdcWork,
        ActionType::MemristorUpdate,
        ActionType::QuantumGate,
    ];

    fn name(self) -> &'static str {
        match self {
            ActionType::HighlightCluster => "highlight_cluster",
            ActionType::GenerateNode => "generate_node",
            ActionType::LinkNodes => "link_nodes",
            ActionType::ExpandNode => "expand_node",
            ActionType::PulseFeedback => "pulse_feedback",
            ActionType::CreateSuperposition => "create_superposition",
            ActionType::CollapseState => "collapse_state",
            ActionType::EntangleNodes => "entangle_nodes",
            ActionType::MeasureCoherence => "measure_coherence",
            ActionType::AdjustFieldStrength => "adjust_field_strength",
            ActionType::PropagateResonance => "propagate_resonance",
            ActionType::SpawnVacuumNode => "spawn_vacuum_node",
            ActionType::AllocateEnergy => "allocate_energy",
            ActionType::TriggerRecovery => "trigger_recovery",
            ActionType::InduceStress => "induce_stress",
            ActionType::BalanceNetworks => "balance_networks",
            ActionType::SdcWork => "sdc_work",
            ActionType::MemristorUpdate => "memristor_update",
            ActionType::QuantumGate => "quantum_gate",
        }
    }
}

/// Target network of an action
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
#[repr(u8)]
pub enum Network {
    /// Decision making
    #[default]
    Executive = 0,
    /// Storage and recall
    Memory = 1,
    /// Input processing
    Sensory = 2,
    /// Cross-network synthesis
    Integration = 3,
}

impl Network {
    /// Share of the energy budget this network receives by default
    pub fn energy_share(self) -> f64 {
        match self {
            Network::Executive => 0.5,
            Network::Memory => 0.3,
            Network::Sensory => 0.2,
            Network::Integration => 0.0,
        }
    }

    #[inline]
    pub fn to_byte(self) -> u8 {
        self as u8
    }
}

impl WireEnum for Network {
    const KIND: &'static str = "target_network";
    const DEFAULT: Self = Network::Executive;

    fn from_wire(raw: i64) -> Option<Self> {
        match raw {
            0 => Some(Network::Executive),
            1 => Some(Network::Memory),
            2 => Some(Network::Sensory),
            3 => Some(Network::Integration),
            _ => None,
        }
    }

    #[inline]
    fn to_wire(self) -> i64 {
        self as i64
    }
}

impl NamedEnum for Network {
    const ALL: &'static [Self] = &[
        Network::Executive,
        Network::Memory,
        Network::Sensory,
        Network::Integration,
    ];

    fn name(self) -> &'static str {
        match self {
            Network::Executive => "executive",
            Network::Memory => "memory",
            Network::Sensory => "sensory",
            Network::Integration => "integration",
        }
    }
}

/// Named priority bands
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PriorityBand {
    Low,
    Normal,
    High,
    Critical,
}

/// Message priority on a closed 1..=10 scale
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Priority(u8);

impl Priority {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 10;

    pub const LOW: Priority = Priority(1);
    pub const NORMAL: Priority = Priority(5);
    pub const HIGH: Priority = Priority(8);
    pub const CRITICAL: Priority = Priority(10);

    /// Clamp any integer into the valid range
    pub fn clamped(level: i64) -> Self {
        Priority(level.clamp(Self::MIN as i64, Self::MAX as i64) as u8)
    }

    #[inline]
    pub fn level(self) -> u8 {
        self.0
    }

    /// Band at or below this level
    pub fn band(self) -> PriorityBand {
        match self.0 {
            10 => PriorityBand::Critical,
            8..=9 => PriorityBand::High,
            5..=7 => PriorityBand::Normal,
            _ => PriorityBand::Low,
        }
    }

    /// High and Critical traffic is flagged in the packet header
    pub fn is_elevated(self) -> bool {
        self >= Self::HIGH
    }
}

impl Default for Priority {
    fn default() -> Self {
        Priority::NORMAL
    }
}

impl fmt::Debug for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Priority({}, {:?})", self.0, self.band())
    }
}

impl WireEnum for Priority {
    const KIND: &'static str = "priority";
    const DEFAULT: Self = Priority::NORMAL;

    fn from_wire(raw: i64) -> Option<Self> {
        if (Self::MIN as i64..=Self::MAX as i64).contains(&raw) {
            Some(Priority(raw as u8))
        } else {
            None
        }
    }

    #[inline]
    fn to_wire(self) -> i64 {
        self.0 as i64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signal_wire_roundtrip() {
        for &signal in SignalType::ALL {
            assert_eq!(SignalType::from_wire(signal.to_wire()), Some(signal));
        }
        assert_eq!(SignalType::from_wire(6), None);
    }

    #[test]
    fn test_signal_fallback() {
        assert_eq!(
            SignalType::from_wire_or_default(9999),
            (SignalType::AlphaPeak, true)
        );
        assert_eq!(
            SignalType::from_wire_or_default(4),
            (SignalType::GammaSync, false)
        );
        assert!(matches!(
            SignalType::try_from_wire(-1),
            Err(FbipError::UnknownEnumValue {
                kind: "signal_type",
                value: -1
            })
        ));
    }

    #[test]
    fn test_name_lookup() {
        assert_eq!(SignalType::from_name("gamma_sync"), Some(SignalType::GammaSync));
        assert_eq!(SignalType::from_name("GAMMA_SYNC"), Some(SignalType::GammaSync));
        assert_eq!(
            ActionType::from_name_or_default("teleport"),
            (ActionType::HighlightCluster, true)
        );
        assert_eq!(Network::from_name("Memory"), Some(Network::Memory));
    }

    #[test]
    fn test_action_categories() {
        assert!(ActionType::QuantumGate.is_hardware());
        assert!(!ActionType::BalanceNetworks.is_hardware());
        for &action in ActionType::ALL {
            assert_eq!(ActionType::from_wire(action.to_wire()), Some(action));
        }
    }

    #[test]
    fn test_quantum_signals() {
        assert!(SignalType::GammaSync.is_quantum());
        assert!(SignalType::ConsciousnessEmergence.is_quantum());
        assert!(!SignalType::AlphaPeak.is_quantum());
        assert!(!SignalType::AtpDepletion.is_quantum());
    }

    #[test]
    fn test_priority_clamp_and_bands() {
        assert_eq!(Priority::clamped(0), Priority::LOW);
        assert_eq!(Priority::clamped(99), Priority::CRITICAL);
        assert_eq!(Priority::clamped(7).band(), PriorityBand::Normal);
        assert_eq!(Priority::clamped(9).band(), PriorityBand::High);
        assert_eq!(Priority::clamped(3).band(), PriorityBand::Low);
        assert!(Priority::HIGH.is_elevated());
        assert!(!Priority::NORMAL.is_elevated());
    }

    #[test]
    fn test_priority_wire() {
        assert_eq!(Priority::from_wire(8), Some(Priority::HIGH));
        assert_eq!(Priority::from_wire(11), None);
        assert_eq!(Priority::from_wire_or_default(0), (Priority::NORMAL, true));
    }

    #[test]
    fn test_network_energy_shares() {
        let total: f64 = Network::ALL.iter().map(|n| n.energy_share()).sum();
        assert!((total - 1.0).abs() < 1e-12);
    }
}
