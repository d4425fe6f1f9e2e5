//! End-to-end protocol scenarios
//!
//! Each scenario drives two protocol instances (sender and receiver)
//! through a realistic exchange and reports what it observed, so tests
//! and benches can assert on the outcome.

use fbip_codec::Format;
use fbip_core::Event;
use fbip_runtime::{Protocol, Received};

use crate::corruption::{Corrupter, CorruptionConfig};
use crate::fixtures::sample_events;

/// Outcome of an isolation run
#[derive(Clone, Debug, Default)]
pub struct IsolationResult {
    /// Corrupted packets fed to the receiver
    pub corrupted_sent: usize,
    /// Corrupted packets the receiver rejected
    pub corrupted_rejected: usize,
    /// Corrupted packets that still decoded (damage in a harmless spot)
    pub corrupted_accepted: usize,
    /// Clean packets sent after corruption
    pub clean_sent: usize,
    /// Clean packets decoded to their original event
    pub clean_recovered: usize,
    /// Sequence advance on the receiver
    pub receiver_calls: u32,
}

impl IsolationResult {
    /// Every clean packet survived the corrupted traffic
    pub fn isolated(&self) -> bool {
        self.clean_sent == self.clean_recovered
    }
}

/// Interleave corrupted and clean packets and check clean ones still decode
pub fn run_isolation(format: Format, packets: usize, seed: u64) -> IsolationResult {
    let sender = Protocol::with_format(format);
    let receiver = Protocol::with_format(format);
    let mut corrupter = match Corrupter::new(CorruptionConfig::default(), seed) {
        Ok(c) => c,
        Err(_) => return IsolationResult::default(),
    };

    let mut result = IsolationResult::default();
    let start = receiver.sequence();

    for event in sample_events(packets, seed) {
        let Ok(bytes) = sender.serialize(&event, None) else {
            continue;
        };

        let (_, damaged) = corrupter.corrupt(&bytes);
        result.corrupted_sent += 1;
        match receiver.receive(&damaged) {
            Ok(_) => result.corrupted_accepted += 1,
            Err(_) => result.corrupted_rejected += 1,
        }

        result.clean_sent += 1;
        if let Ok(Received::Event(decoded)) = receiver.receive(&bytes) {
            if decoded.approx_eq(&event, 1e-5) {
                result.clean_recovered += 1;
            }
        }
    }

    result.receiver_calls = receiver.sequence().wrapping_sub(start);
    result
}

/// Outcome of a batch exchange
#[derive(Clone, Debug, Default)]
pub struct BatchResult {
    pub events: usize,
    pub batch_size: usize,
    pub individual_size: usize,
    pub order_preserved: bool,
}

/// Send `n` events as one batch and compare against individual packets
pub fn run_batch_exchange(n: usize, seed: u64) -> BatchResult {
    let sender = Protocol::with_format(Format::Binary);
    let receiver = Protocol::with_format(Format::Binary);
    let events = sample_events(n, seed);

    let mut result = BatchResult {
        events: n,
        ..Default::default()
    };

    let Ok(batch) = sender.batch(&events) else {
        return result;
    };
    result.batch_size = batch.len();
    result.individual_size = events
        .iter()
        .filter_map(|e| sender.serialize(e, None).ok())
        .map(|bytes| bytes.len())
        .sum();

    if let Ok(decoded) = receiver.unbatch(&batch) {
        result.order_preserved = decoded.len() == events.len()
            && decoded
                .iter()
                .zip(&events)
                .all(|(a, b): (&Event, &Event)| a.approx_eq(b, 1e-5));
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::*;
    use fbip_codec::detect;
    use fbip_core::{FbipError, SignalType, WireEnum};
    use fbip_wire::{unframe, PacketType};
    use proptest::prelude::*;

    #[test]
    fn test_gamma_sync_scenario() {
        let sender = Protocol::default();
        let receiver = Protocol::default();
        let event = sender.create_event(&gamma_sync_signal(), &gamma_sync_action(), None);

        let bytes = sender.serialize(&event, None).unwrap();
        let packet = unframe(&bytes).unwrap();
        assert_eq!(packet.packet_type(), PacketType::SingleEvent);
        assert!(packet.flags().is_priority());

        let decoded = receiver.deserialize(&bytes).unwrap();
        assert!(decoded.approx_eq(&event, 1e-5));
        assert_eq!(decoded.signal_type(), SignalType::GammaSync);
        assert_eq!(decoded.intensity(), 0.8);
        assert_eq!(decoded.duration_ms(), 400);
        assert_eq!(decoded.frequency_hz(), Some(40.0));
        assert_eq!(decoded.target_nodes(), &["n1".to_string()]);
        assert_eq!(decoded.priority(), fbip_core::Priority::HIGH);
        assert_eq!(decoded.sdc_chip_targets(), Some(&[0u8, 1][..]));
        assert_eq!(
            decoded.session_context().and_then(|sx| sx.get("session_id")),
            Some(&sender.session_id().as_str().into())
        );
    }

    #[test]
    fn test_detection_per_format() {
        let protocol = Protocol::default();
        let event = gamma_sync_event(1);
        for format in [Format::Text, Format::Binary, Format::Raw] {
            let bytes = protocol.serialize(&event, Some(format)).unwrap();
            assert_eq!(detect(&bytes), Ok(format));
        }

        let bytes = protocol.serialize(&large_event(), Some(Format::Compressed)).unwrap();
        assert_eq!(detect(&bytes), Ok(Format::Compressed));

        // Below the threshold a compressed-format packet looks binary
        let small = Event::builder("small").build();
        let bytes = protocol.serialize(&small, Some(Format::Compressed)).unwrap();
        assert_eq!(detect(&bytes), Ok(Format::Binary));
        assert!(protocol.deserialize(&bytes).unwrap().approx_eq(&small, 1e-9));
    }

    #[test]
    fn test_unknown_signal_falls_back_with_one_warning() {
        let protocol = Protocol::default();
        let event = gamma_sync_event(9);

        for bytes in [
            raw_with_signal(&event, 9999).unwrap(),
            framed_with_signal(&event, 9999).unwrap(),
        ] {
            protocol.reset_stats();
            let decoded = protocol.deserialize(&bytes).unwrap();
            assert_eq!(decoded.signal_type(), SignalType::default());
            assert_eq!(decoded.id(), event.id());
            assert_eq!(protocol.stats().warnings, 1);
        }
    }

    #[test]
    fn test_batch_exchange() {
        for n in [3, 10, 50] {
            let result = run_batch_exchange(n, n as u64);
            assert!(result.order_preserved, "n = {}", n);
            assert!(result.batch_size <= result.individual_size, "n = {}", n);
        }
    }

    #[test]
    fn test_batch_of_copies() {
        let protocol = Protocol::default();
        let event = gamma_sync_event(4);
        let single = protocol.serialize(&event, Some(Format::Binary)).unwrap().len();
        for n in [3, 8, 20] {
            let copies = vec![event.clone(); n];
            let batch = protocol.batch(&copies).unwrap();
            assert!(batch.len() <= n * single, "n = {}", n);

            let decoded = protocol.unbatch(&batch).unwrap();
            assert!(decoded.iter().all(|e| e.approx_eq(&event, 1e-5)));
        }
    }

    #[test]
    fn test_batch_with_one_bad_event_fails() {
        let protocol = Protocol::default();
        let mut bytes = protocol.batch(&sample_events(4, 5)).unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0x80;
        assert!(matches!(
            protocol.unbatch(&bytes),
            Err(FbipError::ChecksumMismatch { .. })
        ));
        assert_eq!(protocol.stats().errors, 1);
    }

    #[test]
    fn test_isolation_after_corruption() {
        for format in Format::ALL {
            let result = run_isolation(format, 40, 0xF00D);
            assert_eq!(result.corrupted_sent, 40);
            assert!(result.isolated(), "{}: {:?}", format, result);
            assert!(result.corrupted_rejected > 0, "{}", format);
            assert_eq!(result.receiver_calls, 80);
        }
    }

    #[test]
    fn test_text_wire_shape() {
        let protocol = Protocol::with_format(Format::Text);
        let bytes = protocol.serialize(&gamma_sync_event(2), None).unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["protocol_version"], "FBIP_v2.0");
        assert_eq!(json["format"], "text");
        assert_eq!(json["event"]["st"], SignalType::GammaSync.to_wire());
        assert!(json["event"]["mp"].is_array());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn prop_corruption_is_isolated(seed in any::<u64>(), binary in any::<bool>()) {
            let format = if binary { Format::Binary } else { Format::Raw };
            let result = run_isolation(format, 8, seed);
            prop_assert!(result.isolated(), "{:?}", result);
        }
    }
}
