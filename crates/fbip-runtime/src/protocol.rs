//! FBIP Protocol - session facade
//!
//! Owns the codecs for one session and the only shared mutable state: the
//! sequence counter, the performance monitor and the acknowledged set,
//! all behind one mutex. Encoding and decoding run outside the lock.

use std::collections::VecDeque;
use std::time::Instant;

use fbip_codec::{
    decode_batch_packet, decode_event_packet, Ack, BatchEncoder, CodecSet, CompressionInfo,
    Control, ErrorReport, Format, Heartbeat,
};
use fbip_core::{
    unix_seconds, version_tag, ConsciousnessMetrics, Event, EventFactory, FbipResult,
    QuantumState, SessionId, ValueMap, PROTOCOL_MAGIC,
};
use fbip_wire::{unframe, PacketType};
use parking_lot::Mutex;
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::config::ProtocolConfig;
use crate::stats::{Operation, PerformanceMonitor, PerformanceStats, Sample};

/// Anything `receive` can yield
#[derive(Clone, Debug, PartialEq)]
pub enum Received {
    Event(Event),
    Batch(Vec<Event>),
    Heartbeat(Heartbeat),
    Ack(Ack),
    Error(ErrorReport),
    QuantumState(QuantumState),
    Metrics(ConsciousnessMetrics),
}

/// Serializable snapshot of a protocol instance
#[derive(Clone, Debug, Serialize)]
pub struct ProtocolMetrics {
    pub protocol_version: String,
    pub session_id: String,
    pub default_format: Format,
    /// Next sequence number to be used
    pub sequence: u32,
    /// Acknowledged sequence numbers currently remembered
    pub acknowledged: usize,
    pub performance: PerformanceStats,
    pub configuration: ProtocolConfig,
}

/// What `dispatch` decoded, plus what the monitor needs to know about it
struct Dispatched {
    received: Received,
    format: Option<Format>,
    fallbacks: u32,
    compression: Option<CompressionInfo>,
}

/// Mutable session state
#[derive(Debug)]
struct SessionState {
    sequence: u32,
    monitor: PerformanceMonitor,
    acknowledged: VecDeque<u32>,
}

impl SessionState {
    fn next_sequence(&mut self) -> u32 {
        let seq = self.sequence;
        self.sequence = self.sequence.wrapping_add(1);
        seq
    }
}

/// Protocol facade for one session
pub struct Protocol {
    session_id: SessionId,
    config: ProtocolConfig,
    factory: EventFactory,
    codecs: CodecSet,
    batcher: BatchEncoder,
    state: Mutex<SessionState>,
}

impl Protocol {
    /// Create from a validated configuration
    pub fn new(config: ProtocolConfig) -> FbipResult<Self> {
        config.validate()?;
        Ok(Self::from_valid(config))
    }

    /// Defaults with a different default format
    pub fn with_format(format: Format) -> Self {
        Self::from_valid(ProtocolConfig {
            default_format: format,
            ..Default::default()
        })
    }

    /// Low-threshold preset; `compression = false` never deflates
    pub fn high_performance(format: Format, compression: bool) -> Self {
        Self::from_valid(ProtocolConfig::high_performance(format, compression))
    }

    fn from_valid(config: ProtocolConfig) -> Self {
        let session_id = config
            .session
            .session_id
            .as_deref()
            .map(SessionId::new)
            .unwrap_or_else(SessionId::generate);

        info!(
            "Protocol session {} started: format={}, compression_threshold={}",
            session_id, config.default_format, config.compression.threshold
        );

        Protocol {
            factory: EventFactory::new(session_id.clone()),
            codecs: CodecSet::new(config.compression.settings()),
            batcher: BatchEncoder::new(config.compression.batch_settings()),
            state: Mutex::new(SessionState {
                sequence: 0,
                monitor: PerformanceMonitor::new(config.stats.history),
                acknowledged: VecDeque::new(),
            }),
            session_id,
            config,
        }
    }

    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    pub fn config(&self) -> &ProtocolConfig {
        &self.config
    }

    /// Next sequence number to be used
    pub fn sequence(&self) -> u32 {
        self.state.lock().sequence
    }

    /// Build an event from semi-structured input
    ///
    /// Takes one sequence number; the event id is derived from it.
    pub fn create_event(
        &self,
        signal_data: &ValueMap,
        action_data: &ValueMap,
        context: Option<&ValueMap>,
    ) -> Event {
        let sequence = self.state.lock().next_sequence();
        self.factory.create(sequence, signal_data, action_data, context)
    }

    /// Encode one event, in `format` or the configured default
    pub fn serialize(&self, event: &Event, format: Option<Format>) -> FbipResult<Vec<u8>> {
        let format = format.unwrap_or(self.config.default_format);
        let started = Instant::now();
        let result = self.codecs.get(format).encode(event);
        let latency = started.elapsed();

        let sample = match &result {
            Ok(encoded) => {
                debug!(
                    "Encoded {} as {}: {} bytes",
                    event.id(),
                    format,
                    encoded.bytes.len()
                );
                Sample::success(Operation::Encode, latency, encoded.bytes.len())
                    .with_format(format)
                    .with_compression_ratio(encoded.compression.map(|c| c.ratio()))
            }
            Err(e) => {
                error!("Serialization of {} as {} failed: {}", event.id(), format, e);
                Sample::failure(Operation::Encode, latency)
            }
        };
        self.finish(sample, 0);

        result.map(|encoded| encoded.bytes)
    }

    /// Decode one event of any format
    pub fn deserialize(&self, bytes: &[u8]) -> FbipResult<Event> {
        let started = Instant::now();
        let result = self.codecs.decode_auto(bytes);
        let latency = started.elapsed();

        match result {
            Ok((format, decoded)) => {
                debug!("Decoded {} from {} ({} bytes)", decoded.event.id(), format, bytes.len());
                self.finish(
                    Sample::success(Operation::Decode, latency, bytes.len())
                        .with_format(format)
                        .with_compression_ratio(decoded.compression.map(|c| c.ratio())),
                    decoded.fallbacks,
                );
                Ok(decoded.event)
            }
            Err(e) => {
                error!("Deserialization of {} bytes failed: {}", bytes.len(), e);
                self.finish(Sample::failure(Operation::Decode, latency), 0);
                Err(e)
            }
        }
    }

    /// Encode several events into one packet
    pub fn batch(&self, events: &[Event]) -> FbipResult<Vec<u8>> {
        let started = Instant::now();
        let result = self.batcher.encode_batch(events);
        let latency = started.elapsed();

        let sample = match &result {
            Ok(encoded) => {
                debug!("Encoded batch of {}: {} bytes", events.len(), encoded.bytes.len());
                Sample::success(Operation::Encode, latency, encoded.bytes.len())
                    .with_compression_ratio(encoded.compression.map(|c| c.ratio()))
            }
            Err(e) => {
                error!("Batch of {} events failed: {}", events.len(), e);
                Sample::failure(Operation::Encode, latency)
            }
        };
        self.finish(sample, 0);

        result.map(|encoded| encoded.bytes)
    }

    /// Decode a batch packet; fails as a whole
    pub fn unbatch(&self, bytes: &[u8]) -> FbipResult<Vec<Event>> {
        let started = Instant::now();
        let result = self.batcher.decode_batch(bytes);
        let latency = started.elapsed();

        match result {
            Ok(batch) => {
                debug!("Decoded batch of {} ({} bytes)", batch.events.len(), bytes.len());
                self.finish(
                    Sample::success(Operation::Decode, latency, bytes.len())
                        .with_compression_ratio(batch.compression.map(|c| c.ratio())),
                    batch.fallbacks,
                );
                Ok(batch.events)
            }
            Err(e) => {
                error!("Batch decode of {} bytes failed: {}", bytes.len(), e);
                self.finish(Sample::failure(Operation::Decode, latency), 0);
                Err(e)
            }
        }
    }

    /// Heartbeat packet carrying a fresh sequence number
    pub fn heartbeat(&self) -> FbipResult<Vec<u8>> {
        let sequence = self.state.lock().next_sequence();
        Control::Heartbeat(Heartbeat {
            session_id: self.session_id.to_string(),
            sequence,
            timestamp: unix_seconds(),
        })
        .encode()
    }

    /// Ack packet for a sequence number received from the peer
    pub fn ack(&self, sequence: u32) -> FbipResult<Vec<u8>> {
        Control::Ack(Ack { sequence }).encode()
    }

    /// Error packet reporting a local failure to the peer
    pub fn error_report(&self, err: &fbip_core::FbipError) -> FbipResult<Vec<u8>> {
        Control::Error(ErrorReport::from_error(err)).encode()
    }

    /// Decode any packet and dispatch on its type
    ///
    /// Acks are remembered in a bounded window; see `is_acknowledged`.
    pub fn receive(&self, bytes: &[u8]) -> FbipResult<Received> {
        let started = Instant::now();
        let result = self.dispatch(bytes);
        let latency = started.elapsed();

        match result {
            Ok(dispatched) => {
                let mut sample = Sample::success(Operation::Decode, latency, bytes.len())
                    .with_compression_ratio(dispatched.compression.map(|c| c.ratio()));
                if let Some(format) = dispatched.format {
                    sample = sample.with_format(format);
                }
                let mut state = self.state.lock();
                if let Received::Ack(ack) = &dispatched.received {
                    if state.acknowledged.len() == self.config.session.ack_window {
                        state.acknowledged.pop_front();
                    }
                    state.acknowledged.push_back(ack.sequence);
                }
                Self::record(&mut state, sample, dispatched.fallbacks);
                Ok(dispatched.received)
            }
            Err(e) => {
                error!("Receive of {} bytes failed: {}", bytes.len(), e);
                self.finish(Sample::failure(Operation::Decode, latency), 0);
                Err(e)
            }
        }
    }

    fn dispatch(&self, bytes: &[u8]) -> FbipResult<Dispatched> {
        if !bytes.starts_with(&PROTOCOL_MAGIC) {
            let (format, decoded) = self.codecs.decode_auto(bytes)?;
            return Ok(Dispatched {
                received: Received::Event(decoded.event),
                format: Some(format),
                fallbacks: decoded.fallbacks,
                compression: decoded.compression,
            });
        }

        let packet = unframe(bytes)?;
        let dispatched = match packet.packet_type() {
            PacketType::SingleEvent => {
                let format = if packet.flags().is_compressed() {
                    Format::Compressed
                } else {
                    Format::Binary
                };
                let decoded = decode_event_packet(&packet)?;
                Dispatched {
                    received: Received::Event(decoded.event),
                    format: Some(format),
                    fallbacks: decoded.fallbacks,
                    compression: decoded.compression,
                }
            }
            PacketType::BatchEvents => {
                let batch = decode_batch_packet(&packet)?;
                Dispatched {
                    received: Received::Batch(batch.events),
                    format: None,
                    fallbacks: batch.fallbacks,
                    compression: batch.compression,
                }
            }
            _ => {
                let received = match Control::from_packet(&packet)? {
                    Control::Heartbeat(hb) => Received::Heartbeat(hb),
                    Control::Ack(ack) => Received::Ack(ack),
                    Control::Error(report) => {
                        warn!("Peer reported error {}: {}", report.code, report.message);
                        Received::Error(report)
                    }
                    Control::QuantumState(state) => Received::QuantumState(state),
                    Control::Metrics(metrics) => Received::Metrics(metrics),
                };
                Dispatched {
                    received,
                    format: None,
                    fallbacks: 0,
                    compression: None,
                }
            }
        };
        debug!("Received {:?} packet ({} bytes)", packet.packet_type(), bytes.len());
        Ok(dispatched)
    }

    /// Whether the peer acknowledged `sequence` recently
    pub fn is_acknowledged(&self, sequence: u32) -> bool {
        self.state.lock().acknowledged.contains(&sequence)
    }

    pub fn stats(&self) -> PerformanceStats {
        self.state.lock().monitor.stats()
    }

    pub fn reset_stats(&self) {
        self.state.lock().monitor.reset();
    }

    pub fn metrics(&self) -> ProtocolMetrics {
        let (sequence, acknowledged, performance) = {
            let state = self.state.lock();
            (state.sequence, state.acknowledged.len(), state.monitor.stats())
        };
        ProtocolMetrics {
            protocol_version: version_tag(),
            session_id: self.session_id.to_string(),
            default_format: self.config.default_format,
            sequence,
            acknowledged,
            performance,
            configuration: self.config.clone(),
        }
    }

    fn finish(&self, sample: Sample, fallbacks: u32) {
        Self::record(&mut self.state.lock(), sample, fallbacks);
    }

    fn record(state: &mut SessionState, sample: Sample, fallbacks: u32) {
        state.next_sequence();
        state.monitor.record(sample);
        if fallbacks > 0 {
            warn!("Decoded with {} unknown enum value(s) replaced by defaults", fallbacks);
            state.monitor.record_warnings(fallbacks);
        }
    }
}

impl Default for Protocol {
    fn default() -> Self {
        Self::from_valid(ProtocolConfig::default())
    }
}

impl std::fmt::Debug for Protocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Protocol")
            .field("session_id", &self.session_id)
            .field("default_format", &self.config.default_format)
            .field("sequence", &self.sequence())
            .finish()
    }
}
