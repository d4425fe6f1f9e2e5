//! FBIP Runtime - Protocol facade
//!
//! This crate ties the codecs into a per-session facade:
//! - `Protocol`: sequence numbering, serialize/deserialize, batches,
//!   control packets and receive dispatch
//! - Rolling performance monitor
//! - TOML configuration and tracing setup

pub mod config;
pub mod protocol;
pub mod stats;
pub mod telemetry;

pub use config::{CompressionConfig, LoggingConfig, ProtocolConfig, SessionConfig, StatsConfig};
pub use protocol::{Protocol, ProtocolMetrics, Received};
pub use stats::{Operation, PerformanceMonitor, PerformanceStats, Sample};
pub use telemetry::init_tracing;
