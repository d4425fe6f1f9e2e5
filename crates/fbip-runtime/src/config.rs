//! Protocol configuration
//!
//! Loaded from TOML; every section and key is optional.
//!
//! ```toml
//! default_format = "binary"
//!
//! [compression]
//! enabled = true
//! threshold = 512
//! level = 6
//! batches = false
//!
//! [stats]
//! history = 1000
//!
//! [session]
//! ack_window = 1024
//!
//! [logging]
//! level = "info"
//! json = false
//! ```

use fbip_codec::{CompressionSettings, Format};
use fbip_core::{FbipError, FbipResult, DEFAULT_COMPRESSION_THRESHOLD, MAX_PACKET_SIZE};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Protocol configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProtocolConfig {
    /// Format used when a caller does not pick one
    #[serde(default)]
    pub default_format: Format,

    #[serde(default)]
    pub compression: CompressionConfig,

    #[serde(default)]
    pub stats: StatsConfig,

    #[serde(default)]
    pub session: SessionConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        ProtocolConfig {
            default_format: Format::default(),
            compression: CompressionConfig::default(),
            stats: StatsConfig::default(),
            session: SessionConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl ProtocolConfig {
    /// Low-latency preset: lower threshold, compressed batches
    pub fn high_performance(format: Format, compression: bool) -> Self {
        ProtocolConfig {
            default_format: format,
            compression: CompressionConfig {
                enabled: compression,
                threshold: fbip_codec::compressed::HIGH_PERFORMANCE_THRESHOLD,
                batches: compression,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// Parse and validate a TOML document
    pub fn from_toml_str(content: &str) -> FbipResult<Self> {
        let config: Self =
            toml::from_str(content).map_err(|e| FbipError::config("<toml>", e.to_string()))?;
        config.validate()?;
        info!(
            "Configuration loaded: format={}, compression={}",
            config.default_format, config.compression.enabled
        );
        Ok(config)
    }

    pub fn validate(&self) -> FbipResult<()> {
        self.compression.validate()?;
        self.stats.validate()?;
        self.session.validate()?;
        self.logging.validate()?;
        Ok(())
    }

    /// Serializes configuration to TOML string.
    pub fn to_toml(&self) -> String {
        toml::to_string_pretty(self).unwrap_or_default()
    }
}

/// Compression section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompressionConfig {
    /// Allow the compressed codec to deflate at all
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Payloads larger than this are deflated
    #[serde(default = "default_threshold")]
    pub threshold: usize,

    /// zlib level, 0-9
    #[serde(default = "default_level")]
    pub level: u32,

    /// Apply the same rule to batch packets
    #[serde(default)]
    pub batches: bool,
}

fn default_true() -> bool {
    true
}

fn default_threshold() -> usize {
    DEFAULT_COMPRESSION_THRESHOLD
}

fn default_level() -> u32 {
    fbip_codec::compressed::DEFAULT_COMPRESSION_LEVEL
}

impl Default for CompressionConfig {
    fn default() -> Self {
        CompressionConfig {
            enabled: true,
            threshold: default_threshold(),
            level: default_level(),
            batches: false,
        }
    }
}

impl CompressionConfig {
    /// Codec settings; a disabled section never reaches its threshold
    pub fn settings(&self) -> CompressionSettings {
        CompressionSettings {
            threshold: if self.enabled {
                self.threshold
            } else {
                usize::MAX
            },
            level: self.level,
        }
    }

    /// Settings for batch packets, if batches are compressed
    pub fn batch_settings(&self) -> Option<CompressionSettings> {
        (self.enabled && self.batches).then(|| self.settings())
    }

    fn validate(&self) -> FbipResult<()> {
        if self.level > 9 {
            return Err(FbipError::config(
                "compression.level",
                format!("{} is outside 0-9", self.level),
            ));
        }
        if self.threshold >= MAX_PACKET_SIZE {
            return Err(FbipError::config(
                "compression.threshold",
                format!("{} is not below the packet limit {}", self.threshold, MAX_PACKET_SIZE),
            ));
        }
        Ok(())
    }
}

/// Performance monitor section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsConfig {
    /// Samples kept per ring buffer
    #[serde(default = "default_history")]
    pub history: usize,
}

fn default_history() -> usize {
    crate::stats::DEFAULT_HISTORY
}

impl Default for StatsConfig {
    fn default() -> Self {
        StatsConfig {
            history: default_history(),
        }
    }
}

impl StatsConfig {
    fn validate(&self) -> FbipResult<()> {
        if self.history == 0 {
            return Err(FbipError::config("stats.history", "must be at least 1"));
        }
        Ok(())
    }
}

/// Session section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Fixed session id; generated when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,

    /// Acknowledged sequence numbers remembered
    #[serde(default = "default_ack_window")]
    pub ack_window: usize,
}

fn default_ack_window() -> usize {
    1024
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            session_id: None,
            ack_window: default_ack_window(),
        }
    }
}

impl SessionConfig {
    fn validate(&self) -> FbipResult<()> {
        if self.ack_window == 0 {
            return Err(FbipError::config("session.ack_window", "must be at least 1"));
        }
        if matches!(&self.session_id, Some(id) if id.trim().is_empty()) {
            return Err(FbipError::config("session.session_id", "must not be blank"));
        }
        Ok(())
    }
}

/// Logging section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error); `RUST_LOG` wins.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of text
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: default_log_level(),
            json: false,
        }
    }
}

impl LoggingConfig {
    fn validate(&self) -> FbipResult<()> {
        const LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];
        if !LEVELS.contains(&self.level.to_ascii_lowercase().as_str()) {
            return Err(FbipError::config(
                "logging.level",
                format!("unknown level {:?}", self.level),
            ));
        }
        Ok(())
    }
}
