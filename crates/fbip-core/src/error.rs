//! Error types for FBIP protocol

use thiserror::Error;

/// Core FBIP errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FbipError {
    // Construction errors
    #[error("Validation error: {0}")]
    Validation(String),

    // Wire errors
    #[error("Truncated packet: expected {expected} bytes, got {actual}")]
    TruncatedPacket { expected: usize, actual: usize },

    #[error("Checksum mismatch: header says {expected:#010x}, payload is {actual:#010x}")]
    ChecksumMismatch { expected: u32, actual: u32 },

    #[error("Invalid magic bytes: {0:02x?}")]
    InvalidMagic([u8; 4]),

    #[error("Unknown format")]
    UnknownFormat,

    #[error("Unsupported protocol version: {got:#06x}, newest supported {supported:#06x}")]
    UnsupportedVersion { got: u16, supported: u16 },

    #[error("Unsupported packet flags: {0:#04x}")]
    UnsupportedFlags(u8),

    #[error("Unexpected packet type: expected {expected}, got {actual}")]
    UnexpectedPacketType { expected: u8, actual: u8 },

    #[error("Packet too large: {size} > {max}")]
    PacketTooLarge { size: usize, max: usize },

    // Payload errors
    #[error("Decompression failed: {0}")]
    DecompressionFailure(String),

    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    #[error("Unknown {kind} value: {value}")]
    UnknownEnumValue { kind: &'static str, value: i64 },

    // Configuration errors
    #[error("Invalid configuration for {field}: {reason}")]
    Config { field: String, reason: String },
}

impl FbipError {
    pub fn malformed(reason: impl Into<String>) -> Self {
        FbipError::MalformedPayload(reason.into())
    }

    pub fn config(field: impl Into<String>, reason: impl Into<String>) -> Self {
        FbipError::Config {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Integrity failures mean the packet must be dropped as a whole
    pub fn is_integrity_failure(&self) -> bool {
        matches!(
            self,
            FbipError::ChecksumMismatch { .. }
                | FbipError::TruncatedPacket { .. }
                | FbipError::InvalidMagic(_)
        )
    }
}

/// Result type for FBIP operations
pub type FbipResult<T> = Result<T, FbipError>;
