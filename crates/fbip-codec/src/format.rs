//! Serialization formats

use std::fmt;
use std::str::FromStr;

use fbip_core::{FbipError, FbipResult};
use serde::{Deserialize, Serialize};

/// Wire representation of an event
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    /// JSON wrapper, human readable
    Text,
    /// MessagePack compact map in a framed packet
    #[default]
    Binary,
    /// MessagePack compact map, no header
    Raw,
    /// Framed packet, payload zlib-compressed above a threshold
    Compressed,
}

impl Format {
    pub const ALL: [Format; 4] = [
        Format::Text,
        Format::Binary,
        Format::Raw,
        Format::Compressed,
    ];

    /// Stable name used in configuration and metrics
    pub fn name(self) -> &'static str {
        match self {
            Format::Text => "text",
            Format::Binary => "binary",
            Format::Raw => "raw",
            Format::Compressed => "compressed",
        }
    }

    /// Does the encoded form start with a packet header?
    pub fn is_framed(self) -> bool {
        matches!(self, Format::Binary | Format::Compressed)
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Format {
    type Err = FbipError;

    fn from_str(s: &str) -> FbipResult<Self> {
        Format::ALL
            .into_iter()
            .find(|f| f.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| FbipError::config("format", format!("unknown format {:?}", s)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_roundtrip() {
        for format in Format::ALL {
            assert_eq!(format.name().parse::<Format>(), Ok(format));
        }
        assert_eq!("BINARY".parse::<Format>(), Ok(Format::Binary));
        assert!("xml".parse::<Format>().is_err());
    }

    #[test]
    fn test_serde_uses_names() {
        let json = serde_json::to_string(&Format::Compressed).unwrap();
        assert_eq!(json, "\"compressed\"");
        let back: Format = serde_json::from_str("\"raw\"").unwrap();
        assert_eq!(back, Format::Raw);
    }

    #[test]
    fn test_framed_formats() {
        assert!(Format::Binary.is_framed());
        assert!(Format::Compressed.is_framed());
        assert!(!Format::Text.is_framed());
        assert!(!Format::Raw.is_framed());
    }
}
