//! FBIP Core - Fundamental types and primitives
//!
//! This crate defines the types shared by every layer of the protocol:
//! - Identifiers (SessionId, event id generation)
//! - Closed wire enums (SignalType, ActionType, Network, Priority)
//! - The schema-less parameter value type
//! - The Event record and its clamping builder
//! - The event factory for semi-structured input
//! - Protocol constants and the error taxonomy

pub mod class;
pub mod error;
pub mod event;
pub mod factory;
pub mod id;
pub mod time;
pub mod value;

pub use class::*;
pub use error::*;
pub use event::*;
pub use factory::*;
pub use id::*;
pub use time::*;
pub use value::*;

/// Protocol magic constant, first four bytes of every framed packet
pub const PROTOCOL_MAGIC: [u8; 4] = *b"FBIP";

/// Protocol major version
pub const VERSION_MAJOR: u8 = 2;

/// Protocol minor version
pub const VERSION_MINOR: u8 = 0;

/// Protocol version as carried on the wire: `major << 8 | minor`
pub const PROTOCOL_VERSION: u16 = ((VERSION_MAJOR as u16) << 8) | VERSION_MINOR as u16;

/// Upper bound for any encoded packet, and for inflated payloads
pub const MAX_PACKET_SIZE: usize = 64 * 1024;

/// Default compression threshold in bytes
pub const DEFAULT_COMPRESSION_THRESHOLD: usize = 512;

/// Textual protocol version tag, e.g. `FBIP_v2.0`
pub fn version_tag() -> String {
    format!("FBIP_v{}.{}", VERSION_MAJOR, VERSION_MINOR)
}

/// Parse a textual version tag back into its wire form
pub fn parse_version_tag(tag: &str) -> Option<u16> {
    let rest = tag.strip_prefix("FBIP_v")?;
    let (major, minor) = rest.split_once('.')?;
    let major: u8 = major.parse().ok()?;
    let minor: u8 = minor.parse().ok()?;
    Some(((major as u16) << 8) | minor as u16)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_constants() {
        assert_eq!(PROTOCOL_VERSION, 0x0200);
        assert_eq!(version_tag(), "FBIP_v2.0");
    }

    #[test]
    fn test_version_tag_parse() {
        assert_eq!(parse_version_tag("FBIP_v2.0"), Some(0x0200));
        assert_eq!(parse_version_tag("FBIP_v3.1"), Some(0x0301));
        assert_eq!(parse_version_tag("FBIP_2.0"), None);
        assert_eq!(parse_version_tag("FBIP_vx.0"), None);
    }
}
