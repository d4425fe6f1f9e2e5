//! Identity types for FBIP protocol
//!
//! Session ids are opaque strings (128 random bits, hex encoded, when
//! generated locally). Event ids combine the session sequence number with
//! the low 16 bits of the wall clock in milliseconds.

use std::fmt;

use rand::RngCore;

/// Session identity - opaque, chosen once per protocol instance
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct SessionId(String);

impl SessionId {
    pub fn new(id: impl Into<String>) -> Self {
        SessionId(id.into())
    }

    /// Generate a random 128-bit session id
    pub fn generate() -> Self {
        let mut bytes = [0u8; 16];
        rand::thread_rng().fill_bytes(&mut bytes);
        let hex: String = bytes.iter().map(|b| format!("{:02x}", b)).collect();
        SessionId(hex)
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Session({})", self.0)
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Build an event id: `fbip_<sequence:08x>_<millis & 0xFFFF:04x>`
///
/// The sequence component alone is unique within a session until the
/// counter wraps at 2^32.
pub fn event_id(sequence: u32, unix_millis: u64) -> String {
    format!("fbip_{:08x}_{:04x}", sequence, unix_millis & 0xFFFF)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_id_format() {
        assert_eq!(event_id(0x2a, 0x1234_5678), "fbip_0000002a_5678");
        assert_eq!(event_id(u32::MAX, 0), "fbip_ffffffff_0000");
    }

    #[test]
    fn test_event_ids_distinct_per_sequence() {
        let a = event_id(1, 1000);
        let b = event_id(2, 1000);
        assert_ne!(a, b);
    }

    #[test]
    fn test_session_id_generate() {
        let a = SessionId::generate();
        let b = SessionId::generate();
        assert_eq!(a.as_str().len(), 32);
        assert!(a.as_str().chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }

    #[test]
    fn test_session_id_display() {
        let id = SessionId::new("test_session");
        assert_eq!(id.to_string(), "test_session");
        assert_eq!(format!("{:?}", id), "Session(test_session)");
    }
}
