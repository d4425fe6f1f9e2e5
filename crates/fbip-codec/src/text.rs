//! Plain-text codec
//!
//! `{"protocol_version": "FBIP_v2.0", "format": "text", "event": {...}}`
//! with float arrays as plain JSON numbers.

use fbip_core::{parse_version_tag, version_tag, Event, FbipError, FbipResult, PROTOCOL_VERSION};
use serde::{Deserialize, Serialize};

use crate::compact::CompactEvent;
use crate::{check_size, Codec, Decoded, Encoded, Format};

/// Value of the wrapper's `format` key
pub const TEXT_FORMAT_TAG: &str = "text";

type TextEvent = CompactEvent<Vec<f32>>;

#[derive(Serialize, Deserialize)]
struct TextEnvelope {
    protocol_version: String,
    format: String,
    event: TextEvent,
}

/// Header keys only; used by the detector
#[derive(Deserialize)]
pub(crate) struct TextProbe {
    #[allow(dead_code)]
    pub protocol_version: String,
    #[allow(dead_code)]
    pub format: String,
}

/// Plain-text codec
#[derive(Clone, Copy, Debug, Default)]
pub struct TextCodec;

impl Codec for TextCodec {
    fn format(&self) -> Format {
        Format::Text
    }

    fn encode(&self, event: &Event) -> FbipResult<Encoded> {
        let envelope = TextEnvelope {
            protocol_version: version_tag(),
            format: TEXT_FORMAT_TAG.to_string(),
            event: TextEvent::from_event(event),
        };
        let bytes = serde_json::to_vec(&envelope)
            .map_err(|e| FbipError::malformed(format!("json encode: {}", e)))?;
        check_size(bytes.len())?;
        Ok(Encoded {
            bytes,
            compression: None,
        })
    }

    fn decode(&self, bytes: &[u8]) -> FbipResult<Decoded> {
        check_size(bytes.len())?;
        let envelope: TextEnvelope = serde_json::from_slice(bytes)
            .map_err(|e| FbipError::malformed(format!("json decode: {}", e)))?;

        let version = parse_version_tag(&envelope.protocol_version).ok_or_else(|| {
            FbipError::malformed(format!(
                "bad protocol_version {:?}",
                envelope.protocol_version
            ))
        })?;
        if version > PROTOCOL_VERSION {
            return Err(FbipError::UnsupportedVersion {
                got: version,
                supported: PROTOCOL_VERSION,
            });
        }
        if envelope.format != TEXT_FORMAT_TAG {
            return Err(FbipError::malformed(format!(
                "unexpected format tag {:?}",
                envelope.format
            )));
        }

        let (event, fallbacks) = envelope.event.into_event()?;
        Ok(Decoded {
            event,
            fallbacks,
            compression: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fbip_core::{QuantumState, SignalType};

    fn quantum_event() -> Event {
        Event::builder("fbip_00000001_0001")
            .timestamp(1_700_000_000.123_456)
            .signal(SignalType::GammaSync)
            .quantum_state(Some(
                QuantumState::new(vec![0.6, 0.8], vec![0.1, 3.0], 2.0, vec![], "consciousness")
                    .unwrap(),
            ))
            .build()
    }

    #[test]
    fn test_text_wrapper_shape() {
        let encoded = TextCodec.encode(&quantum_event()).unwrap();
        let json: serde_json::Value = serde_json::from_slice(&encoded.bytes).unwrap();

        assert_eq!(json["protocol_version"], "FBIP_v2.0");
        assert_eq!(json["format"], "text");
        assert_eq!(json["event"]["st"], 4);
        assert!(json["event"]["qs"]["a"].is_array());
        assert!(json["event"].get("mp").is_none());
    }

    #[test]
    fn test_text_roundtrip_exact() {
        let event = quantum_event();
        let encoded = TextCodec.encode(&event).unwrap();
        let decoded = TextCodec.decode(&encoded.bytes).unwrap();
        assert_eq!(decoded.event, event);
    }

    #[test]
    fn test_newer_version_rejected() {
        let encoded = TextCodec.encode(&quantum_event()).unwrap();
        let text = String::from_utf8(encoded.bytes)
            .unwrap()
            .replace("FBIP_v2.0", "FBIP_v3.0");
        assert!(matches!(
            TextCodec.decode(text.as_bytes()),
            Err(FbipError::UnsupportedVersion { got: 0x0300, .. })
        ));
    }

    #[test]
    fn test_invalid_json_is_malformed() {
        assert!(matches!(
            TextCodec.decode(b"{\"protocol_version\": 1}"),
            Err(FbipError::MalformedPayload(_))
        ));
    }
}
