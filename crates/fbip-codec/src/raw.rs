//! Raw-compact codec: the MessagePack compact map with no header

use fbip_core::{Event, FbipResult};

use crate::compact::{from_msgpack, to_msgpack};
use crate::{check_size, Codec, Decoded, Encoded, Format};

/// Raw-compact codec
#[derive(Clone, Copy, Debug, Default)]
pub struct RawCodec;

impl Codec for RawCodec {
    fn format(&self) -> Format {
        Format::Raw
    }

    fn encode(&self, event: &Event) -> FbipResult<Encoded> {
        let bytes = to_msgpack(event)?;
        check_size(bytes.len())?;
        Ok(Encoded {
            bytes,
            compression: None,
        })
    }

    fn decode(&self, bytes: &[u8]) -> FbipResult<Decoded> {
        check_size(bytes.len())?;
        let (event, fallbacks) = from_msgpack(bytes)?;
        Ok(Decoded {
            event,
            fallbacks,
            compression: None,
        })
    }
}
