#![no_main]

use fbip_codec::{detect, CodecSet};
use fbip_core::FbipError;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let codecs = CodecSet::default();
    let detected = detect(data);

    if let Ok((format, decoded)) = codecs.decode_auto(data) {
        assert_eq!(detected, Ok(format));

        // Anything that decodes encodes again in its own format and survives
        // a second trip, unless the re-encoding outgrows a packet
        let codec = codecs.get(format);
        match codec.encode(&decoded.event) {
            Ok(encoded) => {
                let again = codec.decode(&encoded.bytes);
                assert!(
                    matches!(&again, Ok(d) if d.event.approx_eq(&decoded.event, 1e-5)),
                    "{:?}",
                    again.map(|d| d.event)
                );
            }
            Err(e) => assert!(matches!(e, FbipError::PacketTooLarge { .. }), "{}", e),
        }
    }

    if let Ok(packet) = fbip_wire::unframe(data) {
        assert!(packet.size() <= data.len());
        assert_eq!(fbip_wire::checksum(packet.payload), packet.header.checksum);
    }
});
