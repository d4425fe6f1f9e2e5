#![no_main]

use fbip_runtime::Protocol;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let protocol = Protocol::default();
    let before = protocol.sequence();

    let _ = protocol.receive(data);

    // Every call is counted exactly once, success or failure
    assert_eq!(protocol.sequence(), before.wrapping_add(1));
    assert_eq!(protocol.stats().total_calls, 1);
});
