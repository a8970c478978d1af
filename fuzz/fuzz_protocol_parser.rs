//! Fuzz target for the hddtemp reply parser.
//!
//! Run with: cargo +nightly fuzz run fuzz_protocol_parser
//!
//! This exercises `parse_reply()` with arbitrary byte sequences to find
//! panics or hangs in the framing and record decoding.

#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        // We don't care about the result — just that it doesn't panic
        let _ = sensorex_core::hddtemp::protocol::parse_reply(s);
    }
});
