//! Fuzz target for InboundFrame::decode
//!
//! Feeds arbitrary text to the frame decoder and, for anything that decodes,
//! checks that re-encoding produces a payload that decodes to the same frame.
//!
//! The fuzzer should NEVER panic. All invalid inputs should return an error.

#![no_main]

use inkwell_proto::InboundFrame;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    if let Ok(frame) = InboundFrame::decode(text) {
        let encoded = frame.encode().expect("decoded frame must encode");
        let again = InboundFrame::decode(&encoded).expect("encoded frame must decode");
        assert_eq!(frame.kind(), again.kind());
    }
});
