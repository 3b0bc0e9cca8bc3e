//! Fuzz target for envelope decoding
//!
//! Feeds arbitrary text to both decoders to find:
//! - Parser panics on malformed JSON
//! - Deeply nested input blowing the stack
//! - Inputs that decode but cannot be encoded again
//!
//! The fuzzer should NEVER panic. All invalid inputs should return an error.

#![no_main]

use libfuzzer_sys::fuzz_target;
use runwire_proto::{ClientMessage, ServerMessage};

fuzz_target!(|data: &[u8]| {
    let Ok(raw) = std::str::from_utf8(data) else {
        return;
    };

    if let Ok(message) = ServerMessage::decode(raw) {
        // Anything the client accepts can be put back on the wire
        assert!(message.encode().is_ok());
    }
    let _ = ClientMessage::decode(raw);
});
