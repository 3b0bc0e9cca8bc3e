//! Fuzz target for socket URL derivation
//!
//! # Invariants
//!
//! - Derivation never panics on any parseable page URL
//! - A derived URL always uses `ws` or `wss`, `wss` exactly for `https` pages
//! - The derived path always ends with the socket suffix

#![no_main]

use libfuzzer_sys::fuzz_target;
use runwire_core::{SOCKET_PATH_SUFFIX, Url, socket_url};

fuzz_target!(|data: &[u8]| {
    let Ok(raw) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(page) = Url::parse(raw) else {
        return;
    };

    if let Ok(socket) = socket_url(&page) {
        let expected = if page.scheme() == "https" { "wss" } else { "ws" };
        assert_eq!(socket.scheme(), expected);
        assert!(socket.path().ends_with(SOCKET_PATH_SUFFIX));
    }
});
