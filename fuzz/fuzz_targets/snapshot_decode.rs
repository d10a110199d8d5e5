//! Fuzz target for remote store payload decoding
//!
//! # Strategy
//!
//! - Random bytes as a state blob
//! - Random bytes as the reply to each kind of write
//!
//! # Invariants
//!
//! - NEVER panic on malformed JSON
//! - A decoded snapshot re-encodes and decodes to itself

#![no_main]

use libfuzzer_sys::fuzz_target;
use livecast_core::{RemoteSnapshot, StoreRequest};

fuzz_target!(|body: &[u8]| {
    if let Ok(snapshot) = RemoteSnapshot::from_json(body) {
        let encoded = serde_json::to_vec(&snapshot).expect("snapshot encodes");
        let decoded = RemoteSnapshot::from_json(&encoded).expect("snapshot re-decodes");
        assert_eq!(decoded, snapshot);
    }

    let requests = [
        StoreRequest::View,
        StoreRequest::Like { user_address: "0xa".into() },
        StoreRequest::Chat { message: "gm".into(), user_address: None },
        StoreRequest::StartStream {
            url: "https://youtu.be/dQw4w9WgXcQ".into(),
            title: "Live Stream".into(),
            user_address: "0xa".into(),
        },
        StoreRequest::EndStream { user_address: "0xa".into() },
    ];
    for request in requests {
        let _ = request.decode_reply(body);
    }
});
