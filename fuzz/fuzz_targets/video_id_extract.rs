//! Fuzz target for video id extraction
//!
//! # Strategy
//!
//! - Random text: arbitrary strings, including multi-line and non-ASCII input
//! - Marker soup: known URL markers glued to arbitrary tails
//!
//! # Invariants
//!
//! - NEVER panic on any input
//! - An extracted id is exactly 11 characters with no `#`, `&` or `?`
//! - `embed_url_for` is empty iff parsing fails

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use livecast_core::{VideoId, video::embed_url_for};

const MARKERS: [&str; 6] = ["youtu.be/", "v/", "embed/", "watch?v=", "&v=", "u/x/"];

#[derive(Debug, Arbitrary)]
enum Input {
    Raw(String),
    Marked { prefix: String, marker: u8, tail: String },
}

fuzz_target!(|input: Input| {
    let text = match input {
        Input::Raw(text) => text,
        Input::Marked { prefix, marker, tail } => {
            format!("{prefix}{}{tail}", MARKERS[usize::from(marker) % MARKERS.len()])
        }
    };

    let parsed = VideoId::parse(&text);
    let embed = embed_url_for(&text);
    assert_eq!(parsed.is_none(), embed.is_empty());

    if let Some(id) = parsed {
        assert_eq!(id.as_str().chars().count(), 11);
        assert!(!id.as_str().contains(['#', '&', '?']));
        assert_eq!(id.embed_url(), embed);
    }
});
