//! Fuzz target for the controller state machine
//!
//! # Strategy
//!
//! - Interleave user entry points, poll results and write completions
//! - Poll results name arbitrary streamers, URLs and live flags
//!
//! # Invariants
//!
//! - NEVER panic
//! - Broadcasting implies a non-empty embed derived from the requested URL
//! - The like flag never turns off
//! - Polling runs iff an embed is active

#![no_main]

use std::collections::VecDeque;

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use livecast_core::{
    Controller, ControllerAction, ControllerConfig, ControllerEvent, CurrentStream,
    RemoteSnapshot, StoreError, StoreRequest, StoreWrite, WriteReply, video::embed_url_for,
};

const URLS: [&str; 3] = [
    "https://youtu.be/dQw4w9WgXcQ",
    "https://www.youtube.com/watch?v=9bZkp7q5g0M",
    "https://example.com/",
];
const VIEWERS: [&str; 2] = ["0xa", "0xb"];

#[derive(Debug, Arbitrary)]
enum Op {
    SetUrl(u8),
    SetRawUrl(String),
    Watch(u8),
    Toggle,
    Like,
    Send(String),
    Connect(bool),
    Poll { url: u8, streamer: u8, live: bool, likes: Option<u64> },
    PollFails,
    Complete(bool),
}

fuzz_target!(|ops: Vec<Op>| {
    let mut controller = Controller::new(ControllerConfig::default());
    let mut queue: VecDeque<StoreWrite> = VecDeque::new();
    let mut liked = false;

    let _ = controller.set_viewer_id(Some(VIEWERS[0].into()));
    for op in ops.into_iter().take(256) {
        let actions = match op {
            Op::SetUrl(i) => controller.set_requested_url(URLS[usize::from(i) % URLS.len()]),
            Op::SetRawUrl(raw) => controller.set_requested_url(&raw),
            Op::Watch(i) => controller.watch_stream(URLS[usize::from(i) % URLS.len()]),
            Op::Toggle => controller.toggle_broadcast(),
            Op::Like => controller.like(),
            Op::Send(text) => controller.send_message(&text),
            Op::Connect(on) => controller.set_viewer_id(on.then(|| VIEWERS[0].to_owned())),
            Op::Poll { url, streamer, live, likes } => {
                let tick = controller.handle(ControllerEvent::Tick);
                match tick.iter().find_map(|a| match a {
                    ControllerAction::Fetch { generation } => Some(*generation),
                    _ => None,
                }) {
                    Some(generation) => controller.handle(ControllerEvent::SnapshotFetched {
                        generation,
                        snapshot: RemoteSnapshot {
                            likes,
                            current_stream: Some(CurrentStream {
                                url: URLS[usize::from(url) % URLS.len()].into(),
                                title: String::new(),
                                streamer_id: VIEWERS[usize::from(streamer) % VIEWERS.len()].into(),
                                is_live: live,
                            }),
                            ..RemoteSnapshot::default()
                        },
                    }),
                    None => tick,
                }
            }
            Op::PollFails => {
                let tick = controller.handle(ControllerEvent::Tick);
                match tick.iter().find_map(|a| match a {
                    ControllerAction::Fetch { generation } => Some(*generation),
                    _ => None,
                }) {
                    Some(generation) => controller.handle(ControllerEvent::FetchFailed {
                        generation,
                        error: StoreError::Transport("fuzz".into()),
                    }),
                    None => tick,
                }
            }
            Op::Complete(ok) => match queue.pop_front() {
                Some(write) if ok => {
                    let reply = match write.request {
                        StoreRequest::View => WriteReply::Views { success: true, views: Some(1) },
                        _ => WriteReply::Ack,
                    };
                    controller.handle(ControllerEvent::WriteSucceeded { write, reply })
                }
                Some(write) => controller.handle(ControllerEvent::WriteFailed {
                    write,
                    error: StoreError::Rejected("fuzz".into()),
                }),
                None => Vec::new(),
            },
        };
        queue.extend(actions.into_iter().filter_map(|action| match action {
            ControllerAction::Write(write) => Some(write),
            _ => None,
        }));

        let session = controller.session();
        if session.is_broadcasting {
            assert!(!session.active_embed_url.is_empty());
            assert_eq!(session.active_embed_url, embed_url_for(&session.requested_url));
        }
        assert!(!liked || session.has_liked_this_slot);
        liked = session.has_liked_this_slot;
        assert_eq!(controller.is_polling(), !session.active_embed_url.is_empty());
    }
});
