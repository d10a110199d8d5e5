//! Takeover and handoff scenarios between viewers sharing one store.
//!
//! Each test drives viewers step by step with `SimViewer`, so the order in
//! which polls and writes reach the store is fixed.

use livecast_core::{
    ActionError, Alert, Controller, ControllerConfig, StoreRequest, WritePurpose,
    video::embed_url_for,
};
use livecast_harness::{InvariantRegistry, SimStore, SimViewer, SystemSnapshot};

const V1: &str = "https://youtu.be/dQw4w9WgXcQ";
const V2: &str = "https://www.youtube.com/watch?v=9bZkp7q5g0M";

fn claim_writes(viewer: &SimViewer) -> usize {
    viewer
        .issued()
        .iter()
        .filter(|w| matches!(w.request, StoreRequest::StartStream { .. }))
        .count()
}

/// A is live with V1, B is watching V2.
fn owner_and_follower() -> (SimStore, SimViewer, SimViewer) {
    let store = SimStore::new();
    let mut a = SimViewer::new("0xa", store.clone());
    let mut b = SimViewer::new("0xb", store.clone());

    a.act(|c| c.set_requested_url(V1));
    a.act(Controller::toggle_broadcast);
    a.flush();

    b.act(|c| c.set_requested_url(V2));
    b.flush();

    (store, a, b)
}

#[test]
fn follower_adopts_live_stream() {
    let (store, a, mut b) = owner_and_follower();
    assert!(b.poll());

    let session = b.session();
    assert!(session.is_broadcasting);
    assert!(!session.is_owner);
    assert_eq!(session.requested_url, V1);
    assert_eq!(session.active_embed_url, embed_url_for(V1));
    assert_eq!(claim_writes(&b), 0);

    let snapshot = SystemSnapshot::capture(&[a, b], &store);
    InvariantRegistry::standard().assert_all(&snapshot, "after adoption");
    insta::assert_json_snapshot!(snapshot, @r#"
    {
      "viewers": [
        {
          "id": "0xa",
          "is_owner": true,
          "is_broadcasting": true,
          "requested_url": "https://youtu.be/dQw4w9WgXcQ",
          "active_embed_url": "https://www.youtube.com/embed/dQw4w9WgXcQ?autoplay=1&controls=0&modestbranding=1&rel=0&showinfo=0",
          "polling": true
        },
        {
          "id": "0xb",
          "is_owner": false,
          "is_broadcasting": true,
          "requested_url": "https://youtu.be/dQw4w9WgXcQ",
          "active_embed_url": "https://www.youtube.com/embed/dQw4w9WgXcQ?autoplay=1&controls=0&modestbranding=1&rel=0&showinfo=0",
          "polling": true
        }
      ],
      "slot": {
        "url": "https://youtu.be/dQw4w9WgXcQ",
        "title": "Live Stream",
        "streamerAddress": "0xa",
        "isLive": true
      }
    }
    "#);
}

#[test]
fn owner_end_stops_followers() {
    let (store, mut a, mut b) = owner_and_follower();
    b.poll();

    a.act(Controller::toggle_broadcast);
    a.flush();
    assert!(!store.current_stream().unwrap().is_live);

    b.poll();
    let session = b.session();
    assert!(!session.is_broadcasting);
    assert!(session.active_embed_url.is_empty());
    assert!(!b.controller().is_polling());

    // Followers never try to keep someone else's slot alive.
    b.poll();
    assert_eq!(claim_writes(&b), 0);
    assert!(store.requests().iter().all(|r| match r {
        StoreRequest::StartStream { user_address, .. } => user_address == "0xa",
        _ => true,
    }));
}

#[test]
fn follower_cannot_end_someone_elses_stream() {
    let (_store, _a, mut b) = owner_and_follower();
    b.poll();

    b.act(Controller::toggle_broadcast);

    assert_eq!(b.alerts(), [Alert::Rejected(ActionError::NotOwner)]);
    assert!(b.session().is_broadcasting);
    assert_eq!(b.pending_writes(), 0);
}

#[test]
fn claim_on_taken_slot_rolls_back() {
    let (store, _a, mut b) = owner_and_follower();

    b.act(Controller::toggle_broadcast);
    assert!(b.session().is_owner);
    b.flush();

    let session = b.session();
    assert!(!session.is_broadcasting);
    assert!(!session.is_owner);
    assert!(session.active_embed_url.is_empty());
    assert_eq!(b.alerts(), [Alert::BroadcastFailed { reason: "0xa is already live".into() }]);
    assert_eq!(store.current_stream().unwrap().streamer_id, "0xa");
}

#[test]
fn transport_failure_on_claim_rolls_back() {
    let store = SimStore::new();
    let mut a = SimViewer::new("0xa", store.clone());
    a.act(|c| c.set_requested_url(V1));
    a.flush();

    store.fail_next_writes(1);
    a.act(Controller::toggle_broadcast);
    a.flush();

    assert!(!a.session().is_broadcasting);
    assert!(matches!(a.alerts(), [Alert::BroadcastFailed { .. }]));
    assert_eq!(store.current_stream(), None);
}

#[test]
fn server_count_overrides_optimistic_like() {
    let (store, _a, mut b) = owner_and_follower();
    store.set_likes(41);
    b.poll();
    assert_eq!(b.session().displayed_like_count, 41);

    b.act(Controller::like);
    assert_eq!(b.session().displayed_like_count, 42);
    assert!(b.session().like_count_provisional);

    store.set_likes(7);
    b.poll();

    let session = b.session();
    assert_eq!(session.displayed_like_count, 7);
    assert!(!session.like_count_provisional);
    assert!(session.has_liked_this_slot);
}

#[test]
fn like_is_counted_once_across_retries() {
    let (store, _a, mut b) = owner_and_follower();

    b.act(Controller::like);
    b.act(Controller::like);
    b.flush();
    b.poll();

    assert_eq!(store.snapshot().likes, Some(1));
    assert_eq!(b.issued().iter().filter(|w| w.purpose == WritePurpose::Like).count(), 1);
}

#[test]
fn owner_restores_lost_slot() {
    let (store, mut a, mut b) = owner_and_follower();
    b.poll();

    store.drop_live_flag();
    a.step();

    let stream = store.current_stream().unwrap();
    assert!(stream.is_live);
    assert_eq!(stream.streamer_id, "0xa");
    assert!(a.issued().iter().any(|w| w.purpose == WritePurpose::Reassert));

    b.poll();
    assert!(b.session().is_broadcasting);
    assert_eq!(claim_writes(&b), 0);
}

#[test]
fn follower_stops_if_it_sees_the_gap_first() {
    let (store, mut a, mut b) = owner_and_follower();
    b.poll();

    store.drop_live_flag();
    b.poll();
    assert!(!b.session().is_broadcasting);

    a.step();
    assert!(store.current_stream().unwrap().is_live);
    assert_eq!(claim_writes(&b), 0);
}

#[test]
fn bounded_reassert_alerts_once() {
    let store = SimStore::new();
    let config = ControllerConfig { reassert_limit: Some(2), ..ControllerConfig::default() };
    let mut a = SimViewer::with_config("0xa", store.clone(), config);
    a.act(|c| c.set_requested_url(V1));
    a.act(Controller::toggle_broadcast);
    a.flush();

    store.drop_live_flag();
    store.fail_next_writes(10);
    for _ in 0..5 {
        a.step();
    }

    let reasserts = a.issued().iter().filter(|w| w.purpose == WritePurpose::Reassert).count();
    assert_eq!(reasserts, 2);
    assert_eq!(a.alerts(), [Alert::ReassertAbandoned { attempts: 2 }]);
    assert!(a.session().is_broadcasting);
}

#[test]
fn handoff_to_next_streamer() {
    let (store, mut a, mut b) = owner_and_follower();
    b.poll();

    a.act(Controller::toggle_broadcast);
    a.flush();
    b.poll();

    b.act(|c| c.set_requested_url(V2));
    b.act(Controller::toggle_broadcast);
    b.flush();
    assert_eq!(store.current_stream().unwrap().streamer_id, "0xb");

    a.act(|c| c.set_requested_url(V1));
    a.flush();
    a.poll();

    let session = a.session();
    assert!(session.is_broadcasting);
    assert!(!session.is_owner);
    assert_eq!(session.requested_url, V2);

    let snapshot = SystemSnapshot::capture(&[a, b], &store);
    InvariantRegistry::standard().assert_all(&snapshot, "after handoff");
}

#[test]
fn chat_shows_up_on_next_poll() {
    let (_store, mut a, mut b) = owner_and_follower();

    b.act(|c| c.send_message("  gm  "));
    assert!(b.session().chat_history.is_empty());
    b.flush();

    a.poll();
    let chat = &a.session().chat_history;
    assert_eq!(chat.len(), 1);
    assert_eq!(chat[0].author, "0xb");
    assert_eq!(chat[0].text, "gm");
}

#[test]
fn view_registered_once_per_embed() {
    let store = SimStore::new();
    let mut b = SimViewer::new("0xb", store.clone());

    b.act(|c| c.set_requested_url(V1));
    b.act(|c| c.set_requested_url(""));
    b.act(|c| c.set_requested_url(V1));
    b.act(|c| c.set_requested_url(V2));
    b.flush();

    let views = b.issued().iter().filter(|w| w.request == StoreRequest::View).count();
    assert_eq!(views, 1);
    assert_eq!(store.snapshot().views, Some(1));
}

#[test]
fn failed_polls_keep_last_state() {
    let (store, _a, mut b) = owner_and_follower();
    b.poll();
    let before = b.session().clone();

    store.fail_next_fetches(3);
    for _ in 0..3 {
        assert!(b.poll());
    }

    assert_eq!(b.session(), &before);
    assert!(b.controller().is_polling());
}
