//! Runtime integration tests against the simulated store.
//!
//! Time is paused, so poll intervals and store latency advance
//! deterministically whenever every task is idle.

use std::time::Duration;

use livecast_app::{Command, Runtime, RuntimeConfig, RuntimeError, SessionHandle};
use livecast_core::{ActionError, Alert, ControllerConfig, LocalSession, StoreRequest};
use livecast_harness::{Faults, SimStore};

const V1: &str = "https://youtu.be/dQw4w9WgXcQ";
const V2: &str = "https://www.youtube.com/watch?v=9bZkp7q5g0M";

fn spawn(store: &SimStore) -> (tokio::task::JoinHandle<()>, SessionHandle) {
    let (runtime, handle) =
        Runtime::new(store.clone(), ControllerConfig::default(), RuntimeConfig::default());
    (tokio::spawn(runtime.run()), handle)
}

async fn wait_for(
    handle: &mut SessionHandle,
    predicate: impl Fn(&LocalSession) -> bool,
) -> LocalSession {
    tokio::time::timeout(Duration::from_secs(30), async {
        loop {
            let session = handle.changed().await.unwrap();
            if predicate(&session) {
                return session;
            }
        }
    })
    .await
    .unwrap()
}

fn start(viewer: &str, url: &str) -> StoreRequest {
    StoreRequest::StartStream {
        url: url.into(),
        title: "Live Stream".into(),
        user_address: viewer.into(),
    }
}

#[tokio::test(start_paused = true)]
async fn adopts_remote_stream() {
    let store = SimStore::new();
    store.write(start("0xa", V1)).unwrap();
    let (task, mut handle) = spawn(&store);

    handle.send(Command::SetViewer(Some("0xb".into()))).await.unwrap();
    handle.send(Command::SetRequestedUrl(V2.into())).await.unwrap();

    let session = wait_for(&mut handle, |s| s.is_broadcasting).await;
    assert!(!session.is_owner);
    assert_eq!(session.requested_url, V1);

    handle.stop_handle().stop();
    task.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn polls_once_per_interval_while_embed_is_set() {
    let store = SimStore::new();
    let (task, handle) = spawn(&store);

    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(store.fetch_count(), 0);

    handle.send(Command::SetRequestedUrl(V1.into())).await.unwrap();
    tokio::time::sleep(Duration::from_millis(5500)).await;
    let fetches = store.fetch_count();
    assert!((5..=7).contains(&fetches), "fetches: {fetches}");

    handle.send(Command::SetRequestedUrl(String::new())).await.unwrap();
    tokio::time::sleep(Duration::from_millis(10)).await;
    let stopped_at = store.fetch_count();
    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(store.fetch_count(), stopped_at);

    handle.stop_handle().stop();
    task.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn slow_store_never_overlaps_polls() {
    let store = SimStore::new();
    store.set_faults(Faults { latency: Duration::from_millis(2500), ..Faults::default() });
    let (task, handle) = spawn(&store);

    handle.send(Command::SetRequestedUrl(V1.into())).await.unwrap();
    tokio::time::sleep(Duration::from_secs(10)).await;

    // 1s interval, 2.5s responses: ticks that land mid-flight are skipped.
    let fetches = store.fetch_count();
    assert!((2..=4).contains(&fetches), "fetches: {fetches}");

    handle.stop_handle().stop();
    task.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn view_join_updates_count() {
    let store = SimStore::new();
    store.write(StoreRequest::View).unwrap();
    let (task, mut handle) = spawn(&store);

    handle.send(Command::SetRequestedUrl(V1.into())).await.unwrap();
    let session = wait_for(&mut handle, |s| s.displayed_view_count == 2).await;
    assert!(!session.active_embed_url.is_empty());
    assert_eq!(store.snapshot().views, Some(2));

    handle.stop_handle().stop();
    task.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn claim_and_release_slot() {
    let store = SimStore::new();
    let (task, mut handle) = spawn(&store);

    handle.send(Command::SetViewer(Some("0xa".into()))).await.unwrap();
    handle.send(Command::SetTitle("Launch".into())).await.unwrap();
    handle.send(Command::SetRequestedUrl(V1.into())).await.unwrap();
    handle.send(Command::ToggleBroadcast).await.unwrap();
    wait_for(&mut handle, |s| s.is_broadcasting && s.is_owner).await;

    tokio::time::sleep(Duration::from_secs(3)).await;
    let stream = store.current_stream().unwrap();
    assert!(stream.is_live);
    assert_eq!(stream.title, "Launch");
    assert!(handle.view().is_owner);

    handle.send(Command::ToggleBroadcast).await.unwrap();
    wait_for(&mut handle, |s| !s.is_broadcasting).await;
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert!(!store.current_stream().unwrap().is_live);

    handle.stop_handle().stop();
    task.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn failed_claim_raises_alert() {
    let store = SimStore::new();
    store.write(start("0xa", V1)).unwrap();
    let (task, mut handle) = spawn(&store);

    handle.send(Command::SetViewer(Some("0xb".into()))).await.unwrap();
    handle.send(Command::SetRequestedUrl(V2.into())).await.unwrap();
    handle.send(Command::ToggleBroadcast).await.unwrap();

    let alert = handle.next_alert().await.unwrap();
    assert_eq!(alert, Alert::BroadcastFailed { reason: "0xa is already live".into() });

    // Once rolled back the viewer is not polling, so the live slot is not adopted.
    tokio::time::sleep(Duration::from_secs(3)).await;
    let session = handle.view();
    assert!(!session.is_broadcasting);
    assert!(!session.is_owner);

    handle.stop_handle().stop();
    task.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn unauthenticated_actions_alert() {
    let store = SimStore::new();
    let (task, mut handle) = spawn(&store);

    handle.send(Command::SetRequestedUrl(V1.into())).await.unwrap();
    handle.send(Command::ToggleBroadcast).await.unwrap();
    handle.send(Command::Like).await.unwrap();

    for _ in 0..2 {
        let alert = handle.next_alert().await.unwrap();
        assert_eq!(alert, Alert::Rejected(ActionError::Unauthenticated));
    }
    assert!(handle.try_alert().is_none());

    handle.stop_handle().stop();
    task.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn chat_round_trip() {
    let store = SimStore::new();
    let (task, mut handle) = spawn(&store);

    handle.send(Command::SetViewer(Some("0xa".into()))).await.unwrap();
    handle.send(Command::SetRequestedUrl(V1.into())).await.unwrap();
    handle.send(Command::SetCompose("gm".into())).await.unwrap();
    handle.send(Command::SendMessage("gm".into())).await.unwrap();

    let session = wait_for(&mut handle, |s| !s.chat_history.is_empty()).await;
    assert_eq!(session.chat_history[0].text, "gm");
    assert!(session.compose.is_empty());

    handle.stop_handle().stop();
    task.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn stop_is_final() {
    let store = SimStore::new();
    let (task, handle) = spawn(&store);
    let stop = handle.stop_handle();

    stop.stop();
    stop.stop();
    task.await.unwrap();

    assert!(stop.is_stopped());
    assert_eq!(handle.send(Command::Like).await, Err(RuntimeError::Stopped));
}

#[tokio::test(start_paused = true)]
async fn dropping_handle_ends_runtime() {
    let store = SimStore::new();
    let (task, handle) = spawn(&store);

    drop(handle);
    tokio::time::timeout(Duration::from_secs(1), task).await.unwrap().unwrap();
}

#[tokio::test(start_paused = true)]
async fn results_after_stop_are_discarded() {
    let store = SimStore::new();
    store.set_faults(Faults { latency: Duration::from_secs(5), ..Faults::default() });
    let (task, handle) = spawn(&store);

    handle.send(Command::SetRequestedUrl(V1.into())).await.unwrap();
    tokio::time::sleep(Duration::from_millis(10)).await;
    handle.stop_handle().stop();
    task.await.unwrap();

    // The in-flight view write still lands on the store.
    tokio::time::sleep(Duration::from_secs(6)).await;
    assert_eq!(store.snapshot().views, Some(1));
    assert_eq!(handle.view().displayed_view_count, 0);
}
