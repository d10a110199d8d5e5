//! Wire format checks against the remote store contract.

use livecast_core::{RemoteSnapshot, StoreError, StoreRequest, WriteReply};

#[test]
fn view_request_is_bare_action() {
    insta::assert_json_snapshot!(StoreRequest::View, @r#"
    {
      "action": "view"
    }
    "#);
}

#[test]
fn start_stream_request_shape() {
    let request = StoreRequest::StartStream {
        url: "https://youtu.be/dQw4w9WgXcQ".into(),
        title: "Live Stream".into(),
        user_address: "0xa".into(),
    };

    insta::assert_json_snapshot!(request, @r#"
    {
      "action": "start_stream",
      "url": "https://youtu.be/dQw4w9WgXcQ",
      "title": "Live Stream",
      "userAddress": "0xa"
    }
    "#);
}

#[test]
fn anonymous_chat_omits_address() {
    let request = StoreRequest::Chat { message: "gm".into(), user_address: None };

    insta::assert_json_snapshot!(request, @r#"
    {
      "action": "chat",
      "message": "gm"
    }
    "#);
}

#[test]
fn like_and_end_carry_address() {
    let like = serde_json::to_value(StoreRequest::Like { user_address: "0xa".into() }).unwrap();
    assert_eq!(like, serde_json::json!({ "action": "like", "userAddress": "0xa" }));

    let end = serde_json::to_value(StoreRequest::EndStream { user_address: "0xa".into() }).unwrap();
    assert_eq!(end, serde_json::json!({ "action": "end_stream", "userAddress": "0xa" }));
}

#[test]
fn requests_round_trip_through_json() {
    let request = StoreRequest::Chat { message: "hi".into(), user_address: Some("0xb".into()) };
    let body = request.to_json().unwrap();
    let decoded: StoreRequest = serde_json::from_slice(&body).unwrap();
    assert_eq!(decoded, request);
}

#[test]
fn snapshot_accepts_descriptive_field_names() {
    let body = br#"{
        "likedViewerIds": ["0xa"],
        "chatHistory": [{"author": "0xa", "text": "gm", "sentAtEpochMs": 5}],
        "currentStream": {"url": "https://youtu.be/dQw4w9WgXcQ", "streamerId": "0xa", "isLive": false}
    }"#;

    let snapshot = RemoteSnapshot::from_json(body).unwrap();
    assert!(snapshot.liked_viewer_ids.contains("0xa"));
    assert_eq!(snapshot.chat_history.unwrap()[0].sent_at_epoch_ms, 5);
    let stream = snapshot.current_stream.unwrap();
    assert_eq!(stream.streamer_id, "0xa");
    assert!(!stream.is_live);
}

#[test]
fn view_reply_without_success_is_not_counted() {
    let reply = StoreRequest::View.decode_reply(br#"{"views": 3}"#).unwrap();
    assert_eq!(reply, WriteReply::Views { success: false, views: Some(3) });
}

#[test]
fn malformed_ack_is_decode_error() {
    let request = StoreRequest::Like { user_address: "0xa".into() };
    assert!(matches!(request.decode_reply(b"not json"), Err(StoreError::Decode(_))));
}
