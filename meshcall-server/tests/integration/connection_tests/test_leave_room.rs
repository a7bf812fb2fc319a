use serde_json::json;

use crate::integration::init_tracing;
use crate::utils::{TestClient, spawn_server, user_names};

#[tokio::test]
async fn test_leave_broadcasts_remaining_members() {
    init_tracing();
    let addr = spawn_server().await;

    let mut ann = TestClient::join(addr, "r1", "ann").await.unwrap();
    let bob = TestClient::join(addr, "r1", "bob").await.unwrap();
    let state = ann.recv_type("room_state").await.unwrap();
    assert_eq!(user_names(&state), ["ann", "bob"]);

    bob.close().await;
    let state = ann.recv_type("room_state").await.unwrap();
    assert_eq!(user_names(&state), ["ann"]);
}

#[tokio::test]
async fn test_mute_state_updates_room_state() {
    init_tracing();
    let addr = spawn_server().await;

    let mut ann = TestClient::join(addr, "r1", "ann").await.unwrap();
    let mut bob = TestClient::join(addr, "r1", "bob").await.unwrap();
    ann.recv_type("room_state").await.unwrap();

    bob.send(json!({"type": "mute_state", "audio_muted": true, "video_muted": false}))
        .await
        .unwrap();

    let state = ann.recv_type("room_state").await.unwrap();
    assert_eq!(state["users"][1]["name"], "bob");
    assert_eq!(state["users"][1]["audio_muted"], true);
    assert_eq!(state["users"][1]["video_muted"], false);
    assert_eq!(state["users"][0]["audio_muted"], false);

    // camelCase clients are understood too.
    bob.send(json!({"type": "mute_state", "audioMuted": false, "videoMuted": true}))
        .await
        .unwrap();
    let state = ann.recv_type("room_state").await.unwrap();
    assert_eq!(state["users"][1]["audio_muted"], false);
    assert_eq!(state["users"][1]["video_muted"], true);
}
