use serde_json::json;

use crate::integration::init_tracing;
use crate::utils::{TestClient, spawn_server};

#[tokio::test]
async fn test_chat_reaches_everyone_but_sender() {
    init_tracing();
    let addr = spawn_server().await;
    let mut ann = TestClient::join(addr, "r1", "ann").await.unwrap();
    let mut bob = TestClient::join(addr, "r1", "bob").await.unwrap();
    let mut carol = TestClient::join(addr, "r1", "carol").await.unwrap();

    bob.send(json!({"type": "chat", "text": "hello"})).await.unwrap();

    for client in [&mut ann, &mut carol] {
        let chat = client.recv_type("chat").await.unwrap();
        assert_eq!(chat["from"], "bob");
        assert_eq!(chat["text"], "hello");
    }
    bob.expect_none("chat", 200).await.unwrap();
}

#[tokio::test]
async fn test_screen_share_is_relayed() {
    init_tracing();
    let addr = spawn_server().await;
    let mut ann = TestClient::join(addr, "r1", "ann").await.unwrap();
    let mut bob = TestClient::join(addr, "r1", "bob").await.unwrap();

    ann.send(json!({"type": "screen_share", "sharing": true}))
        .await
        .unwrap();

    let share = bob.recv_type("screen_share").await.unwrap();
    assert_eq!(share["from"], "ann");
    assert_eq!(share["sharing"], true);
}

#[tokio::test]
async fn test_garbage_does_not_disconnect() {
    init_tracing();
    let addr = spawn_server().await;
    let mut ann = TestClient::join(addr, "r1", "ann").await.unwrap();
    let mut bob = TestClient::join(addr, "r1", "bob").await.unwrap();

    ann.send_raw("not json").await.unwrap();
    ann.send(json!({"type": "whiteboard", "strokes": []}))
        .await
        .unwrap();
    ann.send(json!({"type": "chat"})).await.unwrap();
    ann.send(json!({"type": "room_state", "users": []}))
        .await
        .unwrap();

    ann.send(json!({"type": "chat", "text": "after"})).await.unwrap();
    let chat = bob.recv_type("chat").await.unwrap();
    assert_eq!(chat["text"], "after");
}
