use meshcall_client::{PeerState, SyntheticMediaSource};
use meshcall_core::SdpKind;

use crate::integration::init_tracing;
use crate::utils::{
    EVENT_TIMEOUT_MS, ObservedEvent, TransportCall, eventually, join_room, spawn_relay_server,
};

#[tokio::test]
async fn test_two_participants_negotiate_through_relay() {
    init_tracing();

    let addr = spawn_relay_server().await;
    let alice = join_room(addr, "alice", SyntheticMediaSource::new());
    assert!(
        alice
            .observer
            .wait_until(EVENT_TIMEOUT_MS, |events| events
                .iter()
                .any(|e| matches!(e, ObservedEvent::RoomState(users) if users.len() == 1)))
            .await
    );

    let bob = join_room(addr, "bob", SyntheticMediaSource::new());

    // alice sorts first, so she offers and bob answers.
    let alice_got_answer = eventually(EVENT_TIMEOUT_MS, || {
        alice
            .transports
            .count_for("bob", &TransportCall::RemoteDescription(SdpKind::Answer))
            == 1
    })
    .await;
    assert!(alice_got_answer, "alice never applied bob's answer");

    assert_eq!(alice.transports.offers_for("bob"), vec![false]);
    assert!(bob.transports.offers_for("alice").is_empty());
    assert_eq!(bob.transports.count_for("alice", &TransportCall::Answer), 1);
    assert_eq!(
        bob.observer.last_peer_state("alice").await,
        Some(PeerState::Negotiating)
    );

    let users = bob.observer.latest_room_state().await.unwrap();
    let names: Vec<&str> = users.iter().map(|u| u.name.as_str()).collect();
    assert_eq!(names, ["alice", "bob"]);

    alice.handle.leave().await.unwrap();
    bob.handle.leave().await.unwrap();
    alice.task.await.unwrap();
    bob.task.await.unwrap();
}
