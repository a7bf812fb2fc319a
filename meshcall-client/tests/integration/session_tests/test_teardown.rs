use meshcall_client::PeerState;

use crate::integration::init_tracing;
use crate::utils::{ObservedEvent, SessionHarness, TransportCall, peer};

#[tokio::test]
async fn test_departure_tears_down_exactly_once() {
    init_tracing();

    let mut alice = SessionHarness::new("alice").with_media();
    alice.room_state(&["alice", "bob", "carol"]).await;
    assert_eq!(alice.ctx.sessions.len(), 2);

    alice.room_state(&["alice", "carol"]).await;
    alice.room_state(&["alice", "carol"]).await;

    assert!(alice.session_state("bob").is_none());
    assert_eq!(alice.transports.count_for("bob", &TransportCall::Closed), 1);
    assert_eq!(alice.observer.removed_count("bob").await, 1);
    assert_eq!(alice.observer.last_peer_state("bob").await, Some(PeerState::Closed));

    // carol is untouched.
    assert_eq!(alice.session_state("carol"), Some(PeerState::Negotiating));
}

#[tokio::test]
async fn test_explicit_teardown_is_idempotent() {
    init_tracing();

    let mut alice = SessionHarness::new("alice").with_media();
    alice.room_state(&["alice", "bob"]).await;

    let bob = peer("bob");
    alice.manager.teardown(&mut alice.ctx, &bob).await;
    alice.manager.teardown(&mut alice.ctx, &bob).await;

    assert_eq!(alice.transports.count_for("bob", &TransportCall::Closed), 1);
    assert_eq!(alice.observer.removed_count("bob").await, 1);
}

#[tokio::test]
async fn test_idle_session_is_discarded_on_departure() {
    init_tracing();

    let mut bob = SessionHarness::new("bob").with_media();
    bob.room_state(&["alice", "bob"]).await;
    bob.candidate_from("alice", "c1").await;

    bob.room_state(&["bob"]).await;

    assert!(bob.session_state("alice").is_none());
    assert!(bob.transports.calls().is_empty());
    let events = bob.observer.events().await;
    assert!(events.contains(&ObservedEvent::PeerRemoved(peer("alice"))));
}

#[tokio::test]
async fn test_teardown_all_closes_every_session() {
    init_tracing();

    let mut alice = SessionHarness::new("alice").with_media();
    alice.room_state(&["alice", "bob", "carol"]).await;

    alice.manager.teardown_all(&mut alice.ctx).await;

    assert!(alice.ctx.sessions.is_empty());
    assert_eq!(alice.transports.count_for("bob", &TransportCall::Closed), 1);
    assert_eq!(alice.transports.count_for("carol", &TransportCall::Closed), 1);
}

#[tokio::test]
async fn test_failed_close_still_removes_session() {
    init_tracing();

    let mut alice = SessionHarness::new("alice").with_media();
    alice.room_state(&["alice", "bob"]).await;
    alice.transports.fail_close(true);

    alice.room_state(&["alice"]).await;

    assert!(alice.session_state("bob").is_none());
    assert_eq!(alice.transports.count_for("bob", &TransportCall::Closed), 1);
    assert_eq!(alice.observer.removed_count("bob").await, 1);
    assert_eq!(alice.observer.last_peer_state("bob").await, Some(PeerState::Closed));
}
