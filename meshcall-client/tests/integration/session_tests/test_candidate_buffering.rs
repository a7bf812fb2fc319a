use meshcall_client::PeerState;
use meshcall_core::SdpKind;

use crate::integration::init_tracing;
use crate::utils::{SessionHarness, TransportCall};

#[tokio::test]
async fn test_early_candidates_flush_after_remote_offer() {
    init_tracing();

    let mut bob = SessionHarness::new("bob").with_media();
    bob.room_state(&["alice", "bob"]).await;

    bob.candidate_from("alice", "c1").await;
    bob.candidate_from("alice", "c2").await;
    assert_eq!(bob.session_state("alice"), Some(PeerState::Idle));
    assert!(!bob.has_transport("alice"), "buffering needs no transport");

    bob.offer_from("alice", "offer-1").await;

    let calls: Vec<TransportCall> = bob
        .transports
        .calls_for("alice")
        .into_iter()
        .filter(|c| !matches!(c, TransportCall::Publish { .. }))
        .collect();
    assert_eq!(
        calls,
        vec![
            TransportCall::Created,
            TransportCall::RemoteDescription(SdpKind::Offer),
            TransportCall::Candidate("c1".into()),
            TransportCall::Candidate("c2".into()),
            TransportCall::Answer,
        ]
    );
    assert_eq!(bob.signaling.answers_to("alice").await.len(), 1);
    assert_eq!(bob.session_state("alice"), Some(PeerState::Negotiating));

    // Later candidates are applied straight away.
    bob.candidate_from("alice", "c3").await;
    assert_eq!(
        bob.transports
            .count_for("alice", &TransportCall::Candidate("c3".into())),
        1
    );
}

#[tokio::test]
async fn test_initiator_buffers_candidates_until_answer() {
    init_tracing();

    let mut alice = SessionHarness::new("alice").with_media();
    alice.room_state(&["alice", "bob"]).await;

    alice.candidate_from("bob", "c1").await;
    assert_eq!(
        alice
            .transports
            .count_for("bob", &TransportCall::Candidate("c1".into())),
        0
    );

    alice.answer_from("bob", "answer-1").await;
    let calls = alice.transports.calls_for("bob");
    let answer_at = calls
        .iter()
        .position(|c| *c == TransportCall::RemoteDescription(SdpKind::Answer))
        .unwrap();
    assert_eq!(calls[answer_at + 1], TransportCall::Candidate("c1".into()));
}

#[tokio::test]
async fn test_candidates_from_strangers_are_dropped() {
    init_tracing();

    let mut bob = SessionHarness::new("bob").with_media();
    bob.room_state(&["alice", "bob"]).await;

    bob.candidate_from("mallory", "c1").await;
    assert!(bob.session_state("mallory").is_none());
}

#[tokio::test]
async fn test_local_candidates_are_sent_to_peer() {
    init_tracing();

    let mut alice = SessionHarness::new("alice").with_media();
    alice.room_state(&["alice", "bob"]).await;

    let key = alice.transports.latest_key("bob").unwrap();
    alice.transports.emit_candidate(&key, "local-1").await;
    alice.pump_transport_events().await;

    let sent = alice.signaling.candidates_to("bob").await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].candidate, "local-1");
}
