use meshcall_client::PeerState;

use crate::integration::init_tracing;
use crate::utils::SessionHarness;

#[tokio::test]
async fn test_initiator_ignores_offer_while_own_offer_outstanding() {
    init_tracing();

    let mut alice = SessionHarness::new("alice").with_media();
    alice.room_state(&["alice", "bob"]).await;

    alice.offer_from("bob", "glare-offer").await;

    assert!(alice.signaling.answers_to("bob").await.is_empty());
    assert_eq!(alice.session_state("bob"), Some(PeerState::Negotiating));

    // The own negotiation still completes.
    alice.answer_from("bob", "answer-1").await;
    assert_eq!(alice.signaling.offers_to("bob").await.len(), 1);
}

#[tokio::test]
async fn test_offer_from_absent_participant_is_refused() {
    init_tracing();

    let mut bob = SessionHarness::new("bob").with_media();
    bob.room_state(&["alice", "bob"]).await;

    bob.offer_from("mallory", "offer-1").await;

    assert!(bob.session_state("mallory").is_none());
    assert!(bob.signaling.signals().await.is_empty());
    assert_eq!(bob.observer.errors().await.len(), 1);
}

#[tokio::test]
async fn test_offer_without_local_media_is_refused() {
    init_tracing();

    let mut bob = SessionHarness::new("bob");
    bob.room_state(&["alice", "bob"]).await;

    bob.offer_from("alice", "offer-1").await;

    assert!(bob.signaling.answers_to("alice").await.is_empty());
    assert!(bob.transports.calls().is_empty());
    assert!(bob.observer.errors().await[0].contains("local media"));
}

#[tokio::test]
async fn test_unsolicited_answer_is_ignored() {
    init_tracing();

    let mut bob = SessionHarness::new("bob").with_media();
    bob.room_state(&["alice", "bob"]).await;
    bob.offer_from("alice", "offer-1").await;

    bob.answer_from("alice", "stray-answer").await;
    bob.answer_from("carol", "stray-answer").await;

    assert_eq!(bob.session_state("alice"), Some(PeerState::Negotiating));
    assert!(bob.session_state("carol").is_none());
}
