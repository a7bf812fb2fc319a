use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use meshcall_client::{
    ChannelState, LocalMedia, PeerState, RemoteTrack, RoomObserver, StatusLine, TrackKind,
};
use meshcall_core::{Participant, ParticipantId};
use tokio::sync::Mutex;

#[derive(Debug, Clone, PartialEq)]
pub enum ObservedEvent {
    RoomState(Vec<Participant>),
    LocalMedia,
    PeerState(ParticipantId, PeerState),
    RemoteTrack(ParticipantId, TrackKind),
    PeerRemoved(ParticipantId),
    Chat(Option<ParticipantId>, String),
    ScreenShare(Option<ParticipantId>, bool),
    Channel(ChannelState),
    Status { error: bool, text: String },
}

/// RoomObserver that records every callback.
#[derive(Clone, Default)]
pub struct RecordingObserver {
    events: Arc<Mutex<Vec<ObservedEvent>>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn events(&self) -> Vec<ObservedEvent> {
        self.events.lock().await.clone()
    }

    async fn push(&self, event: ObservedEvent) {
        self.events.lock().await.push(event);
    }

    pub async fn removed_count(&self, peer: &str) -> usize {
        self.events
            .lock()
            .await
            .iter()
            .filter(|e| matches!(e, ObservedEvent::PeerRemoved(p) if p.as_str() == peer))
            .count()
    }

    pub async fn peer_states(&self, peer: &str) -> Vec<PeerState> {
        self.events
            .lock()
            .await
            .iter()
            .filter_map(|e| match e {
                ObservedEvent::PeerState(p, state) if p.as_str() == peer => Some(*state),
                _ => None,
            })
            .collect()
    }

    pub async fn last_peer_state(&self, peer: &str) -> Option<PeerState> {
        self.peer_states(peer).await.last().copied()
    }

    pub async fn errors(&self) -> Vec<String> {
        self.events
            .lock()
            .await
            .iter()
            .filter_map(|e| match e {
                ObservedEvent::Status { error: true, text } => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    pub async fn latest_room_state(&self) -> Option<Vec<Participant>> {
        self.events
            .lock()
            .await
            .iter()
            .rev()
            .find_map(|e| match e {
                ObservedEvent::RoomState(users) => Some(users.clone()),
                _ => None,
            })
    }

    /// Polls until `predicate` holds for the recorded events.
    pub async fn wait_until<F>(&self, timeout_ms: u64, predicate: F) -> bool
    where
        F: Fn(&[ObservedEvent]) -> bool,
    {
        let start = std::time::Instant::now();
        let timeout = Duration::from_millis(timeout_ms);

        loop {
            if predicate(&self.events.lock().await) {
                return true;
            }
            if start.elapsed() > timeout {
                return false;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }
}

#[async_trait]
impl RoomObserver for RecordingObserver {
    async fn on_room_state(&self, participants: &[Participant]) {
        self.push(ObservedEvent::RoomState(participants.to_vec()))
            .await;
    }

    async fn on_local_media(&self, _media: &LocalMedia) {
        self.push(ObservedEvent::LocalMedia).await;
    }

    async fn on_peer_state(&self, peer: &ParticipantId, state: PeerState) {
        self.push(ObservedEvent::PeerState(peer.clone(), state))
            .await;
    }

    async fn on_remote_track(&self, peer: &ParticipantId, track: &RemoteTrack) {
        self.push(ObservedEvent::RemoteTrack(peer.clone(), track.kind))
            .await;
    }

    async fn on_peer_removed(&self, peer: &ParticipantId) {
        self.push(ObservedEvent::PeerRemoved(peer.clone())).await;
    }

    async fn on_chat(&self, from: Option<&ParticipantId>, text: &str) {
        self.push(ObservedEvent::Chat(from.cloned(), text.to_owned()))
            .await;
    }

    async fn on_screen_share(&self, from: Option<&ParticipantId>, sharing: bool) {
        self.push(ObservedEvent::ScreenShare(from.cloned(), sharing))
            .await;
    }

    async fn on_channel_state(&self, state: ChannelState) {
        self.push(ObservedEvent::Channel(state)).await;
    }

    async fn on_status(&self, line: &StatusLine) {
        self.push(ObservedEvent::Status {
            error: line.is_error(),
            text: line.text.clone(),
        })
        .await;
    }
}
