use async_trait::async_trait;
use meshcall_core::{Participant, ParticipantId};

use crate::media::LocalMedia;
use crate::session::PeerState;
use crate::signaling::ChannelState;
use crate::status::StatusLine;
use crate::transport::RemoteTrack;

/// Rendering side of a room. Every callback is optional.
#[async_trait]
pub trait RoomObserver: Send + Sync {
    async fn on_room_state(&self, _participants: &[Participant]) {}

    async fn on_local_media(&self, _media: &LocalMedia) {}

    async fn on_peer_state(&self, _peer: &ParticipantId, _state: PeerState) {}

    async fn on_remote_track(&self, _peer: &ParticipantId, _track: &RemoteTrack) {}

    /// Rendered media for `peer` must be dropped.
    async fn on_peer_removed(&self, _peer: &ParticipantId) {}

    async fn on_chat(&self, _from: Option<&ParticipantId>, _text: &str) {}

    async fn on_screen_share(&self, _from: Option<&ParticipantId>, _sharing: bool) {}

    async fn on_channel_state(&self, _state: ChannelState) {}

    async fn on_status(&self, _line: &StatusLine) {}
}

/// Observer that renders nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl RoomObserver for NoopObserver {}
