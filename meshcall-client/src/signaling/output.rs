use async_trait::async_trait;
use meshcall_core::{IceCandidate, ParticipantId, SessionDescription, SignalMessage};

/// Where the room sends its outbound signaling traffic.
///
/// Only `send_signal` is required; the rest build the wire message.
#[async_trait]
pub trait SignalingOutput: Send + Sync {
    async fn send_signal(&self, message: SignalMessage);

    async fn send_offer(&self, to: ParticipantId, sdp: SessionDescription) {
        self.send_signal(SignalMessage::Offer {
            from: None,
            to: Some(to),
            sdp,
        })
        .await;
    }

    async fn send_answer(&self, to: ParticipantId, sdp: SessionDescription) {
        self.send_signal(SignalMessage::Answer {
            from: None,
            to: Some(to),
            sdp,
        })
        .await;
    }

    async fn send_ice(&self, to: ParticipantId, candidate: IceCandidate) {
        self.send_signal(SignalMessage::IceCandidate {
            from: None,
            to: Some(to),
            candidate,
        })
        .await;
    }

    async fn send_mute_state(&self, audio_muted: bool, video_muted: bool) {
        self.send_signal(SignalMessage::MuteState {
            from: None,
            audio_muted,
            video_muted,
        })
        .await;
    }

    async fn send_chat(&self, text: String) {
        self.send_signal(SignalMessage::Chat { from: None, text }).await;
    }

    async fn send_screen_share(&self, sharing: bool) {
        self.send_signal(SignalMessage::ScreenShare {
            from: None,
            sharing,
        })
        .await;
    }
}
