use meshcall_core::{ParticipantId, SignalMessage};

use crate::room::RoomContext;

/// Local mute flags and their propagation.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MuteStateSync {
    audio_muted: bool,
    video_muted: bool,
}

impl MuteStateSync {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn audio_muted(&self) -> bool {
        self.audio_muted
    }

    pub fn video_muted(&self) -> bool {
        self.video_muted
    }

    pub fn is_muted(&self) -> bool {
        self.audio_muted || self.video_muted
    }

    /// Flips the audio flag, applies it to the local track and returns the
    /// message to broadcast.
    pub fn toggle_audio(&mut self, ctx: &mut RoomContext) -> SignalMessage {
        self.audio_muted = !self.audio_muted;
        self.apply_local(ctx);
        self.message()
    }

    pub fn toggle_video(&mut self, ctx: &mut RoomContext) -> SignalMessage {
        self.video_muted = !self.video_muted;
        self.apply_local(ctx);
        self.message()
    }

    /// Enables or disables local tracks to match the flags.
    pub fn apply_local(&self, ctx: &mut RoomContext) {
        if let Some(media) = ctx.local_media.as_mut() {
            media.set_audio_enabled(!self.audio_muted);
            media.set_video_enabled(!self.video_muted);
        }
    }

    pub fn message(&self) -> SignalMessage {
        SignalMessage::MuteState {
            from: None,
            audio_muted: self.audio_muted,
            video_muted: self.video_muted,
        }
    }

    /// Records a peer's flags for display. Returns false for unknown peers.
    pub fn apply_remote(
        ctx: &mut RoomContext,
        from: &ParticipantId,
        audio_muted: bool,
        video_muted: bool,
    ) -> bool {
        match ctx.participant_mut(from) {
            Some(participant) => {
                participant.audio_muted = audio_muted;
                participant.video_muted = video_muted;
                true
            }
            None => false,
        }
    }
}
