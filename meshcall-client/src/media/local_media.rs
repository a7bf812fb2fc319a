use std::fmt;

use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackKind {
    Audio,
    Video,
}

impl fmt::Display for TrackKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Audio => f.write_str("audio"),
            Self::Video => f.write_str("video"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalTrack {
    pub id: String,
    pub kind: TrackKind,
    pub label: String,
    pub enabled: bool,
}

impl LocalTrack {
    pub fn new(kind: TrackKind, label: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            kind,
            label: label.into(),
            enabled: true,
        }
    }
}

/// The outgoing stream: at most one audio and one video track.
#[derive(Debug, Clone)]
pub struct LocalMedia {
    pub stream_id: String,
    audio: Option<LocalTrack>,
    video: Option<LocalTrack>,
}

impl LocalMedia {
    pub fn new(audio: Option<LocalTrack>, video: Option<LocalTrack>) -> Self {
        Self {
            stream_id: Uuid::new_v4().to_string(),
            audio,
            video,
        }
    }

    pub fn tracks(&self) -> impl Iterator<Item = &LocalTrack> {
        self.audio.iter().chain(self.video.iter())
    }

    pub fn video(&self) -> Option<&LocalTrack> {
        self.video.as_ref()
    }

    pub fn audio(&self) -> Option<&LocalTrack> {
        self.audio.as_ref()
    }

    pub fn set_audio_enabled(&mut self, enabled: bool) {
        if let Some(track) = self.audio.as_mut() {
            track.enabled = enabled;
        }
    }

    pub fn set_video_enabled(&mut self, enabled: bool) {
        if let Some(track) = self.video.as_mut() {
            track.enabled = enabled;
        }
    }

    /// Swaps the video track, keeping the current enabled flag. Returns the
    /// stopped track.
    pub fn replace_video(&mut self, mut track: LocalTrack) -> Option<LocalTrack> {
        if let Some(current) = &self.video {
            track.enabled = current.enabled;
        }
        self.video.replace(track)
    }
}
