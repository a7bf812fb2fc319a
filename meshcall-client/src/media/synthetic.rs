use async_trait::async_trait;

use super::{CameraFacing, LocalMedia, LocalTrack, MediaSource, TrackKind};
use crate::error::MediaError;

/// Media source for headless participants. Tracks are announced and
/// negotiated but never carry samples.
#[derive(Debug, Clone, Default)]
pub struct SyntheticMediaSource {
    deny: bool,
}

impl SyntheticMediaSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// A source that refuses every request, like a user dismissing the
    /// permission prompt.
    pub fn denied() -> Self {
        Self { deny: true }
    }
}

#[async_trait]
impl MediaSource for SyntheticMediaSource {
    async fn acquire_camera(&self, facing: CameraFacing) -> Result<LocalMedia, MediaError> {
        if self.deny {
            return Err(MediaError::Denied("camera and microphone".into()));
        }
        let label = match facing {
            CameraFacing::User => "synthetic front camera",
            CameraFacing::Environment => "synthetic rear camera",
        };
        Ok(LocalMedia::new(
            Some(LocalTrack::new(TrackKind::Audio, "synthetic microphone")),
            Some(LocalTrack::new(TrackKind::Video, label)),
        ))
    }

    async fn acquire_screen(&self) -> Result<LocalTrack, MediaError> {
        if self.deny {
            return Err(MediaError::Denied("screen capture".into()));
        }
        Ok(LocalTrack::new(TrackKind::Video, "synthetic screen"))
    }
}
