//! Local media capability: what the engine needs from camera, microphone and
//! screen capture, without any capture code of its own.

mod local_media;
mod synthetic;

pub use local_media::{LocalMedia, LocalTrack, TrackKind};
pub use synthetic::SyntheticMediaSource;

use async_trait::async_trait;

use crate::error::MediaError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraFacing {
    User,
    Environment,
}

impl CameraFacing {
    pub fn flipped(self) -> Self {
        match self {
            Self::User => Self::Environment,
            Self::Environment => Self::User,
        }
    }
}

#[async_trait]
pub trait MediaSource: Send + Sync + 'static {
    /// Microphone plus camera facing `facing`.
    async fn acquire_camera(&self, facing: CameraFacing) -> Result<LocalMedia, MediaError>;

    /// A single video track capturing the screen.
    async fn acquire_screen(&self) -> Result<LocalTrack, MediaError>;
}
