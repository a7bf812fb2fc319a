mod config;
mod error;
mod status;

pub mod media;
pub mod room;
pub mod session;
pub mod signaling;
pub mod transport;

pub use config::*;
pub use error::*;
pub use status::*;

pub use media::{CameraFacing, LocalMedia, LocalTrack, MediaSource, SyntheticMediaSource, TrackKind};
pub use room::*;
pub use session::*;
pub use signaling::*;
pub use transport::*;
