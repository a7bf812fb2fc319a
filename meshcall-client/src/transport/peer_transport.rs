use async_trait::async_trait;
use meshcall_core::{IceCandidate, SessionDescription};
use tokio::sync::mpsc;

use crate::error::TransportError;
use crate::media::LocalTrack;
use crate::transport::{TransportConfig, TransportEvent, TransportKey};

/// Anything remote candidates can be applied to.
#[async_trait]
pub trait CandidateSink: Send + Sync {
    async fn add_ice_candidate(&self, candidate: IceCandidate) -> Result<(), TransportError>;
}

/// One real-time transport session towards one peer.
///
/// Offer and answer creation also install the result as the local description.
#[async_trait]
pub trait PeerTransport: CandidateSink {
    fn key(&self) -> &TransportKey;

    async fn create_offer(&self, ice_restart: bool) -> Result<SessionDescription, TransportError>;

    async fn create_answer(&self) -> Result<SessionDescription, TransportError>;

    async fn set_remote_description(
        &self,
        description: SessionDescription,
    ) -> Result<(), TransportError>;

    /// Sends `track`, replacing the current sender of the same kind in place
    /// when there is one.
    async fn publish_track(&self, stream_id: &str, track: &LocalTrack)
    -> Result<(), TransportError>;

    async fn close(&self) -> Result<(), TransportError>;
}

#[async_trait]
pub trait TransportFactory: Send + Sync + 'static {
    async fn create(
        &self,
        key: TransportKey,
        config: &TransportConfig,
        events: mpsc::Sender<TransportEvent>,
    ) -> Result<Box<dyn PeerTransport>, TransportError>;
}
