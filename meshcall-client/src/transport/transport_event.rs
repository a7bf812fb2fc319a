use std::fmt;

use meshcall_core::{IceCandidate, ParticipantId};

use crate::media::TrackKind;

/// Identifies one transport handle. The generation changes every time a
/// session for the same participant is recreated.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TransportKey {
    pub peer: ParticipantId,
    pub generation: u64,
}

impl fmt::Display for TransportKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.peer, self.generation)
    }
}

/// ICE-level connection state as reported by the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    New,
    Checking,
    Connected,
    Disconnected,
    Failed,
    Closed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteTrack {
    pub id: String,
    pub kind: TrackKind,
}

/// Events a transport raises for the room actor.
#[derive(Debug, Clone)]
pub enum TransportEvent {
    /// A local candidate was gathered and must be sent to the peer.
    CandidateGenerated(TransportKey, IceCandidate),

    StateChanged(TransportKey, ConnectionState),

    /// The peer started sending media.
    RemoteTrack(TransportKey, RemoteTrack),
}

impl TransportEvent {
    pub fn key(&self) -> &TransportKey {
        match self {
            Self::CandidateGenerated(key, _)
            | Self::StateChanged(key, _)
            | Self::RemoteTrack(key, _) => key,
        }
    }
}
