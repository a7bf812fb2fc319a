use std::fmt;

use meshcall_core::ParticipantId;

use crate::session::CandidateQueue;
use crate::transport::{PeerTransport, TransportKey};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeerState {
    /// Known peer without a negotiated transport; may hold buffered candidates.
    Idle,
    Negotiating,
    Connected,
    /// ICE failed or disconnected; waiting for recovery or a restart.
    Degraded,
    Closed,
}

impl fmt::Display for PeerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Negotiating => "negotiating",
            Self::Connected => "connected",
            Self::Degraded => "degraded",
            Self::Closed => "closed",
        };
        f.write_str(name)
    }
}

/// Everything the local side holds for one remote participant.
pub struct PeerSession {
    pub peer: ParticipantId,
    pub generation: u64,
    pub state: PeerState,
    pub transport: Option<Box<dyn PeerTransport>>,
    pub candidates: CandidateQueue,
    /// A local offer is out and no answer has been applied yet.
    pub awaiting_answer: bool,
    /// A renegotiation was requested while an offer was outstanding.
    pub pending_renegotiation: bool,
    /// The deferred offer must restart ICE.
    pub pending_ice_restart: bool,
    /// Last ICE report from the transport was connected.
    pub transport_connected: bool,
    /// ICE restarts since the transport was last connected.
    pub ice_restarts: u32,
    pub negotiated_once: bool,
}

impl PeerSession {
    pub fn new(peer: ParticipantId, generation: u64) -> Self {
        Self {
            peer,
            generation,
            state: PeerState::Idle,
            transport: None,
            candidates: CandidateQueue::new(),
            awaiting_answer: false,
            pending_renegotiation: false,
            pending_ice_restart: false,
            transport_connected: false,
            ice_restarts: 0,
            negotiated_once: false,
        }
    }

    pub fn key(&self) -> TransportKey {
        TransportKey {
            peer: self.peer.clone(),
            generation: self.generation,
        }
    }

    /// `Idle` sessions only buffer candidates and do not count as live.
    pub fn is_live(&self) -> bool {
        !matches!(self.state, PeerState::Idle | PeerState::Closed)
    }

    pub fn is_current(&self, key: &TransportKey) -> bool {
        self.peer == key.peer && self.generation == key.generation
    }
}

impl fmt::Debug for PeerSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PeerSession")
            .field("peer", &self.peer)
            .field("generation", &self.generation)
            .field("state", &self.state)
            .field("has_transport", &self.transport.is_some())
            .field("buffered_candidates", &self.candidates.len())
            .field("awaiting_answer", &self.awaiting_answer)
            .field("pending_renegotiation", &self.pending_renegotiation)
            .field("ice_restarts", &self.ice_restarts)
            .finish()
    }
}
