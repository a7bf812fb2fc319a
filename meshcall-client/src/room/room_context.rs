use std::collections::HashMap;

use meshcall_core::{Participant, ParticipantId, RoomId};

use crate::media::LocalMedia;
use crate::session::PeerSession;
use crate::transport::TransportConfig;

/// State of one joined room, owned by its room actor.
#[derive(Debug)]
pub struct RoomContext {
    pub room: RoomId,
    pub local: ParticipantId,
    /// Latest authoritative list, in server order.
    pub participants: Vec<Participant>,
    pub sessions: HashMap<ParticipantId, PeerSession>,
    pub local_media: Option<LocalMedia>,
    pub transport_config: TransportConfig,
}

impl RoomContext {
    pub fn new(room: RoomId, local: ParticipantId, transport_config: TransportConfig) -> Self {
        Self {
            room,
            local,
            participants: Vec::new(),
            sessions: HashMap::new(),
            local_media: None,
            transport_config,
        }
    }

    pub fn is_present(&self, peer: &ParticipantId) -> bool {
        self.participants.iter().any(|p| &p.name == peer)
    }

    pub fn participant_mut(&mut self, peer: &ParticipantId) -> Option<&mut Participant> {
        self.participants.iter_mut().find(|p| &p.name == peer)
    }

    pub fn media_ready(&self) -> bool {
        self.local_media.is_some()
    }

    pub fn session(&self, peer: &ParticipantId) -> Option<&PeerSession> {
        self.sessions.get(peer)
    }
}
