use axum::extract::ws::Message;
use dashmap::DashMap;
use meshcall_core::{Participant, ParticipantId, RoomId};
use std::fmt;
use tokio::sync::mpsc;
use tracing::info;
use uuid::Uuid;

/// Identifies one WebSocket connection. Names can be reused across
/// connections, ids never are.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

struct Member {
    id: ConnectionId,
    participant: Participant,
    tx: mpsc::UnboundedSender<Message>,
}

/// Result of [`RoomManager::join`].
pub struct Joined {
    pub id: ConnectionId,
    /// Outbound queue of the connection that previously held the name.
    pub evicted: Option<mpsc::UnboundedSender<Message>>,
}

/// Membership of every room, keyed by room id. Members keep join order.
#[derive(Default)]
pub struct RoomManager {
    rooms: DashMap<RoomId, Vec<Member>>,
}

impl RoomManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a connection under `name`, replacing any member with the same name.
    pub fn join(
        &self,
        room: &RoomId,
        name: ParticipantId,
        tx: mpsc::UnboundedSender<Message>,
    ) -> Joined {
        let id = ConnectionId::new();
        let mut members = self.rooms.entry(room.clone()).or_default();

        let evicted = members
            .iter()
            .position(|m| m.participant.name == name)
            .map(|index| members.remove(index).tx);

        if members.is_empty() && evicted.is_none() {
            info!("Creating room {room}");
        }
        members.push(Member {
            id,
            participant: Participant::new(name),
            tx,
        });

        Joined { id, evicted }
    }

    /// Removes the member only if `id` still owns its slot.
    pub fn leave(&self, room: &RoomId, id: ConnectionId) -> bool {
        let removed = match self.rooms.get_mut(room) {
            Some(mut members) => {
                let before = members.len();
                members.retain(|m| m.id != id);
                members.len() < before
            }
            None => false,
        };

        if self.rooms.remove_if(room, |_, members| members.is_empty()).is_some() {
            info!("Room {room} is empty, dropping it");
        }
        removed
    }

    pub fn set_mute(&self, room: &RoomId, id: ConnectionId, audio: bool, video: bool) -> bool {
        let Some(mut members) = self.rooms.get_mut(room) else {
            return false;
        };
        match members.iter_mut().find(|m| m.id == id) {
            Some(member) => {
                member.participant.audio_muted = audio;
                member.participant.video_muted = video;
                true
            }
            None => false,
        }
    }

    pub fn participants(&self, room: &RoomId) -> Vec<Participant> {
        self.rooms
            .get(room)
            .map(|members| members.iter().map(|m| m.participant.clone()).collect())
            .unwrap_or_default()
    }

    /// Outbound queues of every member except `except`.
    pub fn senders(
        &self,
        room: &RoomId,
        except: Option<ConnectionId>,
    ) -> Vec<mpsc::UnboundedSender<Message>> {
        self.rooms
            .get(room)
            .map(|members| {
                members
                    .iter()
                    .filter(|m| Some(m.id) != except)
                    .map(|m| m.tx.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn sender_for(
        &self,
        room: &RoomId,
        name: &ParticipantId,
    ) -> Option<mpsc::UnboundedSender<Message>> {
        let members = self.rooms.get(room)?;
        members
            .iter()
            .find(|m| &m.participant.name == name)
            .map(|m| m.tx.clone())
    }

    pub fn contains(&self, room: &RoomId, id: ConnectionId) -> bool {
        self.rooms
            .get(room)
            .is_some_and(|members| members.iter().any(|m| m.id == id))
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }
}
