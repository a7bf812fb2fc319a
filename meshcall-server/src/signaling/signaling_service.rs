use crate::room::{ConnectionId, RoomManager};
use axum::extract::ws::Message;
use meshcall_core::{IceServerConfig, ParticipantId, RoomId, SignalMessage, encode};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// One accepted WebSocket: which room it sits in and under what name.
#[derive(Debug, Clone)]
pub struct Connection {
    pub id: ConnectionId,
    pub room: RoomId,
    pub name: ParticipantId,
}

struct SignalingInner {
    rooms: RoomManager,
    ice_servers: Vec<IceServerConfig>,
}

/// Room-scoped relay. Stateless apart from membership and mute flags.
#[derive(Clone)]
pub struct SignalingService {
    inner: Arc<SignalingInner>,
}

impl SignalingService {
    pub fn new(ice_servers: Vec<IceServerConfig>) -> Self {
        Self {
            inner: Arc::new(SignalingInner {
                rooms: RoomManager::new(),
                ice_servers,
            }),
        }
    }

    pub fn get_ice_servers(&self) -> Vec<IceServerConfig> {
        self.inner.ice_servers.clone()
    }

    pub fn rooms(&self) -> &RoomManager {
        &self.inner.rooms
    }

    /// Registers a connection, tells the room, then hands the newcomer its ICE servers.
    pub fn join(
        &self,
        room: RoomId,
        name: ParticipantId,
        tx: mpsc::UnboundedSender<Message>,
    ) -> Connection {
        let joined = self.inner.rooms.join(&room, name.clone(), tx.clone());

        if let Some(previous) = joined.evicted {
            info!("{name} reconnected to {room}, closing the previous connection");
            let _ = previous.send(Message::Close(None));
        }

        self.broadcast_room_state(&room);
        self.send_signal(
            &tx,
            &SignalMessage::IceServers {
                ice_servers: self.get_ice_servers(),
            },
        );

        Connection {
            id: joined.id,
            room,
            name,
        }
    }

    pub fn leave(&self, conn: &Connection) {
        if self.inner.rooms.leave(&conn.room, conn.id) {
            info!("{} left {}", conn.name, conn.room);
            self.broadcast_room_state(&conn.room);
        }
    }

    /// Applies one message received from `conn`.
    pub fn handle_signal(&self, conn: &Connection, msg: SignalMessage) {
        match msg {
            SignalMessage::MuteState {
                audio_muted,
                video_muted,
                ..
            } => {
                if self
                    .inner
                    .rooms
                    .set_mute(&conn.room, conn.id, audio_muted, video_muted)
                {
                    self.broadcast_room_state(&conn.room);
                }
            }

            SignalMessage::Offer { .. }
            | SignalMessage::Answer { .. }
            | SignalMessage::IceCandidate { .. } => self.relay_negotiation(conn, msg),

            SignalMessage::Chat { .. } | SignalMessage::ScreenShare { .. } => {
                let stamped = msg.stamped(&conn.name);
                self.broadcast(&conn.room, &stamped, Some(conn.id));
            }

            SignalMessage::IceServers { .. } | SignalMessage::RoomState { .. } => {
                warn!(
                    "Ignoring server-only {} message from {}",
                    msg.kind(),
                    conn.name
                );
            }
        }
    }

    fn relay_negotiation(&self, conn: &Connection, msg: SignalMessage) {
        let kind = msg.kind();
        let stamped = msg.stamped(&conn.name);

        match stamped.recipient().cloned() {
            Some(to) => match self.inner.rooms.sender_for(&conn.room, &to) {
                Some(tx) => {
                    debug!("Relaying {kind} {} -> {to}", conn.name);
                    self.send_signal(&tx, &stamped);
                }
                None => warn!("Dropping {kind} from {} to absent {to}", conn.name),
            },
            None if matches!(stamped, SignalMessage::Offer { .. }) => {
                self.broadcast(&conn.room, &stamped, Some(conn.id));
            }
            None => warn!("Dropping unaddressed {kind} from {}", conn.name),
        }
    }

    pub fn broadcast_room_state(&self, room: &RoomId) {
        let msg = SignalMessage::RoomState {
            users: self.inner.rooms.participants(room),
        };
        self.broadcast(room, &msg, None);
    }

    fn broadcast(&self, room: &RoomId, msg: &SignalMessage, except: Option<ConnectionId>) {
        for tx in self.inner.rooms.senders(room, except) {
            self.send_signal(&tx, msg);
        }
    }

    pub fn send_signal(&self, tx: &mpsc::UnboundedSender<Message>, msg: &SignalMessage) {
        match encode(msg) {
            Ok(json) => {
                if let Err(e) = tx.send(Message::Text(json.into())) {
                    error!("Failed to queue {} message: {e}", msg.kind());
                }
            }
            Err(e) => error!("Failed to serialize signal message: {e}"),
        }
    }
}
