use crate::SignalingService;
use crate::signaling::Connection;
use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Path, State, WebSocketUpgrade};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use futures::{SinkExt, StreamExt};
use meshcall_core::{Inbound, ParticipantId, RoomId, decode};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Path((room, name)): Path<(String, String)>,
    State(service): State<SignalingService>,
) -> Response {
    let room = RoomId::from(room);
    let name = ParticipantId::from(name);

    if room.is_empty() || name.is_empty() {
        return (StatusCode::BAD_REQUEST, "room and name must not be empty").into_response();
    }

    ws.on_upgrade(move |socket| handle_socket(socket, room, name, service))
}

async fn handle_socket(socket: WebSocket, room: RoomId, name: ParticipantId, service: SignalingService) {
    info!("New WebSocket connection: {name} in {room}");

    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel();

    let conn = service.join(room, name, tx);

    let mut send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            let closing = matches!(msg, Message::Close(_));
            if sender.send(msg).await.is_err() || closing {
                break;
            }
        }
    });

    let mut recv_task = tokio::spawn({
        let service = service.clone();
        let conn = conn.clone();

        async move {
            while let Some(Ok(msg)) = receiver.next().await {
                let text = match msg {
                    Message::Text(text) => text.to_string(),
                    Message::Binary(data) => match String::from_utf8(data.to_vec()) {
                        Ok(text) => text,
                        Err(_) => {
                            warn!("Ignoring non UTF-8 frame from {}", conn.name);
                            continue;
                        }
                    },
                    Message::Close(_) => break,
                    _ => continue,
                };

                match decode(&text) {
                    Ok(Inbound::Message(signal)) => service.handle_signal(&conn, signal),
                    Ok(Inbound::Unknown(kind)) => {
                        debug!("Ignoring unknown {kind:?} message from {}", conn.name)
                    }
                    Err(e) => warn!("Invalid SignalMessage from {}: {e}", conn.name),
                }
            }
        }
    });

    tokio::select! {
        _ = (&mut send_task) => recv_task.abort(),
        _ = (&mut recv_task) => send_task.abort(),
    };

    service.leave(&conn);
    info!("WebSocket disconnected: {} from {}", conn.name, conn.room);
}
