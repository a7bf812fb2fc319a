use tokio::sync::mpsc;

use crate::error::ClientError;

/// User actions sent to a running room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoomCommand {
    ToggleAudio,
    ToggleVideo,
    /// Use the camera facing the other way.
    SwitchCamera,
    ToggleScreenShare,
    SendChat(String),
    /// Drop every session and the local media, then join again.
    Rejoin,
    Leave,
}

/// Cloneable sender side of a room actor.
#[derive(Debug, Clone)]
pub struct RoomHandle {
    command_tx: mpsc::Sender<RoomCommand>,
}

impl RoomHandle {
    pub(crate) fn new(command_tx: mpsc::Sender<RoomCommand>) -> Self {
        Self { command_tx }
    }

    pub async fn send(&self, command: RoomCommand) -> Result<(), ClientError> {
        self.command_tx
            .send(command)
            .await
            .map_err(|_| ClientError::Stopped)
    }

    pub async fn toggle_audio(&self) -> Result<(), ClientError> {
        self.send(RoomCommand::ToggleAudio).await
    }

    pub async fn toggle_video(&self) -> Result<(), ClientError> {
        self.send(RoomCommand::ToggleVideo).await
    }

    pub async fn switch_camera(&self) -> Result<(), ClientError> {
        self.send(RoomCommand::SwitchCamera).await
    }

    pub async fn toggle_screen_share(&self) -> Result<(), ClientError> {
        self.send(RoomCommand::ToggleScreenShare).await
    }

    pub async fn send_chat(&self, text: impl Into<String>) -> Result<(), ClientError> {
        self.send(RoomCommand::SendChat(text.into())).await
    }

    pub async fn rejoin(&self) -> Result<(), ClientError> {
        self.send(RoomCommand::Rejoin).await
    }

    pub async fn leave(&self) -> Result<(), ClientError> {
        self.send(RoomCommand::Leave).await
    }

    pub fn is_closed(&self) -> bool {
        self.command_tx.is_closed()
    }
}
