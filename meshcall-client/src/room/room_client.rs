use std::sync::Arc;

use async_trait::async_trait;
use meshcall_core::{ParticipantId, SignalMessage};
use tokio::sync::{RwLock, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::ClientConfig;
use crate::media::{CameraFacing, LocalTrack, MediaSource};
use crate::room::{
    MuteStateSync, RoomCommand, RoomContext, RoomHandle, RoomMembershipTracker, RoomObserver,
};
use crate::session::PeerSessionManager;
use crate::signaling::{ChannelEvent, ChannelState, SignalingChannel, SignalingOutput};
use crate::status::StatusLog;
use crate::transport::{TransportEvent, TransportFactory};

/// Outbound side of whichever signaling channel the room currently uses.
#[derive(Clone, Default)]
struct ChannelOutput {
    current: Arc<RwLock<Option<SignalingChannel>>>,
}

#[async_trait]
impl SignalingOutput for ChannelOutput {
    async fn send_signal(&self, message: SignalMessage) {
        match self.current.read().await.as_ref() {
            Some(channel) => {
                channel.send(&message);
            }
            None => warn!("No signaling channel, dropping {} message", message.kind()),
        }
    }
}

/// Actor owning one joined room.
///
/// Signaling events, transport events and user commands are handled one at a
/// time from a single task.
pub struct RoomClient {
    config: ClientConfig,
    ctx: RoomContext,
    manager: PeerSessionManager,
    membership: RoomMembershipTracker,
    mute: MuteStateSync,
    media: Arc<dyn MediaSource>,
    observer: Arc<dyn RoomObserver>,
    status: StatusLog,
    output: ChannelOutput,
    facing: CameraFacing,
    /// Camera track parked while the screen is shared.
    parked_camera: Option<LocalTrack>,
    screen_sharing: bool,
    channel_rx: Option<mpsc::Receiver<ChannelEvent>>,
    transport_rx: mpsc::Receiver<TransportEvent>,
    command_rx: mpsc::Receiver<RoomCommand>,
}

impl RoomClient {
    pub fn new(
        config: ClientConfig,
        media: Arc<dyn MediaSource>,
        transports: Arc<dyn TransportFactory>,
        observer: Arc<dyn RoomObserver>,
    ) -> (Self, RoomHandle) {
        let (command_tx, command_rx) = mpsc::channel(64);
        let (transport_tx, transport_rx) = mpsc::channel(256);

        let output = ChannelOutput::default();
        let manager = PeerSessionManager::new(
            transports,
            Arc::new(output.clone()),
            observer.clone(),
            transport_tx,
            config.max_ice_restarts,
        );
        let ctx = RoomContext::new(
            config.room.clone(),
            config.participant.clone(),
            config.transport.clone(),
        );

        let client = Self {
            ctx,
            manager,
            membership: RoomMembershipTracker::new(observer.clone()),
            mute: MuteStateSync::new(),
            media,
            status: StatusLog::new(observer.clone()),
            observer,
            output,
            facing: CameraFacing::User,
            parked_camera: None,
            screen_sharing: false,
            channel_rx: None,
            transport_rx,
            command_rx,
            config,
        };
        (client, RoomHandle::new(command_tx))
    }

    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    pub async fn run(mut self) {
        info!(
            "Joining room {} as {}",
            self.config.room, self.config.participant
        );
        self.join().await;

        loop {
            tokio::select! {
                evt = next_channel_event(&mut self.channel_rx) => match evt {
                    Some(e) => self.handle_channel_event(e).await,
                    None => {
                        debug!("Signaling channel finished");
                        self.channel_rx = None;
                    }
                },

                evt = self.transport_rx.recv() => match evt {
                    Some(e) => self.manager.handle_transport_event(&mut self.ctx, e).await,
                    None => {
                        warn!("Transport channel closed unexpectedly");
                        break;
                    }
                },

                cmd = self.command_rx.recv() => match cmd {
                    Some(RoomCommand::Leave) | None => break,
                    Some(c) => self.handle_command(c).await,
                },
            }
        }

        self.disconnect().await;
        self.observer.on_channel_state(ChannelState::Closed).await;
        self.status.info(format!("Left room {}", self.config.room)).await;
    }

    async fn join(&mut self) {
        self.acquire_media().await;

        let endpoint = match self.config.endpoint() {
            Ok(endpoint) => endpoint,
            Err(e) => {
                self.status.error(e.to_string()).await;
                return;
            }
        };
        let (channel, rx) = SignalingChannel::open(endpoint, self.config.reconnect.clone());
        *self.output.current.write().await = Some(channel);
        self.channel_rx = Some(rx);
        self.observer.on_channel_state(ChannelState::Connecting).await;
    }

    /// Closes the channel, every session and the local media.
    async fn disconnect(&mut self) {
        if let Some(channel) = self.output.current.write().await.take() {
            channel.shutdown();
        }
        self.channel_rx = None;
        self.manager.teardown_all(&mut self.ctx).await;
        self.ctx.participants.clear();
        self.ctx.local_media = None;
        self.parked_camera = None;
        self.screen_sharing = false;
    }

    async fn acquire_media(&mut self) {
        match self.media.acquire_camera(self.facing).await {
            Ok(media) => {
                self.ctx.local_media = Some(media);
                self.mute.apply_local(&mut self.ctx);
                if let Some(media) = &self.ctx.local_media {
                    self.observer.on_local_media(media).await;
                }
                self.status.info("Local media ready").await;
                self.membership
                    .reconcile(&mut self.ctx, &mut self.manager)
                    .await;
            }
            Err(e) => self.status.error(format!("Local media unavailable: {e}")).await,
        }
    }

    async fn handle_channel_event(&mut self, event: ChannelEvent) {
        match event {
            ChannelEvent::Opened { reconnected } => {
                if reconnected {
                    // The server dropped our membership, and peers dropped their sessions with it.
                    self.manager.teardown_all(&mut self.ctx).await;
                    self.status.info("Signaling reconnected").await;
                } else {
                    self.status.info("Signaling connected").await;
                }
                self.observer.on_channel_state(ChannelState::Open).await;
                if self.mute.is_muted() {
                    self.output.send_signal(self.mute.message()).await;
                }
            }
            ChannelEvent::Message(message) => self.handle_signal(message).await,
            ChannelEvent::Closed => {
                self.status.error("Signaling connection lost").await;
                self.observer.on_channel_state(ChannelState::Closed).await;
            }
            ChannelEvent::Reconnecting { attempt, delay } => {
                self.status
                    .info(format!(
                        "Reconnecting in {:.1}s (attempt {attempt})",
                        delay.as_secs_f32()
                    ))
                    .await;
                self.observer
                    .on_channel_state(ChannelState::Reconnecting { attempt })
                    .await;
            }
            ChannelEvent::GaveUp { attempts } => {
                self.status
                    .error(format!("Gave up reconnecting after {attempts} attempts"))
                    .await;
                self.observer.on_channel_state(ChannelState::GaveUp).await;
            }
        }
    }

    async fn handle_signal(&mut self, message: SignalMessage) {
        match message {
            SignalMessage::IceServers { ice_servers } => {
                if ice_servers.is_empty() {
                    debug!("Keeping configured ICE servers");
                } else {
                    info!("Using {} ICE servers from the server", ice_servers.len());
                    self.ctx.transport_config.ice_servers = ice_servers;
                }
            }
            SignalMessage::RoomState { users } => {
                self.membership
                    .apply_room_state(&mut self.ctx, &mut self.manager, users)
                    .await;
            }
            SignalMessage::Offer { from, to, sdp } => {
                if let Some(from) = self.addressed_sender(from, to.as_ref(), "offer") {
                    self.manager.handle_offer(&mut self.ctx, from, sdp).await;
                }
            }
            SignalMessage::Answer { from, to, sdp } => {
                if let Some(from) = self.addressed_sender(from, to.as_ref(), "answer") {
                    self.manager.handle_answer(&mut self.ctx, from, sdp).await;
                }
            }
            SignalMessage::IceCandidate {
                from,
                to,
                candidate,
            } => {
                if let Some(from) = self.addressed_sender(from, to.as_ref(), "ice_candidate") {
                    self.manager
                        .handle_candidate(&mut self.ctx, from, candidate)
                        .await;
                }
            }
            SignalMessage::MuteState {
                from: Some(from),
                audio_muted,
                video_muted,
            } => {
                if MuteStateSync::apply_remote(&mut self.ctx, &from, audio_muted, video_muted) {
                    self.observer.on_room_state(&self.ctx.participants).await;
                }
            }
            SignalMessage::Chat { from, text } if self.config.extensions.chat => {
                self.observer.on_chat(from.as_ref(), &text).await;
            }
            SignalMessage::ScreenShare { from, sharing } if self.config.extensions.screen_share => {
                self.observer.on_screen_share(from.as_ref(), sharing).await;
            }
            other => debug!("Ignoring {} message", other.kind()),
        }
    }

    /// Sender of a negotiation message meant for the local participant.
    fn addressed_sender(
        &self,
        from: Option<ParticipantId>,
        to: Option<&ParticipantId>,
        kind: &str,
    ) -> Option<ParticipantId> {
        if let Some(to) = to {
            if to != &self.ctx.local {
                debug!("Ignoring {kind} addressed to {to}");
                return None;
            }
        }
        match from {
            Some(from) if from == self.ctx.local => {
                debug!("Ignoring own {kind}");
                None
            }
            Some(from) => Some(from),
            None => {
                warn!("Ignoring {kind} without sender");
                None
            }
        }
    }

    async fn handle_command(&mut self, command: RoomCommand) {
        match command {
            RoomCommand::ToggleAudio => {
                let message = self.mute.toggle_audio(&mut self.ctx);
                let state = if self.mute.audio_muted() { "muted" } else { "unmuted" };
                self.status.info(format!("Microphone {state}")).await;
                self.output.send_signal(message).await;
            }
            RoomCommand::ToggleVideo => {
                let message = self.mute.toggle_video(&mut self.ctx);
                let state = if self.mute.video_muted() { "off" } else { "on" };
                self.status.info(format!("Camera {state}")).await;
                self.output.send_signal(message).await;
            }
            RoomCommand::SwitchCamera => self.switch_camera().await,
            RoomCommand::ToggleScreenShare => self.toggle_screen_share().await,
            RoomCommand::SendChat(text) => {
                if !self.config.extensions.chat {
                    self.status.error("Chat is disabled").await;
                } else if !text.trim().is_empty() {
                    self.output
                        .send_signal(SignalMessage::Chat { from: None, text })
                        .await;
                }
            }
            RoomCommand::Rejoin => {
                self.status.info("Rejoining").await;
                self.disconnect().await;
                self.join().await;
            }
            RoomCommand::Leave => {}
        }
    }

    async fn switch_camera(&mut self) {
        let facing = self.facing.flipped();
        let fresh = match self.media.acquire_camera(facing).await {
            Ok(media) => media,
            Err(e) => {
                self.status.error(format!("Cannot switch camera: {e}")).await;
                return;
            }
        };
        let Some(video) = fresh.video().cloned() else {
            self.status.error("Switched camera has no video").await;
            return;
        };
        self.facing = facing;

        if self.screen_sharing {
            // Shown again once sharing stops.
            self.parked_camera = Some(video);
        } else {
            self.replace_video(video).await;
        }
        self.status.info(format!("Camera: {}", describe(facing))).await;
    }

    async fn toggle_screen_share(&mut self) {
        if self.screen_sharing {
            let camera = match self.parked_camera.take() {
                Some(track) => Some(track),
                None => match self.media.acquire_camera(self.facing).await {
                    Ok(media) => media.video().cloned(),
                    Err(e) => {
                        self.status.error(format!("Cannot restore camera: {e}")).await;
                        None
                    }
                },
            };
            let Some(camera) = camera else { return };
            self.replace_video(camera).await;
            self.screen_sharing = false;
            self.status.info("Screen sharing stopped").await;
        } else {
            let screen = match self.media.acquire_screen().await {
                Ok(track) => track,
                Err(e) => {
                    self.status.error(format!("Cannot share screen: {e}")).await;
                    return;
                }
            };
            if self.ctx.local_media.is_none() {
                self.status.error("Cannot share screen: no local media").await;
                return;
            }
            self.parked_camera = self.replace_video(screen).await;
            self.screen_sharing = true;
            self.status.info("Screen sharing started").await;
        }

        if self.config.extensions.screen_share {
            self.output
                .send_signal(SignalMessage::ScreenShare {
                    from: None,
                    sharing: self.screen_sharing,
                })
                .await;
        }
    }

    /// Swaps the local video track and publishes it on every session.
    /// Returns the previous track.
    async fn replace_video(&mut self, track: LocalTrack) -> Option<LocalTrack> {
        let Some(media) = self.ctx.local_media.as_mut() else {
            return None;
        };
        let previous = media.replace_video(track);
        let published = media.video().cloned();
        let snapshot = media.clone();

        if let Some(published) = published {
            self.manager.publish_track(&mut self.ctx, &published).await;
        }
        self.observer.on_local_media(&snapshot).await;
        previous
    }
}

async fn next_channel_event(rx: &mut Option<mpsc::Receiver<ChannelEvent>>) -> Option<ChannelEvent> {
    match rx {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

fn describe(facing: CameraFacing) -> &'static str {
    match facing {
        CameraFacing::User => "front",
        CameraFacing::Environment => "rear",
    }
}
