use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use meshcall_core::{Inbound, SignalMessage, decode, encode};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, error, info, warn};
use url::Url;

use crate::config::ReconnectPolicy;
use crate::signaling::SignalingOutput;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    Connecting,
    Open,
    Reconnecting { attempt: u32 },
    Closed,
    /// Reconnect attempts are exhausted. Terminal.
    GaveUp,
}

/// What the channel reports to its owner.
#[derive(Debug)]
pub enum ChannelEvent {
    Opened { reconnected: bool },
    Message(SignalMessage),
    /// The connection dropped without `shutdown()`.
    Closed,
    Reconnecting { attempt: u32, delay: Duration },
    GaveUp { attempts: u32 },
}

/// Handle to a room-scoped signaling connection.
///
/// A supervisor task owns the socket and reconnects according to the
/// [`ReconnectPolicy`]. Dropping every handle shuts it down.
#[derive(Clone)]
pub struct SignalingChannel {
    outbound: watch::Receiver<Option<mpsc::UnboundedSender<String>>>,
    state: watch::Receiver<ChannelState>,
    shutdown: Arc<watch::Sender<bool>>,
}

impl SignalingChannel {
    pub fn open(endpoint: Url, policy: ReconnectPolicy) -> (Self, mpsc::Receiver<ChannelEvent>) {
        let (event_tx, event_rx) = mpsc::channel(256);
        let (outbound_tx, outbound_rx) = watch::channel(None);
        let (state_tx, state_rx) = watch::channel(ChannelState::Connecting);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let supervisor = Supervisor {
            endpoint,
            policy,
            events: event_tx,
            outbound: outbound_tx,
            state: state_tx,
            shutdown: shutdown_rx,
        };
        tokio::spawn(supervisor.run());

        let channel = Self {
            outbound: outbound_rx,
            state: state_rx,
            shutdown: Arc::new(shutdown_tx),
        };
        (channel, event_rx)
    }

    /// Sends `message` if the channel is open; drops it otherwise.
    pub fn send(&self, message: &SignalMessage) -> bool {
        let text = match encode(message) {
            Ok(text) => text,
            Err(e) => {
                error!("Failed to encode {} message: {e}", message.kind());
                return false;
            }
        };

        let sent = match self.outbound.borrow().as_ref() {
            Some(tx) => tx.send(text).is_ok(),
            None => false,
        };
        if !sent {
            warn!("Signaling channel is not open, dropping {} message", message.kind());
        }
        sent
    }

    pub fn state(&self) -> ChannelState {
        *self.state.borrow()
    }

    pub fn state_changes(&self) -> watch::Receiver<ChannelState> {
        self.state.clone()
    }

    /// Closes the socket and cancels any pending reconnect timer.
    pub fn shutdown(&self) {
        self.shutdown.send_replace(true);
    }
}

#[async_trait]
impl SignalingOutput for SignalingChannel {
    async fn send_signal(&self, message: SignalMessage) {
        self.send(&message);
    }
}

enum PumpExit {
    Dropped,
    Shutdown,
    OwnerGone,
}

struct Supervisor {
    endpoint: Url,
    policy: ReconnectPolicy,
    events: mpsc::Sender<ChannelEvent>,
    outbound: watch::Sender<Option<mpsc::UnboundedSender<String>>>,
    state: watch::Sender<ChannelState>,
    shutdown: watch::Receiver<bool>,
}

impl Supervisor {
    async fn run(mut self) {
        let mut attempt = 0u32;
        let mut opened_before = false;
        let mut final_state = ChannelState::Closed;

        loop {
            if *self.shutdown.borrow() {
                break;
            }

            let connected = tokio::select! {
                res = connect_async(self.endpoint.as_str()) => res,
                _ = self.shutdown.changed() => break,
            };

            match connected {
                Ok((stream, _)) => {
                    attempt = 0;
                    info!("Signaling channel open: {}", self.endpoint);

                    let (tx, rx) = mpsc::unbounded_channel();
                    self.outbound.send_replace(Some(tx));
                    self.state.send_replace(ChannelState::Open);
                    let opened = ChannelEvent::Opened {
                        reconnected: opened_before,
                    };
                    if self.events.send(opened).await.is_err() {
                        break;
                    }
                    opened_before = true;

                    let exit = self.pump(stream, rx).await;
                    self.outbound.send_replace(None);
                    match exit {
                        PumpExit::Shutdown | PumpExit::OwnerGone => break,
                        PumpExit::Dropped => {
                            warn!("Signaling channel closed unexpectedly");
                            if self.events.send(ChannelEvent::Closed).await.is_err() {
                                break;
                            }
                        }
                    }
                }
                Err(e) => warn!("Signaling connect to {} failed: {e}", self.endpoint),
            }

            attempt += 1;
            if !self.policy.allows(attempt) {
                let attempts = attempt - 1;
                error!("Giving up on signaling after {attempts} reconnect attempts");
                final_state = ChannelState::GaveUp;
                self.state.send_replace(ChannelState::GaveUp);
                let _ = self.events.send(ChannelEvent::GaveUp { attempts }).await;
                break;
            }

            let delay = self.policy.delay_for(attempt);
            info!("Reconnecting signaling in {delay:?} (attempt {attempt})");
            self.state
                .send_replace(ChannelState::Reconnecting { attempt });
            let reconnecting = ChannelEvent::Reconnecting { attempt, delay };
            if self.events.send(reconnecting).await.is_err() {
                break;
            }

            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = self.shutdown.changed() => break,
            }
        }

        self.outbound.send_replace(None);
        if final_state != ChannelState::GaveUp {
            self.state.send_replace(ChannelState::Closed);
        }
        debug!("Signaling supervisor for {} stopped", self.endpoint);
    }

    async fn pump(
        &mut self,
        stream: WsStream,
        mut outbound: mpsc::UnboundedReceiver<String>,
    ) -> PumpExit {
        let (mut sink, mut source) = stream.split();

        loop {
            tokio::select! {
                out = outbound.recv() => {
                    let Some(text) = out else { return PumpExit::Dropped };
                    if let Err(e) = sink.send(Message::Text(text)).await {
                        warn!("Signaling write failed: {e}");
                        return PumpExit::Dropped;
                    }
                }

                frame = source.next() => {
                    let text = match frame {
                        Some(Ok(Message::Text(text))) => text,
                        Some(Ok(Message::Binary(data))) => match String::from_utf8(data) {
                            Ok(text) => text,
                            Err(_) => {
                                warn!("Ignoring non UTF-8 binary signaling frame");
                                continue;
                            }
                        },
                        Some(Ok(Message::Close(_))) | None => return PumpExit::Dropped,
                        Some(Ok(_)) => continue,
                        Some(Err(e)) => {
                            warn!("Signaling read failed: {e}");
                            return PumpExit::Dropped;
                        }
                    };
                    if !self.dispatch(&text).await {
                        return PumpExit::OwnerGone;
                    }
                }

                _ = self.shutdown.changed() => {
                    let _ = sink.send(Message::Close(None)).await;
                    return PumpExit::Shutdown;
                }
            }
        }
    }

    /// Returns false once nobody listens for events any more.
    async fn dispatch(&self, text: &str) -> bool {
        match decode(text) {
            Ok(Inbound::Message(message)) => {
                debug!(kind = message.kind(), from = ?message.sender(), "Inbound signal");
                self.events.send(ChannelEvent::Message(message)).await.is_ok()
            }
            Ok(Inbound::Unknown(kind)) => {
                debug!("Ignoring signal of unknown type {kind:?}");
                true
            }
            Err(e) => {
                warn!("Ignoring malformed signal: {e}");
                true
            }
        }
    }
}
