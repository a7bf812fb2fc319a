use std::sync::Arc;

use async_trait::async_trait;
use meshcall_client::SignalingOutput;
use meshcall_core::{IceCandidate, SessionDescription, SignalMessage};
use tokio::sync::{Mutex, mpsc};

/// SignalingOutput that captures every outbound message.
#[derive(Clone)]
pub struct MockSignalingOutput {
    tx: mpsc::UnboundedSender<SignalMessage>,
    signals: Arc<Mutex<Vec<SignalMessage>>>,
}

impl MockSignalingOutput {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<SignalMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let signaling = Self {
            tx,
            signals: Arc::new(Mutex::new(Vec::new())),
        };
        (signaling, rx)
    }

    pub fn new_stored_only() -> Self {
        Self::new().0
    }

    pub async fn signals(&self) -> Vec<SignalMessage> {
        self.signals.lock().await.clone()
    }

    pub async fn offers_to(&self, peer: &str) -> Vec<SessionDescription> {
        self.signals
            .lock()
            .await
            .iter()
            .filter_map(|s| match s {
                SignalMessage::Offer { to: Some(to), sdp, .. } if to.as_str() == peer => {
                    Some(sdp.clone())
                }
                _ => None,
            })
            .collect()
    }

    pub async fn answers_to(&self, peer: &str) -> Vec<SessionDescription> {
        self.signals
            .lock()
            .await
            .iter()
            .filter_map(|s| match s {
                SignalMessage::Answer { to: Some(to), sdp, .. } if to.as_str() == peer => {
                    Some(sdp.clone())
                }
                _ => None,
            })
            .collect()
    }

    pub async fn candidates_to(&self, peer: &str) -> Vec<IceCandidate> {
        self.signals
            .lock()
            .await
            .iter()
            .filter_map(|s| match s {
                SignalMessage::IceCandidate {
                    to: Some(to),
                    candidate,
                    ..
                } if to.as_str() == peer => Some(candidate.clone()),
                _ => None,
            })
            .collect()
    }
}

impl Default for MockSignalingOutput {
    fn default() -> Self {
        Self::new_stored_only()
    }
}

#[async_trait]
impl SignalingOutput for MockSignalingOutput {
    async fn send_signal(&self, message: SignalMessage) {
        tracing::debug!("[MockSignaling] send {}", message.kind());

        self.signals.lock().await.push(message.clone());
        let _ = self.tx.send(message);
    }
}
