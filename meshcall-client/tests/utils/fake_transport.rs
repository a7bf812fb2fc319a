use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use meshcall_client::{
    CandidateSink, ConnectionState, LocalTrack, PeerTransport, TrackKind, TransportConfig,
    TransportError, TransportEvent, TransportFactory, TransportKey,
};
use meshcall_core::{IceCandidate, ParticipantId, SdpKind, SessionDescription};
use tokio::sync::mpsc;

/// One call made on a fake transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportCall {
    Created,
    Offer { ice_restart: bool },
    Answer,
    RemoteDescription(SdpKind),
    Candidate(String),
    Publish { kind: TrackKind, track_id: String },
    Closed,
}

#[derive(Default)]
struct FakeInner {
    calls: Mutex<Vec<(TransportKey, TransportCall)>>,
    events: Mutex<HashMap<TransportKey, mpsc::Sender<TransportEvent>>>,
    sdp_counter: AtomicUsize,
    fail_create: AtomicBool,
    fail_offer: AtomicBool,
    fail_remote_description: AtomicBool,
    fail_close: AtomicBool,
}

/// Transport factory that records every call and lets tests raise
/// transport events by hand.
#[derive(Clone, Default)]
pub struct FakeTransportFactory {
    inner: Arc<FakeInner>,
}

impl FakeTransportFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_create(&self, fail: bool) {
        self.inner.fail_create.store(fail, Ordering::SeqCst);
    }

    pub fn fail_offer(&self, fail: bool) {
        self.inner.fail_offer.store(fail, Ordering::SeqCst);
    }

    pub fn fail_remote_description(&self, fail: bool) {
        self.inner.fail_remote_description.store(fail, Ordering::SeqCst);
    }

    pub fn fail_close(&self, fail: bool) {
        self.inner.fail_close.store(fail, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<(TransportKey, TransportCall)> {
        self.inner.calls.lock().unwrap().clone()
    }

    /// Calls on every transport created for `peer`, oldest first.
    pub fn calls_for(&self, peer: &str) -> Vec<TransportCall> {
        self.calls()
            .into_iter()
            .filter(|(key, _)| key.peer.as_str() == peer)
            .map(|(_, call)| call)
            .collect()
    }

    pub fn count_for(&self, peer: &str, call: &TransportCall) -> usize {
        self.calls_for(peer).iter().filter(|c| *c == call).count()
    }

    pub fn offers_for(&self, peer: &str) -> Vec<bool> {
        self.calls_for(peer)
            .into_iter()
            .filter_map(|call| match call {
                TransportCall::Offer { ice_restart } => Some(ice_restart),
                _ => None,
            })
            .collect()
    }

    /// Key of the newest transport created for `peer`.
    pub fn latest_key(&self, peer: &str) -> Option<TransportKey> {
        self.calls()
            .into_iter()
            .filter(|(key, call)| key.peer.as_str() == peer && *call == TransportCall::Created)
            .map(|(key, _)| key)
            .last()
    }

    pub async fn emit(&self, key: &TransportKey, event: TransportEvent) {
        let tx = self.inner.events.lock().unwrap().get(key).cloned();
        if let Some(tx) = tx {
            let _ = tx.send(event).await;
        }
    }

    pub async fn emit_state(&self, key: &TransportKey, state: ConnectionState) {
        self.emit(key, TransportEvent::StateChanged(key.clone(), state))
            .await;
    }

    pub async fn emit_candidate(&self, key: &TransportKey, candidate: &str) {
        self.emit(
            key,
            TransportEvent::CandidateGenerated(key.clone(), IceCandidate::new(candidate)),
        )
        .await;
    }
}

#[async_trait]
impl TransportFactory for FakeTransportFactory {
    async fn create(
        &self,
        key: TransportKey,
        _config: &TransportConfig,
        events: mpsc::Sender<TransportEvent>,
    ) -> Result<Box<dyn PeerTransport>, TransportError> {
        if self.inner.fail_create.load(Ordering::SeqCst) {
            return Err(TransportError::Setup("injected create failure".into()));
        }
        self.inner
            .events
            .lock()
            .unwrap()
            .insert(key.clone(), events);

        let transport = FakeTransport {
            key,
            inner: Arc::clone(&self.inner),
        };
        transport.record(TransportCall::Created);
        Ok(Box::new(transport))
    }
}

pub struct FakeTransport {
    key: TransportKey,
    inner: Arc<FakeInner>,
}

impl FakeTransport {
    fn record(&self, call: TransportCall) {
        self.inner
            .calls
            .lock()
            .unwrap()
            .push((self.key.clone(), call));
    }

    fn next_sdp(&self, kind: &str) -> String {
        let n = self.inner.sdp_counter.fetch_add(1, Ordering::SeqCst);
        format!("{kind}-{}-{n}", self.key)
    }
}

#[async_trait]
impl CandidateSink for FakeTransport {
    async fn add_ice_candidate(&self, candidate: IceCandidate) -> Result<(), TransportError> {
        self.record(TransportCall::Candidate(candidate.candidate));
        Ok(())
    }
}

#[async_trait]
impl PeerTransport for FakeTransport {
    fn key(&self) -> &TransportKey {
        &self.key
    }

    async fn create_offer(&self, ice_restart: bool) -> Result<SessionDescription, TransportError> {
        if self.inner.fail_offer.load(Ordering::SeqCst) {
            return Err(TransportError::Negotiation("injected offer failure".into()));
        }
        self.record(TransportCall::Offer { ice_restart });
        Ok(SessionDescription::offer(self.next_sdp("offer")))
    }

    async fn create_answer(&self) -> Result<SessionDescription, TransportError> {
        self.record(TransportCall::Answer);
        Ok(SessionDescription::answer(self.next_sdp("answer")))
    }

    async fn set_remote_description(
        &self,
        description: SessionDescription,
    ) -> Result<(), TransportError> {
        if self.inner.fail_remote_description.load(Ordering::SeqCst) {
            return Err(TransportError::Negotiation("injected sdp failure".into()));
        }
        self.record(TransportCall::RemoteDescription(description.kind));
        Ok(())
    }

    async fn publish_track(
        &self,
        _stream_id: &str,
        track: &LocalTrack,
    ) -> Result<(), TransportError> {
        self.record(TransportCall::Publish {
            kind: track.kind,
            track_id: track.id.clone(),
        });
        Ok(())
    }

    async fn close(&self) -> Result<(), TransportError> {
        self.record(TransportCall::Closed);
        if self.inner.fail_close.load(Ordering::SeqCst) {
            return Err(TransportError::Close("injected close failure".into()));
        }
        Ok(())
    }
}

pub fn peer(name: &str) -> ParticipantId {
    ParticipantId::from(name)
}
