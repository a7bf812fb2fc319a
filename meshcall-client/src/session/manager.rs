use std::sync::Arc;

use meshcall_core::{IceCandidate, ParticipantId, SessionDescription, is_initiator};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::error::TransportError;
use crate::media::LocalTrack;
use crate::room::{RoomContext, RoomObserver};
use crate::session::{PeerSession, PeerState};
use crate::signaling::SignalingOutput;
use crate::status::StatusLog;
use crate::transport::{
    ConnectionState, PeerTransport, TransportEvent, TransportFactory, TransportKey,
};

/// Drives the per-peer session state machine.
///
/// Every operation runs inside the room actor and is awaited to completion
/// before the next event is handled, so a peer never has two negotiation
/// steps running at once. Sessions are taken out of the context map while
/// being worked on and put back afterwards.
pub struct PeerSessionManager {
    transports: Arc<dyn TransportFactory>,
    signaling: Arc<dyn SignalingOutput>,
    observer: Arc<dyn RoomObserver>,
    status: StatusLog,
    transport_tx: mpsc::Sender<TransportEvent>,
    next_generation: u64,
    max_ice_restarts: u32,
}

impl PeerSessionManager {
    pub fn new(
        transports: Arc<dyn TransportFactory>,
        signaling: Arc<dyn SignalingOutput>,
        observer: Arc<dyn RoomObserver>,
        transport_tx: mpsc::Sender<TransportEvent>,
        max_ice_restarts: u32,
    ) -> Self {
        Self {
            transports,
            signaling,
            status: StatusLog::new(observer.clone()),
            observer,
            transport_tx,
            next_generation: 0,
            max_ice_restarts,
        }
    }

    pub fn has_live_session(&self, ctx: &RoomContext, peer: &ParticipantId) -> bool {
        ctx.sessions.get(peer).is_some_and(PeerSession::is_live)
    }

    /// Sends the first offer to `peer`. No-op unless the peer is present,
    /// local media is ready and no live session exists yet.
    pub async fn initiate(&mut self, ctx: &mut RoomContext, peer: &ParticipantId) {
        if peer == &ctx.local || !ctx.is_present(peer) {
            return;
        }
        if !ctx.media_ready() {
            debug!("Not offering to {peer}: local media is not ready");
            return;
        }

        let mut session = self.take_or_create(ctx, peer);
        if session.is_live() {
            ctx.sessions.insert(peer.clone(), session);
            return;
        }

        info!("Offering to {peer}");
        if let Err(e) = self.send_offer(ctx, &mut session, false).await {
            self.negotiation_failed(&mut session, "offer", e).await;
        }
        ctx.sessions.insert(peer.clone(), session);
    }

    pub async fn handle_offer(
        &mut self,
        ctx: &mut RoomContext,
        from: ParticipantId,
        sdp: SessionDescription,
    ) {
        if !ctx.is_present(&from) {
            self.status
                .error(format!("Refusing offer from {from}: not in the room"))
                .await;
            return;
        }
        if !ctx.media_ready() {
            self.status
                .error(format!("Refusing offer from {from}: local media unavailable"))
                .await;
            return;
        }

        let mut session = self.take_or_create(ctx, &from);
        if session.awaiting_answer && is_initiator(&ctx.local, &from) {
            warn!("Ignoring offer from {from}: own offer is outstanding");
            ctx.sessions.insert(from, session);
            return;
        }

        if let Err(e) = self.answer_offer(ctx, &mut session, sdp).await {
            self.negotiation_failed(&mut session, "answer", e).await;
        }
        ctx.sessions.insert(from, session);
    }

    pub async fn handle_answer(
        &mut self,
        ctx: &mut RoomContext,
        from: ParticipantId,
        sdp: SessionDescription,
    ) {
        let Some(mut session) = ctx.sessions.remove(&from) else {
            warn!("Ignoring answer from {from}: no session");
            return;
        };
        if !session.awaiting_answer {
            warn!("Ignoring answer from {from}: no offer outstanding");
            ctx.sessions.insert(from, session);
            return;
        }

        match self.apply_answer(&mut session, sdp).await {
            Ok(()) => {
                session.awaiting_answer = false;
                session.negotiated_once = true;
                self.settle(&mut session).await;

                if session.pending_renegotiation {
                    let ice_restart = session.pending_ice_restart;
                    session.pending_renegotiation = false;
                    session.pending_ice_restart = false;
                    debug!("Running deferred renegotiation with {from}");
                    if let Err(e) = self.send_offer(ctx, &mut session, ice_restart).await {
                        self.negotiation_failed(&mut session, "renegotiation", e).await;
                    }
                }
            }
            Err(e) => self.negotiation_failed(&mut session, "answer", e).await,
        }
        ctx.sessions.insert(from, session);
    }

    /// Applies or buffers a remote candidate. Candidates from participants
    /// outside the room are dropped.
    pub async fn handle_candidate(
        &mut self,
        ctx: &mut RoomContext,
        from: ParticipantId,
        candidate: IceCandidate,
    ) {
        let mut session = match ctx.sessions.remove(&from) {
            Some(session) => session,
            None if ctx.is_present(&from) => self.allocate(from.clone()),
            None => {
                debug!("Dropping candidate from {from}: not in the room");
                return;
            }
        };

        if let Some(candidate) = session.candidates.enqueue(candidate) {
            match session.transport.as_deref() {
                Some(transport) => {
                    if let Err(e) = transport.add_ice_candidate(candidate).await {
                        warn!("Failed to add candidate from {from}: {e}");
                    }
                }
                None => debug!("Dropping candidate from {from}: no transport"),
            }
        } else {
            debug!("Buffered candidate from {from} ({} queued)", session.candidates.len());
        }
        ctx.sessions.insert(from, session);
    }

    pub async fn handle_transport_event(&mut self, ctx: &mut RoomContext, event: TransportEvent) {
        let current = ctx
            .sessions
            .get(&event.key().peer)
            .is_some_and(|s| s.is_current(event.key()));
        if !current {
            debug!("Dropping event from stale transport {}", event.key());
            return;
        }

        match event {
            TransportEvent::CandidateGenerated(key, candidate) => {
                self.signaling.send_ice(key.peer, candidate).await;
            }
            TransportEvent::RemoteTrack(key, track) => {
                info!("Receiving {} from {}", track.kind, key.peer);
                self.observer.on_remote_track(&key.peer, &track).await;
            }
            TransportEvent::StateChanged(key, state) => {
                self.handle_transport_state(ctx, key, state).await;
            }
        }
    }

    async fn handle_transport_state(
        &mut self,
        ctx: &mut RoomContext,
        key: TransportKey,
        state: ConnectionState,
    ) {
        let Some(mut session) = ctx.sessions.remove(&key.peer) else {
            return;
        };

        match state {
            ConnectionState::New | ConnectionState::Checking => {}
            ConnectionState::Connected => {
                session.transport_connected = true;
                session.ice_restarts = 0;
                self.settle(&mut session).await;
            }
            ConnectionState::Disconnected => {
                session.transport_connected = false;
                self.degrade(&mut session).await;
            }
            ConnectionState::Failed => {
                session.transport_connected = false;
                self.degrade(&mut session).await;

                if !is_initiator(&ctx.local, &key.peer) {
                    debug!("ICE failed with {}; waiting for a restart offer", key.peer);
                } else if session.ice_restarts >= self.max_ice_restarts {
                    self.status
                        .error(format!(
                            "Connection to {} failed after {} ICE restarts",
                            key.peer, session.ice_restarts
                        ))
                        .await;
                    self.close_session(session).await;
                    return;
                } else {
                    session.ice_restarts += 1;
                    self.status
                        .info(format!(
                            "Connection to {} failed, restarting ICE ({}/{})",
                            key.peer, session.ice_restarts, self.max_ice_restarts
                        ))
                        .await;
                    self.renegotiate(ctx, &mut session, true).await;
                }
            }
            ConnectionState::Closed => {
                self.close_session(session).await;
                return;
            }
        }
        ctx.sessions.insert(key.peer, session);
    }

    /// Publishes `track` on every session that has a transport, then has each
    /// session the local side initiates renegotiate.
    pub async fn publish_track(&mut self, ctx: &mut RoomContext, track: &LocalTrack) {
        let Some(stream_id) = ctx.local_media.as_ref().map(|m| m.stream_id.clone()) else {
            return;
        };

        let peers: Vec<ParticipantId> = ctx.sessions.keys().cloned().collect();
        for peer in peers {
            let Some(mut session) = ctx.sessions.remove(&peer) else {
                continue;
            };

            if let Some(transport) = session.transport.as_deref() {
                match transport.publish_track(&stream_id, track).await {
                    Ok(()) if is_initiator(&ctx.local, &peer) => {
                        self.renegotiate(ctx, &mut session, false).await;
                    }
                    Ok(()) => {}
                    Err(e) => {
                        self.status
                            .error(format!("Failed to send {} to {peer}: {e}", track.kind))
                            .await;
                    }
                }
            }
            ctx.sessions.insert(peer, session);
        }
    }

    /// Sends a fresh offer on an established session, or defers it until the
    /// outstanding answer arrives.
    pub async fn renegotiate(
        &mut self,
        ctx: &RoomContext,
        session: &mut PeerSession,
        ice_restart: bool,
    ) {
        if session.transport.is_none() {
            return;
        }
        if session.awaiting_answer {
            debug!("Deferring renegotiation with {}", session.peer);
            session.pending_renegotiation = true;
            session.pending_ice_restart |= ice_restart;
            return;
        }
        if let Err(e) = self.send_offer(ctx, session, ice_restart).await {
            self.negotiation_failed(session, "renegotiation", e).await;
        }
    }

    /// Restarts ICE on a `Degraded` session the local side initiates. Sessions
    /// with an offer outstanding are left alone.
    pub async fn retry_degraded(&mut self, ctx: &mut RoomContext, peer: &ParticipantId) {
        if !is_initiator(&ctx.local, peer) {
            return;
        }
        let Some(mut session) = ctx.sessions.remove(peer) else {
            return;
        };
        if session.state == PeerState::Degraded && !session.awaiting_answer {
            info!("Retrying degraded session with {peer}");
            self.renegotiate(ctx, &mut session, true).await;
        }
        ctx.sessions.insert(peer.clone(), session);
    }

    /// Removes and closes the session with `peer`. Repeated calls are no-ops.
    pub async fn teardown(&mut self, ctx: &mut RoomContext, peer: &ParticipantId) {
        let Some(session) = ctx.sessions.remove(peer) else {
            return;
        };
        self.close_session(session).await;
    }

    pub async fn teardown_all(&mut self, ctx: &mut RoomContext) {
        let sessions: Vec<PeerSession> = ctx.sessions.drain().map(|(_, s)| s).collect();
        for session in sessions {
            self.close_session(session).await;
        }
    }

    fn allocate(&mut self, peer: ParticipantId) -> PeerSession {
        self.next_generation += 1;
        PeerSession::new(peer, self.next_generation)
    }

    fn take_or_create(&mut self, ctx: &mut RoomContext, peer: &ParticipantId) -> PeerSession {
        match ctx.sessions.remove(peer) {
            Some(session) => session,
            None => self.allocate(peer.clone()),
        }
    }

    async fn ensure_transport(
        &self,
        ctx: &RoomContext,
        session: &mut PeerSession,
    ) -> Result<(), TransportError> {
        if session.transport.is_some() {
            return Ok(());
        }

        let transport = self
            .transports
            .create(session.key(), &ctx.transport_config, self.transport_tx.clone())
            .await?;

        if let Some(media) = &ctx.local_media {
            for track in media.tracks() {
                if let Err(e) = transport.publish_track(&media.stream_id, track).await {
                    if let Err(close) = transport.close().await {
                        warn!("Closing transport {} failed: {close}", session.key());
                    }
                    return Err(e);
                }
            }
        }

        debug!("Created transport {}", session.key());
        session.transport = Some(transport);
        Ok(())
    }

    async fn send_offer(
        &mut self,
        ctx: &RoomContext,
        session: &mut PeerSession,
        ice_restart: bool,
    ) -> Result<(), TransportError> {
        self.ensure_transport(ctx, session).await?;
        let offer = transport_of(session)?.create_offer(ice_restart).await?;

        if ice_restart {
            // Restart candidates belong to the answer that has not arrived yet.
            session.candidates.rearm();
        }
        session.awaiting_answer = true;
        self.transition(session, PeerState::Negotiating).await;
        self.signaling.send_offer(session.peer.clone(), offer).await;
        Ok(())
    }

    async fn answer_offer(
        &mut self,
        ctx: &RoomContext,
        session: &mut PeerSession,
        sdp: SessionDescription,
    ) -> Result<(), TransportError> {
        self.ensure_transport(ctx, session).await?;

        let Some(transport) = session.transport.as_deref() else {
            return Err(missing_transport(&session.peer));
        };
        transport.set_remote_description(sdp).await?;
        let flushed = session.candidates.flush(transport).await;
        if flushed > 0 {
            debug!("Applied {flushed} buffered candidates from {}", session.peer);
        }
        let answer = transport.create_answer().await?;

        session.negotiated_once = true;
        self.transition(session, PeerState::Negotiating).await;
        self.signaling.send_answer(session.peer.clone(), answer).await;
        self.settle(session).await;
        Ok(())
    }

    async fn apply_answer(
        &self,
        session: &mut PeerSession,
        sdp: SessionDescription,
    ) -> Result<(), TransportError> {
        let Some(transport) = session.transport.as_deref() else {
            return Err(missing_transport(&session.peer));
        };
        transport.set_remote_description(sdp).await?;
        let flushed = session.candidates.flush(transport).await;
        if flushed > 0 {
            debug!("Applied {flushed} buffered candidates from {}", session.peer);
        }
        Ok(())
    }

    /// Moves to `Connected` once ICE is up and no offer is outstanding.
    async fn settle(&self, session: &mut PeerSession) {
        if session.transport_connected && !session.awaiting_answer {
            self.transition(session, PeerState::Connected).await;
        }
    }

    async fn degrade(&self, session: &mut PeerSession) {
        if matches!(session.state, PeerState::Connected | PeerState::Negotiating) {
            self.transition(session, PeerState::Degraded).await;
        }
    }

    async fn negotiation_failed(
        &mut self,
        session: &mut PeerSession,
        step: &str,
        error: TransportError,
    ) {
        self.status
            .error(format!("Negotiation with {} failed ({step}): {error}", session.peer))
            .await;

        session.awaiting_answer = false;
        session.pending_renegotiation = false;
        session.pending_ice_restart = false;

        if session.negotiated_once {
            self.transition(session, PeerState::Degraded).await;
            return;
        }

        if let Some(transport) = session.transport.take() {
            if let Err(e) = transport.close().await {
                warn!("Closing transport {} failed: {e}", session.key());
            }
        }
        session.candidates.discard();
        // Events from the released handle must not reach the next one.
        self.next_generation += 1;
        session.generation = self.next_generation;
        self.transition(session, PeerState::Idle).await;
    }

    async fn close_session(&self, mut session: PeerSession) {
        session.candidates.discard();
        if let Some(transport) = session.transport.take() {
            if let Err(e) = transport.close().await {
                warn!("Closing transport {} failed: {e}", session.key());
            }
        }
        session.state = PeerState::Closed;
        info!("Session with {} closed", session.peer);

        self.observer
            .on_peer_state(&session.peer, PeerState::Closed)
            .await;
        self.observer.on_peer_removed(&session.peer).await;
    }

    async fn transition(&self, session: &mut PeerSession, state: PeerState) {
        if session.state == state {
            return;
        }
        debug!("{}: {} -> {}", session.peer, session.state, state);
        session.state = state;
        self.observer.on_peer_state(&session.peer, state).await;
    }
}

fn transport_of(session: &PeerSession) -> Result<&dyn PeerTransport, TransportError> {
    session
        .transport
        .as_deref()
        .ok_or_else(|| missing_transport(&session.peer))
}

fn missing_transport(peer: &ParticipantId) -> TransportError {
    TransportError::Negotiation(format!("no transport for {peer}"))
}
