use std::sync::Arc;

use meshcall_core::{Participant, ParticipantId, is_initiator};
use tracing::{debug, info};

use crate::room::{RoomContext, RoomObserver};
use crate::session::PeerSessionManager;

/// Keeps the session map in line with the authoritative participant list.
pub struct RoomMembershipTracker {
    observer: Arc<dyn RoomObserver>,
}

impl RoomMembershipTracker {
    pub fn new(observer: Arc<dyn RoomObserver>) -> Self {
        Self { observer }
    }

    /// Stores a fresh `room_state` list and reconciles against it.
    pub async fn apply_room_state(
        &self,
        ctx: &mut RoomContext,
        manager: &mut PeerSessionManager,
        users: Vec<Participant>,
    ) {
        debug!("Room {} has {} participants", ctx.room, users.len());
        ctx.participants = users;
        self.observer.on_room_state(&ctx.participants).await;
        self.reconcile(ctx, manager).await;
    }

    /// Tears down sessions of departed participants, then offers to every
    /// present participant the local side initiates with and has no live
    /// session for. Degraded sessions with those participants get an ICE
    /// restart. Offers wait until local media is ready.
    pub async fn reconcile(&self, ctx: &mut RoomContext, manager: &mut PeerSessionManager) {
        let departed: Vec<ParticipantId> = ctx
            .sessions
            .keys()
            .filter(|peer| !ctx.is_present(peer))
            .cloned()
            .collect();
        for peer in departed {
            info!("{peer} left {}", ctx.room);
            manager.teardown(ctx, &peer).await;
        }

        if !ctx.media_ready() {
            debug!("Local media not ready; offers postponed");
            return;
        }

        let targets: Vec<ParticipantId> = ctx
            .participants
            .iter()
            .map(|p| p.name.clone())
            .filter(|peer| peer != &ctx.local)
            .filter(|peer| is_initiator(&ctx.local, peer))
            .collect();
        for peer in targets {
            if manager.has_live_session(ctx, &peer) {
                manager.retry_degraded(ctx, &peer).await;
            } else {
                manager.initiate(ctx, &peer).await;
            }
        }
    }
}
