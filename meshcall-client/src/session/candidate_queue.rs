use std::collections::VecDeque;

use meshcall_core::IceCandidate;
use tracing::warn;

use crate::transport::CandidateSink;

/// Remote candidates for one peer that arrived before its remote description.
#[derive(Debug, Default)]
pub struct CandidateQueue {
    pending: VecDeque<IceCandidate>,
    remote_description_set: bool,
}

impl CandidateQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Buffers `candidate` while no remote description is set. Otherwise hands
    /// it back so the caller applies it right away.
    pub fn enqueue(&mut self, candidate: IceCandidate) -> Option<IceCandidate> {
        if self.remote_description_set {
            return Some(candidate);
        }
        self.pending.push_back(candidate);
        None
    }

    /// Marks the remote description as set and applies every buffered
    /// candidate in arrival order. Returns how many were applied.
    pub async fn flush<S>(&mut self, sink: &S) -> usize
    where
        S: CandidateSink + ?Sized,
    {
        self.remote_description_set = true;

        let mut applied = 0;
        while let Some(candidate) = self.pending.pop_front() {
            match sink.add_ice_candidate(candidate).await {
                Ok(()) => applied += 1,
                Err(e) => warn!("Dropping buffered candidate: {e}"),
            }
        }
        applied
    }

    /// Buffers again until the next [`flush`](Self::flush), keeping anything
    /// already queued.
    pub fn rearm(&mut self) {
        self.remote_description_set = false;
    }

    /// Drops everything and forgets the remote description.
    pub fn discard(&mut self) {
        self.pending.clear();
        self.remote_description_set = false;
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn remote_description_set(&self) -> bool {
        self.remote_description_set
    }
}
