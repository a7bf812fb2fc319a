mod candidate_queue;
mod manager;
mod peer_session;

pub use candidate_queue::CandidateQueue;
pub use manager::PeerSessionManager;
pub use peer_session::{PeerSession, PeerState};
