use meshcall_core::ProtocolError;
use thiserror::Error;

/// Failures reported by the real-time transport capability.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("failed to set up transport: {0}")]
    Setup(String),

    #[error("negotiation failed: {0}")]
    Negotiation(String),

    #[error("failed to apply candidate: {0}")]
    Candidate(String),

    #[error("failed to publish track: {0}")]
    Track(String),

    #[error("failed to close transport: {0}")]
    Close(String),
}

/// Failures of the local media capability.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("media capture denied: {0}")]
    Denied(String),

    #[error("media device unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Media(#[from] MediaError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error("room client has stopped")]
    Stopped,
}
