mod connection_wrapper;
mod peer_transport;
mod transport_config;
mod transport_event;

pub use connection_wrapper::{ConnectionWrapper, WebRtcTransportFactory};
pub use peer_transport::{CandidateSink, PeerTransport, TransportFactory};
pub use transport_config::{IceTransportPolicy, TransportConfig};
pub use transport_event::{ConnectionState, RemoteTrack, TransportEvent, TransportKey};
