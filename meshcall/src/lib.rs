pub use meshcall_core::{Participant, ParticipantId, RoomId, SignalMessage};

pub mod model {
    pub use meshcall_core::model::*;
}

pub mod protocol {
    pub use meshcall_core::{Inbound, ProtocolError, decode, encode, is_initiator};
}

#[cfg(feature = "client")]
pub mod client {
    pub use meshcall_client::*;
}

#[cfg(feature = "server")]
pub mod server {
    pub use meshcall_server::*;
}
