pub mod codec;
pub mod election;
pub mod model;
pub mod utils;

mod error;

pub use codec::{Inbound, decode, encode};
pub use election::is_initiator;
pub use error::ProtocolError;
pub use model::*;
