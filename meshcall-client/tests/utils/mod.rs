pub mod fake_transport;
pub mod mock_signaling;
pub mod recording_observer;

pub use fake_transport::*;
pub use mock_signaling::*;
pub use recording_observer::*;
pub use room_helpers::*;
pub use ws_server::*;
