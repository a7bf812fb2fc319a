mod membership;
mod mute_sync;
mod observer;
mod room_client;
mod room_command;
mod room_context;

pub use membership::*;
pub use mute_sync::*;
pub use observer::*;
pub use room_client::*;
pub use room_command::*;
pub use room_context::*;
