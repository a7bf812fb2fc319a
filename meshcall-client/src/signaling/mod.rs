mod channel;
mod output;

pub use channel::{ChannelEvent, ChannelState, SignalingChannel};
pub use output::SignalingOutput;
