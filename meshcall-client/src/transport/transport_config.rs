use meshcall_core::IceServerConfig;
use meshcall_core::utils::default_stun_urls;

/// Which candidate types the transport may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IceTransportPolicy {
    #[default]
    All,
    /// TURN relays only; hides host and reflexive addresses from peers.
    Relay,
}

/// Settings for every transport created in a room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportConfig {
    pub ice_servers: Vec<IceServerConfig>,
    pub policy: IceTransportPolicy,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            ice_servers: vec![IceServerConfig::stun(default_stun_urls())],
            policy: IceTransportPolicy::All,
        }
    }
}

impl TransportConfig {
    pub fn relay_only(mut self) -> Self {
        self.policy = IceTransportPolicy::Relay;
        self
    }
}
