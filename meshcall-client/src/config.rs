use std::time::Duration;

use meshcall_core::{ParticipantId, RoomId};
use url::Url;

use crate::error::ClientError;
use crate::transport::TransportConfig;

/// Default number of reconnect attempts before the channel gives up.
pub const DEFAULT_MAX_RECONNECT_ATTEMPTS: u32 = 10;

/// Default number of in-place ICE restarts per session before it is torn down.
pub const DEFAULT_MAX_ICE_RESTARTS: u32 = 3;

/// How the delay between reconnect attempts grows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    Fixed,
    Linear,
    Exponential,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub backoff: Backoff,
    pub base_delay: Duration,
    pub max_delay: Duration,
    /// `None` retries forever.
    pub max_attempts: Option<u32>,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            backoff: Backoff::Linear,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            max_attempts: Some(DEFAULT_MAX_RECONNECT_ATTEMPTS),
        }
    }
}

impl ReconnectPolicy {
    /// Delay before reconnect attempt number `attempt` (1-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let attempt = attempt.max(1);
        let delay = match self.backoff {
            Backoff::Fixed => self.base_delay,
            Backoff::Linear => self.base_delay.saturating_mul(attempt),
            Backoff::Exponential => {
                let factor = 1u32.checked_shl(attempt - 1).unwrap_or(u32::MAX);
                self.base_delay.saturating_mul(factor)
            }
        };
        delay.min(self.max_delay)
    }

    pub fn allows(&self, attempt: u32) -> bool {
        self.max_attempts.is_none_or(|max| attempt <= max)
    }
}

/// Optional protocol extensions; both are advisory pass-through features.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Extensions {
    pub chat: bool,
    pub screen_share: bool,
}

impl Default for Extensions {
    fn default() -> Self {
        Self {
            chat: true,
            screen_share: true,
        }
    }
}

/// Everything a participant needs to join one room.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub server_url: Url,
    pub room: RoomId,
    pub participant: ParticipantId,
    pub transport: TransportConfig,
    pub reconnect: ReconnectPolicy,
    pub extensions: Extensions,
    pub max_ice_restarts: u32,
}

impl ClientConfig {
    pub fn new(
        server_url: &str,
        room: impl Into<RoomId>,
        participant: impl Into<ParticipantId>,
    ) -> Result<Self, ClientError> {
        let room = room.into();
        let participant = participant.into();

        if room.is_empty() {
            return Err(ClientError::Config("room id must not be empty".into()));
        }
        if participant.is_empty() {
            return Err(ClientError::Config("participant name must not be empty".into()));
        }

        let mut server_url = Url::parse(server_url)
            .map_err(|e| ClientError::Config(format!("invalid server url {server_url:?}: {e}")))?;

        let scheme = match server_url.scheme() {
            "ws" | "http" => "ws",
            "wss" | "https" => "wss",
            other => {
                return Err(ClientError::Config(format!(
                    "unsupported server url scheme {other:?}"
                )));
            }
        };
        if server_url.set_scheme(scheme).is_err() || server_url.cannot_be_a_base() {
            return Err(ClientError::Config(format!(
                "server url {server_url} cannot carry a path"
            )));
        }

        Ok(Self {
            server_url,
            room,
            participant,
            transport: TransportConfig::default(),
            reconnect: ReconnectPolicy::default(),
            extensions: Extensions::default(),
            max_ice_restarts: DEFAULT_MAX_ICE_RESTARTS,
        })
    }

    pub fn with_transport(mut self, transport: TransportConfig) -> Self {
        self.transport = transport;
        self
    }

    pub fn with_reconnect(mut self, reconnect: ReconnectPolicy) -> Self {
        self.reconnect = reconnect;
        self
    }

    pub fn with_extensions(mut self, extensions: Extensions) -> Self {
        self.extensions = extensions;
        self
    }

    pub fn with_max_ice_restarts(mut self, max: u32) -> Self {
        self.max_ice_restarts = max;
        self
    }

    /// Room-scoped signaling endpoint: `<server>/ws/<room>/<participant>`.
    pub fn endpoint(&self) -> Result<Url, ClientError> {
        let mut url = self.server_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                ClientError::Config(format!("server url {} cannot carry a path", self.server_url))
            })?
            .pop_if_empty()
            .push("ws")
            .push(self.room.as_str())
            .push(self.participant.as_str());
        Ok(url)
    }
}
