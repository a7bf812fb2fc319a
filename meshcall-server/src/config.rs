use std::net::SocketAddr;
use std::path::Path;

use meshcall_core::IceServerConfig;
use meshcall_core::utils::default_stun_urls;

use crate::error::ServerError;

pub const DEFAULT_BIND: &str = "0.0.0.0:8000";

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind: SocketAddr,
    /// Sent to every participant right after it joins.
    pub ice_servers: Vec<IceServerConfig>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([0, 0, 0, 0], 8000)),
            ice_servers: vec![IceServerConfig::stun(default_stun_urls())],
        }
    }
}

impl ServerConfig {
    pub fn with_bind(mut self, bind: SocketAddr) -> Self {
        self.bind = bind;
        self
    }

    /// Replaces the ICE servers with the JSON list in `path`.
    pub fn with_ice_servers_file(mut self, path: &Path) -> Result<Self, ServerError> {
        self.ice_servers = load_ice_servers(path)?;
        Ok(self)
    }
}

/// Reads `[{"urls": ..., "username"?: ..., "credential"?: ...}]` from `path`.
pub fn load_ice_servers(path: &Path) -> Result<Vec<IceServerConfig>, ServerError> {
    let invalid = |reason: String| ServerError::IceConfig {
        path: path.to_path_buf(),
        reason,
    };

    let text = std::fs::read_to_string(path).map_err(|e| invalid(e.to_string()))?;
    let servers: Vec<IceServerConfig> =
        serde_json::from_str(&text).map_err(|e| invalid(e.to_string()))?;

    if servers.is_empty() {
        return Err(invalid("no ICE servers listed".into()));
    }
    if let Some(server) = servers.iter().find(|s| s.urls.is_empty()) {
        return Err(invalid(format!("entry without urls: {server:?}")));
    }
    Ok(servers)
}
