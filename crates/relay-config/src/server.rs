use std::net::SocketAddr;

use serde::Deserialize;

use crate::{cors::CorsConfig, health::HealthConfig};

/// Default listen address, matching the port the web client expects
pub const DEFAULT_LISTEN_ADDRESS: SocketAddr = SocketAddr::new(
    std::net::IpAddr::V4(std::net::Ipv4Addr::UNSPECIFIED),
    5000,
);

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    pub listen_address: Option<SocketAddr>,
    #[serde(default)]
    pub health: HealthConfig,
    /// Explicit CORS policy; when absent every origin is allowed
    #[serde(default)]
    pub cors: Option<CorsConfig>,
    /// Serve the embedded landing page on `GET /`
    #[serde(default = "default_landing_page")]
    pub landing_page: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_address: None,
            health: HealthConfig::default(),
            cors: None,
            landing_page: default_landing_page(),
        }
    }
}

impl ServerConfig {
    /// Configured listen address or the default one
    pub fn listen_address(&self) -> SocketAddr {
        self.listen_address.unwrap_or(DEFAULT_LISTEN_ADDRESS)
    }
}

const fn default_landing_page() -> bool {
    true
}
