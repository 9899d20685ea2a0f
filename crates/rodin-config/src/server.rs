use std::net::SocketAddr;

use serde::Deserialize;

/// Transport the MCP tools are served over
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Transport {
    /// JSON-RPC over stdin/stdout, spawned by the agent host
    #[default]
    Stdio,
    /// Streamable HTTP on `listen_address`
    Http,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    #[serde(default)]
    pub transport: Transport,
    /// Only used by the HTTP transport; defaults to `127.0.0.1:8000`
    pub listen_address: Option<SocketAddr>,
}

impl ServerConfig {
    pub fn listen_address(&self) -> SocketAddr {
        self.listen_address.unwrap_or_else(|| SocketAddr::from(([127, 0, 0, 1], 8000)))
    }
}
