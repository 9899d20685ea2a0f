#![allow(clippy::must_use_candidate)]

mod duration;
mod env;
mod loader;
pub mod rodin;
pub mod server;
pub mod telemetry;

use serde::Deserialize;

pub use rodin::*;
pub use server::*;
pub use telemetry::TelemetryConfig;

/// Top-level rodin-mcp configuration
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Rodin API access and pipeline policies
    pub rodin: RodinConfig,
    /// MCP server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Logging configuration
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}
