use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use rodin_config::Transport;

/// Rodin MCP server
#[derive(Debug, Parser)]
#[command(name = "rodin-mcp", about = "Expose the Rodin generative 3D API as MCP tools")]
pub struct Args {
    /// Path to configuration file; when absent, defaults plus `--api-key` are used
    #[arg(short, long, env = "RODIN_MCP_CONFIG")]
    pub config: Option<PathBuf>,

    /// Rodin API key, overrides the configuration file
    #[arg(long, env = "RODIN_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Transport to serve the tools over
    #[arg(short, long, value_enum)]
    pub transport: Option<TransportArg>,

    /// Override the listen address of the HTTP transport
    #[arg(long, env = "RODIN_MCP_LISTEN")]
    pub listen: Option<SocketAddr>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum TransportArg {
    Stdio,
    Http,
}

impl From<TransportArg> for Transport {
    fn from(value: TransportArg) -> Self {
        match value {
            TransportArg::Stdio => Self::Stdio,
            TransportArg::Http => Self::Http,
        }
    }
}
