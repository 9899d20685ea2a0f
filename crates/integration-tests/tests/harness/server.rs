//! Test server wrapper that serves the Rodin tools over HTTP on a random port

use std::net::SocketAddr;

use rmcp::service::{RoleClient, RunningService, ServiceExt as _};
use rmcp::transport::StreamableHttpClientTransport;
use rmcp::transport::streamable_http_client::StreamableHttpClientTransportConfig;
use rodin_client::RodinClient;
use rodin_config::Config;
use rodin_mcp::RodinServer;
use rodin_mcp::transport::{MCP_PATH, http_router};
use tokio_util::sync::CancellationToken;

/// A running test server instance
pub struct TestServer {
    addr: SocketAddr,
    shutdown: CancellationToken,
}

impl TestServer {
    /// Start a test server with the given configuration
    ///
    /// Binds to port 0 for automatic port assignment
    pub async fn start(config: &Config) -> anyhow::Result<Self> {
        let server = RodinServer::new(RodinClient::new(&config.rodin)?);
        let shutdown = CancellationToken::new();
        let shutdown_clone = shutdown.clone();

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        tokio::spawn(async move {
            axum::serve(listener, http_router(server))
                .with_graceful_shutdown(async move {
                    shutdown_clone.cancelled().await;
                })
                .await
                .ok();
        });

        Ok(Self { addr, shutdown })
    }

    /// URL of the MCP endpoint
    pub fn mcp_url(&self) -> String {
        format!("http://{}{MCP_PATH}", self.addr)
    }

    /// Open an MCP client session against the server
    pub async fn connect(&self) -> anyhow::Result<RunningService<RoleClient, ()>> {
        let transport = StreamableHttpClientTransport::with_client(
            reqwest::Client::new(),
            StreamableHttpClientTransportConfig::with_uri(self.mcp_url()),
        );

        ().serve(transport)
            .await
            .map_err(|e| anyhow::anyhow!("MCP handshake failed: {e}"))
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}
