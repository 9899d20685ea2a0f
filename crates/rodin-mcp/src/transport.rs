use std::net::SocketAddr;

use rmcp::ServiceExt as _;
use rmcp::transport::streamable_http_server::session::local::LocalSessionManager;
use rmcp::transport::streamable_http_server::{StreamableHttpServerConfig, StreamableHttpService};
use tokio_util::sync::CancellationToken;

use crate::RodinServer;

/// Path the streamable HTTP transport is mounted at
pub const MCP_PATH: &str = "/mcp";

/// Serve the tools over stdin/stdout until the host disconnects
///
/// # Errors
///
/// Returns an error if the MCP handshake fails or the service task panics
pub async fn serve_stdio(server: RodinServer) -> anyhow::Result<()> {
    tracing::info!("serving MCP over stdio");

    let service = server
        .serve(rmcp::transport::stdio())
        .await
        .map_err(|e| anyhow::anyhow!("stdio handshake failed: {e}"))?;

    let reason = service.waiting().await?;
    tracing::info!(?reason, "stdio session closed");

    Ok(())
}

/// Router serving a fresh MCP session per client at [`MCP_PATH`]
pub fn http_router(server: RodinServer) -> axum::Router {
    let service = StreamableHttpService::new(
        move || Ok(server.clone()),
        LocalSessionManager::default().into(),
        StreamableHttpServerConfig::default(),
    );

    axum::Router::new().nest_service(MCP_PATH, service)
}

/// Serve the tools over streamable HTTP until `shutdown` is cancelled
///
/// # Errors
///
/// Returns an error if the listener cannot be bound or the server fails
pub async fn serve_http(server: RodinServer, listen: SocketAddr, shutdown: CancellationToken) -> anyhow::Result<()> {
    let router = http_router(server);

    let listener = tokio::net::TcpListener::bind(listen)
        .await
        .map_err(|e| anyhow::anyhow!("failed to bind {listen}: {e}"))?;

    tracing::info!(address = %listener.local_addr()?, path = MCP_PATH, "serving MCP over streamable HTTP");

    axum::serve(listener, router)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;

    Ok(())
}
