#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

mod args;

use args::Args;
use clap::Parser;
use rodin_client::RodinClient;
use rodin_config::{Config, Transport};
use rodin_mcp::RodinServer;
use secrecy::SecretString;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Load configuration
    let config = load_config(&args)?;

    // Initialize telemetry
    rodin_telemetry::init(&config.telemetry)?;

    tracing::info!(
        config_path = ?args.config,
        transport = ?config.server.transport,
        "starting rodin-mcp"
    );

    // Build server
    let client = RodinClient::new(&config.rodin)?;
    let server = RodinServer::new(client);

    // Run server
    match config.server.transport {
        Transport::Stdio => rodin_mcp::transport::serve_stdio(server).await?,
        Transport::Http => {
            // Set up graceful shutdown
            let shutdown = CancellationToken::new();
            let shutdown_clone = shutdown.clone();

            tokio::spawn(async move {
                shutdown_signal().await;
                shutdown_clone.cancel();
            });

            rodin_mcp::transport::serve_http(server, config.server.listen_address(), shutdown).await?;
        }
    }

    tracing::info!("rodin-mcp stopped");
    Ok(())
}

/// Build the configuration from the file (if any) and command-line overrides
fn load_config(args: &Args) -> anyhow::Result<Config> {
    let api_key = args.api_key.clone().map(SecretString::from);

    let mut config = match (&args.config, api_key.clone()) {
        (Some(path), _) => Config::load(path)?,
        (None, Some(key)) => Config::from_api_key(key),
        (None, None) => anyhow::bail!("no Rodin API key: set RODIN_API_KEY, pass --api-key, or provide --config"),
    };

    // Command-line values override the file
    if let Some(key) = api_key {
        config.rodin.api_key = key;
    }

    if let Some(transport) = args.transport {
        config.server.transport = transport.into();
    }

    if let Some(listen) = args.listen {
        config.server.listen_address = Some(listen);
    }

    config.validate()?;

    Ok(config)
}

/// Wait for a shutdown signal (`SIGINT` or `SIGTERM`)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }

    tracing::info!("shutdown signal received");
}
