/// Rail MCP Server - JSON-RPC (stdio) + HTTP API
///
/// Dual-protocol server:
/// 1. JSON-RPC over stdin/stdout (for direct MCP protocol)
/// 2. HTTP endpoints (for remote/network access)
///
/// Run with MCP:  ./rail-mcp (default)
/// Run with HTTP: RAIL_MCP_MODE=http ./rail-mcp
use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

use rail_mcp::{http, jsonrpc, Config, Mode, RailClient, RailMcp};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    // stdout carries JSON-RPC traffic, so logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let config = Config::from_env().context("invalid configuration")?;
    let client = RailClient::from_config(&config);
    tracing::info!(
        "Upstream {} (timeout {:?}, language {:?})",
        client.endpoint(),
        config.timeout,
        config.language
    );
    let server = RailMcp::new(client, config.language);

    match config.mode {
        Mode::JsonRpc => {
            tracing::info!("✓ Serving MCP over stdio");
            jsonrpc::serve(&server, tokio::io::stdin(), tokio::io::stdout()).await
        }
        Mode::Http => start_http_server(server, config.port).await,
    }
}

/// Start HTTP server
async fn start_http_server(server: RailMcp, port: u16) -> Result<()> {
    let app = http::router(server);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port))
        .await
        .with_context(|| format!("failed to bind port {}", port))?;

    tracing::info!("✓ Server listening on http://0.0.0.0:{}", port);
    tracing::info!("  GET    /health");
    tracing::info!("  GET    /tools");
    tracing::info!("  POST   /tools/get_places");
    tracing::info!("  POST   /tools/get_trips");
    tracing::info!("  POST   /tools/get_trip_prices");
    tracing::info!("  POST   /tools/book_ticket");

    axum::serve(listener, app).await?;

    Ok(())
}
