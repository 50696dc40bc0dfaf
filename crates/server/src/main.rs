//! fieldmap MCP server entry point.
//!
//! This is the main binary that boots the MCP server on stdio transport.
//! Logging goes to stderr to avoid interfering with the JSON-RPC protocol on stdout.

use std::sync::Arc;

use anyhow::{Context, Result};
use fieldmap_client::ReportClient;
use fieldmap_core::{AppConfig, CacheDb, SyncCoordinator, SyncSettings};
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use tracing_subscriber::EnvFilter;

mod handler;
mod tools;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load().context("loading configuration")?;
    let client = ReportClient::from_app_config(&config).context("building report client")?;

    let store = match CacheDb::open(&config.db_path).await {
        Ok(store) => Some(store),
        Err(e) => {
            tracing::warn!(path = %config.db_path.display(), "local store unavailable, running uncached: {e}");
            None
        }
    };

    let coordinator = SyncCoordinator::new(Arc::new(client), store, SyncSettings::from_config(&config));

    tracing::info!("Starting fieldmap-mcp server on stdio transport");

    let handler = handler::FieldmapServer::new(Arc::new(coordinator));
    let transport = stdio();
    let server = serve_server(handler, transport).await?;

    server.waiting().await?;

    Ok(())
}
