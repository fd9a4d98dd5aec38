//! emissions-mcp server entry point.
//!
//! This is the main binary that boots the MCP server on stdio transport.
//! Logging goes to stderr to avoid interfering with the JSON-RPC protocol on stdout.

use anyhow::Result;
use emissions_client::{Scope3Client, Scope3Config};
use emissions_core::{AppConfig, EmissionsStore, MeasureService};
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use std::sync::Arc;
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

    let config = AppConfig::load()?;
    let token = config.require_scope3_token()?.to_string();

    tracing::info!(
        api_url = %config.scope3_api_url,
        cache_ttl_secs = config.cache_ttl_secs,
        sweep_interval_secs = config.sweep_interval_secs,
        "Starting emissions-mcp server on stdio transport"
    );

    let store = Arc::new(EmissionsStore::new(config.cache_ttl()));
    let sweeper = store.spawn_sweeper(config.sweep_interval());

    let client = Scope3Client::new(Scope3Config {
        api_url: config.scope3_api_url.clone(),
        token,
        timeout: config.timeout(),
        user_agent: config.user_agent.clone(),
    })?;

    let service = MeasureService::new(store.clone(), Arc::new(client));
    let handler = handler::EmissionsServer::new(service, store);
    let transport = stdio();
    let server = serve_server(handler, transport).await?;

    server.waiting().await?;
    sweeper.abort();

    tracing::info!("emissions-mcp server stopped");

    Ok(())
}
