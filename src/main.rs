//! MCP Server Entry Point
//!
//! Loads configuration, initializes logging, builds the server and runs the
//! configured transport until the client disconnects or a shutdown signal
//! arrives.

use anyhow::Result;
use tracing::{error, info, warn};

use ghl_mcp_server::core::{Config, McpServer, TransportService, init_logging};

#[tokio::main]
async fn main() -> Result<()> {
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            // Logging is not configured yet; report with the defaults.
            init_logging(&Default::default());
            error!(error = %e, "Failed to load configuration");
            return Err(e.into());
        }
    };

    init_logging(&config.logging);
    for warning in &config.warnings {
        warn!("{}", warning);
    }

    info!("Starting {} v{}", config.server.name, config.server.version);
    info!(
        base_url = %config.ghl.base_url,
        version = %config.ghl.api_version,
        location_id = %config.ghl.location_id,
        "Initializing GoHighLevel API client"
    );

    let transport = TransportService::new(config.transport.clone());
    let server = McpServer::new(config)?;

    info!("Server initialized");

    if let Err(e) = transport.run(server).await {
        error!(error = %e, "Server stopped with an error");
        return Err(e.into());
    }

    info!("Server shutting down");

    Ok(())
}
