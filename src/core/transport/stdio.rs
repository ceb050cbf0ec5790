//! STDIO transport implementation.
//!
//! Standard input/output transport for MCP - the default and recommended mode.
//! The API connectivity check runs in the background so a slow or failing
//! API never delays the handshake.

use rmcp::ServiceExt;
use tracing::{info, warn};

use super::{TransportError, TransportResult};
use crate::core::McpServer;

/// STDIO transport handler.
pub struct StdioTransport;

impl StdioTransport {
    /// Run the STDIO transport until the client disconnects.
    pub async fn run(server: McpServer) -> TransportResult<()> {
        let probe = server.clone();
        tokio::spawn(async move {
            if let Err(e) = probe.check_connection().await {
                warn!(error = %e, "GoHighLevel API connectivity check failed; tools may not work");
            }
        });

        info!("Ready - communicating via stdin/stdout");

        let service = server
            .serve(rmcp::transport::stdio())
            .await
            .map_err(|e| TransportError::init(e.to_string()))?;

        service
            .waiting()
            .await
            .map_err(|e| TransportError::ServiceError(e.to_string()))?;

        info!("STDIO transport finished");
        Ok(())
    }
}
