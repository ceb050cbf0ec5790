//! MCP Server implementation and lifecycle management.
//!
//! [`McpServer`] owns the API client and the tool registry. Both transports
//! go through [`McpServer::dispatch_tool`], so tool calls log, format and
//! classify failures the same way whichever transport carries them.

use std::sync::Arc;

use rmcp::{
    ErrorData as McpError, RoleServer, ServerHandler,
    model::*,
    service::RequestContext,
};
use serde_json::{Value, json};
use tracing::{debug, error, info, instrument, warn};

use super::config::Config;
use super::error::Result;
use crate::clients::{ApiError, GhlApiClient};
use crate::domains::tools::{ToolRegistry, build_tool_registry, classify_error, success_result};

/// Category label logged for calls to unregistered tools.
const UNKNOWN_CATEGORY: &str = "unknown";

/// The main MCP server handler.
#[derive(Clone)]
pub struct McpServer {
    /// Server configuration.
    config: Arc<Config>,

    /// GoHighLevel API client shared with every provider.
    client: Arc<GhlApiClient>,

    /// Tool registry built once at startup.
    registry: Arc<ToolRegistry>,
}

impl McpServer {
    /// Create a new MCP server with the given configuration.
    pub fn new(config: Config) -> Result<Self> {
        let client = Arc::new(GhlApiClient::new(&config.ghl)?);
        let registry = Arc::new(build_tool_registry(Arc::clone(&client)));
        Ok(Self::from_parts(config, client, registry))
    }

    /// Assemble a server from pre-built parts.
    pub fn from_parts(config: Config, client: Arc<GhlApiClient>, registry: Arc<ToolRegistry>) -> Self {
        Self {
            config: Arc::new(config),
            client,
            registry,
        }
    }

    /// Get the server name.
    pub fn name(&self) -> &str {
        &self.config.server.name
    }

    /// Get the server version.
    pub fn version(&self) -> &str {
        &self.config.server.version
    }

    /// Get the server configuration.
    pub fn config(&self) -> &Arc<Config> {
        &self.config
    }

    /// Get the tool registry.
    pub fn registry(&self) -> &Arc<ToolRegistry> {
        &self.registry
    }

    // ========================================================================
    // Tool Support Methods
    // ========================================================================

    /// Registered tool definitions, in registration order.
    pub fn tools(&self) -> Vec<Tool> {
        self.registry.definitions().to_vec()
    }

    /// Tool definitions as wire JSON (for HTTP transport).
    pub fn list_tools(&self) -> Vec<Value> {
        self.registry
            .definitions()
            .iter()
            .filter_map(|tool| match serde_json::to_value(tool) {
                Ok(value) => Some(value),
                Err(e) => {
                    warn!(tool = %tool.name, error = %e, "Failed to encode tool definition");
                    None
                }
            })
            .collect()
    }

    /// Total tool count with the per-category breakdown.
    pub fn tools_snapshot(&self) -> Value {
        json!({
            "total": self.registry.len(),
            "categories": self.registry.summary(),
        })
    }

    /// Log the registered tools per category.
    pub fn log_tool_summary(&self) {
        for entry in self.registry.summary() {
            info!(category = %entry.category, count = entry.count, "Registered tools");
        }
        info!(total = self.registry.len(), "Tool registry ready");
    }

    /// Execute a tool call and turn the outcome into a protocol response.
    ///
    /// Missing arguments count as an empty object.
    #[instrument(skip(self, arguments), fields(category = tracing::field::Empty))]
    pub async fn dispatch_tool(
        &self,
        name: &str,
        arguments: Option<JsonObject>,
    ) -> std::result::Result<CallToolResult, McpError> {
        let category = self.registry.category(name).unwrap_or(UNKNOWN_CATEGORY);
        tracing::Span::current().record("category", category);
        info!("Executing tool");

        match self.registry.invoke(name, arguments.unwrap_or_default()).await {
            Ok(value) => {
                debug!("Tool completed");
                Ok(success_result(value))
            }
            Err(e) => {
                let classified = classify_error(&e);
                if classified.provider_failure {
                    error!(error = %e, "Tool execution failed");
                } else {
                    warn!(error = %e, "Rejected tool call");
                }
                Err(classified.into_mcp_error())
            }
        }
    }

    /// Verify the API credentials by fetching the configured location.
    #[instrument(skip(self), fields(location_id = %self.client.location_id()))]
    pub async fn check_connection(&self) -> std::result::Result<(), ApiError> {
        self.client.test_connection().await?;
        info!("Connected to GoHighLevel API");
        Ok(())
    }

    /// Server info advertised on `initialize`.
    pub fn server_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "GoHighLevel CRM tools: contacts, locations, payments and knowledge bases."
                    .to_string(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: self.config.server.name.clone(),
                version: self.config.server.version.clone(),
                ..Implementation::from_build_env()
            },
            ..Default::default()
        }
    }
}

impl ServerHandler for McpServer {
    fn get_info(&self) -> ServerInfo {
        self.server_info()
    }

    #[instrument(skip(self, _request, _context))]
    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> std::result::Result<ListToolsResult, McpError> {
        debug!("Listing tools");
        Ok(ListToolsResult {
            tools: self.tools(),
            next_cursor: None,
            meta: None,
        })
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> std::result::Result<CallToolResult, McpError> {
        self.dispatch_tool(&request.name, request.arguments).await
    }
}
