//! GoHighLevel MCP Server Library
//!
//! This crate exposes the GoHighLevel CRM API to MCP clients as tools, over
//! STDIO or HTTP/SSE.
//!
//! # Architecture
//!
//! - **core**: Configuration, error handling, logging, the server handler and transports
//! - **clients**: The GoHighLevel REST API client
//! - **domains**: Business logic organized by bounded contexts
//!   - **tools**: Tool providers, the registry and dispatch rules
//!
//! # Example
//!
//! ```rust,no_run
//! use ghl_mcp_server::{Config, McpServer, TransportService};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env()?;
//!     let transport = TransportService::new(config.transport.clone());
//!     let server = McpServer::new(config)?;
//!     transport.run(server).await?;
//!     Ok(())
//! }
//! ```

pub mod clients;
pub mod core;
pub mod domains;

// Re-export commonly used types for convenience
pub use core::{Config, Error, McpServer, Result, TransportService};
