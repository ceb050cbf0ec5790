//! Transport layer for the MCP server.
//!
//! - **STDIO**: Standard input/output (default for MCP) - feature: `stdio`
//! - **HTTP**: SSE sessions plus JSON-RPC over POST - feature: `http`
//!
//! Each transport handles the connection lifecycle and delegates tool calls
//! to [`McpServer::dispatch_tool`](crate::core::McpServer::dispatch_tool).

mod config;
mod error;
mod service;
mod shutdown;

#[cfg(feature = "http")]
pub mod http;

#[cfg(feature = "stdio")]
pub mod stdio;

pub use config::TransportConfig;
pub use error::{TransportError, TransportResult};
pub use service::TransportService;
pub use shutdown::shutdown_signal;

#[cfg(feature = "http")]
pub use config::HttpConfig;
