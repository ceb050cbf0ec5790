//! Error types and handling for the MCP server.
//!
//! This module defines the error type returned while the server starts up:
//! configuration loading, API client construction and the transport run.

use thiserror::Error;

/// A specialized Result type for MCP server operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type for the MCP server.
#[derive(Debug, Error)]
pub enum Error {
    /// Error originating from the GoHighLevel API client.
    #[error("API error: {0}")]
    Api(#[from] crate::clients::ApiError),

    /// Error originating from a transport.
    #[error("Transport error: {0}")]
    Transport(#[from] super::transport::TransportError),

    /// Configuration-related errors.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Create a new configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
