//! Transport configuration types.

use serde::{Deserialize, Serialize};

/// Transport configuration options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TransportConfig {
    /// Standard input/output transport (default for MCP).
    #[cfg(feature = "stdio")]
    Stdio,

    /// HTTP transport with SSE sessions and JSON-RPC over POST.
    #[cfg(feature = "http")]
    Http(HttpConfig),
}

/// HTTP transport configuration.
#[cfg(feature = "http")]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Port number to listen on.
    pub port: u16,

    /// Host address to bind to.
    #[serde(default = "default_host")]
    pub host: String,

    /// Path for the plain JSON-RPC endpoint.
    #[serde(default = "default_rpc_path")]
    pub rpc_path: String,

    /// Enable CORS for browser clients.
    #[serde(default = "default_cors")]
    pub enable_cors: bool,
}

#[cfg(feature = "http")]
const DEFAULT_HTTP_PORT: u16 = 8000;

#[cfg(feature = "http")]
fn default_host() -> String {
    "0.0.0.0".to_string()
}

#[cfg(feature = "http")]
fn default_rpc_path() -> String {
    "/mcp".to_string()
}

#[cfg(feature = "http")]
fn default_cors() -> bool {
    true
}

impl Default for TransportConfig {
    fn default() -> Self {
        #[cfg(feature = "stdio")]
        {
            return Self::Stdio;
        }

        #[cfg(all(not(feature = "stdio"), feature = "http"))]
        {
            return Self::Http(HttpConfig::default());
        }

        #[cfg(not(any(feature = "stdio", feature = "http")))]
        {
            compile_error!("At least one transport feature must be enabled: stdio or http");
        }
    }
}

#[cfg(feature = "http")]
impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_HTTP_PORT,
            host: default_host(),
            rpc_path: default_rpc_path(),
            enable_cors: default_cors(),
        }
    }
}

impl TransportConfig {
    /// Create a STDIO transport config.
    #[cfg(feature = "stdio")]
    pub fn stdio() -> Self {
        Self::Stdio
    }

    /// Create an HTTP transport config.
    #[cfg(feature = "http")]
    pub fn http(port: u16, host: impl Into<String>) -> Self {
        Self::Http(HttpConfig {
            port,
            host: host.into(),
            ..Default::default()
        })
    }

    /// Load transport config from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok().filter(|v| !v.is_empty()))
    }

    /// Load transport config through a variable lookup.
    ///
    /// `MCP_TRANSPORT` selects the transport; anything unrecognized falls
    /// back to the default.
    pub fn from_lookup<F>(var: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let transport = var("MCP_TRANSPORT").unwrap_or_default().to_lowercase();

        match transport.as_str() {
            #[cfg(feature = "http")]
            "http" | "sse" => {
                let port = var("PORT")
                    .or_else(|| var("MCP_SERVER_PORT"))
                    .and_then(|p| p.parse().ok())
                    .unwrap_or(DEFAULT_HTTP_PORT);
                let host = var("MCP_HTTP_HOST").unwrap_or_else(default_host);
                let rpc_path = var("MCP_HTTP_PATH").unwrap_or_else(default_rpc_path);
                let enable_cors = var("MCP_HTTP_CORS")
                    .map(|v| v.to_lowercase() != "false" && v != "0")
                    .unwrap_or_else(default_cors);
                Self::Http(HttpConfig {
                    port,
                    host,
                    rpc_path,
                    enable_cors,
                })
            }
            _ => Self::default(),
        }
    }

    /// Get a description of this transport for logging.
    pub fn description(&self) -> String {
        match self {
            #[cfg(feature = "stdio")]
            Self::Stdio => "STDIO (standard MCP mode)".to_string(),
            #[cfg(feature = "http")]
            Self::Http(cfg) => format!("HTTP/SSE on {}:{}", cfg.host, cfg.port),
        }
    }

    /// Check if this transport is the standard STDIO mode.
    pub fn is_stdio(&self) -> bool {
        #[cfg(feature = "stdio")]
        {
            matches!(self, Self::Stdio)
        }
        #[cfg(not(feature = "stdio"))]
        {
            false
        }
    }
}

#[cfg(all(test, feature = "stdio", feature = "http"))]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_is_stdio() {
        assert_eq!(TransportConfig::from_lookup(lookup(&[])), TransportConfig::Stdio);
        assert_eq!(
            TransportConfig::from_lookup(lookup(&[("MCP_TRANSPORT", "carrier-pigeon")])),
            TransportConfig::Stdio
        );
        assert!(TransportConfig::default().is_stdio());
    }

    #[test]
    fn test_http_defaults() {
        let config = TransportConfig::from_lookup(lookup(&[("MCP_TRANSPORT", "HTTP")]));
        assert_eq!(config, TransportConfig::Http(HttpConfig::default()));
        assert_eq!(config.description(), "HTTP/SSE on 0.0.0.0:8000");
    }

    #[test]
    fn test_http_port_precedence() {
        let config = TransportConfig::from_lookup(lookup(&[
            ("MCP_TRANSPORT", "http"),
            ("PORT", "9100"),
            ("MCP_SERVER_PORT", "9200"),
            ("MCP_HTTP_CORS", "false"),
        ]));
        let TransportConfig::Http(http) = config else {
            panic!("expected http transport");
        };
        assert_eq!(http.port, 9100);
        assert!(!http.enable_cors);

        let config = TransportConfig::from_lookup(lookup(&[
            ("MCP_TRANSPORT", "http"),
            ("MCP_SERVER_PORT", "9200"),
        ]));
        assert_eq!(config, TransportConfig::http(9200, "0.0.0.0"));
    }
}
