//! Configuration management for the MCP server.
//!
//! This module provides a centralized configuration structure populated from
//! environment variables (and a `.env` file, if present). Required GoHighLevel
//! credentials are validated up front so the server fails fast at startup.

use super::error::{Error, Result};
use super::transport::TransportConfig;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Default GoHighLevel API base URL.
pub const DEFAULT_BASE_URL: &str = "https://services.leadconnectorhq.com";

/// Default GoHighLevel API version header.
pub const DEFAULT_API_VERSION: &str = "2021-07-28";

/// Main configuration structure for the MCP server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server identification and metadata.
    pub server: ServerConfig,

    /// GoHighLevel API access.
    pub ghl: GhlConfig,

    /// Logging configuration.
    pub logging: LoggingConfig,

    /// Transport configuration.
    pub transport: TransportConfig,

    /// Notices gathered while loading, logged once logging is up.
    #[serde(skip)]
    pub warnings: Vec<String>,
}

/// Server identification configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// The name of the server as reported to clients.
    pub name: String,

    /// The version of the server.
    pub version: String,
}

/// GoHighLevel API configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct GhlConfig {
    /// Bearer token (private integration token or API key).
    pub access_token: String,

    /// API base URL.
    pub base_url: String,

    /// Value of the `Version` header.
    pub api_version: String,

    /// Default location (sub-account) for tool calls.
    pub location_id: String,
}

/// Custom Debug implementation to redact secrets from logs.
impl std::fmt::Debug for GhlConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GhlConfig")
            .field("access_token", &"[REDACTED]")
            .field("base_url", &self.base_url)
            .field("api_version", &self.api_version)
            .field("location_id", &self.location_id)
            .finish()
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl LogFormat {
    /// Parse a format name; anything but `json` is text.
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(str::to_lowercase).as_deref() {
            Some("json") => Self::Json,
            _ => Self::Text,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (`debug`, `info`, `warn`, `error`).
    pub level: String,

    /// Text lines or one JSON object per line.
    pub format: LogFormat,
}

impl LoggingConfig {
    /// Normalize a level name; unknown or missing values fall back to `info`.
    pub fn parse_level(value: Option<&str>) -> String {
        match value.map(str::to_lowercase).as_deref() {
            Some(level @ ("debug" | "info" | "warn" | "error")) => level.to_string(),
            Some("warning") => "warn".to_string(),
            _ => "info".to_string(),
        }
    }
}

impl Default for GhlConfig {
    fn default() -> Self {
        Self {
            access_token: String::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
            location_id: String::new(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Text,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                name: "ghl-mcp-server".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
            ghl: GhlConfig::default(),
            logging: LoggingConfig::default(),
            transport: TransportConfig::default(),
            warnings: Vec::new(),
        }
    }
}

impl Config {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from the process environment.
    ///
    /// A `.env` file in the working directory is read first, without
    /// overriding variables that are already set.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.is_empty());
        let mut config = Self::default();

        if let Some(name) = var("MCP_SERVER_NAME") {
            config.server.name = name;
        }

        config.logging.level =
            LoggingConfig::parse_level(var("GHL_MCP_LOG_LEVEL").or_else(|| var("LOG_LEVEL")).as_deref());
        config.logging.format =
            LogFormat::parse(var("GHL_MCP_LOG_FORMAT").or_else(|| var("LOG_FORMAT")).as_deref());

        if var("GHL_API_TOKEN").is_none() && var("GHL_API_KEY").is_some() {
            config
                .warnings
                .push("GHL_API_TOKEN not provided, falling back to GHL_API_KEY".to_string());
        }
        config.ghl = GhlConfig::from_lookup(&var)?;
        config.transport = TransportConfig::from_lookup(&var);

        Ok(config)
    }
}

impl GhlConfig {
    /// Read GoHighLevel settings, failing on any missing required value.
    pub fn from_lookup<F>(var: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let access_token = var("GHL_API_TOKEN").or_else(|| var("GHL_API_KEY"));
        let location_id = var("GHL_LOCATION_ID");

        let mut missing = Vec::new();
        if access_token.is_none() {
            missing.push("GHL_API_TOKEN");
        }
        if location_id.is_none() {
            missing.push("GHL_LOCATION_ID");
        }
        if !missing.is_empty() {
            return Err(Error::config(format!(
                "Missing required environment variables: {}",
                missing.join(", ")
            )));
        }

        let config = Self {
            access_token: access_token.unwrap_or_default(),
            base_url: var("GHL_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            api_version: var("GHL_API_VERSION").unwrap_or_else(|| DEFAULT_API_VERSION.to_string()),
            location_id: location_id.unwrap_or_default(),
        };

        debug!(
            base_url = %config.base_url,
            version = %config.api_version,
            location_id = %config.location_id,
            "Loaded GoHighLevel configuration"
        );

        Ok(config)
    }
}
