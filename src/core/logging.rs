//! Logging initialization.
//!
//! All output goes to stderr: on the STDIO transport, stdout carries the
//! JSON-RPC stream and must not see anything else.

use tracing::Level;
use tracing_subscriber::{EnvFilter, fmt};

use super::config::{LogFormat, LoggingConfig};

/// Map a configured level name to a tracing level.
pub fn level_for(level: &str) -> Level {
    match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" | "warning" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    }
}

/// Initialize the logging subsystem.
///
/// `RUST_LOG` directives are honoured on top of the configured level.
pub fn init_logging(config: &LoggingConfig) {
    let filter = EnvFilter::from_default_env().add_directive(level_for(&config.level).into());

    let builder = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr);

    match config.format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Text => builder.init(),
    }
}
