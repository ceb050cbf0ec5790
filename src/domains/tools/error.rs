//! Tool-specific error types.

use thiserror::Error;

use crate::clients::ApiError;

/// Prefix the registry uses for names it has never seen.
///
/// Transports key their error classification off this marker, so no other
/// variant may render a message starting with it.
pub const UNKNOWN_TOOL_MARKER: &str = "Unknown tool";

/// Errors that can occur during tool operations.
#[derive(Debug, Error)]
pub enum ToolError {
    /// The requested tool is not registered.
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    /// A provider was asked to run a tool it does not declare.
    #[error("{category} provider does not handle tool: {name}")]
    UnsupportedTool { category: String, name: String },

    /// The argument object did not match the tool's input schema.
    #[error("Invalid arguments for {tool}: {message}")]
    InvalidArguments { tool: String, message: String },

    /// The GoHighLevel API call failed.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// The tool ran but could not produce a result.
    #[error("{0}")]
    Failed(String),
}

impl ToolError {
    /// Create a new "unknown tool" error.
    pub fn unknown_tool(name: impl Into<String>) -> Self {
        Self::UnknownTool(name.into())
    }

    /// Create a new "unsupported tool" error.
    pub fn unsupported(category: impl Into<String>, name: impl Into<String>) -> Self {
        Self::UnsupportedTool {
            category: category.into(),
            name: name.into(),
        }
    }

    /// Create a new "invalid arguments" error.
    pub fn invalid_arguments(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidArguments {
            tool: tool.into(),
            message: message.into(),
        }
    }

    /// Create a new "failed" error.
    pub fn failed(msg: impl Into<String>) -> Self {
        Self::Failed(msg.into())
    }

    /// Wrap an error with the action that was being attempted.
    pub fn context(action: &str, source: impl std::fmt::Display) -> Self {
        Self::Failed(format!("Failed to {}: {}", action, source))
    }

    /// Whether this is the registry's unknown-tool condition.
    pub fn is_unknown_tool(&self) -> bool {
        matches!(self, Self::UnknownTool(_))
    }
}

/// Result type for tool execution.
pub type ToolResult<T> = Result<T, ToolError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_tool_message() {
        let err = ToolError::unknown_tool("missing_tool");
        assert_eq!(err.to_string(), "Unknown tool: missing_tool");
        assert!(err.is_unknown_tool());
    }

    #[test]
    fn test_unsupported_does_not_use_marker() {
        let err = ToolError::unsupported("Payments", "unknown_tool");
        assert!(!err.to_string().starts_with(UNKNOWN_TOOL_MARKER));
        assert!(!err.is_unknown_tool());
    }

    #[test]
    fn test_context_prefix() {
        let err = ToolError::context("get knowledge base", "boom");
        assert_eq!(err.to_string(), "Failed to get knowledge base: boom");
    }
}
