//! Result formatting and error classification for tool calls.
//!
//! Both transports turn registry outcomes into protocol responses through
//! these functions, so a client sees the same error class for the same
//! failure whichever transport it uses:
//!
//! | Failure                              | Class           | Message                          |
//! |--------------------------------------|-----------------|----------------------------------|
//! | `Unknown tool: <name>`               | invalid request | verbatim                         |
//! | any other failure containing `404`   | invalid request | `Tool execution failed: <msg>`   |
//! | everything else                      | internal error  | `Tool execution failed: <msg>`   |

use rmcp::ErrorData as McpError;
use rmcp::model::{CallToolResult, Content};
use serde_json::Value;

use super::error::{ToolError, UNKNOWN_TOOL_MARKER};

/// Prefix applied to every surfaced provider failure.
pub const EXECUTION_FAILED_PREFIX: &str = "Tool execution failed";

/// Protocol-level error class a failure is reported as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    InvalidRequest,
    InternalError,
}

/// A tool failure ready to be surfaced to the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedError {
    pub class: ErrorClass,
    pub message: String,
    /// Whether the failure came from a provider (and should be logged as such).
    pub provider_failure: bool,
}

impl ClassifiedError {
    /// JSON-RPC error code for this class.
    pub fn code(&self) -> i32 {
        match self.class {
            ErrorClass::InvalidRequest => -32600,
            ErrorClass::InternalError => -32603,
        }
    }

    /// Convert into the rmcp error type.
    pub fn into_mcp_error(self) -> McpError {
        match self.class {
            ErrorClass::InvalidRequest => McpError::invalid_request(self.message, None),
            ErrorClass::InternalError => McpError::internal_error(self.message, None),
        }
    }
}

/// Classify a failure returned by the registry.
pub fn classify_error(error: &ToolError) -> ClassifiedError {
    let message = error.to_string();

    if message.starts_with(UNKNOWN_TOOL_MARKER) {
        return ClassifiedError {
            class: ErrorClass::InvalidRequest,
            message,
            provider_failure: false,
        };
    }

    let class = if message.contains("404") {
        ErrorClass::InvalidRequest
    } else {
        ErrorClass::InternalError
    };

    ClassifiedError {
        class,
        message: format!("{}: {}", EXECUTION_FAILED_PREFIX, message),
        provider_failure: true,
    }
}

/// Render a tool result as text: strings pass through, anything else is
/// pretty-printed JSON.
pub fn format_result(value: Value) -> String {
    match value {
        Value::String(text) => text,
        other => serde_json::to_string_pretty(&other).unwrap_or_else(|_| other.to_string()),
    }
}

/// Wrap a tool result as protocol content.
pub fn success_result(value: Value) -> CallToolResult {
    CallToolResult::success(vec![Content::text(format_result(value))])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::ApiError;
    use rmcp::model::RawContent;
    use serde_json::json;

    #[test]
    fn test_unknown_tool_is_invalid_request_verbatim() {
        let classified = classify_error(&ToolError::unknown_tool("missing_tool"));
        assert_eq!(classified.class, ErrorClass::InvalidRequest);
        assert_eq!(classified.message, "Unknown tool: missing_tool");
        assert_eq!(classified.code(), -32600);
        assert!(!classified.provider_failure);
    }

    #[test]
    fn test_404_failure_is_invalid_request() {
        let classified = classify_error(&ToolError::failed("Failed: 404 not found"));
        assert_eq!(classified.class, ErrorClass::InvalidRequest);
        assert_eq!(classified.message, "Tool execution failed: Failed: 404 not found");
        assert!(classified.provider_failure);
    }

    #[test]
    fn test_api_404_is_invalid_request() {
        let error = ToolError::from(ApiError::Status {
            status: 404,
            message: "Contact not found".to_string(),
        });
        let classified = classify_error(&error);
        assert_eq!(classified.class, ErrorClass::InvalidRequest);
        assert_eq!(
            classified.message,
            "Tool execution failed: GHL API error (404): Contact not found"
        );
    }

    #[test]
    fn test_other_failures_are_internal() {
        let classified = classify_error(&ToolError::failed("upstream timeout"));
        assert_eq!(classified.class, ErrorClass::InternalError);
        assert_eq!(classified.code(), -32603);
        assert_eq!(classified.message, "Tool execution failed: upstream timeout");

        let classified = classify_error(&ToolError::invalid_arguments("get_contact", "missing field `contactId`"));
        assert_eq!(classified.class, ErrorClass::InternalError);

        let classified = classify_error(&ToolError::unsupported("Payments", "nope"));
        assert_eq!(classified.class, ErrorClass::InternalError);
    }

    #[test]
    fn test_into_mcp_error_keeps_message() {
        let error = classify_error(&ToolError::failed("boom")).into_mcp_error();
        assert_eq!(error.code.0, -32603);
        assert_eq!(error.message, "Tool execution failed: boom");
    }

    #[test]
    fn test_format_result() {
        assert_eq!(format_result(json!("plain text")), "plain text");
        assert_eq!(format_result(json!({ "a": 1 })), "{\n  \"a\": 1\n}");
        assert_eq!(format_result(json!(null)), "null");
    }

    #[test]
    fn test_success_result_single_text_block() {
        let result = success_result(json!({ "ok": true }));
        assert_eq!(result.is_error, Some(false));
        assert_eq!(result.content.len(), 1);
        match &result.content[0].raw {
            RawContent::Text(text) => assert_eq!(text.text, "{\n  \"ok\": true\n}"),
            _ => panic!("expected text content"),
        }
    }
}
