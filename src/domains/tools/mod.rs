//! Tools domain module.
//!
//! Tools are the GoHighLevel API operations exposed to MCP clients.
//!
//! ## Architecture
//!
//! - `provider.rs` - `ToolProvider` trait and the `ProviderTable` lookup table
//! - `definitions/` - One provider per API area (contacts, locations, ...)
//! - `catalog.rs` - The shipped providers, in registration order
//! - `registry.rs` - Name → provider index shared by every transport
//! - `dispatch.rs` - Result formatting and error classification
//! - `error.rs` - Tool-specific error types
//!
//! ## Adding a New Tool
//!
//! 1. Add a params struct and an async handler to the provider file
//! 2. Declare it with `.with_tool(NAME, DESCRIPTION, with_client(&client, handler))`
//! 3. Add the API call to `clients/ghl.rs` if it is new
//!
//! Neither the server nor the transports need to change.

pub mod catalog;
pub mod definitions;
pub mod dispatch;
mod error;
pub mod provider;
mod registry;

pub use catalog::{build_tool_registry, default_providers};
pub use dispatch::{ClassifiedError, ErrorClass, classify_error, format_result, success_result};
pub use error::{ToolError, ToolResult, UNKNOWN_TOOL_MARKER};
pub use provider::{ProviderTable, ToolProvider};
pub use registry::{CategorySummary, ToolRegistry};
