//! Tool definitions module.
//!
//! One file per GoHighLevel API area. Each file exposes a `CATEGORY` label
//! and a `provider()` function returning the [`ProviderTable`] for that area.
//!
//! [`ProviderTable`]: super::provider::ProviderTable

pub mod contacts;
pub mod knowledge_base;
pub mod locations;
pub mod payments;

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use super::error::{ToolError, ToolResult};
use crate::clients::GhlApiClient;

/// Bind an API client to a handler, producing a table-ready closure.
pub fn with_client<P, F, Fut>(
    client: &Arc<GhlApiClient>,
    handler: F,
) -> impl Fn(P) -> Fut + Send + Sync + 'static
where
    F: Fn(Arc<GhlApiClient>, P) -> Fut + Send + Sync + 'static,
{
    let client = Arc::clone(client);
    move |params| handler(Arc::clone(&client), params)
}

/// Serialize a parameter record into a JSON request body.
pub fn to_body<T: Serialize>(params: &T) -> ToolResult<Value> {
    serde_json::to_value(params).map_err(|e| ToolError::failed(format!("Failed to encode request: {}", e)))
}

/// Render an optional number for a query string.
pub fn opt_string<T: ToString>(value: Option<T>) -> Option<String> {
    value.map(|v| v.to_string())
}
