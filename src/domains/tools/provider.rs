//! Tool providers - groups of related tools sharing one category.
//!
//! A provider declares its tool definitions in order and executes any tool it
//! declared. [`ProviderTable`] is the standard implementation: a lookup table
//! from tool name to an async handler that receives typed, already-validated
//! parameters.

use std::borrow::Cow;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::BoxFuture;
use rmcp::handler::server::tool::cached_schema_for_type;
use rmcp::model::{JsonObject, Tool};
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::error::{ToolError, ToolResult};

// ============================================================================
// Provider Trait
// ============================================================================

/// A bundle of related tools sharing an execute dispatcher and a category label.
#[async_trait::async_trait]
pub trait ToolProvider: Send + Sync {
    /// Display grouping for the tools of this provider.
    fn category(&self) -> &str;

    /// Tool definitions, in declaration order.
    fn definitions(&self) -> Vec<Tool>;

    /// Execute one of the declared tools.
    ///
    /// Names this provider does not declare must fail with something other
    /// than [`ToolError::UnknownTool`], which is reserved for the registry.
    async fn execute(&self, name: &str, arguments: JsonObject) -> ToolResult<Value>;
}

// ============================================================================
// Tool Definitions
// ============================================================================

/// Build a tool definition from an explicit input schema.
pub fn definition(
    name: impl Into<Cow<'static, str>>,
    description: impl Into<Cow<'static, str>>,
    input_schema: Arc<JsonObject>,
) -> Tool {
    Tool {
        name: name.into(),
        description: Some(description.into()),
        input_schema,
        annotations: None,
        output_schema: None,
        icons: None,
        meta: None,
        title: None,
    }
}

/// Build a tool definition whose input schema is derived from `P`.
pub fn tool_definition<P>(name: &'static str, description: &'static str) -> Tool
where
    P: JsonSchema + 'static,
{
    definition(name, description, cached_schema_for_type::<P>())
}

/// Deserialize an argument object into the tool's parameter record.
pub fn parse_arguments<P>(tool: &str, arguments: JsonObject) -> ToolResult<P>
where
    P: DeserializeOwned,
{
    serde_json::from_value(Value::Object(arguments))
        .map_err(|e| ToolError::invalid_arguments(tool, e.to_string()))
}

// ============================================================================
// Lookup Table Provider
// ============================================================================

type Handler = Arc<dyn Fn(JsonObject) -> BoxFuture<'static, ToolResult<Value>> + Send + Sync>;

/// Provider backed by a name → handler table.
///
/// ```rust,ignore
/// ProviderTable::new("Locations")
///     .with_tool(GET_LOCATION, "Get a location", move |p: GetLocationParams| {
///         let client = client.clone();
///         async move { Ok(client.get_location(&p.location_id).await?) }
///     })
/// ```
pub struct ProviderTable {
    category: String,
    definitions: Vec<Tool>,
    handlers: HashMap<String, Handler>,
}

impl ProviderTable {
    /// Create an empty table for the given category.
    pub fn new(category: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            definitions: Vec::new(),
            handlers: HashMap::new(),
        }
    }

    /// Declare a tool and its handler.
    ///
    /// Arguments are deserialized into `P` before the handler runs; a
    /// mismatch fails with [`ToolError::InvalidArguments`] without calling it.
    pub fn with_tool<P, F, Fut>(
        mut self,
        name: &'static str,
        description: &'static str,
        handler: F,
    ) -> Self
    where
        P: DeserializeOwned + JsonSchema + Send + 'static,
        F: Fn(P) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ToolResult<Value>> + Send + 'static,
    {
        self.definitions.push(tool_definition::<P>(name, description));

        let erased: Handler = Arc::new(move |arguments: JsonObject| match parse_arguments::<P>(name, arguments) {
            Ok(params) => handler(params).boxed(),
            Err(e) => futures::future::ready(Err(e)).boxed(),
        });
        self.handlers.entry(name.to_string()).or_insert(erased);
        self
    }

    /// Names of the declared tools, in declaration order.
    pub fn tool_names(&self) -> Vec<&str> {
        self.definitions.iter().map(|t| t.name.as_ref()).collect()
    }

    /// Number of declared tools.
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    /// Whether the table declares no tools.
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

#[async_trait::async_trait]
impl ToolProvider for ProviderTable {
    fn category(&self) -> &str {
        &self.category
    }

    fn definitions(&self) -> Vec<Tool> {
        self.definitions.clone()
    }

    async fn execute(&self, name: &str, arguments: JsonObject) -> ToolResult<Value> {
        let handler = self
            .handlers
            .get(name)
            .ok_or_else(|| ToolError::unsupported(&self.category, name))?;
        handler(arguments).await
    }
}
