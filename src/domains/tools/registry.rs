//! Tool Registry - central registration and dispatch for all tools.
//!
//! This module provides:
//! - Aggregation of every [`ToolProvider`] into one name → executor map
//! - Duplicate detection (first provider to declare a name wins)
//! - Per-category bookkeeping for startup logs and the HTTP snapshot
//!
//! The registry is built once before the server accepts requests and has no
//! mutation API afterwards, so it can be shared freely across tasks.

use std::collections::HashMap;
use std::sync::Arc;

use rmcp::model::{JsonObject, Tool};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use super::error::{ToolError, ToolResult};
use super::provider::ToolProvider;

/// Number of tools registered under one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategorySummary {
    pub category: String,
    pub count: usize,
}

/// A registered tool bound to the provider that declared it.
struct Binding {
    provider: Arc<dyn ToolProvider>,
    category: String,
}

// ============================================================================
// Tool Registry
// ============================================================================

/// Tool registry - manages all available tools.
pub struct ToolRegistry {
    bindings: HashMap<String, Binding>,
    definitions: Vec<Tool>,
    summary: Vec<CategorySummary>,
}

impl ToolRegistry {
    /// Build the registry from providers, in order.
    ///
    /// A name already claimed by an earlier provider is skipped with a
    /// warning; the earlier registration is kept.
    pub fn new(providers: Vec<Arc<dyn ToolProvider>>) -> Self {
        let mut bindings: HashMap<String, Binding> = HashMap::new();
        let mut definitions = Vec::new();
        let mut summary = Vec::with_capacity(providers.len());

        for provider in providers {
            let category = provider.category().to_string();
            let mut registered = 0;

            for tool in provider.definitions() {
                if let Some(existing) = bindings.get(tool.name.as_ref()) {
                    warn!(
                        tool = %tool.name,
                        existing_category = %existing.category,
                        new_category = %category,
                        "Duplicate tool registration detected; skipping"
                    );
                    continue;
                }

                bindings.insert(
                    tool.name.to_string(),
                    Binding {
                        provider: Arc::clone(&provider),
                        category: category.clone(),
                    },
                );
                definitions.push(tool);
                registered += 1;
            }

            debug!(category = %category, count = registered, "Registered tool provider");
            summary.push(CategorySummary {
                category,
                count: registered,
            });
        }

        Self {
            bindings,
            definitions,
            summary,
        }
    }

    /// All registered tool definitions, in registration order.
    ///
    /// This is the single source of truth for "list tools" on every transport.
    pub fn definitions(&self) -> &[Tool] {
        &self.definitions
    }

    /// Category that owns a registered tool.
    pub fn category(&self, name: &str) -> Option<&str> {
        self.bindings.get(name).map(|b| b.category.as_str())
    }

    /// One entry per provider, in provider order.
    pub fn summary(&self) -> &[CategorySummary] {
        &self.summary
    }

    /// Whether a tool is registered under this name.
    pub fn contains(&self, name: &str) -> bool {
        self.bindings.contains_key(name)
    }

    /// Number of registered tools.
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    /// Whether no tools are registered.
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Invoke a tool by name.
    ///
    /// The owning provider's result or failure is returned as is.
    pub async fn invoke(&self, name: &str, arguments: JsonObject) -> ToolResult<Value> {
        let binding = self
            .bindings
            .get(name)
            .ok_or_else(|| ToolError::unknown_tool(name))?;

        binding.provider.execute(name, arguments).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::tools::provider::definition;
    use serde_json::json;
    use std::sync::Mutex;

    type Calls = Arc<Mutex<Vec<(String, JsonObject)>>>;

    /// Provider that records every call and answers with its own category.
    struct RecordingProvider {
        category: &'static str,
        tools: Vec<Tool>,
        calls: Calls,
        failure: Option<&'static str>,
    }

    impl RecordingProvider {
        fn new(category: &'static str, names: &[&'static str]) -> Self {
            Self {
                category,
                tools: names.iter().map(|n| sample_tool(n)).collect(),
                calls: Arc::new(Mutex::new(Vec::new())),
                failure: None,
            }
        }

        fn failing(mut self, message: &'static str) -> Self {
            self.failure = Some(message);
            self
        }
    }

    #[async_trait::async_trait]
    impl ToolProvider for RecordingProvider {
        fn category(&self) -> &str {
            self.category
        }

        fn definitions(&self) -> Vec<Tool> {
            self.tools.clone()
        }

        async fn execute(&self, name: &str, arguments: JsonObject) -> ToolResult<Value> {
            self.calls
                .lock()
                .unwrap()
                .push((name.to_string(), arguments.clone()));
            match self.failure {
                Some(message) => Err(ToolError::failed(message)),
                None => Ok(json!({ "category": self.category, "args": arguments })),
            }
        }
    }

    fn sample_tool(name: &'static str) -> Tool {
        let schema = json!({ "type": "object", "properties": {} });
        definition(
            name,
            format!("{} description", name),
            Arc::new(schema.as_object().cloned().unwrap()),
        )
    }

    fn names(registry: &ToolRegistry) -> Vec<String> {
        registry
            .definitions()
            .iter()
            .map(|t| t.name.to_string())
            .collect()
    }

    fn args(value: Value) -> JsonObject {
        value.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn test_registers_tools_and_exposes_definitions() {
        let registry = ToolRegistry::new(vec![
            Arc::new(RecordingProvider::new("CategoryA", &["sample_tool"])),
            Arc::new(RecordingProvider::new("CategoryB", &["other_tool"])),
        ]);

        assert_eq!(names(&registry), vec!["sample_tool", "other_tool"]);
        assert_eq!(registry.len(), 2);
        assert!(registry.contains("other_tool"));
    }

    #[test]
    fn test_summary_in_provider_order() {
        let registry = ToolRegistry::new(vec![
            Arc::new(RecordingProvider::new("Zeta", &["z1", "z2", "z3"])),
            Arc::new(RecordingProvider::new("Alpha", &["a1"])),
            Arc::new(RecordingProvider::new("Empty", &[])),
        ]);

        let summary = registry.summary();
        assert_eq!(
            summary,
            &[
                CategorySummary { category: "Zeta".into(), count: 3 },
                CategorySummary { category: "Alpha".into(), count: 1 },
                CategorySummary { category: "Empty".into(), count: 0 },
            ]
        );
    }

    #[tokio::test]
    async fn test_duplicate_registration_first_provider_wins() {
        let a = Arc::new(RecordingProvider::new("A", &["T1"]));
        let b = Arc::new(RecordingProvider::new("B", &["T1", "T2"]));
        let a_calls = a.calls.clone();
        let b_calls = b.calls.clone();

        let registry = ToolRegistry::new(vec![a as Arc<dyn ToolProvider>, b]);

        assert_eq!(names(&registry), vec!["T1", "T2"]);
        assert_eq!(
            registry.summary(),
            &[
                CategorySummary { category: "A".into(), count: 1 },
                CategorySummary { category: "B".into(), count: 1 },
            ]
        );
        assert_eq!(registry.category("T1"), Some("A"));
        assert_eq!(registry.category("T2"), Some("B"));
        assert_eq!(registry.definitions()[0].description.as_deref(), Some("T1 description"));

        let result = registry.invoke("T1", JsonObject::new()).await.unwrap();
        assert_eq!(result["category"], "A");
        assert_eq!(a_calls.lock().unwrap().len(), 1);
        assert!(b_calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_invoke_forwards_name_and_arguments_once() {
        let a = Arc::new(RecordingProvider::new("A", &["T1"]));
        let b = Arc::new(RecordingProvider::new("B", &["T1", "T2"]));
        let b_calls = b.calls.clone();
        let registry = ToolRegistry::new(vec![a as Arc<dyn ToolProvider>, b]);

        let result = registry.invoke("T2", args(json!({ "x": 1 }))).await.unwrap();
        assert_eq!(result, json!({ "category": "B", "args": { "x": 1 } }));

        let calls = b_calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "T2");
        assert_eq!(calls[0].1, args(json!({ "x": 1 })));
    }

    #[tokio::test]
    async fn test_invoke_unknown_tool() {
        let registry = ToolRegistry::new(vec![Arc::new(RecordingProvider::new("A", &["T1"]))]);

        let err = registry.invoke("missing_tool", JsonObject::new()).await.unwrap_err();
        assert!(err.is_unknown_tool());
        assert_eq!(err.to_string(), "Unknown tool: missing_tool");
    }

    #[tokio::test]
    async fn test_invoke_propagates_provider_failure_unchanged() {
        let registry = ToolRegistry::new(vec![Arc::new(
            RecordingProvider::new("A", &["T1"]).failing("Failed: 404 not found"),
        )]);

        let err = registry.invoke("T1", JsonObject::new()).await.unwrap_err();
        assert!(matches!(err, ToolError::Failed(_)));
        assert_eq!(err.to_string(), "Failed: 404 not found");
    }

    #[test]
    fn test_category_of_unregistered_name() {
        let registry = ToolRegistry::new(vec![Arc::new(RecordingProvider::new("A", &["T1"]))]);
        assert_eq!(registry.category("T1"), Some("A"));
        assert_eq!(registry.category("nope"), None);
        assert!(!registry.contains("nope"));
    }

    #[test]
    fn test_definition_count_matches_providers_minus_duplicates() {
        let registry = ToolRegistry::new(vec![
            Arc::new(RecordingProvider::new("A", &["t1", "t2", "t3"])),
            Arc::new(RecordingProvider::new("B", &["t2", "t4"])),
            Arc::new(RecordingProvider::new("C", &["t1", "t3", "t4"])),
        ]);

        assert_eq!(registry.len(), 8 - 4);
        let counts: Vec<usize> = registry.summary().iter().map(|s| s.count).collect();
        assert_eq!(counts, vec![3, 1, 0]);
    }

    #[tokio::test]
    async fn test_concurrent_invocations_are_independent() {
        let provider = Arc::new(RecordingProvider::new("A", &["T1", "T2"]));
        let calls = provider.calls.clone();
        let registry = Arc::new(ToolRegistry::new(vec![provider as Arc<dyn ToolProvider>]));

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let registry = registry.clone();
                let name = if i % 2 == 0 { "T1" } else { "T2" };
                tokio::spawn(async move { registry.invoke(name, args(json!({ "i": i }))).await })
            })
            .collect();

        for handle in handles {
            assert!(handle.await.unwrap().is_ok());
        }
        assert_eq!(calls.lock().unwrap().len(), 8);
    }
}
