//! The shipped set of tool providers.

use std::sync::Arc;

use super::definitions::{contacts, knowledge_base, locations, payments};
use super::provider::ToolProvider;
use super::registry::ToolRegistry;
use crate::clients::GhlApiClient;

/// Every provider the server ships, in registration order.
pub fn default_providers(client: Arc<GhlApiClient>) -> Vec<Arc<dyn ToolProvider>> {
    vec![
        Arc::new(contacts::provider(Arc::clone(&client))),
        Arc::new(locations::provider(Arc::clone(&client))),
        Arc::new(payments::provider(Arc::clone(&client))),
        Arc::new(knowledge_base::provider(client)),
    ]
}

/// Build the registry over [`default_providers`].
pub fn build_tool_registry(client: Arc<GhlApiClient>) -> ToolRegistry {
    ToolRegistry::new(default_providers(client))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::GhlConfig;
    use crate::domains::tools::registry::CategorySummary;

    fn client() -> Arc<GhlApiClient> {
        let config = GhlConfig {
            access_token: "token_123".to_string(),
            location_id: "loc_123".to_string(),
            ..GhlConfig::default()
        };
        Arc::new(GhlApiClient::new(&config).unwrap())
    }

    #[test]
    fn test_catalog_summary() {
        let registry = build_tool_registry(client());
        let summary: Vec<(&str, usize)> = registry
            .summary()
            .iter()
            .map(|CategorySummary { category, count }| (category.as_str(), *count))
            .collect();

        assert_eq!(
            summary,
            vec![
                ("Contact Management", 6),
                ("Locations", 2),
                ("Payments", 4),
                ("Knowledge Base", 9),
            ]
        );
        assert_eq!(registry.len(), 21);
    }

    #[test]
    fn test_catalog_lookup() {
        let registry = build_tool_registry(client());
        assert_eq!(registry.category("create_coupon"), Some("Payments"));
        assert_eq!(registry.category("ghl_list_knowledge_bases"), Some("Knowledge Base"));
        assert_eq!(registry.category("not_a_tool"), None);
        assert_eq!(registry.definitions()[0].name, "search_contacts");
    }

    #[test]
    fn test_catalog_schemas_are_objects() {
        let registry = build_tool_registry(client());
        for tool in registry.definitions() {
            assert_eq!(
                tool.input_schema.get("type").and_then(|t| t.as_str()),
                Some("object"),
                "{} schema",
                tool.name
            );
        }
    }
}
