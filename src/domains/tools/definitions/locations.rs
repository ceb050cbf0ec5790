//! Location (sub-account) tools.

use std::sync::Arc;

use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value;

use super::{opt_string, with_client};
use crate::clients::GhlApiClient;
use crate::domains::tools::error::ToolResult;
use crate::domains::tools::provider::ProviderTable;

pub const CATEGORY: &str = "Locations";

pub const GET_LOCATION: &str = "get_location";
pub const SEARCH_LOCATIONS: &str = "search_locations";

#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct GetLocationParams {
    /// Location ID. Defaults to the configured location.
    pub location_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SearchLocationsParams {
    /// Agency (company) ID owning the locations
    pub company_id: Option<String>,
    /// Filter by email address
    pub email: Option<String>,
    /// Number of results to skip
    pub skip: Option<u32>,
    /// Maximum number of results (default: 10)
    pub limit: Option<u32>,
    /// Sort order by creation date: "asc" or "desc"
    pub order: Option<String>,
}

/// Build the locations provider.
pub fn provider(client: Arc<GhlApiClient>) -> ProviderTable {
    ProviderTable::new(CATEGORY)
        .with_tool(
            GET_LOCATION,
            "Get details of a location (sub-account): name, address, timezone and settings.",
            with_client(&client, get_location),
        )
        .with_tool(
            SEARCH_LOCATIONS,
            "Search the locations of an agency, optionally filtered by email.",
            with_client(&client, search_locations),
        )
}

async fn get_location(client: Arc<GhlApiClient>, params: GetLocationParams) -> ToolResult<Value> {
    let location_id = client.location_or_default(params.location_id);
    Ok(client.get_location(&location_id).await?)
}

async fn search_locations(client: Arc<GhlApiClient>, params: SearchLocationsParams) -> ToolResult<Value> {
    let query = [
        ("companyId", params.company_id),
        ("email", params.email),
        ("skip", opt_string(params.skip)),
        ("limit", opt_string(params.limit)),
        ("order", params.order),
    ];
    Ok(client.search_locations(&query).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::GhlConfig;
    use crate::domains::tools::provider::ToolProvider;
    use rmcp::model::JsonObject;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn setup() -> (MockServer, ProviderTable) {
        let server = MockServer::start().await;
        let config = GhlConfig {
            access_token: "token_123".to_string(),
            base_url: server.uri(),
            location_id: "loc_123".to_string(),
            ..GhlConfig::default()
        };
        let client = Arc::new(GhlApiClient::new(&config).unwrap());
        (server, provider(client))
    }

    #[tokio::test]
    async fn test_get_location_defaults_to_configured() {
        let (server, table) = setup().await;
        Mock::given(method("GET"))
            .and(path("/locations/loc_123"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "location": { "id": "loc_123" } })))
            .expect(1)
            .mount(&server)
            .await;

        let result = table.execute(GET_LOCATION, JsonObject::new()).await.unwrap();
        assert_eq!(result["location"]["id"], "loc_123");
    }

    #[tokio::test]
    async fn test_search_locations_passes_filters() {
        let (server, table) = setup().await;
        Mock::given(method("GET"))
            .and(path("/locations/search"))
            .and(query_param("companyId", "comp_1"))
            .and(query_param("limit", "5"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "locations": [] })))
            .expect(1)
            .mount(&server)
            .await;

        let arguments = json!({ "companyId": "comp_1", "limit": 5 });
        let result = table
            .execute(SEARCH_LOCATIONS, arguments.as_object().cloned().unwrap())
            .await
            .unwrap();
        assert_eq!(result["locations"], json!([]));
    }
}
