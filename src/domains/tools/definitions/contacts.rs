//! Contact management tools.

use std::sync::Arc;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::info;

use super::{to_body, with_client};
use crate::clients::GhlApiClient;
use crate::domains::tools::error::{ToolError, ToolResult};
use crate::domains::tools::provider::ProviderTable;

pub const CATEGORY: &str = "Contact Management";

pub const SEARCH_CONTACTS: &str = "search_contacts";
pub const GET_CONTACT: &str = "get_contact";
pub const CREATE_CONTACT: &str = "create_contact";
pub const UPDATE_CONTACT: &str = "update_contact";
pub const DELETE_CONTACT: &str = "delete_contact";
pub const ADD_CONTACT_TAGS: &str = "add_contact_tags";

const DEFAULT_SEARCH_LIMIT: u32 = 25;

// ============================================================================
// Tool Parameters
// ============================================================================

#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SearchContactsParams {
    /// Free-text search over name, email, phone and company
    pub query: Option<String>,
    /// Maximum number of contacts to return (default: 25)
    pub limit: Option<u32>,
    /// Location to search. Defaults to the configured location.
    pub location_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ContactIdParams {
    /// The unique ID of the contact
    pub contact_id: String,
}

/// Writable contact fields shared by create and update.
#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ContactFields {
    /// First name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    /// Last name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    /// Full name, when first/last are not split
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Email address
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Phone number in E.164 format
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    /// Company name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
    /// Lead source label
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// Tags to set on the contact
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateContactParams {
    #[serde(flatten)]
    pub fields: ContactFields,
    /// Location to create the contact in. Defaults to the configured location.
    pub location_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateContactParams {
    /// The unique ID of the contact to update
    pub contact_id: String,
    #[serde(flatten)]
    pub fields: ContactFields,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AddContactTagsParams {
    /// The unique ID of the contact
    pub contact_id: String,
    /// Tags to add to the contact
    pub tags: Vec<String>,
}

// ============================================================================
// Provider
// ============================================================================

/// Build the contact management provider.
pub fn provider(client: Arc<GhlApiClient>) -> ProviderTable {
    ProviderTable::new(CATEGORY)
        .with_tool(
            SEARCH_CONTACTS,
            "Search contacts in the location by name, email, phone or company.",
            with_client(&client, search_contacts),
        )
        .with_tool(
            GET_CONTACT,
            "Get a contact by ID with all stored fields, tags and custom fields.",
            with_client(&client, get_contact),
        )
        .with_tool(
            CREATE_CONTACT,
            "Create a new contact. Provide at least an email, a phone number or a name.",
            with_client(&client, create_contact),
        )
        .with_tool(
            UPDATE_CONTACT,
            "Update fields of an existing contact. Only provided fields are changed.",
            with_client(&client, update_contact),
        )
        .with_tool(
            DELETE_CONTACT,
            "Delete a contact permanently.",
            with_client(&client, delete_contact),
        )
        .with_tool(
            ADD_CONTACT_TAGS,
            "Add one or more tags to a contact.",
            with_client(&client, add_contact_tags),
        )
}

// ============================================================================
// Handlers
// ============================================================================

async fn search_contacts(client: Arc<GhlApiClient>, params: SearchContactsParams) -> ToolResult<Value> {
    let mut body = json!({
        "locationId": client.location_or_default(params.location_id),
        "pageLimit": params.limit.unwrap_or(DEFAULT_SEARCH_LIMIT),
    });
    if let Some(query) = params.query.filter(|q| !q.is_empty()) {
        body["query"] = Value::String(query);
    }
    Ok(client.search_contacts(&body).await?)
}

async fn get_contact(client: Arc<GhlApiClient>, params: ContactIdParams) -> ToolResult<Value> {
    Ok(client.get_contact(&params.contact_id).await?)
}

async fn create_contact(client: Arc<GhlApiClient>, params: CreateContactParams) -> ToolResult<Value> {
    let fields = &params.fields;
    if fields.email.is_none() && fields.phone.is_none() && fields.name.is_none() && fields.first_name.is_none() {
        return Err(ToolError::invalid_arguments(
            CREATE_CONTACT,
            "at least one of email, phone, name or firstName is required",
        ));
    }

    let mut body = to_body(fields)?;
    body["locationId"] = Value::String(client.location_or_default(params.location_id));

    let created = client.create_contact(&body).await?;
    info!(contact_id = ?created.pointer("/contact/id"), "Created contact");
    Ok(created)
}

async fn update_contact(client: Arc<GhlApiClient>, params: UpdateContactParams) -> ToolResult<Value> {
    let body = to_body(&params.fields)?;
    if body.as_object().is_some_and(|fields| fields.is_empty()) {
        return Err(ToolError::invalid_arguments(UPDATE_CONTACT, "no fields to update"));
    }
    Ok(client.update_contact(&params.contact_id, &body).await?)
}

async fn delete_contact(client: Arc<GhlApiClient>, params: ContactIdParams) -> ToolResult<Value> {
    let result = client.delete_contact(&params.contact_id).await?;
    info!(contact_id = %params.contact_id, "Deleted contact");
    Ok(result)
}

async fn add_contact_tags(client: Arc<GhlApiClient>, params: AddContactTagsParams) -> ToolResult<Value> {
    if params.tags.is_empty() {
        return Err(ToolError::invalid_arguments(ADD_CONTACT_TAGS, "tags must not be empty"));
    }
    Ok(client.add_contact_tags(&params.contact_id, &params.tags).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::ApiError;
    use crate::core::config::GhlConfig;
    use crate::domains::tools::provider::ToolProvider;
    use rmcp::model::JsonObject;
    use wiremock::matchers::{body_json, method, path};
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

    fn args(value: Value) -> JsonObject {
        value.as_object().cloned().unwrap_or_default()
    }

    #[tokio::test]
    async fn test_declares_six_tools() {
        let (_server, table) = setup().await;
        assert_eq!(table.category(), "Contact Management");
        assert_eq!(
            table.tool_names(),
            vec![
                SEARCH_CONTACTS,
                GET_CONTACT,
                CREATE_CONTACT,
                UPDATE_CONTACT,
                DELETE_CONTACT,
                ADD_CONTACT_TAGS
            ]
        );
    }

    #[tokio::test]
    async fn test_search_builds_body() {
        let (server, table) = setup().await;
        Mock::given(method("POST"))
            .and(path("/contacts/search"))
            .and(body_json(json!({ "locationId": "loc_123", "pageLimit": 5, "query": "jane" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "contacts": [], "total": 0 })))
            .expect(1)
            .mount(&server)
            .await;

        let result = table
            .execute(SEARCH_CONTACTS, args(json!({ "query": "jane", "limit": 5 })))
            .await
            .unwrap();
        assert_eq!(result["total"], 0);
    }

    #[tokio::test]
    async fn test_get_contact_not_found() {
        let (server, table) = setup().await;
        Mock::given(method("GET"))
            .and(path("/contacts/c_404"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({ "message": "Contact not found" })))
            .mount(&server)
            .await;

        let err = table
            .execute(GET_CONTACT, args(json!({ "contactId": "c_404" })))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "GHL API error (404): Contact not found");
    }

    #[tokio::test]
    async fn test_create_contact_adds_location() {
        let (server, table) = setup().await;
        Mock::given(method("POST"))
            .and(path("/contacts/"))
            .and(body_json(json!({ "email": "jane@example.com", "firstName": "Jane", "locationId": "loc_123" })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "contact": { "id": "c_1" } })))
            .expect(1)
            .mount(&server)
            .await;

        let result = table
            .execute(
                CREATE_CONTACT,
                args(json!({ "email": "jane@example.com", "firstName": "Jane" })),
            )
            .await
            .unwrap();
        assert_eq!(result["contact"]["id"], "c_1");
    }

    #[tokio::test]
    async fn test_create_contact_requires_identity() {
        let (_server, table) = setup().await;
        let err = table
            .execute(CREATE_CONTACT, args(json!({ "source": "api" })))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments { .. }));
    }

    #[tokio::test]
    async fn test_update_without_fields_rejected() {
        let (_server, table) = setup().await;
        let err = table
            .execute(UPDATE_CONTACT, args(json!({ "contactId": "c_1" })))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Invalid arguments for update_contact: no fields to update");
    }

    #[tokio::test]
    async fn test_add_tags_posts_list() {
        let (server, table) = setup().await;
        Mock::given(method("POST"))
            .and(path("/contacts/c_1/tags"))
            .and(body_json(json!({ "tags": ["vip", "lead"] })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "tags": ["vip", "lead"] })))
            .expect(1)
            .mount(&server)
            .await;

        let result = table
            .execute(ADD_CONTACT_TAGS, args(json!({ "contactId": "c_1", "tags": ["vip", "lead"] })))
            .await
            .unwrap();
        assert_eq!(result["tags"][0], "vip");
    }

    #[tokio::test]
    async fn test_delete_rejects_path_traversal() {
        let (server, table) = setup().await;
        Mock::given(method("DELETE"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "hit": "knowledge-base" })))
            .expect(0)
            .mount(&server)
            .await;

        let err = table
            .execute(DELETE_CONTACT, args(json!({ "contactId": "../knowledge-bases/kb_1" })))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::Api(ApiError::InvalidId(_))));

        let err = table
            .execute(DELETE_CONTACT, args(json!({ "contactId": "" })))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::Api(ApiError::InvalidId(_))));
    }
}
