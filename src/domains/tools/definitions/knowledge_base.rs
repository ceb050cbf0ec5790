//! Knowledge base tools.
//!
//! Manage AI knowledge bases and their FAQ entries. Every handler shapes the
//! API payload into `{ success, <payload>, message, metadata }` so the model
//! gets a one-line summary next to the raw data.

use std::sync::Arc;

use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{info, instrument};

use super::{opt_string, with_client};
use crate::clients::GhlApiClient;
use crate::domains::tools::error::{ToolError, ToolResult};
use crate::domains::tools::provider::ProviderTable;

pub const CATEGORY: &str = "Knowledge Base";

pub const GET_KNOWLEDGE_BASE: &str = "ghl_get_knowledge_base";
pub const DELETE_KNOWLEDGE_BASE: &str = "ghl_delete_knowledge_base";
pub const UPDATE_KNOWLEDGE_BASE: &str = "ghl_update_knowledge_base";
pub const LIST_KNOWLEDGE_BASES: &str = "ghl_list_knowledge_bases";
pub const CREATE_KNOWLEDGE_BASE: &str = "ghl_create_knowledge_base";
pub const LIST_KNOWLEDGE_BASE_FAQS: &str = "ghl_list_knowledge_base_faqs";
pub const CREATE_KNOWLEDGE_BASE_FAQ: &str = "ghl_create_knowledge_base_faq";
pub const UPDATE_KNOWLEDGE_BASE_FAQ: &str = "ghl_update_knowledge_base_faq";
pub const DELETE_KNOWLEDGE_BASE_FAQ: &str = "ghl_delete_knowledge_base_faq";

/// Knowledge bases allowed per location.
const MAX_KNOWLEDGE_BASES: usize = 15;

// ============================================================================
// Tool Parameters
// ============================================================================

#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct KnowledgeBaseIdParams {
    /// The unique ID of the knowledge base
    pub knowledge_base_id: String,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdateKnowledgeBaseParams {
    /// The unique ID of the knowledge base to update
    pub knowledge_base_id: String,
    /// Updated name for the knowledge base
    pub name: Option<String>,
    /// Updated description for the knowledge base
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ListKnowledgeBasesParams {
    /// Location to list. Defaults to the configured location.
    pub location_id: Option<String>,
    /// Search query to filter knowledge bases by name
    pub query: Option<String>,
    /// Maximum number of knowledge bases to return (default: 20)
    pub limit: Option<u32>,
    /// ID of the last knowledge base from the previous page
    pub last_knowledge_base_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateKnowledgeBaseParams {
    /// Name of the new knowledge base
    pub name: String,
    /// Optional description for the knowledge base
    pub description: Option<String>,
    /// Location to create it in. Defaults to the configured location.
    pub location_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ListFaqsParams {
    /// Knowledge base ID
    pub knowledge_base_id: String,
    /// Location ID. Defaults to the configured location.
    pub location_id: Option<String>,
    /// Limit the number of FAQs returned (default: 10)
    pub limit: Option<u32>,
    /// Last FAQ ID for cursor-based pagination
    pub last_faq_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateFaqParams {
    /// Location ID. Defaults to the configured location.
    pub location_id: Option<String>,
    /// FAQ question
    pub question: String,
    /// FAQ answer
    pub answer: String,
    /// Knowledge base ID
    pub knowledge_base_id: String,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdateFaqParams {
    /// FAQ ID
    pub faq_id: String,
    /// Updated FAQ question
    pub question: String,
    /// Updated FAQ answer
    pub answer: String,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct FaqIdParams {
    /// FAQ ID
    pub faq_id: String,
}

// ============================================================================
// Provider
// ============================================================================

/// Build the knowledge base provider.
pub fn provider(client: Arc<GhlApiClient>) -> ProviderTable {
    ProviderTable::new(CATEGORY)
        .with_tool(
            GET_KNOWLEDGE_BASE,
            "Get knowledge base by ID with full details including metadata with content counts (FAQs, URLs, rich text, files, web searches, tables).",
            with_client(&client, get_knowledge_base),
        )
        .with_tool(
            DELETE_KNOWLEDGE_BASE,
            "Delete a knowledge base permanently. This action cannot be undone.",
            with_client(&client, delete_knowledge_base),
        )
        .with_tool(
            UPDATE_KNOWLEDGE_BASE,
            "Update a knowledge base name and/or description.",
            with_client(&client, update_knowledge_base),
        )
        .with_tool(
            LIST_KNOWLEDGE_BASES,
            "Get all knowledge bases for a location with pagination support. Returns list with activeCount, hasMore status, and optional search filtering.",
            with_client(&client, list_knowledge_bases),
        )
        .with_tool(
            CREATE_KNOWLEDGE_BASE,
            "Create a new knowledge base. Maximum 15 knowledge bases per location.",
            with_client(&client, create_knowledge_base),
        )
        .with_tool(
            LIST_KNOWLEDGE_BASE_FAQS,
            "Get all FAQs by knowledge base with cursor-based pagination.",
            with_client(&client, list_faqs),
        )
        .with_tool(
            CREATE_KNOWLEDGE_BASE_FAQ,
            "Create a new FAQ (question and answer pair) inside a knowledge base.",
            with_client(&client, create_faq),
        )
        .with_tool(
            UPDATE_KNOWLEDGE_BASE_FAQ,
            "Update the question and answer of an existing knowledge base FAQ.",
            with_client(&client, update_faq),
        )
        .with_tool(
            DELETE_KNOWLEDGE_BASE_FAQ,
            "Delete an existing knowledge base FAQ permanently.",
            with_client(&client, delete_faq),
        )
}

// ============================================================================
// Handlers
// ============================================================================

#[instrument(skip_all, fields(knowledge_base_id = %params.knowledge_base_id))]
async fn get_knowledge_base(client: Arc<GhlApiClient>, params: KnowledgeBaseIdParams) -> ToolResult<Value> {
    let kb = client
        .get_knowledge_base(&params.knowledge_base_id)
        .await
        .map_err(|e| ToolError::context("get knowledge base", e))?;

    let content_counts = kb.get("kbMetadata").cloned().unwrap_or(Value::Null);
    let total_content: f64 = content_counts
        .as_object()
        .map(|counts| counts.values().filter_map(Value::as_f64).sum())
        .unwrap_or(0.0);

    Ok(json!({
        "success": true,
        "message": format!("Successfully retrieved knowledge base: {}", str_field(&kb, "name")),
        "metadata": {
            "contentCounts": content_counts,
            "totalContent": total_content,
            "isDefault": kb.get("isDefault").and_then(Value::as_bool).unwrap_or(false),
            "deleted": kb.get("deleted").cloned().unwrap_or(Value::Bool(false)),
        },
        "knowledgeBase": kb,
    }))
}

async fn delete_knowledge_base(client: Arc<GhlApiClient>, params: KnowledgeBaseIdParams) -> ToolResult<Value> {
    client
        .delete_knowledge_base(&params.knowledge_base_id)
        .await
        .map_err(|e| ToolError::context("delete knowledge base", e))?;

    info!(knowledge_base_id = %params.knowledge_base_id, "Deleted knowledge base");
    Ok(json!({
        "success": true,
        "message": format!("Successfully deleted knowledge base with ID: {}", params.knowledge_base_id),
        "deletedId": params.knowledge_base_id,
    }))
}

async fn update_knowledge_base(client: Arc<GhlApiClient>, params: UpdateKnowledgeBaseParams) -> ToolResult<Value> {
    let mut update = serde_json::Map::new();
    if let Some(name) = params.name.filter(|n| !n.is_empty()) {
        update.insert("name".into(), Value::String(name));
    }
    if let Some(description) = params.description.filter(|d| !d.is_empty()) {
        update.insert("description".into(), Value::String(description));
    }
    if update.is_empty() {
        return Err(ToolError::context(
            "update knowledge base",
            "At least one field (name or description) must be provided for update",
        ));
    }

    let body = Value::Object(update);
    client
        .update_knowledge_base(&params.knowledge_base_id, &body)
        .await
        .map_err(|e| ToolError::context("update knowledge base", e))?;

    Ok(json!({
        "success": true,
        "message": format!("Successfully updated knowledge base with ID: {}", params.knowledge_base_id),
        "updatedFields": body,
        "knowledgeBaseId": params.knowledge_base_id,
    }))
}

async fn list_knowledge_bases(client: Arc<GhlApiClient>, params: ListKnowledgeBasesParams) -> ToolResult<Value> {
    let query = [
        ("locationId", Some(client.location_or_default(params.location_id))),
        ("query", params.query.clone()),
        ("limit", opt_string(params.limit)),
        ("lastKnowledgeBaseId", params.last_knowledge_base_id),
    ];
    let data = client
        .list_knowledge_bases(&query)
        .await
        .map_err(|e| ToolError::context("list knowledge bases", e))?;

    let knowledge_bases = data.get("knowledgeBases").cloned().unwrap_or_else(|| json!([]));
    let page = knowledge_bases.as_array().map_or(0, Vec::len);
    let active_count = data.get("activeCount").cloned().unwrap_or(Value::Null);
    let has_more = data.get("hasMore").cloned().unwrap_or(Value::Bool(false));

    Ok(json!({
        "success": true,
        "knowledgeBases": knowledge_bases,
        "totalCount": active_count,
        "hasMore": has_more,
        "lastKnowledgeBaseId": data.get("lastKnowledgeBaseId").cloned().unwrap_or(Value::Null),
        "message": format!(
            "Successfully retrieved {} knowledge bases out of {} total",
            page,
            display_count(&active_count)
        ),
        "metadata": {
            "currentPage": page,
            "totalActive": active_count,
            "hasMorePages": has_more,
            "searchQuery": params.query,
        },
    }))
}

async fn create_knowledge_base(client: Arc<GhlApiClient>, params: CreateKnowledgeBaseParams) -> ToolResult<Value> {
    let has_description = params.description.as_deref().is_some_and(|d| !d.is_empty());
    let body = json!({
        "name": &params.name,
        "description": params.description,
        "locationId": client.location_or_default(params.location_id),
    });

    let kb = client.create_knowledge_base(&body).await.map_err(|e| {
        let message = e.to_string();
        if message.contains("limit") || message.contains("maximum") {
            ToolError::context(
                "create knowledge base",
                format!(
                    "Maximum limit of {} knowledge bases per location has been reached",
                    MAX_KNOWLEDGE_BASES
                ),
            )
        } else {
            ToolError::context("create knowledge base", message)
        }
    })?;

    info!(name = %params.name, "Created knowledge base");
    Ok(json!({
        "success": true,
        "message": format!("Successfully created knowledge base: {}", str_field(&kb, "name")),
        "metadata": {
            "id": kb.get("id"),
            "name": kb.get("name"),
            "locationId": kb.get("locationId"),
            "createdAt": kb.get("createdAt"),
            "hasDescription": has_description,
            "remainingSlots": format!("Unknown (max {} per location)", MAX_KNOWLEDGE_BASES),
        },
        "knowledgeBase": kb,
    }))
}

async fn list_faqs(client: Arc<GhlApiClient>, params: ListFaqsParams) -> ToolResult<Value> {
    let query = [
        ("knowledgeBaseId", Some(params.knowledge_base_id.clone())),
        ("locationId", Some(client.location_or_default(params.location_id))),
        ("limit", opt_string(params.limit)),
        ("lastFaqId", params.last_faq_id),
    ];
    let data = client
        .list_knowledge_base_faqs(&query)
        .await
        .map_err(|e| ToolError::context("list knowledge base FAQs", e))?;

    let faqs = data.get("faqs").cloned().unwrap_or_else(|| json!([]));
    let page = faqs.as_array().map_or(0, Vec::len);
    let count = data.get("count").cloned().unwrap_or(Value::Null);
    let has_more = data.get("hasMore").cloned().unwrap_or(Value::Bool(false));

    Ok(json!({
        "success": true,
        "faqs": faqs,
        "totalCount": count,
        "lastFaqId": data.get("lastFaqId").cloned().unwrap_or(Value::Null),
        "hasMore": has_more,
        "message": format!("Successfully retrieved {} FAQs out of {} total", page, display_count(&count)),
        "metadata": {
            "currentPage": page,
            "totalCount": count,
            "hasMorePages": has_more,
            "knowledgeBaseId": params.knowledge_base_id,
        },
    }))
}

async fn create_faq(client: Arc<GhlApiClient>, params: CreateFaqParams) -> ToolResult<Value> {
    let body = json!({
        "locationId": client.location_or_default(params.location_id),
        "question": params.question,
        "answer": params.answer,
        "knowledgeBaseId": params.knowledge_base_id,
    });
    let data = client
        .create_knowledge_base_faq(&body)
        .await
        .map_err(|e| ToolError::context("create knowledge base FAQ", e))?;

    let faq = data.get("faq").cloned().unwrap_or(data);
    Ok(json!({
        "success": true,
        "message": format!("Successfully created FAQ: \"{}\"", str_field(&faq, "question")),
        "metadata": {
            "id": faq.get("id"),
            "question": faq.get("question"),
            "knowledgeBaseId": faq.get("knowledgeBaseId"),
            "locationId": faq.get("locationId"),
            "createdAt": faq.get("createdAt"),
        },
        "faq": faq,
    }))
}

async fn update_faq(client: Arc<GhlApiClient>, params: UpdateFaqParams) -> ToolResult<Value> {
    let body = json!({ "question": params.question, "answer": params.answer });
    client
        .update_knowledge_base_faq(&params.faq_id, &body)
        .await
        .map_err(|e| ToolError::context("update knowledge base FAQ", e))?;

    Ok(json!({
        "success": true,
        "message": format!("Successfully updated FAQ with ID: {}", params.faq_id),
        "updatedFields": body,
        "faqId": params.faq_id,
    }))
}

async fn delete_faq(client: Arc<GhlApiClient>, params: FaqIdParams) -> ToolResult<Value> {
    client
        .delete_knowledge_base_faq(&params.faq_id)
        .await
        .map_err(|e| ToolError::context("delete knowledge base FAQ", e))?;

    Ok(json!({
        "success": true,
        "message": format!("Successfully deleted FAQ with ID: {}", params.faq_id),
        "deletedId": params.faq_id,
    }))
}

fn str_field<'a>(value: &'a Value, key: &str) -> &'a str {
    value.get(key).and_then(Value::as_str).unwrap_or("")
}

fn display_count(count: &Value) -> String {
    match count {
        Value::Null => "unknown".to_string(),
        other => other.to_string(),
    }
}
