//! GoHighLevel API client.
//!
//! A thin async wrapper around one `reqwest::Client`: one method per remote
//! operation, JSON in and JSON out. Non-2xx responses are turned into
//! [`ApiError::Status`] so that callers see the HTTP status in the message.

use std::sync::{Arc, RwLock};
use std::time::Duration;

use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::{Method, RequestBuilder};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::core::config::GhlConfig;

/// Request timeout applied to every API call.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors returned by the GoHighLevel API client.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The API answered with a non-success status.
    #[error("GHL API error ({status}): {message}")]
    Status { status: u16, message: String },

    /// The request could not be sent or the response could not be read.
    #[error("GHL API request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The client could not be built from the configuration.
    #[error("Invalid GHL API configuration: {0}")]
    Config(String),

    /// A resource id is not usable as a single URL path segment.
    #[error("Invalid resource id {0:?}: expected letters, digits, '-', '_', '.' or '~'")]
    InvalidId(String),
}

/// Query string parameters; `None` values are omitted.
pub type Query<'a> = [(&'a str, Option<String>)];

/// Client for the GoHighLevel REST API.
#[derive(Clone)]
pub struct GhlApiClient {
    http: reqwest::Client,
    base_url: String,
    location_id: String,
    access_token: Arc<RwLock<String>>,
}

impl std::fmt::Debug for GhlApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GhlApiClient")
            .field("base_url", &self.base_url)
            .field("location_id", &self.location_id)
            .field("access_token", &"[REDACTED]")
            .finish()
    }
}

impl GhlApiClient {
    /// Create a new client from the API configuration.
    pub fn new(config: &GhlConfig) -> Result<Self, ApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "Version",
            HeaderValue::from_str(&config.api_version)
                .map_err(|e| ApiError::Config(format!("invalid API version header: {}", e)))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ApiError::Config(e.to_string()))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            location_id: config.location_id.clone(),
            access_token: Arc::new(RwLock::new(config.access_token.clone())),
        })
    }

    /// Base URL every request path is appended to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Location used when a tool call does not name one.
    pub fn location_id(&self) -> &str {
        &self.location_id
    }

    /// Resolve an optional location id against the configured default.
    pub fn location_or_default(&self, location_id: Option<String>) -> String {
        location_id
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| self.location_id.clone())
    }

    /// Replace the bearer token used for subsequent requests.
    pub fn update_access_token(&self, token: impl Into<String>) {
        let mut guard = self
            .access_token
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = token.into();
    }

    fn token(&self) -> String {
        self.access_token
            .read()
            .map(|t| t.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }

    // ========================================================================
    // Request plumbing
    // ========================================================================

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        self.http.request(method, url).bearer_auth(self.token())
    }

    async fn send(&self, method: Method, path: &str, builder: RequestBuilder) -> Result<Value, ApiError> {
        debug!(%method, path, "GHL API request");

        let response = builder.send().await?;
        let status = response.status();
        let body = response.bytes().await?;

        if !status.is_success() {
            let message = error_message(&body)
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("Unknown error").to_string());
            warn!(%method, path, status = status.as_u16(), "GHL API call failed: {}", message);
            return Err(ApiError::Status {
                status: status.as_u16(),
                message,
            });
        }

        if body.is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_slice(&body)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&body).into_owned())))
    }

    async fn get(&self, path: &str, query: &Query<'_>) -> Result<Value, ApiError> {
        let builder = self.request(Method::GET, path).query(&present(query));
        self.send(Method::GET, path, builder).await
    }

    async fn post(&self, path: &str, body: &Value) -> Result<Value, ApiError> {
        let builder = self.request(Method::POST, path).json(body);
        self.send(Method::POST, path, builder).await
    }

    async fn put(&self, path: &str, body: &Value) -> Result<Value, ApiError> {
        let builder = self.request(Method::PUT, path).json(body);
        self.send(Method::PUT, path, builder).await
    }

    async fn delete(&self, path: &str) -> Result<Value, ApiError> {
        let builder = self.request(Method::DELETE, path);
        self.send(Method::DELETE, path, builder).await
    }

    // ========================================================================
    // Locations
    // ========================================================================

    /// Fetch the configured location to verify credentials.
    pub async fn test_connection(&self) -> Result<Value, ApiError> {
        self.get_location(&self.location_id).await
    }

    pub async fn get_location(&self, location_id: &str) -> Result<Value, ApiError> {
        self.get(&format!("/locations/{}", segment(location_id)?), &[]).await
    }

    pub async fn search_locations(&self, query: &Query<'_>) -> Result<Value, ApiError> {
        self.get("/locations/search", query).await
    }

    // ========================================================================
    // Contacts
    // ========================================================================

    pub async fn search_contacts(&self, body: &Value) -> Result<Value, ApiError> {
        self.post("/contacts/search", body).await
    }

    pub async fn get_contact(&self, contact_id: &str) -> Result<Value, ApiError> {
        self.get(&format!("/contacts/{}", segment(contact_id)?), &[]).await
    }

    pub async fn create_contact(&self, body: &Value) -> Result<Value, ApiError> {
        self.post("/contacts/", body).await
    }

    pub async fn update_contact(&self, contact_id: &str, body: &Value) -> Result<Value, ApiError> {
        self.put(&format!("/contacts/{}", segment(contact_id)?), body).await
    }

    pub async fn delete_contact(&self, contact_id: &str) -> Result<Value, ApiError> {
        self.delete(&format!("/contacts/{}", segment(contact_id)?)).await
    }

    pub async fn add_contact_tags(&self, contact_id: &str, tags: &[String]) -> Result<Value, ApiError> {
        let body = serde_json::json!({ "tags": tags });
        self.post(&format!("/contacts/{}/tags", segment(contact_id)?), &body).await
    }

    // ========================================================================
    // Payments
    // ========================================================================

    pub async fn list_orders(&self, query: &Query<'_>) -> Result<Value, ApiError> {
        self.get("/payments/orders", query).await
    }

    pub async fn get_order(&self, order_id: &str, query: &Query<'_>) -> Result<Value, ApiError> {
        self.get(&format!("/payments/orders/{}", segment(order_id)?), query).await
    }

    pub async fn list_coupons(&self, query: &Query<'_>) -> Result<Value, ApiError> {
        self.get("/payments/coupon/list", query).await
    }

    pub async fn create_coupon(&self, body: &Value) -> Result<Value, ApiError> {
        self.post("/payments/coupon", body).await
    }

    // ========================================================================
    // Knowledge Base
    // ========================================================================

    pub async fn get_knowledge_base(&self, knowledge_base_id: &str) -> Result<Value, ApiError> {
        self.get(&format!("/knowledge-bases/{}", segment(knowledge_base_id)?), &[])
            .await
    }

    pub async fn delete_knowledge_base(&self, knowledge_base_id: &str) -> Result<Value, ApiError> {
        self.delete(&format!("/knowledge-bases/{}", segment(knowledge_base_id)?))
            .await
    }

    pub async fn update_knowledge_base(
        &self,
        knowledge_base_id: &str,
        body: &Value,
    ) -> Result<Value, ApiError> {
        self.put(&format!("/knowledge-bases/{}", segment(knowledge_base_id)?), body)
            .await
    }

    pub async fn list_knowledge_bases(&self, query: &Query<'_>) -> Result<Value, ApiError> {
        self.get("/knowledge-bases/", query).await
    }

    pub async fn create_knowledge_base(&self, body: &Value) -> Result<Value, ApiError> {
        self.post("/knowledge-bases/", body).await
    }

    pub async fn list_knowledge_base_faqs(&self, query: &Query<'_>) -> Result<Value, ApiError> {
        self.get("/knowledge-bases/faqs", query).await
    }

    pub async fn create_knowledge_base_faq(&self, body: &Value) -> Result<Value, ApiError> {
        self.post("/knowledge-bases/faqs", body).await
    }

    pub async fn update_knowledge_base_faq(&self, faq_id: &str, body: &Value) -> Result<Value, ApiError> {
        self.put(&format!("/knowledge-bases/faqs/{}", segment(faq_id)?), body)
            .await
    }

    pub async fn delete_knowledge_base_faq(&self, faq_id: &str) -> Result<Value, ApiError> {
        self.delete(&format!("/knowledge-bases/faqs/{}", segment(faq_id)?))
            .await
    }
}

/// Check that a caller-supplied id stays one path segment.
///
/// Empty ids, dot segments and anything outside the unreserved URL
/// characters are rejected before a request is built.
fn segment(id: &str) -> Result<&str, ApiError> {
    let unreserved = id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '~'));
    if id.is_empty() || id == "." || id == ".." || !unreserved {
        return Err(ApiError::InvalidId(id.to_string()));
    }
    Ok(id)
}

/// Drop query parameters that were not provided.
fn present<'a>(query: &'a Query<'a>) -> Vec<(&'a str, &'a str)> {
    query
        .iter()
        .filter_map(|(key, value)| value.as_deref().map(|v| (*key, v)))
        .collect()
}

/// Pull a human-readable message out of an error body.
///
/// The API reports `message` either as a string or as a list of strings.
fn error_message(body: &[u8]) -> Option<String> {
    let value: Value = match serde_json::from_slice(body) {
        Ok(v) => v,
        Err(_) => {
            let text = String::from_utf8_lossy(body).trim().to_string();
            return (!text.is_empty()).then_some(text);
        }
    };

    match value.get("message") {
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Array(items)) => Some(
            items
                .iter()
                .map(|i| i.as_str().map(str::to_string).unwrap_or_else(|| i.to_string()))
                .collect::<Vec<_>>()
                .join(", "),
        ),
        _ => value
            .get("error")
            .and_then(|e| e.as_str())
            .map(str::to_string),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config(base_url: &str) -> GhlConfig {
        GhlConfig {
            access_token: "token_123".to_string(),
            base_url: base_url.to_string(),
            api_version: "2021-07-28".to_string(),
            location_id: "loc_123".to_string(),
        }
    }

    #[tokio::test]
    async fn test_connection_sends_configured_headers() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/locations/loc_123"))
            .and(header("Authorization", "Bearer token_123"))
            .and(header("Version", "2021-07-28"))
            .and(header("Accept", "application/json"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "location": { "id": "loc_123" } })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = GhlApiClient::new(&test_config(&server.uri())).unwrap();
        let result = client.test_connection().await.unwrap();
        assert_eq!(result["location"]["id"], "loc_123");
    }

    #[tokio::test]
    async fn test_update_access_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/contacts/c_1"))
            .and(header("Authorization", "Bearer token_456"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "id": "c_1" })))
            .expect(1)
            .mount(&server)
            .await;

        let client = GhlApiClient::new(&test_config(&server.uri())).unwrap();
        client.update_access_token("token_456");
        assert!(client.get_contact("c_1").await.is_ok());
    }

    #[tokio::test]
    async fn test_not_found_status_in_message() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/knowledge-bases/kb_missing"))
            .respond_with(
                ResponseTemplate::new(404)
                    .set_body_json(serde_json::json!({ "message": "Knowledge base not found" })),
            )
            .mount(&server)
            .await;

        let client = GhlApiClient::new(&test_config(&server.uri())).unwrap();
        let err = client.get_knowledge_base("kb_missing").await.unwrap_err();
        assert!(matches!(err, ApiError::Status { status: 404, .. }));
        assert_eq!(
            err.to_string(),
            "GHL API error (404): Knowledge base not found"
        );
    }

    #[tokio::test]
    async fn test_error_message_list_is_joined() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/payments/coupon"))
            .respond_with(ResponseTemplate::new(422).set_body_json(
                serde_json::json!({ "message": ["code must be a string", "discount is required"] }),
            ))
            .mount(&server)
            .await;

        let client = GhlApiClient::new(&test_config(&server.uri())).unwrap();
        let err = client
            .create_coupon(&serde_json::json!({}))
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "GHL API error (422): code must be a string, discount is required"
        );
    }

    #[tokio::test]
    async fn test_query_skips_missing_values() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/knowledge-bases/"))
            .and(query_param("locationId", "loc_123"))
            .and(query_param("limit", "5"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "knowledgeBases": [] })))
            .expect(1)
            .mount(&server)
            .await;

        let client = GhlApiClient::new(&test_config(&server.uri())).unwrap();
        let query = [
            ("locationId", Some("loc_123".to_string())),
            ("query", None),
            ("limit", Some("5".to_string())),
        ];
        assert!(client.list_knowledge_bases(&query).await.is_ok());
    }

    #[tokio::test]
    async fn test_post_sends_json_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/contacts/c_1/tags"))
            .and(body_json(serde_json::json!({ "tags": ["vip", "lead"] })))
            .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({ "tags": ["vip", "lead"] })))
            .expect(1)
            .mount(&server)
            .await;

        let client = GhlApiClient::new(&test_config(&server.uri())).unwrap();
        let tags = vec!["vip".to_string(), "lead".to_string()];
        assert!(client.add_contact_tags("c_1", &tags).await.is_ok());
    }

    #[tokio::test]
    async fn test_empty_success_body_is_null() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/contacts/c_1"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let client = GhlApiClient::new(&test_config(&server.uri())).unwrap();
        assert_eq!(client.delete_contact("c_1").await.unwrap(), Value::Null);
    }

    #[test]
    fn test_location_fallback() {
        let client = GhlApiClient::new(&test_config("https://example.test/")).unwrap();
        assert_eq!(client.base_url(), "https://example.test");
        assert_eq!(client.location_or_default(None), "loc_123");
        assert_eq!(client.location_or_default(Some(String::new())), "loc_123");
        assert_eq!(client.location_or_default(Some("loc_9".into())), "loc_9");
    }

    #[test]
    fn test_debug_redacts_token() {
        let client = GhlApiClient::new(&test_config("https://example.test")).unwrap();
        let debug = format!("{:?}", client);
        assert!(debug.contains("REDACTED"));
        assert!(!debug.contains("token_123"));
    }

    #[tokio::test]
    async fn test_ids_cannot_leave_their_path_segment() {
        let server = MockServer::start().await;
        Mock::given(wiremock::matchers::any())
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "hit": true })))
            .expect(0)
            .mount(&server)
            .await;

        let client = GhlApiClient::new(&test_config(&server.uri())).unwrap();
        for id in ["../knowledge-bases/kb_1", "", "..", "c_1?force=true", "c_1#x", "c%2F1", "c 1"] {
            let err = client.delete_contact(id).await.unwrap_err();
            assert!(matches!(err, ApiError::InvalidId(_)), "accepted {:?}", id);
        }
        assert!(client.get_knowledge_base("../contacts/c_1").await.is_err());
        assert!(client.update_knowledge_base_faq("faq/1", &Value::Null).await.is_err());
    }

    #[test]
    fn test_segment_accepts_api_ids() {
        assert_eq!(segment("ve9EPM428h8vShlRW1KT").unwrap(), "ve9EPM428h8vShlRW1KT");
        assert!(segment("order_1.v2~a-b").is_ok());
    }
}
