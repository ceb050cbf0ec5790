//! HTTP transport implementation.
//!
//! Serves MCP over Server-Sent Events for web clients, plus a plain
//! JSON-RPC endpoint and a few informational routes:
//!
//! | Route                  | Purpose                                          |
//! |------------------------|--------------------------------------------------|
//! | `GET /`                | server info and tool snapshot                    |
//! | `GET /health`          | liveness with tool snapshot                      |
//! | `GET /capabilities`    | advertised capabilities                          |
//! | `GET /tools`           | tool definitions and count                       |
//! | `GET\|POST /sse`       | open an SSE session                              |
//! | `POST /messages`       | JSON-RPC message for an SSE session              |
//! | `POST /mcp`            | JSON-RPC request with the response in the body   |
//!
//! An SSE session starts with an `endpoint` event naming the URL to POST
//! messages to. Responses to those messages arrive on the stream as
//! `message` events.

use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::{
        IntoResponse, Response,
        sse::{Event, KeepAlive, Sse},
    },
    routing::{get, post},
};
use rmcp::model::JsonObject;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tokio::sync::{RwLock, mpsc};
use tokio_stream::wrappers::ReceiverStream;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use super::shutdown::shutdown_signal;
use super::{TransportConfig, TransportError, TransportResult, config::HttpConfig};
use crate::core::McpServer;

/// Path SSE clients POST their messages to.
pub const MESSAGES_PATH: &str = "/messages";

/// Buffered events per SSE session.
const SSE_CHANNEL_CAPACITY: usize = 100;

type SseSender = mpsc::Sender<Result<Event, Infallible>>;

/// Queue feeding one SSE session's worker.
type SessionSender = mpsc::Sender<JsonRpcRequest>;

/// HTTP transport handler.
pub struct HttpTransport {
    config: HttpConfig,
}

/// JSON-RPC request structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    #[serde(default)]
    pub id: Option<Value>,
    pub method: String,
    #[serde(default)]
    pub params: Option<Value>,
}

/// JSON-RPC response structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

/// JSON-RPC error structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl JsonRpcResponse {
    /// Create a success response.
    pub fn success(id: Option<Value>, result: Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    /// Create an error response.
    pub fn error(id: Option<Value>, code: i32, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: None,
            error: Some(JsonRpcError {
                code,
                message: message.into(),
                data: None,
            }),
        }
    }

    /// Method not found error.
    pub fn method_not_found(id: Option<Value>) -> Self {
        Self::error(id, -32601, "Method not found")
    }

    /// Invalid request error.
    pub fn invalid_request(id: Option<Value>) -> Self {
        Self::error(id, -32600, "Invalid Request")
    }

    /// Invalid params error.
    pub fn invalid_params(id: Option<Value>, msg: impl Into<String>) -> Self {
        Self::error(id, -32602, msg)
    }

    /// Internal error.
    pub fn internal_error(id: Option<Value>, msg: impl Into<String>) -> Self {
        Self::error(id, -32603, msg)
    }
}

/// Application state shared across HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    /// The MCP server instance.
    server: McpServer,
    /// Open SSE sessions by id.
    sessions: Arc<RwLock<HashMap<String, SessionSender>>>,
}

impl AppState {
    pub fn new(server: McpServer) -> Self {
        Self {
            server,
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Number of open SSE sessions.
    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }
}

#[derive(Debug, Deserialize)]
struct MessageQuery {
    #[serde(rename = "sessionId")]
    session_id: Option<String>,
}

impl HttpTransport {
    /// Create a new HTTP transport with the given config.
    pub fn new(config: HttpConfig) -> Self {
        Self { config }
    }

    /// Create from TransportConfig (extracts HTTP config).
    pub fn from_transport_config(config: &TransportConfig) -> Option<Self> {
        match config {
            TransportConfig::Http(http_config) => Some(Self::new(http_config.clone())),
            #[allow(unreachable_patterns)]
            _ => None,
        }
    }

    /// Get the bind address.
    pub fn address(&self) -> String {
        format!("{}:{}", self.config.host, self.config.port)
    }

    /// Build the router for the given state.
    pub fn router(&self, state: AppState) -> Router {
        let mut app = Router::new()
            .route("/", get(root_handler))
            .route("/health", get(health_check))
            .route("/capabilities", get(capabilities))
            .route("/tools", get(list_tools))
            .route("/sse", get(handle_sse).post(handle_sse))
            .route(MESSAGES_PATH, post(handle_message))
            .route(&self.config.rpc_path, post(handle_rpc))
            .with_state(state)
            .layer(TraceLayer::new_for_http());

        if self.config.enable_cors {
            let cors = CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any);
            app = app.layer(cors);
        }

        app
    }

    /// Run the HTTP transport until a shutdown signal arrives.
    ///
    /// The GoHighLevel API must be reachable before the listener starts.
    pub async fn run(self, server: McpServer) -> TransportResult<()> {
        info!("Testing GoHighLevel API connectivity");
        server.check_connection().await.map_err(|e| {
            error!(error = %e, "GoHighLevel API connection failed");
            TransportError::connection(format!("Failed to connect to GHL API: {}", e))
        })?;

        let addr = self.address();
        let tool_count = server.registry().len();
        let app = self.router(AppState::new(server));

        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(|e| TransportError::bind(&addr, e))?;

        let cors_status = if self.config.enable_cors {
            "enabled"
        } else {
            "disabled"
        };
        info!(address = %addr, tools = tool_count, cors = cors_status, "Ready - listening for HTTP/SSE clients");
        info!("  → SSE:      GET /sse");
        info!("  → JSON-RPC: POST {}", self.config.rpc_path);
        info!("  → Health:   GET /health");

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        info!("HTTP transport finished");
        Ok(())
    }
}

// ============================================================================
// Informational Routes
// ============================================================================

/// Root handler - provides API info.
async fn root_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "name": "GoHighLevel MCP Server",
        "version": state.server.version(),
        "status": "running",
        "endpoints": {
            "health": "/health",
            "capabilities": "/capabilities",
            "tools": "/tools",
            "sse": "/sse",
            "messages": MESSAGES_PATH
        },
        "tools": state.server.tools_snapshot()
    }))
}

/// Health check endpoint.
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "server": state.server.name(),
        "version": state.server.version(),
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "tools": state.server.tools_snapshot()
    }))
}

async fn capabilities(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "capabilities": { "tools": {} },
        "server": {
            "name": state.server.name(),
            "version": state.server.version()
        }
    }))
}

async fn list_tools(State(state): State<AppState>) -> impl IntoResponse {
    let tools = state.server.list_tools();
    Json(json!({ "count": tools.len(), "tools": tools }))
}

// ============================================================================
// SSE Sessions
// ============================================================================

/// Open an SSE session.
///
/// Each session has one worker that handles its messages in arrival order,
/// so responses appear on the stream in the order requests were posted.
async fn handle_sse(State(state): State<AppState>) -> impl IntoResponse {
    let session_id = Uuid::new_v4().to_string();
    let (events, rx) = mpsc::channel(SSE_CHANNEL_CAPACITY);
    let (inbound, requests) = mpsc::channel(SSE_CHANNEL_CAPACITY);

    let endpoint = format!("{}?sessionId={}", MESSAGES_PATH, session_id);
    if events.try_send(Ok(Event::default().event("endpoint").data(endpoint))).is_err() {
        warn!(session_id = %session_id, "Failed to queue endpoint event");
    }

    state.sessions.write().await.insert(session_id.clone(), inbound);
    info!(session_id = %session_id, "SSE connection established");

    tokio::spawn(run_session(state, session_id, requests, events));

    Sse::new(ReceiverStream::new(rx)).keep_alive(KeepAlive::default())
}

/// Process one session's messages until its stream goes away.
async fn run_session(
    state: AppState,
    session_id: String,
    mut requests: mpsc::Receiver<JsonRpcRequest>,
    events: SseSender,
) {
    loop {
        let request = tokio::select! {
            _ = events.closed() => break,
            request = requests.recv() => match request {
                Some(request) => request,
                None => break,
            },
        };

        let Some(response) = process_request(&state, request).await else {
            continue;
        };
        let data = match serde_json::to_string(&response) {
            Ok(data) => data,
            Err(e) => {
                error!(error = %e, "Failed to encode JSON-RPC response");
                continue;
            }
        };
        if events.send(Ok(Event::default().event("message").data(data))).await.is_err() {
            debug!(session_id = %session_id, "Session closed before response was delivered");
            break;
        }
    }

    state.sessions.write().await.remove(&session_id);
    info!(session_id = %session_id, "SSE connection closed");
}

/// Accept a JSON-RPC message for an SSE session.
///
/// The response is delivered on the session stream, not in this reply.
async fn handle_message(
    State(state): State<AppState>,
    Query(query): Query<MessageQuery>,
    Json(request): Json<JsonRpcRequest>,
) -> Response {
    let Some(session_id) = query.session_id else {
        return (StatusCode::BAD_REQUEST, Json(json!({ "error": "Missing sessionId" }))).into_response();
    };

    let sender = state.sessions.read().await.get(&session_id).cloned();
    let Some(sender) = sender else {
        warn!(session_id = %session_id, "Message for unknown session");
        return session_not_found();
    };

    debug!(session_id = %session_id, method = %request.method, "Received session message");
    if sender.send(request).await.is_err() {
        warn!(session_id = %session_id, "Message for closed session");
        return session_not_found();
    }

    StatusCode::ACCEPTED.into_response()
}

fn session_not_found() -> Response {
    (StatusCode::NOT_FOUND, Json(json!({ "error": "Session not found" }))).into_response()
}

// ============================================================================
// JSON-RPC
// ============================================================================

/// Handle plain JSON-RPC requests.
#[instrument(skip_all, fields(method))]
async fn handle_rpc(State(state): State<AppState>, Json(request): Json<JsonRpcRequest>) -> Response {
    tracing::Span::current().record("method", request.method.as_str());
    debug!("Received JSON-RPC request");

    match process_request(&state, request).await {
        Some(response) => (StatusCode::OK, Json(response)).into_response(),
        None => StatusCode::ACCEPTED.into_response(),
    }
}

/// Process a JSON-RPC message. Notifications produce no response.
async fn process_request(state: &AppState, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
    if request.jsonrpc != "2.0" {
        return Some(JsonRpcResponse::invalid_request(request.id));
    }

    let response = match request.method.as_str() {
        "initialize" => handle_initialize(state, request),
        "ping" => JsonRpcResponse::success(request.id, json!({})),
        "tools/list" => handle_tools_list(state, request),
        "tools/call" => handle_tools_call(state, request).await,
        method if method.starts_with("notifications/") => {
            debug!(method, "Received notification");
            return None;
        }
        _ => {
            warn!(method = %request.method, "Unknown method");
            JsonRpcResponse::method_not_found(request.id)
        }
    };

    Some(response)
}

fn handle_initialize(state: &AppState, request: JsonRpcRequest) -> JsonRpcResponse {
    info!("Processing initialize request");

    match serde_json::to_value(state.server.server_info()) {
        Ok(result) => JsonRpcResponse::success(request.id, result),
        Err(e) => JsonRpcResponse::internal_error(request.id, e.to_string()),
    }
}

fn handle_tools_list(state: &AppState, request: JsonRpcRequest) -> JsonRpcResponse {
    let tools = state.server.list_tools();
    debug!(count = tools.len(), "Listing tools");
    JsonRpcResponse::success(request.id, json!({ "tools": tools }))
}

async fn handle_tools_call(state: &AppState, request: JsonRpcRequest) -> JsonRpcResponse {
    let Some(params) = request.params else {
        return JsonRpcResponse::invalid_params(request.id, "Missing params");
    };

    let Some(name) = params.get("name").and_then(Value::as_str) else {
        return JsonRpcResponse::invalid_params(request.id, "Missing tool name");
    };

    let arguments: Option<JsonObject> = match params.get("arguments") {
        None | Some(Value::Null) => None,
        Some(Value::Object(map)) => Some(map.clone()),
        Some(_) => return JsonRpcResponse::invalid_params(request.id, "Tool arguments must be an object"),
    };

    match state.server.dispatch_tool(name, arguments).await {
        Ok(result) => match serde_json::to_value(result) {
            Ok(value) => JsonRpcResponse::success(request.id, value),
            Err(e) => JsonRpcResponse::internal_error(request.id, e.to_string()),
        },
        Err(e) => JsonRpcResponse::error(request.id, e.code.0, e.message.into_owned()),
    }
}
