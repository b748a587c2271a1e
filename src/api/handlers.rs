//! API Handlers
//!
//! HTTP request handlers for each state store endpoint.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{header, HeaderMap},
    response::IntoResponse,
    Json,
};

use crate::config::Config;
use crate::error::{Result, StateError};
use crate::models::{
    ClearResponse, DeleteResponse, GetResponse, HealthResponse, MetaResponse, SetRequest,
    SetResponse,
};
use crate::store::{ListedEntry, StateStore, StoreHandle};
use crate::tool::StateTool;

/// Header carrying the caller's agent label.
pub const AGENT_HEADER: &str = "x-agent-id";

/// Application state shared across all handlers.
///
/// The store is opened lazily on the first request that needs it.
#[derive(Clone)]
pub struct AppState {
    pub handle: StoreHandle,
    pub tool: StateTool,
}

impl AppState {
    /// Creates a new AppState around a store handle.
    pub fn new(handle: StoreHandle) -> Self {
        Self {
            tool: StateTool::new(handle.clone()),
            handle,
        }
    }

    /// Creates a new AppState from configuration.
    pub fn from_config(config: &Config) -> Self {
        Self::new(StoreHandle::new(config.clone()))
    }

    /// Creates a new AppState around an already opened store.
    pub fn from_store(store: StateStore) -> Self {
        Self::new(StoreHandle::from_store(store))
    }
}

fn agent_label(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AGENT_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// Handler for PUT /set
///
/// Stores a JSON value with optional TTL; the writer is taken from `x-agent-id`.
/// Body rejections keep axum's status but answer with a JSON error.
pub async fn set_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: std::result::Result<Json<SetRequest>, JsonRejection>,
) -> Result<Json<SetResponse>> {
    let Json(req) = payload?;
    if let Some(error_msg) = req.validate() {
        return Err(StateError::Validation(error_msg));
    }

    let value = req.value.unwrap_or_default();
    let agent = agent_label(&headers).unwrap_or(crate::store::DEFAULT_AGENT);
    let store = state.handle.store().await?;
    let outcome = store.set(&req.key, &value, req.ttl, agent).await?;

    Ok(Json(SetResponse::from(outcome)))
}

/// Handler for GET /get/:key
///
/// Returns `{"found": false}` with status 200 for missing or expired keys.
pub async fn get_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<GetResponse>> {
    let stored = state.handle.store().await?.get(&key).await?;
    Ok(Json(GetResponse::from(stored)))
}

/// Handler for GET /meta/:key
pub async fn meta_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<MetaResponse>> {
    let meta = state.handle.store().await?.meta(&key).await?;
    Ok(Json(MetaResponse::from(meta)))
}

/// Handler for GET /list
pub async fn list_handler(State(state): State<AppState>) -> Result<Json<Vec<ListedEntry>>> {
    let entries = state.handle.store().await?.list().await?;
    Ok(Json(entries))
}

/// Handler for DELETE /del/:key
///
/// Deleting a missing key succeeds with `deleted: false`.
pub async fn delete_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<DeleteResponse>> {
    let deleted = state.handle.store().await?.delete(&key).await?;
    Ok(Json(DeleteResponse::new(key, deleted)))
}

/// Handler for DELETE /clear
pub async fn clear_handler(State(state): State<AppState>) -> Result<Json<ClearResponse>> {
    let cleared = state.handle.store().await?.clear().await?;
    Ok(Json(ClearResponse::new(cleared)))
}

/// Handler for POST /tool
///
/// Accepts the tool argument record and always answers 200 with the tool's
/// JSON response; failures are reported in its `error` field.
pub async fn tool_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: String,
) -> impl IntoResponse {
    let response = state.tool.invoke_json(&body, agent_label(&headers)).await;
    ([(header::CONTENT_TYPE, "application/json")], response)
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
