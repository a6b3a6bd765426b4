//! HTTP routes and handlers for the API Bridge (spec §6).

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use serde::Deserialize;
use serde_json::{Value, json};
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};
use tracing::warn;

use crate::context::ToolExecutionContext;
use crate::error::Error;
use crate::manager::RegistryManager;
use crate::model::ToolCategory;
use crate::result::ToolResult;

/// Shared application state threaded through every handler.
pub struct AppState {
    /// The manager whose surface this bridge projects over HTTP.
    pub manager: Arc<RegistryManager>,
}

/// Build the full route table (spec §6).
#[must_use = "the router does nothing until it is served"]
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/tools/", get(overview_handler))
        .route("/tools/discover", get(discover_handler))
        .route("/tools/providers", get(providers_handler))
        .route("/tools/categories", get(categories_handler))
        .route("/tools/{name}", get(get_tool_handler))
        .route("/tools/execute", post(execute_handler))
        .route("/tools/executions/{id}/status", get(execution_status_handler))
        .route("/tools/executions/{id}/result", get(execution_result_handler))
        .route("/tools/stats", get(stats_handler))
        .route("/tools/health", get(health_handler))
        .layer(CatchPanicLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn error_response(error: &Error) -> axum::response::Response {
    let status = StatusCode::from_u16(error.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(json!({"error": error.code(), "message": error.to_string()}))).into_response()
}

/// GET /tools/ — system overview (spec §6).
async fn overview_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let status = state.manager.get_comprehensive_status();
    Json(json!({
        "status": status.status,
        "uptime_secs": status.uptime_secs,
        "total_tools": status.registry_stats.total_tools,
        "frameworks_count": status.registry_stats.frameworks_count,
    }))
}

#[derive(Debug, Deserialize)]
struct DiscoverQuery {
    category: Option<ToolCategory>,
    provider: Option<String>,
    tags: Option<String>,
}

/// GET /tools/discover?category=&provider=&tags= — list tools (spec §6).
async fn discover_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DiscoverQuery>,
) -> impl IntoResponse {
    let filter = crate::unified_registry::DiscoverFilter {
        categories: query.category.map(|c| vec![c]),
        providers: query.provider.map(|p| vec![p]),
        name_contains: None,
    };

    match state.manager.registry().discover_tools(&filter) {
        Ok(mut tools) => {
            if let Some(tags) = query.tags {
                let wanted: Vec<&str> = tags.split(',').collect();
                tools.retain(|t| wanted.iter().any(|w| t.tags.iter().any(|tag| tag == w)));
            }
            Json(tools).into_response()
        }
        Err(e) => error_response(&e),
    }
}

/// GET /tools/providers — list adapters (spec §6).
async fn providers_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let stats = state.manager.registry().stats();
    Json(stats.available_providers)
}

/// GET /tools/categories — enum values (spec §6).
async fn categories_handler() -> impl IntoResponse {
    Json(ToolCategory::all())
}

/// GET /tools/{name} — one spec (spec §6).
async fn get_tool_handler(State(state): State<Arc<AppState>>, Path(name): Path<String>) -> impl IntoResponse {
    match state.manager.registry().get_tool_spec(&name) {
        Some(spec) => Json(spec).into_response(),
        None => error_response(&Error::ToolNotFound(name)),
    }
}

#[derive(Debug, Deserialize)]
struct ExecuteContext {
    #[serde(default)]
    user_id: Option<String>,
    #[serde(default)]
    session_id: Option<String>,
    #[serde(default)]
    trace_id: Option<String>,
    #[serde(default)]
    priority: Option<i32>,
}

#[derive(Debug, Deserialize)]
struct ExecuteRequest {
    tool_name: String,
    #[serde(default)]
    params: Value,
    #[serde(default)]
    context: Option<ExecuteContext>,
    /// Per-call timeout override, in seconds (spec §6).
    #[serde(default)]
    timeout: Option<u64>,
}

/// POST /tools/execute — run a tool (spec §6). Submits through the
/// coordinator and awaits the result, returning the envelope spec §6
/// describes: `{success, execution_id, tool_name, status, data?, error?,
/// duration_ms?, metadata}`. Structural errors (e.g. `not_initialized`) map
/// to HTTP status; a failed `ToolResult` is never itself a non-200 (spec
/// §7).
async fn execute_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ExecuteRequest>,
) -> impl IntoResponse {
    let mut ctx = ToolExecutionContext::new();
    if let Some(requested) = request.context {
        ctx.user_id = requested.user_id;
        ctx.session_id = requested.session_id;
        ctx.trace_id = requested.trace_id;
        if let Some(priority) = requested.priority {
            ctx = ctx.with_priority(priority.into());
        }
    }
    if let Some(secs) = request.timeout {
        ctx = ctx.with_timeout(std::time::Duration::from_secs(secs));
    }
    // Same bound the coordinator applies to the adapter call itself: an
    // explicit per-request override, or the configured default. Used here
    // to cap how long this handler waits on a result, so a request stuck
    // behind a saturated semaphore can't wedge the connection forever.
    let wait_bound = ctx
        .timeout
        .unwrap_or_else(|| std::time::Duration::from_secs(state.manager.config().execution_timeout_seconds));
    let tool_name = request.tool_name.clone();

    let execution_id = match state
        .manager
        .coordinator()
        .submit(request.tool_name, request.params, ctx)
        .await
    {
        Ok(id) => id,
        Err(e) => {
            warn!(error = %e, "execute request rejected");
            return error_response(&e);
        }
    };

    let coordinator = state.manager.coordinator();
    let poll = async {
        loop {
            if let Some(result) = coordinator.get_result(&execution_id) {
                break result;
            }
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        }
    };
    let result = if let Ok(result) = tokio::time::timeout(wait_bound, poll).await {
        result
    } else {
        warn!(%execution_id, "execute handler wait exceeded bound before a result was available");
        ToolResult::timeout(
            execution_id,
            tool_name,
            i64::try_from(wait_bound.as_millis()).unwrap_or(i64::MAX),
        )
    };

    Json(json!({
        "success": result.is_success(),
        "execution_id": result.execution_id,
        "tool_name": result.tool_name,
        "status": result.status,
        "data": result.data,
        "error": result.error,
        "duration_ms": result.duration_ms,
        "metadata": result.metadata,
    }))
    .into_response()
}

/// GET /tools/executions/{id}/status — lifecycle state (spec §6).
async fn execution_status_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match state.manager.coordinator().get_status(&id) {
        Some(status) => Json(json!({"execution_id": id, "status": status})).into_response(),
        None => error_response(&Error::ToolNotFound(id)),
    }
}

/// GET /tools/executions/{id}/result — completed result (spec §6). Wired
/// to the coordinator's completed-results map, resolving spec §9's Open
/// Question (the source's equivalent route always returned `null`).
async fn execution_result_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match state.manager.coordinator().get_result(&id) {
        Some(result) => Json(result).into_response(),
        None => error_response(&Error::ToolNotFound(id)),
    }
}

/// GET /tools/stats — counters (spec §6).
async fn stats_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let status = state.manager.get_comprehensive_status();
    Json(json!({
        "registry": status.registry_stats,
        "coordinator": status.coordinator_stats,
    }))
}

/// GET /tools/health — 200 if healthy, 503 otherwise (spec §6). Reflects
/// the most recent health-check record (spec §4.5), falling back to
/// whether the manager is running at all if no sweep has happened yet.
async fn health_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let record = state.manager.get_health_status();
    let healthy = record.as_ref().map_or_else(|| state.manager.is_running(), |r| r.healthy);
    let issues = record.map(|r| r.issues).unwrap_or_default();

    let status = if healthy { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (status, Json(json!({"healthy": healthy, "issues": issues}))).into_response()
}
