//! End-to-end exercise of the platform across crate boundaries: manager
//! lifecycle, multi-provider registration with name-conflict renaming,
//! priority-bounded execution, and the HTTP bridge (spec §8).

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use serde_json::json;
use tower::ServiceExt;
use toolmesh::adapters::{AgnoAdapter, DemoAdapter, FastMcpAdapter, HaystackAdapter, LlamaIndexAdapter, OwlAdapter};
use toolmesh::bridge::{AppState, create_router};
use toolmesh::context::{Priority, ToolExecutionContext};
use toolmesh::manager::{RegistryConfig, RegistryManager};

async fn running_manager() -> Arc<RegistryManager> {
    let manager = Arc::new(RegistryManager::new(RegistryConfig::default()));
    manager.registry().register_adapter(Arc::new(DemoAdapter::new())).unwrap();
    manager.registry().register_adapter(Arc::new(AgnoAdapter::new())).unwrap();
    manager.registry().register_adapter(Arc::new(LlamaIndexAdapter::new())).unwrap();
    manager.registry().register_adapter(Arc::new(OwlAdapter::new())).unwrap();
    manager.registry().register_adapter(Arc::new(FastMcpAdapter::new())).unwrap();
    manager.registry().register_adapter(Arc::new(HaystackAdapter::new())).unwrap();
    manager.start().await.unwrap();
    manager
}

#[tokio::test]
async fn full_platform_discovers_and_executes_across_providers() {
    let manager = running_manager().await;

    let stats = manager.registry().stats();
    assert_eq!(stats.frameworks_count, 6);
    // "search" is provided by both llamaindex and owl; the first registered
    // keeps the bare name, the second gets renamed (spec §4.3).
    assert!(manager.registry().get_tool_spec("search").is_some());
    assert!(manager.registry().get_tool_spec("owl_search").is_some());

    let ctx = ToolExecutionContext::new().with_priority(Priority::HIGH);
    let id = manager
        .coordinator()
        .submit("owl_search", json!({"query": "toolmesh"}), ctx)
        .await
        .unwrap();

    let mut result = None;
    for _ in 0..50 {
        if let Some(r) = manager.coordinator().get_result(&id) {
            result = Some(r);
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    let result = result.expect("execution completed");
    assert!(result.is_success());

    let health = manager.run_health_check();
    assert!(health.healthy);

    manager.stop().await;
}

#[tokio::test]
async fn http_bridge_executes_a_tool_end_to_end() {
    let manager = running_manager().await;
    let router: Router = create_router(Arc::new(AppState { manager: Arc::clone(&manager) }));

    let request = axum::http::Request::builder()
        .method("POST")
        .uri("/tools/execute")
        .header("content-type", "application/json")
        .body(axum::body::Body::from(
            json!({"tool_name": "echo", "params": {"msg": "hello"}}).to_string(),
        ))
        .unwrap();

    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), axum::http::StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let payload: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(payload["success"], true);
    assert_eq!(payload["data"]["msg"], "hello");

    manager.stop().await;
}

#[tokio::test]
async fn http_bridge_health_endpoint_reflects_registry_state() {
    let manager = running_manager().await;
    manager.run_health_check();
    let router: Router = create_router(Arc::new(AppState { manager: Arc::clone(&manager) }));

    let request = axum::http::Request::builder()
        .uri("/tools/health")
        .body(axum::body::Body::empty())
        .unwrap();

    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), axum::http::StatusCode::OK);

    manager.stop().await;
}
