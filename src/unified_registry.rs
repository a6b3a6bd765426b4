//! Unified Registry — the single source of truth for "what tools exist"
//! and "which adapter executes this tool" (spec §4.3).
//!
//! Grounded in `app/registry/unified_registry.py::UnifiedToolRegistry`.
//! Holds no execution state (that's [`crate::coordinator::ExecutionCoordinator`]'s
//! job) and no persistent state (recoverable by re-scanning adapters).

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use dashmap::DashMap;
use parking_lot::Mutex;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::adapter::Adapter;
use crate::context::ToolExecutionContext;
use crate::error::Error;
use crate::model::{ToolCategory, ToolSpec};
use crate::result::{ToolResult, ToolStatus};

/// Monotonic counters tracked by the registry (spec §3: `stats`).
#[derive(Debug, Default, Clone, Serialize)]
pub struct RegistryStats {
    /// Total tools across all providers, after conflict resolution.
    pub total_tools: u64,
    /// Total `execute_tool` calls dispatched.
    pub total_executions: u64,
    /// Executions whose result was a success.
    pub successful_executions: u64,
    /// Executions whose result was a failure.
    pub failed_executions: u64,
    /// Number of registered adapters.
    pub frameworks_count: u64,
    /// Tool counts per provider.
    pub tools_by_provider: HashMap<String, u64>,
    /// Tool counts per category.
    pub tools_by_category: HashMap<ToolCategory, u64>,
    /// Provider names currently registered.
    pub available_providers: Vec<String>,
    /// Whether `initialize` has completed.
    pub initialized: bool,
}

/// Optional narrowing filters for [`UnifiedRegistry::discover_tools`].
#[derive(Debug, Default, Clone)]
pub struct DiscoverFilter {
    /// Restrict to these categories (AND-composed with `providers`).
    pub categories: Option<Vec<ToolCategory>>,
    /// Restrict to these providers (AND-composed with `categories`).
    pub providers: Option<Vec<String>>,
    /// Restrict to tools whose name contains this substring.
    pub name_contains: Option<String>,
}

/// The in-memory, multi-index tool catalog (spec §3, §4.3).
pub struct UnifiedRegistry {
    adapters: DashMap<String, Arc<dyn Adapter>>,
    tools_by_provider: DashMap<String, DashMap<String, ToolSpec>>,
    tools_by_category: DashMap<ToolCategory, DashMap<String, ToolSpec>>,
    global_tools: DashMap<String, ToolSpec>,
    execution_status: DashMap<String, ToolStatus>,
    initialized: AtomicBool,
    total_executions: AtomicU64,
    successful_executions: AtomicU64,
    failed_executions: AtomicU64,
    // Serializes `register_adapter` against itself — a quick, non-suspending
    // critical section, so a plain blocking mutex is appropriate.
    registration_lock: Mutex<()>,
    // Serializes `initialize`/`shutdown` against each other. These sections
    // suspend across adapter calls, so this is a tokio mutex rather than a
    // blocking one (holding a blocking lock across an await can stall an
    // executor thread).
    lifecycle: tokio::sync::Mutex<()>,
    // Registration order, since `DashMap` iteration order is arbitrary and
    // spec §5 wants adapter initialization order ("serially ... to make
    // failures easy to attribute") to be deterministic and reproducible.
    registration_order: Mutex<Vec<String>>,
    // Maps a conflict-renamed global name (`<provider>_<name>`) back to the
    // name the owning adapter registered it under, since the adapter's own
    // tool cache is never renamed (spec §4.3).
    renamed_to_local: DashMap<String, String>,
}

impl UnifiedRegistry {
    /// Construct an empty, uninitialized registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            adapters: DashMap::new(),
            tools_by_provider: DashMap::new(),
            tools_by_category: DashMap::new(),
            global_tools: DashMap::new(),
            execution_status: DashMap::new(),
            initialized: AtomicBool::new(false),
            total_executions: AtomicU64::new(0),
            successful_executions: AtomicU64::new(0),
            failed_executions: AtomicU64::new(0),
            registration_lock: Mutex::new(()),
            lifecycle: tokio::sync::Mutex::new(()),
            registration_order: Mutex::new(Vec::new()),
            renamed_to_local: DashMap::new(),
        }
    }

    /// Register an adapter under a unique provider name. Must be called
    /// before [`Self::initialize`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateAdapter`] if the name is already taken.
    pub fn register_adapter(&self, adapter: Arc<dyn Adapter>) -> Result<(), Error> {
        let _guard = self.registration_lock.lock();
        let name = adapter.provider_name().to_string();
        if self.adapters.contains_key(&name) {
            return Err(Error::DuplicateAdapter(name));
        }
        self.adapters.insert(name.clone(), adapter);
        self.tools_by_provider.insert(name.clone(), DashMap::new());
        self.registration_order.lock().push(name.clone());
        info!(provider = %name, "registered adapter");
        Ok(())
    }

    /// Initialize every registered adapter (serially — spec §5, so a
    /// failure is easy to attribute to one provider) and discover their
    /// tools into the catalog indices.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InitError`] if any adapter fails to initialize.
    /// Tool *discovery* failures after a successful adapter init are
    /// logged and skipped, matching `_discover_and_register_all_tools`'s
    /// `continue`.
    pub async fn initialize(&self) -> Result<(), Error> {
        let _guard = self.lifecycle.lock().await;

        // Walk adapters in registration order (not `DashMap` iteration
        // order, which is arbitrary) so initialization is reproducible.
        let providers: Vec<(String, Arc<dyn Adapter>)> = self
            .registration_order
            .lock()
            .iter()
            .filter_map(|name| self.adapters.get(name).map(|entry| (name.clone(), Arc::clone(entry.value()))))
            .collect();

        for (name, adapter) in &providers {
            adapter.initialize().await.map_err(|e| {
                error!(provider = %name, error = %e, "adapter initialization failed");
                Error::InitError(format!("adapter {name} failed to initialize: {e}"))
            })?;
            debug!(provider = %name, "adapter initialized");
        }

        for (name, adapter) in &providers {
            let tools = adapter.discover_tools(None).await;
            let mut registered = 0usize;
            for tool in tools {
                if let Err(e) = self.register_tool_internal(tool, name) {
                    warn!(provider = %name, error = %e, "failed to register discovered tool");
                    continue;
                }
                registered += 1;
            }
            info!(provider = %name, count = registered, "discovered tools");
        }

        self.initialized.store(true, Ordering::SeqCst);
        info!("unified registry initialized");
        Ok(())
    }

    /// Release every adapter and clear all indices.
    pub async fn shutdown(&self) {
        let _guard = self.lifecycle.lock().await;

        let adapters: Vec<Arc<dyn Adapter>> = self
            .adapters
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();
        for adapter in adapters {
            adapter.shutdown().await;
        }

        self.adapters.clear();
        self.registration_order.lock().clear();
        self.renamed_to_local.clear();
        self.tools_by_provider.clear();
        self.tools_by_category.clear();
        self.global_tools.clear();
        self.execution_status.clear();
        self.total_executions.store(0, Ordering::SeqCst);
        self.successful_executions.store(0, Ordering::SeqCst);
        self.failed_executions.store(0, Ordering::SeqCst);
        self.initialized.store(false, Ordering::SeqCst);
        info!("unified registry shutdown");
    }

    /// `true` once `initialize` has completed.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }

    fn register_tool_internal(&self, mut spec: ToolSpec, provider_name: &str) -> Result<(), Error> {
        crate::model::validate(&spec)?;

        if let Some(existing) = self.global_tools.get(&spec.name) {
            if existing.provider == provider_name {
                // Same provider re-registering a name it already owns:
                // resolves spec §9's Open Question as `duplicate_tool`
                // rather than the source's silent same-provider collision.
                return Err(Error::DuplicateTool {
                    tool: spec.name.clone(),
                    provider: provider_name.to_string(),
                });
            }
            // Conflict rename: the registry-level copy gets
            // `<provider>_<name>`; the adapter's own cache (and thus
            // subsequent `execute_tool` delegation) keeps the original
            // name, exactly as spec §4.3 describes.
            let local_name = spec.name.clone();
            spec.name = format!("{provider_name}_{local_name}");
            self.renamed_to_local.insert(spec.name.clone(), local_name);
        }

        let category = spec.category;
        self.tools_by_provider
            .entry(provider_name.to_string())
            .or_default()
            .insert(spec.name.clone(), spec.clone());
        self.tools_by_category
            .entry(category)
            .or_default()
            .insert(spec.name.clone(), spec.clone());
        self.global_tools.insert(spec.name.clone(), spec);

        Ok(())
    }

    /// Enumerate tools, AND-composing the optional category/provider/name
    /// filters (spec §4.3).
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotInitialized`] before `initialize` completes.
    pub fn discover_tools(&self, filter: &DiscoverFilter) -> Result<Vec<ToolSpec>, Error> {
        if !self.is_initialized() {
            return Err(Error::NotInitialized);
        }

        let mut tools: Vec<ToolSpec> = self
            .global_tools
            .iter()
            .map(|entry| entry.value().clone())
            .collect();

        if let Some(categories) = &filter.categories {
            tools.retain(|t| categories.contains(&t.category));
        }
        if let Some(providers) = &filter.providers {
            tools.retain(|t| providers.contains(&t.provider));
        }
        if let Some(needle) = &filter.name_contains {
            tools.retain(|t| t.name.contains(needle.as_str()));
        }

        Ok(tools)
    }

    /// Look up a single tool spec by its (possibly conflict-renamed) global
    /// name.
    #[must_use]
    pub fn get_tool_spec(&self, name: &str) -> Option<ToolSpec> {
        self.global_tools.get(name).map(|entry| entry.value().clone())
    }

    /// Execute dispatch (spec §4.3): look up spec → look up adapter →
    /// delegate → update stats/status. Never returns `Err` for
    /// tool/adapter-not-found — those become a failed [`ToolResult`], per
    /// spec §7; only [`Error::NotInitialized`] is raised structurally.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotInitialized`] before `initialize` completes.
    pub async fn execute_tool(
        &self,
        tool_name: &str,
        params: Value,
        context: Option<ToolExecutionContext>,
    ) -> Result<ToolResult, Error> {
        if !self.is_initialized() {
            return Err(Error::NotInitialized);
        }

        let context = context.unwrap_or_default();
        let execution_id = context.execution_id.clone();

        let Some(spec) = self.get_tool_spec(tool_name) else {
            return Ok(self.record_and_return(ToolResult::failure(
                execution_id,
                tool_name,
                format!("tool {tool_name} not found"),
                "tool_not_found",
            )));
        };

        let Some(adapter) = self.adapters.get(&spec.provider).map(|e| Arc::clone(e.value())) else {
            return Ok(self.record_and_return(ToolResult::failure(
                execution_id,
                tool_name,
                format!("adapter for provider {} not found", spec.provider),
                "adapter_not_found",
            )));
        };

        self.execution_status.insert(execution_id.clone(), ToolStatus::Running);

        // The adapter-local name is the one it registered under, before any
        // conflict-rename. `renamed_to_local` records that mapping for
        // renamed tools; unrenamed tools dispatch under their own name.
        let local_name = self.renamed_to_local.get(tool_name).map(|e| e.value().clone());
        let adapter_local_name = local_name.as_deref().unwrap_or(tool_name);

        let result = adapter.execute_tool(adapter_local_name, params, &context).await;

        self.total_executions.fetch_add(1, Ordering::SeqCst);
        if result.is_success() {
            self.successful_executions.fetch_add(1, Ordering::SeqCst);
        } else {
            self.failed_executions.fetch_add(1, Ordering::SeqCst);
        }
        self.execution_status.insert(execution_id, result.status);

        Ok(result)
    }

    fn record_and_return(&self, result: ToolResult) -> ToolResult {
        self.execution_status
            .insert(result.execution_id.clone(), result.status);
        self.total_executions.fetch_add(1, Ordering::SeqCst);
        self.failed_executions.fetch_add(1, Ordering::SeqCst);
        result
    }

    /// The execution status last recorded for an execution id.
    #[must_use]
    pub fn get_execution_status(&self, execution_id: &str) -> Option<ToolStatus> {
        self.execution_status.get(execution_id).map(|e| *e.value())
    }

    /// Snapshot of the registry's counters and per-index sizes (spec §4.3,
    /// §8 universal invariants).
    #[must_use]
    pub fn stats(&self) -> RegistryStats {
        RegistryStats {
            total_tools: self.global_tools.len() as u64,
            total_executions: self.total_executions.load(Ordering::SeqCst),
            successful_executions: self.successful_executions.load(Ordering::SeqCst),
            failed_executions: self.failed_executions.load(Ordering::SeqCst),
            frameworks_count: self.adapters.len() as u64,
            tools_by_provider: self
                .tools_by_provider
                .iter()
                .map(|e| (e.key().clone(), e.value().len() as u64))
                .collect(),
            tools_by_category: self
                .tools_by_category
                .iter()
                .map(|e| (*e.key(), e.value().len() as u64))
                .collect(),
            available_providers: self.adapters.iter().map(|e| e.key().clone()).collect(),
            initialized: self.is_initialized(),
        }
    }
}

impl Default for UnifiedRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::DemoAdapter;

    async fn demo_registry() -> UnifiedRegistry {
        let registry = UnifiedRegistry::new();
        registry.register_adapter(Arc::new(DemoAdapter::new())).unwrap();
        registry.initialize().await.unwrap();
        registry
    }

    #[tokio::test]
    async fn scenario_basic_discover_and_execute() {
        let registry = demo_registry().await;

        let filter = DiscoverFilter {
            name_contains: Some("echo".to_string()),
            ..DiscoverFilter::default()
        };
        let tools = registry.discover_tools(&filter).unwrap();
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0].name, "echo");

        let result = registry
            .execute_tool("echo", serde_json::json!({"msg": "hi"}), None)
            .await
            .unwrap();
        assert_eq!(result.status, ToolStatus::Completed);
        assert!(result.data.is_some());
        assert!(result.duration_ms.unwrap_or(0) >= 0);
    }

    #[tokio::test]
    async fn scenario_name_conflict_renaming() {
        let registry = UnifiedRegistry::new();
        registry.register_adapter(Arc::new(AdapterA::new())).unwrap();
        registry.register_adapter(Arc::new(AdapterB::new())).unwrap();
        registry.initialize().await.unwrap();

        assert!(registry.get_tool_spec("search").is_some());
        assert_eq!(registry.get_tool_spec("search").unwrap().provider, "a");

        let renamed = registry.get_tool_spec("b_search").unwrap();
        assert_eq!(renamed.provider, "b");

        let r1 = registry
            .execute_tool("search", serde_json::json!({}), None)
            .await
            .unwrap();
        assert!(r1.is_success());
        let r2 = registry
            .execute_tool("b_search", serde_json::json!({}), None)
            .await
            .unwrap();
        assert!(r2.is_success());
        // AdapterB echoes back whatever name it was called with; dispatch
        // must strip the rename and pass its own "search", not "b_search".
        assert_eq!(r2.tool_name, "search");
    }

    #[tokio::test]
    async fn executing_unknown_tool_is_failed_not_error() {
        let registry = demo_registry().await;
        let result = registry
            .execute_tool("nope", serde_json::json!({}), None)
            .await
            .unwrap();
        assert!(result.is_failed());
        assert_eq!(result.error_code.as_deref(), Some("tool_not_found"));
        assert!(result.data.is_none());
    }

    #[tokio::test]
    async fn discover_before_initialize_errors() {
        let registry = UnifiedRegistry::new();
        let err = registry.discover_tools(&DiscoverFilter::default()).unwrap_err();
        assert_eq!(err.code(), "not_initialized");
    }

    #[tokio::test]
    async fn duplicate_adapter_rejected() {
        let registry = UnifiedRegistry::new();
        registry.register_adapter(Arc::new(DemoAdapter::new())).unwrap();
        let err = registry.register_adapter(Arc::new(DemoAdapter::new())).unwrap_err();
        assert_eq!(err.code(), "duplicate_adapter");
    }

    #[tokio::test]
    async fn reinitialize_after_shutdown_is_idempotent() {
        let registry = demo_registry().await;
        let before = registry.stats().total_tools;
        registry.shutdown().await;
        registry.register_adapter(Arc::new(DemoAdapter::new())).unwrap();
        registry.initialize().await.unwrap();
        assert_eq!(registry.stats().total_tools, before);
    }

    // --- test-only adapters for the conflict-rename scenario ---

    use async_trait::async_trait;
    use crate::adapter::{Adapter, AdapterState, FrameworkInfo};
    use crate::model::ToolCategory;

    struct AdapterA(crate::adapter::BaseAdapter);
    impl AdapterA {
        fn new() -> Self {
            Self(crate::adapter::BaseAdapter::new())
        }
    }
    #[async_trait]
    impl Adapter for AdapterA {
        fn provider_name(&self) -> &str {
            "a"
        }
        fn supported_categories(&self) -> &[ToolCategory] {
            &[ToolCategory::Search]
        }
        fn framework_info(&self) -> FrameworkInfo {
            FrameworkInfo {
                name: "a".into(),
                version: "1.0".into(),
                description: String::new(),
                capabilities: vec![],
            }
        }
        fn state(&self) -> AdapterState {
            AdapterState::Ready
        }
        async fn initialize(&self) -> crate::Result<()> {
            self.0.insert(ToolSpec::new(
                "search",
                "1.0",
                "a's search",
                ToolCategory::Search,
                "a",
                serde_json::json!({}),
                serde_json::json!({}),
            ));
            Ok(())
        }
        async fn shutdown(&self) {}
        async fn discover_tools(&self, categories: Option<&[ToolCategory]>) -> Vec<ToolSpec> {
            self.0.discover(categories)
        }
        async fn get_tool_spec(&self, name: &str) -> Option<ToolSpec> {
            self.0.get(name)
        }
        async fn execute_tool(
            &self,
            name: &str,
            _params: Value,
            context: &ToolExecutionContext,
        ) -> ToolResult {
            ToolResult::success(context.execution_id.clone(), name, serde_json::json!({"from": "a"}))
        }
    }

    struct AdapterB(crate::adapter::BaseAdapter);
    impl AdapterB {
        fn new() -> Self {
            Self(crate::adapter::BaseAdapter::new())
        }
    }
    #[async_trait]
    impl Adapter for AdapterB {
        fn provider_name(&self) -> &str {
            "b"
        }
        fn supported_categories(&self) -> &[ToolCategory] {
            &[ToolCategory::Search]
        }
        fn framework_info(&self) -> FrameworkInfo {
            FrameworkInfo {
                name: "b".into(),
                version: "1.0".into(),
                description: String::new(),
                capabilities: vec![],
            }
        }
        fn state(&self) -> AdapterState {
            AdapterState::Ready
        }
        async fn initialize(&self) -> crate::Result<()> {
            self.0.insert(ToolSpec::new(
                "search",
                "1.0",
                "b's search",
                ToolCategory::Search,
                "b",
                serde_json::json!({}),
                serde_json::json!({}),
            ));
            Ok(())
        }
        async fn shutdown(&self) {}
        async fn discover_tools(&self, categories: Option<&[ToolCategory]>) -> Vec<ToolSpec> {
            self.0.discover(categories)
        }
        async fn get_tool_spec(&self, name: &str) -> Option<ToolSpec> {
            self.0.get(name)
        }
        async fn execute_tool(
            &self,
            name: &str,
            _params: Value,
            context: &ToolExecutionContext,
        ) -> ToolResult {
            ToolResult::success(context.execution_id.clone(), name, serde_json::json!({"from": "b"}))
        }
    }
}
