//! Framework Adapter protocol: the capability contract every tool provider
//! implements to plug into the registry.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use futures::future::join_all;
use serde_json::Value;

use crate::context::ToolExecutionContext;
use crate::model::{Capability, ToolCategory, ToolSpec};
use crate::result::ToolResult;

/// Lifecycle state of an adapter: uninitialized → initializing → ready →
/// (busy|error) → shutdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdapterState {
    /// Constructed, `initialize` not yet called.
    Uninitialized,
    /// `initialize` in progress.
    Initializing,
    /// Ready to accept `execute_tool` calls.
    Ready,
    /// Ready, but momentarily saturated.
    Busy,
    /// Initialization failed or a fatal error occurred.
    Error,
    /// `shutdown` has completed.
    Shutdown,
}

/// Static descriptive information about a framework adapter, supplemental
/// to the bare `provider_name` + `supported_categories`.
#[derive(Debug, Clone)]
pub struct FrameworkInfo {
    /// Human-readable framework name.
    pub name: String,
    /// Framework version.
    pub version: String,
    /// Short description.
    pub description: String,
    /// Capability tags this framework advertises.
    pub capabilities: Vec<Capability>,
}

/// A pluggable source of AI-agent tools, exposing a single framework's
/// tools under one uniform contract.
///
/// # Init invariant
///
/// An adapter that declares a tool in [`Adapter::discover_tools`] output
/// must be able to execute that tool (or return a typed failed
/// [`ToolResult`]) at any time until `shutdown`.
#[async_trait]
pub trait Adapter: Send + Sync + 'static {
    /// Stable identifier for this adapter instance (e.g. `agno`).
    fn provider_name(&self) -> &str;

    /// Tool categories this adapter declares support for.
    fn supported_categories(&self) -> &[ToolCategory];

    /// Descriptive framework info.
    fn framework_info(&self) -> FrameworkInfo;

    /// Current lifecycle state.
    fn state(&self) -> AdapterState;

    /// Enter `ready`, or fail with a typed error.
    ///
    /// Idempotent for repeated success calls within one lifecycle.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::InitError`] on fatal startup failure.
    async fn initialize(&self) -> crate::Result<()>;

    /// Release any acquired resources and transition to `shutdown`.
    /// Subsequent calls are no-ops.
    async fn shutdown(&self);

    /// Enumerate this adapter's currently-registered tools, optionally
    /// narrowed by category. Pure — no state change.
    async fn discover_tools(&self, categories: Option<&[ToolCategory]>) -> Vec<ToolSpec>;

    /// Look up a single tool spec by its adapter-local name.
    async fn get_tool_spec(&self, name: &str) -> Option<ToolSpec>;

    /// Best-effort required-key validation against the tool's
    /// `input_schema.required`. Type-level validation is best-effort and
    /// may be overridden by adapters that want more.
    async fn validate_params(&self, name: &str, params: &Value) -> bool {
        let Some(spec) = self.get_tool_spec(name).await else {
            return false;
        };
        let required = spec.required_params();
        let Some(obj) = params.as_object() else {
            return required.is_empty();
        };
        required.iter().all(|key| obj.contains_key(key))
    }

    /// Execute one tool call. Must catch all internal failures and return
    /// a failed [`ToolResult`] rather than propagate.
    async fn execute_tool(
        &self,
        name: &str,
        params: Value,
        context: &ToolExecutionContext,
    ) -> ToolResult;

    /// Concurrent invocation of multiple `(name, params)` pairs using this
    /// adapter's single-tool path. Failures are per-item, never aggregate:
    /// each task already yields a `ToolResult`, so nothing ever surfaces as
    /// a raw panic or error out of the batch.
    async fn batch_execute(
        &self,
        requests: Vec<(String, Value)>,
        context: &ToolExecutionContext,
    ) -> Vec<ToolResult> {
        let futures = requests
            .into_iter()
            .map(|(name, params)| async move { self.execute_tool(&name, params, context).await });
        join_all(futures).await
    }
}

/// Common bookkeeping shared by every illustrative adapter: a tool cache,
/// an initialized flag, and success/error result helpers — composition
/// instead of inheritance, so each adapter only implements discovery and
/// per-tool execution.
pub struct BaseAdapter {
    tools: DashMap<String, ToolSpec>,
    initialized: AtomicBool,
}

impl BaseAdapter {
    /// Create an empty, uninitialized cache.
    #[must_use]
    pub fn new() -> Self {
        Self {
            tools: DashMap::new(),
            initialized: AtomicBool::new(false),
        }
    }

    /// Register a tool spec into the local cache.
    pub fn insert(&self, spec: ToolSpec) {
        self.tools.insert(spec.name.clone(), spec);
    }

    /// Remove a tool spec from the local cache.
    pub fn remove(&self, name: &str) -> bool {
        self.tools.remove(name).is_some()
    }

    /// All cached tool specs, optionally narrowed by category.
    #[must_use]
    pub fn discover(&self, categories: Option<&[ToolCategory]>) -> Vec<ToolSpec> {
        self.tools
            .iter()
            .map(|entry| entry.value().clone())
            .filter(|spec| categories.is_none_or(|cats| cats.contains(&spec.category)))
            .collect()
    }

    /// Look up one cached spec.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<ToolSpec> {
        self.tools.get(name).map(|entry| entry.value().clone())
    }

    /// Mark the adapter as initialized.
    pub fn mark_initialized(&self) {
        self.initialized.store(true, Ordering::SeqCst);
    }

    /// Mark the adapter as shut down.
    pub fn mark_shutdown(&self) {
        self.initialized.store(false, Ordering::SeqCst);
    }

    /// Whether `initialize` has completed successfully.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }
}

impl Default for BaseAdapter {
    fn default() -> Self {
        Self::new()
    }
}
