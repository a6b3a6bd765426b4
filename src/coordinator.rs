//! Execution Coordinator — bounds concurrency, enforces a real priority
//! order, and tracks in-flight/completed executions (spec §4.4).
//!
//! Grounded in `app/registry/execution_coordinator.py::ExecutionCoordinator`.
//! The source declares a priority queue but never actually sorts it before
//! popping (plain `list.append` + `list.pop(0)`); this implementation fixes
//! that with a real binary heap, per spec §9's REDESIGN FLAG.

use std::cmp::Ordering as CmpOrdering;
use std::collections::BinaryHeap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use chrono::Utc;
use dashmap::DashMap;
use parking_lot::Mutex;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::context::ToolExecutionContext;
use crate::error::Error;
use crate::result::{ToolResult, ToolStatus};
use crate::unified_registry::UnifiedRegistry;

/// One submission waiting for a concurrency slot (spec §4.4).
struct PendingExecution {
    priority: i32,
    // Earlier submissions break priority ties (FIFO within a priority
    // band), matching the source's intent even though it never enforced
    // the ordering.
    sequence: u64,
    tool_name: String,
    params: Value,
    context: ToolExecutionContext,
}

impl PartialEq for PendingExecution {
    fn eq(&self, other: &Self) -> bool {
        self.priority == other.priority && self.sequence == other.sequence
    }
}
impl Eq for PendingExecution {}
impl PartialOrd for PendingExecution {
    fn partial_cmp(&self, other: &Self) -> Option<CmpOrdering> {
        Some(self.cmp(other))
    }
}
impl Ord for PendingExecution {
    fn cmp(&self, other: &Self) -> CmpOrdering {
        // BinaryHeap is a max-heap: higher priority first, and among equal
        // priorities the lower sequence number (submitted earlier) first.
        self.priority
            .cmp(&other.priority)
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

/// Snapshot of coordinator-level counters (spec §4.4, §8 invariants).
#[derive(Debug, Default, Clone, Serialize)]
pub struct CoordinatorStats {
    /// Executions currently occupying a concurrency slot.
    pub running: u64,
    /// Executions waiting in the priority queue.
    pub pending: u64,
    /// Completed executions retained in the results map.
    pub completed: u64,
    /// Concurrency bound.
    pub max_concurrent: u64,
    /// Total executions submitted since `start`.
    pub total_submitted: u64,
}

/// Bounds how many tool calls run at once and tracks their lifecycle,
/// delegating the actual work to a [`UnifiedRegistry`] (spec §4.4).
pub struct ExecutionCoordinator {
    registry: Arc<UnifiedRegistry>,
    semaphore: Arc<Semaphore>,
    max_concurrent: usize,
    cleanup_interval: Duration,
    result_ttl: Duration,
    /// Bound applied to an execution whose context carries no explicit
    /// `timeout` override (spec §4.4, wired from
    /// `RegistryConfig::execution_timeout_seconds`).
    default_timeout: Option<Duration>,
    pending: Mutex<BinaryHeap<PendingExecution>>,
    sequence: AtomicU64,
    /// `execution_id` → (`tool_name`, task handle), so a running execution
    /// can be aborted by id and still produce a properly-named cancelled
    /// `ToolResult`.
    running: Arc<DashMap<String, (String, JoinHandle<()>)>>,
    completed: Arc<DashMap<String, (ToolResult, chrono::DateTime<Utc>)>>,
    running_flag: AtomicBool,
    cleanup_task: Mutex<Option<JoinHandle<()>>>,
    total_submitted: AtomicU64,
}

impl ExecutionCoordinator {
    /// Build a coordinator bounded to `max_concurrent` in-flight executions.
    #[must_use]
    pub fn new(registry: Arc<UnifiedRegistry>, max_concurrent: usize) -> Self {
        Self {
            registry,
            semaphore: Arc::new(Semaphore::new(max_concurrent.max(1))),
            max_concurrent: max_concurrent.max(1),
            cleanup_interval: Duration::from_mins(1),
            result_ttl: Duration::from_hours(1),
            default_timeout: None,
            pending: Mutex::new(BinaryHeap::new()),
            sequence: AtomicU64::new(0),
            running: Arc::new(DashMap::new()),
            completed: Arc::new(DashMap::new()),
            running_flag: AtomicBool::new(false),
            cleanup_task: Mutex::new(None),
            total_submitted: AtomicU64::new(0),
        }
    }

    /// Override how long a completed result is retained before the
    /// background sweep evicts it (default 1 hour).
    #[must_use]
    pub fn with_result_ttl(mut self, ttl: Duration) -> Self {
        self.result_ttl = ttl;
        self
    }

    /// Override the background sweep interval (default 5 minutes).
    #[must_use]
    pub fn with_cleanup_interval(mut self, interval: Duration) -> Self {
        self.cleanup_interval = interval;
        self
    }

    /// Set the default per-execution timeout applied when a submission's
    /// context carries no explicit override (spec §4.4: every tool
    /// execution is bounded by semaphore + per-call timeout).
    #[must_use]
    pub fn with_default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = Some(timeout);
        self
    }

    /// Spawn the background cleanup sweep. Idempotent.
    pub fn start(self: &Arc<Self>) {
        if self.running_flag.swap(true, Ordering::SeqCst) {
            return;
        }
        let this = Arc::clone(self);
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(this.cleanup_interval);
            loop {
                ticker.tick().await;
                this.sweep_expired();
            }
        });
        *self.cleanup_task.lock() = Some(handle);
        info!("execution coordinator started");
    }

    /// Cancel the background cleanup sweep, abort every still-running
    /// execution, and report every running or still-pending request as
    /// cancelled (spec §4.4/§5/§8: "shutdown cancels every in-flight
    /// request"). Cancellation runs every time, even if [`Self::start`] was
    /// never called — only the cleanup-sweep teardown is guarded for
    /// idempotency.
    pub fn stop(&self) {
        if self.running_flag.swap(false, Ordering::SeqCst) && let Some(handle) = self.cleanup_task.lock().take() {
            handle.abort();
        }

        for entry in self.running.iter() {
            entry.value().1.abort();
        }
        let running: Vec<(String, String)> = self
            .running
            .iter()
            .map(|e| (e.key().clone(), e.value().0.clone()))
            .collect();
        self.running.clear();
        for (id, tool_name) in &running {
            self.completed
                .insert(id.clone(), (ToolResult::cancelled(id.clone(), tool_name.clone()), Utc::now()));
        }

        let stranded: Vec<PendingExecution> = std::mem::take(&mut *self.pending.lock()).into_vec();
        for item in stranded {
            let id = item.context.execution_id;
            self.completed
                .insert(id.clone(), (ToolResult::cancelled(id.clone(), item.tool_name), Utc::now()));
        }

        if !running.is_empty() {
            warn!(count = running.len(), "shutdown cancelled in-flight executions");
        }
        info!("execution coordinator stopped");
    }

    fn sweep_expired(&self) {
        let now = Utc::now();
        let ttl = self.result_ttl;
        let mut expired = Vec::new();
        for entry in self.completed.iter() {
            let (_, recorded_at) = entry.value();
            if now.signed_duration_since(*recorded_at).to_std().unwrap_or_default() > ttl {
                expired.push(entry.key().clone());
            }
        }
        for id in expired {
            self.completed.remove(&id);
        }
        debug!(retained = self.completed.len(), "swept expired execution results");
    }

    /// Submit a tool call. Never blocks: the request is queued and a
    /// background task is spawned for every pending request a free
    /// concurrency slot can absorb right now, honoring priority order among
    /// waiters (spec §4.4). Whatever stays queued is drained later, off the
    /// completion of whichever running execution frees its slot next — see
    /// [`Self::drain_ready`]. The returned execution id can be polled via
    /// [`Self::get_result`].
    pub async fn submit(
        self: &Arc<Self>,
        tool_name: impl Into<String>,
        params: Value,
        mut context: ToolExecutionContext,
    ) -> Result<String, Error> {
        if context.timeout.is_none() {
            context.timeout = self.default_timeout;
        }
        let tool_name = tool_name.into();
        let execution_id = context.execution_id.clone();
        let priority = context.priority.0;
        let sequence = self.sequence.fetch_add(1, Ordering::SeqCst);

        self.pending.lock().push(PendingExecution {
            priority,
            sequence,
            tool_name,
            params,
            context,
        });
        self.total_submitted.fetch_add(1, Ordering::SeqCst);

        self.drain_ready();
        Ok(execution_id)
    }

    /// Pop and spawn every pending execution a currently-free concurrency
    /// slot can admit. Called from [`Self::submit`] and, crucially, again
    /// from each spawned execution's completion so a request stranded
    /// behind a saturated semaphore runs as soon as capacity frees — even
    /// if no further `submit` calls ever arrive (spec §4.4, end-to-end
    /// Scenario 4).
    fn drain_ready(self: &Arc<Self>) {
        loop {
            let Ok(permit) = Arc::clone(&self.semaphore).try_acquire_owned() else {
                return;
            };
            let Some(next) = self.pending.lock().pop() else {
                drop(permit);
                return;
            };
            self.spawn_execution(permit, next);
        }
    }

    /// Run one execution to completion on a background task, holding
    /// `permit` for its duration, and re-invoke [`Self::drain_ready`] when
    /// it finishes so the next queued request (if any) gets its turn.
    fn spawn_execution(
        self: &Arc<Self>,
        permit: tokio::sync::OwnedSemaphorePermit,
        next: PendingExecution,
    ) {
        let execution_id = next.context.execution_id.clone();
        let execution_id_for_insert = execution_id.clone();
        let tool_name = next.tool_name.clone();
        let tool_name_for_insert = tool_name.clone();
        let this = Arc::clone(self);
        let registry = Arc::clone(&self.registry);
        let completed = Arc::clone(&self.completed);
        let running = Arc::clone(&self.running);
        let bound = next.context.timeout;

        let handle = tokio::spawn(async move {
            let permit = permit;
            let start = std::time::Instant::now();
            let call = registry.execute_tool(&tool_name, next.params, Some(next.context));

            let result = match bound {
                // Timeout is an outer bound around the adapter call (spec
                // §4.4): the underlying task is not forcibly aborted, its
                // result is just discarded once the deadline passes.
                Some(duration) => match tokio::time::timeout(duration, call).await {
                    Ok(Ok(result)) => result,
                    Ok(Err(e)) => ToolResult::failure(execution_id.clone(), &tool_name, e.to_string(), e.code()),
                    Err(_) => ToolResult::timeout(
                        execution_id.clone(),
                        &tool_name,
                        i64::try_from(start.elapsed().as_millis()).unwrap_or(i64::MAX),
                    ),
                },
                None => match call.await {
                    Ok(result) => result,
                    Err(e) => ToolResult::failure(execution_id.clone(), &tool_name, e.to_string(), e.code()),
                },
            };

            running.remove(&execution_id);
            completed.insert(execution_id, (result, Utc::now()));
            drop(permit);
            this.drain_ready();
        });

        self.running.insert(execution_id_for_insert, (tool_name_for_insert, handle));
    }

    /// Look up a completed execution's result (spec §4.4, and the API
    /// Bridge's `/tools/executions/{id}/result` route).
    #[must_use]
    pub fn get_result(&self, execution_id: &str) -> Option<ToolResult> {
        self.completed.get(execution_id).map(|e| e.value().0.clone())
    }

    /// Current lifecycle status for an execution id, across pending,
    /// running, and completed states.
    #[must_use]
    pub fn get_status(&self, execution_id: &str) -> Option<ToolStatus> {
        if self.running.contains_key(execution_id) {
            return Some(ToolStatus::Running);
        }
        if let Some(entry) = self.completed.get(execution_id) {
            return Some(entry.value().0.status);
        }
        if self
            .pending
            .lock()
            .iter()
            .any(|p| p.context.execution_id == execution_id)
        {
            return Some(ToolStatus::Pending);
        }
        None
    }

    /// Attempt to cancel an execution. A still-pending request is removed
    /// from the queue outright. A running request has its task aborted — an
    /// attempt at interruption, per spec §4.4; whether the adapter honored
    /// cooperative cancellation or ran to completion internally, the
    /// caller-visible status is `cancelled` either way. Returns `true` if
    /// the execution was found in either state.
    pub fn cancel(self: &Arc<Self>, execution_id: &str) -> bool {
        let mut pending = self.pending.lock();
        let items: Vec<PendingExecution> = std::mem::take(&mut *pending).into_sorted_vec();
        let mut cancelled_tool_name = None;
        for item in items {
            if cancelled_tool_name.is_none() && item.context.execution_id == execution_id {
                cancelled_tool_name = Some(item.tool_name);
                continue;
            }
            pending.push(item);
        }
        drop(pending);
        if let Some(tool_name) = cancelled_tool_name {
            self.completed.insert(
                execution_id.to_string(),
                (ToolResult::cancelled(execution_id, tool_name), Utc::now()),
            );
            warn!(%execution_id, "cancelled pending execution");
            return true;
        }

        if let Some((_, (tool_name, handle))) = self.running.remove(execution_id) {
            handle.abort();
            let id = execution_id.to_string();
            let completed = Arc::clone(&self.completed);
            let this = Arc::clone(self);
            tokio::spawn(async move {
                // Wait for the abort to actually land before draining so the
                // freed semaphore permit (dropped with the aborted task) is
                // visible to the next `try_acquire_owned`.
                let _ = handle.await;
                completed.insert(id.clone(), (ToolResult::cancelled(id, tool_name), Utc::now()));
                this.drain_ready();
            });
            warn!(%execution_id, "cancelling running execution");
            return true;
        }

        false
    }

    /// Snapshot of coordinator counters (spec §4.4).
    #[must_use]
    pub fn stats(&self) -> CoordinatorStats {
        CoordinatorStats {
            running: self.running.len() as u64,
            pending: self.pending.lock().len() as u64,
            completed: self.completed.len() as u64,
            max_concurrent: self.max_concurrent as u64,
            total_submitted: self.total_submitted.load(Ordering::SeqCst),
        }
    }
}

impl Drop for ExecutionCoordinator {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::DemoAdapter;

    async fn coordinator() -> Arc<ExecutionCoordinator> {
        let registry = Arc::new(UnifiedRegistry::new());
        registry.register_adapter(Arc::new(DemoAdapter::new())).unwrap();
        registry.initialize().await.unwrap();
        Arc::new(ExecutionCoordinator::new(registry, 2))
    }

    #[tokio::test]
    async fn submit_and_fetch_result() {
        let coordinator = coordinator().await;
        let id = coordinator
            .submit("echo", serde_json::json!({"msg": "hi"}), ToolExecutionContext::new())
            .await
            .unwrap();

        let mut result = None;
        for _ in 0..50 {
            if let Some(r) = coordinator.get_result(&id) {
                result = Some(r);
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        let result = result.expect("execution completed");
        assert!(result.is_success());
    }

    #[tokio::test]
    async fn concurrency_is_bounded() {
        let coordinator = coordinator().await;
        for _ in 0..5 {
            coordinator
                .submit("echo", serde_json::json!({"msg": "x"}), ToolExecutionContext::new())
                .await
                .unwrap();
        }
        let stats = coordinator.stats();
        assert!(stats.running <= stats.max_concurrent);
    }

    #[tokio::test]
    async fn higher_priority_is_recorded() {
        let coordinator = coordinator().await;
        let high_ctx = ToolExecutionContext::new().with_priority(crate::context::Priority::HIGH);
        let id = coordinator
            .submit("echo", serde_json::json!({"msg": "urgent"}), high_ctx)
            .await
            .unwrap();
        assert!(coordinator.get_status(&id).is_some());
    }

    #[tokio::test]
    async fn timeout_shorter_than_natural_duration_produces_timeout_status() {
        let coordinator = coordinator().await;
        let ctx = ToolExecutionContext::new().with_timeout(Duration::from_millis(50));
        let id = coordinator
            .submit("sleep", serde_json::json!({"millis": 500}), ctx)
            .await
            .unwrap();

        let mut result = None;
        for _ in 0..50 {
            if let Some(r) = coordinator.get_result(&id) {
                result = Some(r);
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        let result = result.expect("execution completed");
        assert_eq!(result.status, ToolStatus::Timeout);
        assert_eq!(result.error_code.as_deref(), Some("timeout"));
    }

    /// Spec §4.4 / end-to-end Scenario 4: a request queued behind a
    /// saturated semaphore must run once capacity frees, even with no
    /// further `submit` calls to re-trigger draining.
    #[tokio::test]
    async fn queued_request_drains_without_a_further_submit() {
        let coordinator = coordinator().await; // max_concurrent = 2
        let first = coordinator
            .submit("sleep", serde_json::json!({"millis": 80}), ToolExecutionContext::new())
            .await
            .unwrap();
        let second = coordinator
            .submit("sleep", serde_json::json!({"millis": 80}), ToolExecutionContext::new())
            .await
            .unwrap();
        let third = coordinator
            .submit("echo", serde_json::json!({"msg": "queued"}), ToolExecutionContext::new())
            .await
            .unwrap();

        let stats = coordinator.stats();
        assert_eq!(stats.running, 2);
        assert_eq!(stats.pending, 1);
        assert_eq!(coordinator.get_status(&third), Some(ToolStatus::Pending));

        let mut third_result = None;
        for _ in 0..50 {
            if let Some(r) = coordinator.get_result(&third) {
                third_result = Some(r);
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        let third_result = third_result.expect("queued request eventually ran without a further submit");
        assert!(third_result.is_success());
        assert_eq!(coordinator.stats().pending, 0);

        for id in [&first, &second] {
            for _ in 0..50 {
                if coordinator.get_result(id).is_some() {
                    break;
                }
                tokio::time::sleep(Duration::from_millis(20)).await;
            }
        }
    }

    #[tokio::test]
    async fn cancel_aborts_a_running_execution() {
        let coordinator = coordinator().await;
        let id = coordinator
            .submit("sleep", serde_json::json!({"millis": 5000}), ToolExecutionContext::new())
            .await
            .unwrap();
        assert_eq!(coordinator.get_status(&id), Some(ToolStatus::Running));

        assert!(coordinator.cancel(&id));

        let mut result = None;
        for _ in 0..50 {
            if let Some(r) = coordinator.get_result(&id) {
                result = Some(r);
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        let result = result.expect("cancelled execution recorded a result");
        assert_eq!(result.status, ToolStatus::Cancelled);
    }

    #[tokio::test]
    async fn stop_cancels_every_in_flight_execution() {
        let coordinator = coordinator().await;
        let running = coordinator
            .submit("sleep", serde_json::json!({"millis": 5000}), ToolExecutionContext::new())
            .await
            .unwrap();
        let pending = coordinator
            .submit("sleep", serde_json::json!({"millis": 5000}), ToolExecutionContext::new())
            .await
            .unwrap();
        let queued = coordinator
            .submit("echo", serde_json::json!({"msg": "stranded"}), ToolExecutionContext::new())
            .await
            .unwrap();

        coordinator.stop();

        for id in [&running, &pending, &queued] {
            let result = coordinator.get_result(id).expect("shutdown recorded a result for every request");
            assert_eq!(result.status, ToolStatus::Cancelled);
        }
    }
}
