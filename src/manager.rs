//! Registry Manager — top-level lifecycle and configuration (spec §4.5).
//!
//! Grounded in `app/registry/registry_manager.py::RegistryManager`; config
//! loading follows the teacher's `config::Config::load` figment pattern.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::coordinator::{CoordinatorStats, ExecutionCoordinator};
use crate::error::Error;
use crate::unified_registry::{RegistryStats, UnifiedRegistry};

/// Overall lifecycle state of the manager (spec §4.5).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistryStatus {
    /// Constructed, `start` not yet called.
    Stopped,
    /// `start` in progress.
    Starting,
    /// Running and accepting requests.
    Running,
    /// `stop` in progress.
    Stopping,
    /// A fatal error occurred during startup.
    Error,
}

/// Declarative configuration for a [`RegistryManager`] (spec §6), loadable
/// from YAML plus `REGISTRY_`-prefixed environment variables. Field names
/// and defaults follow spec §6's recognized option set exactly.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Whether the manager initializes the registry as soon as it's built,
    /// rather than waiting for an explicit `start` call from the bridge.
    pub auto_initialize: bool,
    /// Whether to run the periodic health-check loop (spec §4.5).
    pub enable_health_check: bool,
    /// Interval between health checks (seconds).
    pub health_check_interval_seconds: u64,
    /// Maximum number of tool executions running concurrently (spec §4.4
    /// default: 50).
    pub max_concurrent_executions: usize,
    /// Default wall-clock bound applied to a tool execution when its
    /// context carries no explicit `timeout` override (spec §4.4).
    pub execution_timeout_seconds: u64,
    /// Deadline for each adapter's `initialize` call (spec §4.5 default:
    /// 30s).
    pub adapter_initialization_timeout_seconds: u64,
    /// Whether adapters may cache discovered `ToolSpec`s between
    /// `discover_tools` calls instead of re-discovering every time.
    pub enable_tool_cache: bool,
    /// How long a cached tool spec is considered fresh (seconds).
    pub cache_ttl_seconds: u64,
    /// Minimum `tracing` level for the process (`trace`/`debug`/`info`/
    /// `warn`/`error`).
    pub log_level: String,
    /// Whether each execution logs a structured start/finish event.
    pub enable_execution_logging: bool,
    /// Whether to run the periodic metrics loop (spec §4.5).
    pub enable_metrics: bool,
    /// Interval between metrics snapshots (seconds).
    pub metrics_collection_interval_seconds: u64,
    /// How long a completed execution result is retained (seconds, spec
    /// §4.4 default: 1 hour).
    pub result_ttl_seconds: u64,
    /// Interval between the coordinator's background cleanup sweeps
    /// (seconds, spec §4.4 default: 5 minutes).
    pub cleanup_interval_seconds: u64,
    /// How many past metrics snapshots to retain (spec §4.5: "a ring of
    /// the last 100 samples").
    pub metrics_history_size: usize,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            auto_initialize: true,
            enable_health_check: true,
            health_check_interval_seconds: 60,
            max_concurrent_executions: 50,
            execution_timeout_seconds: 300,
            adapter_initialization_timeout_seconds: 30,
            enable_tool_cache: true,
            cache_ttl_seconds: 300,
            log_level: "info".to_string(),
            enable_execution_logging: true,
            enable_metrics: true,
            metrics_collection_interval_seconds: 30,
            result_ttl_seconds: 3600,
            cleanup_interval_seconds: 300,
            metrics_history_size: 100,
        }
    }
}

impl RegistryConfig {
    /// Load configuration from an optional YAML file, overlaid by
    /// `REGISTRY_`-prefixed environment variables, matching the teacher's
    /// `Config::load`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the file doesn't exist or fails to
    /// parse.
    pub fn load(path: Option<&Path>) -> Result<Self, Error> {
        let mut figment = Figment::new();

        if let Some(p) = path {
            if !p.exists() {
                return Err(Error::Config(format!("config file not found: {}", p.display())));
            }
            figment = figment.merge(Yaml::file(p));
        }

        figment = figment.merge(Env::prefixed("REGISTRY_").split("__"));

        figment.extract().map_err(|e| Error::Config(e.to_string()))
    }
}

/// Result of one health-check sweep (spec §4.5).
#[derive(Debug, Clone, Serialize)]
pub struct HealthRecord {
    /// `false` if any issue was found, even though the registry may still
    /// be usable (degraded, not fatal — spec §4.5).
    pub healthy: bool,
    /// When this record was produced.
    pub last_check: DateTime<Utc>,
    /// Human-readable issues found, empty when fully healthy.
    pub issues: Vec<String>,
}

/// A point-in-time metrics snapshot retained in the manager's history
/// (spec §4.5: `get_metrics_history`).
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    /// Seconds since the manager's `start` call.
    pub uptime_secs: u64,
    /// Registry catalog counters at capture time.
    pub registry_stats: RegistryStats,
    /// Coordinator concurrency counters at capture time.
    pub coordinator_stats: CoordinatorStats,
}

/// Comprehensive status payload (spec §4.5: `get_comprehensive_status`,
/// and the API Bridge's `/health` route).
#[derive(Debug, Clone, Serialize)]
pub struct ComprehensiveStatus {
    /// Current lifecycle status.
    pub status: RegistryStatus,
    /// Seconds since `start`, or 0 if not running.
    pub uptime_secs: u64,
    /// Registry catalog counters.
    pub registry_stats: RegistryStats,
    /// Coordinator concurrency counters.
    pub coordinator_stats: CoordinatorStats,
    /// The most recently captured metrics snapshot, if any.
    pub latest_metrics: Option<MetricsSnapshot>,
    /// The most recent health-check record, if the loop has run at least
    /// once.
    pub health: Option<HealthRecord>,
    /// The effective configuration in force.
    pub config: RegistryConfigDigest,
}

/// Redacted view of [`RegistryConfig`] safe to expose over the bridge
/// (today every field is already non-secret, but this keeps the shape
/// stable if sensitive fields are added later).
#[derive(Debug, Clone, Serialize)]
pub struct RegistryConfigDigest {
    /// See [`RegistryConfig::max_concurrent_executions`].
    pub max_concurrent_executions: usize,
    /// See [`RegistryConfig::execution_timeout_seconds`].
    pub execution_timeout_seconds: u64,
    /// See [`RegistryConfig::result_ttl_seconds`].
    pub result_ttl_seconds: u64,
}

impl From<&RegistryConfig> for RegistryConfigDigest {
    fn from(config: &RegistryConfig) -> Self {
        Self {
            max_concurrent_executions: config.max_concurrent_executions,
            execution_timeout_seconds: config.execution_timeout_seconds,
            result_ttl_seconds: config.result_ttl_seconds,
        }
    }
}

/// Owns a [`UnifiedRegistry`] and [`ExecutionCoordinator`] pair and drives
/// their combined startup/shutdown (spec §4.5).
pub struct RegistryManager {
    config: RegistryConfig,
    registry: Arc<UnifiedRegistry>,
    coordinator: Arc<ExecutionCoordinator>,
    status: Mutex<RegistryStatus>,
    started_at: Mutex<Option<Instant>>,
    metrics_history: Mutex<Vec<MetricsSnapshot>>,
    health: Mutex<Option<HealthRecord>>,
    running: AtomicBool,
    health_task: Mutex<Option<JoinHandle<()>>>,
    metrics_task: Mutex<Option<JoinHandle<()>>>,
}

impl RegistryManager {
    /// Construct a manager around a fresh, empty registry. Adapters must
    /// be registered (via [`Self::registry`]) before [`Self::start`].
    #[must_use]
    pub fn new(config: RegistryConfig) -> Self {
        let registry = Arc::new(UnifiedRegistry::new());
        let coordinator = Arc::new(
            ExecutionCoordinator::new(Arc::clone(&registry), config.max_concurrent_executions)
                .with_result_ttl(Duration::from_secs(config.result_ttl_seconds))
                .with_cleanup_interval(Duration::from_secs(config.cleanup_interval_seconds))
                .with_default_timeout(Duration::from_secs(config.execution_timeout_seconds)),
        );
        Self {
            config,
            registry,
            coordinator,
            status: Mutex::new(RegistryStatus::Stopped),
            started_at: Mutex::new(None),
            metrics_history: Mutex::new(Vec::new()),
            health: Mutex::new(None),
            running: AtomicBool::new(false),
            health_task: Mutex::new(None),
            metrics_task: Mutex::new(None),
        }
    }

    /// The underlying catalog, for adapter registration before `start`.
    #[must_use]
    pub fn registry(&self) -> &Arc<UnifiedRegistry> {
        &self.registry
    }

    /// The underlying execution coordinator.
    #[must_use]
    pub fn coordinator(&self) -> &Arc<ExecutionCoordinator> {
        &self.coordinator
    }

    /// The effective configuration.
    #[must_use]
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Initialize every registered adapter, start the coordinator's cleanup
    /// sweep, and — unless disabled in config — the health-check and
    /// metrics loops (spec §4.5).
    ///
    /// # Errors
    ///
    /// Returns [`Error::InitError`] if any adapter fails to initialize, or
    /// [`Error::InitTimeout`] if initialization exceeds
    /// [`RegistryConfig::adapter_initialization_timeout_seconds`].
    pub async fn start(self: &Arc<Self>) -> Result<(), Error> {
        *self.status.lock() = RegistryStatus::Starting;

        let deadline = Duration::from_secs(self.config.adapter_initialization_timeout_seconds);
        let init_result = tokio::time::timeout(deadline, self.registry.initialize()).await;

        match init_result {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                *self.status.lock() = RegistryStatus::Error;
                return Err(e);
            }
            Err(_) => {
                *self.status.lock() = RegistryStatus::Error;
                return Err(Error::InitTimeout(deadline));
            }
        }

        self.coordinator.start();
        *self.started_at.lock() = Some(Instant::now());
        self.running.store(true, Ordering::SeqCst);
        *self.status.lock() = RegistryStatus::Running;

        if self.config.enable_health_check {
            self.spawn_health_loop();
        }
        if self.config.enable_metrics {
            self.spawn_metrics_loop();
        }

        info!("registry manager started");
        Ok(())
    }

    fn spawn_health_loop(self: &Arc<Self>) {
        let this = Arc::clone(self);
        let interval = Duration::from_secs(self.config.health_check_interval_seconds.max(1));
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                this.run_health_check();
            }
        });
        *self.health_task.lock() = Some(handle);
    }

    fn spawn_metrics_loop(self: &Arc<Self>) {
        let this = Arc::clone(self);
        let interval = Duration::from_secs(self.config.metrics_collection_interval_seconds.max(1));
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                this.record_metrics();
            }
        });
        *self.metrics_task.lock() = Some(handle);
    }

    /// Run one health-check sweep and record it (spec §4.5): verifies the
    /// registry is initialized, at least one framework is registered, and
    /// at least one tool is registered. Issues are degraded-not-fatal — the
    /// registry stays usable.
    pub fn run_health_check(&self) -> HealthRecord {
        let stats = self.registry.stats();
        let mut issues = Vec::new();

        if !stats.initialized {
            issues.push("Registry not initialized".to_string());
        }
        if stats.frameworks_count == 0 {
            issues.push("No frameworks registered".to_string());
        }
        if stats.total_tools == 0 {
            issues.push("No tools registered".to_string());
        }

        let record = HealthRecord {
            healthy: issues.is_empty(),
            last_check: Utc::now(),
            issues,
        };

        if !record.healthy {
            warn!(issues = ?record.issues, "registry manager health degraded");
        }
        *self.health.lock() = Some(record.clone());
        record
    }

    /// The most recent health-check record, if the loop has run (or
    /// [`Self::run_health_check`] was called directly) at least once.
    #[must_use]
    pub fn get_health_status(&self) -> Option<HealthRecord> {
        self.health.lock().clone()
    }

    /// Cancel the health-check and metrics loops, stop the coordinator, and
    /// release every adapter. Idempotent.
    pub async fn stop(&self) {
        *self.status.lock() = RegistryStatus::Stopping;
        if let Some(handle) = self.health_task.lock().take() {
            handle.abort();
        }
        if let Some(handle) = self.metrics_task.lock().take() {
            handle.abort();
        }
        self.coordinator.stop();
        self.registry.shutdown().await;
        self.running.store(false, Ordering::SeqCst);
        *self.status.lock() = RegistryStatus::Stopped;
        info!("registry manager stopped");
    }

    /// `true` once `start` has completed and `stop` has not yet run.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    fn uptime_secs(&self) -> u64 {
        self.started_at
            .lock()
            .map(|t| t.elapsed().as_secs())
            .unwrap_or(0)
    }

    /// Capture and retain a metrics snapshot, trimming history to
    /// [`RegistryConfig::metrics_history_size`] (spec §4.5).
    pub fn record_metrics(&self) -> MetricsSnapshot {
        let snapshot = MetricsSnapshot {
            uptime_secs: self.uptime_secs(),
            registry_stats: self.registry.stats(),
            coordinator_stats: self.coordinator.stats(),
        };
        let mut history = self.metrics_history.lock();
        history.push(snapshot.clone());
        if history.len() > self.config.metrics_history_size {
            let excess = history.len() - self.config.metrics_history_size;
            history.drain(0..excess);
        }
        snapshot
    }

    /// The last `limit` metrics snapshots, most recent last.
    #[must_use]
    pub fn get_metrics_history(&self, limit: usize) -> Vec<MetricsSnapshot> {
        let history = self.metrics_history.lock();
        let start = history.len().saturating_sub(limit);
        history[start..].to_vec()
    }

    /// Assemble the full status payload used by the bridge's health route
    /// (spec §4.5).
    #[must_use]
    pub fn get_comprehensive_status(&self) -> ComprehensiveStatus {
        let latest_metrics = self.metrics_history.lock().last().cloned();
        ComprehensiveStatus {
            status: *self.status.lock(),
            uptime_secs: self.uptime_secs(),
            registry_stats: self.registry.stats(),
            coordinator_stats: self.coordinator.stats(),
            latest_metrics,
            health: self.health.lock().clone(),
            config: RegistryConfigDigest::from(&self.config),
        }
    }
}

impl Drop for RegistryManager {
    fn drop(&mut self) {
        if let Some(handle) = self.health_task.lock().take() {
            handle.abort();
        }
        if let Some(handle) = self.metrics_task.lock().take() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::DemoAdapter;

    #[tokio::test]
    async fn start_initializes_registered_adapters() {
        let manager = Arc::new(RegistryManager::new(RegistryConfig::default()));
        manager
            .registry()
            .register_adapter(Arc::new(DemoAdapter::new()))
            .unwrap();
        manager.start().await.unwrap();
        assert!(manager.is_running());

        let status = manager.get_comprehensive_status();
        assert_eq!(status.status, RegistryStatus::Running);
        assert_eq!(status.registry_stats.total_tools, 2);

        manager.stop().await;
        assert!(!manager.is_running());
    }

    #[test]
    fn config_defaults_are_sane() {
        let config = RegistryConfig::default();
        assert!(config.max_concurrent_executions > 0);
    }

    #[tokio::test]
    async fn metrics_history_is_trimmed() {
        let config = RegistryConfig {
            metrics_history_size: 2,
            ..RegistryConfig::default()
        };
        let manager = Arc::new(RegistryManager::new(config));
        manager
            .registry()
            .register_adapter(Arc::new(DemoAdapter::new()))
            .unwrap();
        manager.start().await.unwrap();

        manager.record_metrics();
        manager.record_metrics();
        manager.record_metrics();

        assert_eq!(manager.get_metrics_history(10).len(), 2);
    }

    #[tokio::test]
    async fn zero_adapters_reports_degraded_health() {
        let manager = Arc::new(RegistryManager::new(RegistryConfig::default()));
        manager.start().await.unwrap();

        let record = manager.run_health_check();
        assert!(!record.healthy);
        assert!(record.issues.contains(&"No frameworks registered".to_string()));
        assert!(record.issues.contains(&"No tools registered".to_string()));
        assert!(!manager.get_health_status().unwrap().healthy);
    }
}
