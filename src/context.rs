//! Per-invocation execution context threaded through the registry,
//! coordinator, and adapter boundary.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Execution priority. A small typed scale rather than a bare integer.
/// Higher values run first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Priority(pub i32);

impl Priority {
    /// Background / best-effort work.
    pub const LOW: Self = Self(1);
    /// Default priority for unmarked requests.
    pub const NORMAL: Self = Self(5);
    /// Above-default priority.
    pub const HIGH: Self = Self(8);
    /// Time-critical work that should overtake everything else.
    pub const CRITICAL: Self = Self(10);
}

impl Default for Priority {
    fn default() -> Self {
        Self::NORMAL
    }
}

impl From<i32> for Priority {
    fn from(value: i32) -> Self {
        Self(value)
    }
}

/// Per-invocation envelope threaded through registry, coordinator, and
/// adapter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolExecutionContext {
    /// Opaque unique id, assigned at submit time.
    pub execution_id: String,
    /// Caller-supplied user id, if any.
    pub user_id: Option<String>,
    /// Caller-supplied session id, if any.
    pub session_id: Option<String>,
    /// Distributed-trace id, if any.
    pub trace_id: Option<String>,
    /// Per-call timeout override.
    pub timeout: Option<Duration>,
    /// Scheduling priority (higher runs first).
    pub priority: Priority,
    /// Number of retries already attempted.
    pub retry_count: u32,
    /// Maximum retries permitted.
    pub max_retries: u32,
    /// Free-form metadata.
    #[serde(default)]
    pub metadata: HashMap<String, Value>,
    /// When execution actually began.
    pub started_at: Option<DateTime<Utc>>,
    /// When execution finished (success, failure, or cancellation).
    pub completed_at: Option<DateTime<Utc>>,
}

impl ToolExecutionContext {
    /// Create a fresh context with a newly assigned `execution_id`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            execution_id: Uuid::new_v4().to_string(),
            user_id: None,
            session_id: None,
            trace_id: None,
            timeout: None,
            priority: Priority::NORMAL,
            retry_count: 0,
            max_retries: 3,
            metadata: HashMap::new(),
            started_at: None,
            completed_at: None,
        }
    }

    /// Attach a priority (builder-style).
    #[must_use]
    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    /// Attach a per-call timeout (builder-style).
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

impl Default for ToolExecutionContext {
    fn default() -> Self {
        Self::new()
    }
}
