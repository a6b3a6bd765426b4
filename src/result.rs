//! Outcome envelope of one tool invocation.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Lifecycle state of one execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolStatus {
    /// Created, not yet submitted.
    Idle,
    /// Submitted, waiting for a concurrency slot.
    Pending,
    /// Currently executing.
    Running,
    /// Finished successfully.
    Completed,
    /// Finished with an error.
    Failed,
    /// Cancelled by caller or shutdown.
    Cancelled,
    /// Exceeded its wall-clock bound.
    Timeout,
}

impl ToolStatus {
    /// Whether this is a terminal failure state.
    #[must_use]
    pub const fn is_failure(self) -> bool {
        matches!(self, Self::Failed | Self::Timeout | Self::Cancelled)
    }
}

/// Outcome of one tool invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    /// Execution id this result belongs to.
    pub execution_id: String,
    /// Name of the tool that was invoked.
    pub tool_name: String,
    /// Terminal (or in-flight) status.
    pub status: ToolStatus,
    /// Opaque JSON value on success.
    pub data: Option<Value>,
    /// Human-readable error message on failure.
    pub error: Option<String>,
    /// Stable machine-readable error code.
    pub error_code: Option<String>,
    /// When the underlying adapter call began.
    pub started_at: DateTime<Utc>,
    /// When the underlying adapter call finished.
    pub completed_at: Option<DateTime<Utc>>,
    /// Wall-clock duration in milliseconds.
    pub duration_ms: Option<i64>,
    /// Free-form metadata.
    #[serde(default)]
    pub metadata: HashMap<String, Value>,
    /// Free-form trace data (span ids, adapter-internal timings, ...).
    #[serde(default)]
    pub trace_data: HashMap<String, Value>,
}

impl ToolResult {
    /// Build a successful result.
    #[must_use]
    pub fn success(execution_id: impl Into<String>, tool_name: impl Into<String>, data: Value) -> Self {
        let now = Utc::now();
        Self {
            execution_id: execution_id.into(),
            tool_name: tool_name.into(),
            status: ToolStatus::Completed,
            data: Some(data),
            error: None,
            error_code: None,
            started_at: now,
            completed_at: Some(now),
            duration_ms: Some(0),
            metadata: HashMap::new(),
            trace_data: HashMap::new(),
        }
    }

    /// Build a failed result with the given error code, matching
    /// `BaseToolAdapter._create_error_result`.
    #[must_use]
    pub fn failure(
        execution_id: impl Into<String>,
        tool_name: impl Into<String>,
        error: impl Into<String>,
        error_code: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            execution_id: execution_id.into(),
            tool_name: tool_name.into(),
            status: ToolStatus::Failed,
            data: None,
            error: Some(error.into()),
            error_code: Some(error_code.into()),
            started_at: now,
            completed_at: Some(now),
            duration_ms: None,
            metadata: HashMap::new(),
            trace_data: HashMap::new(),
        }
    }

    /// Build a timed-out result.
    #[must_use]
    pub fn timeout(execution_id: impl Into<String>, tool_name: impl Into<String>, duration_ms: i64) -> Self {
        let now = Utc::now();
        Self {
            execution_id: execution_id.into(),
            tool_name: tool_name.into(),
            status: ToolStatus::Timeout,
            data: None,
            error: Some(format!("execution exceeded its time bound ({duration_ms}ms)")),
            error_code: Some("timeout".to_string()),
            started_at: now,
            completed_at: Some(now),
            duration_ms: Some(duration_ms),
            metadata: HashMap::new(),
            trace_data: HashMap::new(),
        }
    }

    /// Build a cancelled result.
    #[must_use]
    pub fn cancelled(execution_id: impl Into<String>, tool_name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            execution_id: execution_id.into(),
            tool_name: tool_name.into(),
            status: ToolStatus::Cancelled,
            data: None,
            error: Some("execution cancelled".to_string()),
            error_code: Some("cancelled".to_string()),
            started_at: now,
            completed_at: Some(now),
            duration_ms: None,
            metadata: HashMap::new(),
            trace_data: HashMap::new(),
        }
    }

    /// Set the duration in milliseconds (builder-style; used once the
    /// caller knows the true elapsed wall-clock time).
    #[must_use]
    pub fn with_duration_ms(mut self, duration_ms: i64) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }

    /// `status == completed && error == None`.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status == ToolStatus::Completed && self.error.is_none()
    }

    /// `status ∈ {failed, timeout, cancelled}`.
    #[must_use]
    pub fn is_failed(&self) -> bool {
        self.status.is_failure()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_and_failure_predicates() {
        let ok = ToolResult::success("e1", "echo", serde_json::json!({"msg": "hi"}));
        assert!(ok.is_success());
        assert!(!ok.is_failed());

        let err = ToolResult::failure("e2", "echo", "boom", "execution_error");
        assert!(!err.is_success());
        assert!(err.is_failed());

        let to = ToolResult::timeout("e3", "echo", 1000);
        assert!(to.is_failed());
    }
}
