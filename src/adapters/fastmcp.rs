//! Illustrative `fastmcp` adapter: MCP-protocol and integration tools.
//!
//! Shape grounded in `app/adapters/fastmcp_adapter.py` — the real adapter
//! proxies a live `FastMCP` server over JSON-RPC; this stands in with a
//! fixed catalog of MCP-shaped tools executed in-process (no real
//! subprocess/transport — that remains an external collaborator).

use async_trait::async_trait;
use serde_json::{Value, json};

use crate::adapter::{Adapter, AdapterState, BaseAdapter, FrameworkInfo};
use crate::context::ToolExecutionContext;
use crate::model::{Capability, ToolCategory, ToolSpec};
use crate::result::ToolResult;

/// In-process stand-in for a FastMCP-backed MCP server.
pub struct FastMcpAdapter {
    base: BaseAdapter,
    categories: Vec<ToolCategory>,
}

impl FastMcpAdapter {
    /// Construct an uninitialized adapter.
    #[must_use]
    pub fn new() -> Self {
        Self {
            base: BaseAdapter::new(),
            categories: vec![ToolCategory::Mcp, ToolCategory::Integration, ToolCategory::Custom],
        }
    }
}

impl Default for FastMcpAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Adapter for FastMcpAdapter {
    fn provider_name(&self) -> &str {
        "fastmcp"
    }

    fn supported_categories(&self) -> &[ToolCategory] {
        &self.categories
    }

    fn framework_info(&self) -> FrameworkInfo {
        FrameworkInfo {
            name: "fastmcp".to_string(),
            version: "1.0.0".to_string(),
            description: "MCP-protocol tool adapter".to_string(),
            capabilities: vec![Capability::McpProtocol, Capability::ToolCalling],
        }
    }

    fn state(&self) -> AdapterState {
        if self.base.is_initialized() {
            AdapterState::Ready
        } else {
            AdapterState::Uninitialized
        }
    }

    async fn initialize(&self) -> crate::Result<()> {
        self.base.insert(ToolSpec::new(
            "calculator",
            "1.0.0",
            "Evaluates a simple arithmetic expression of the form `a op b`",
            ToolCategory::Calculator,
            self.provider_name(),
            json!({"properties": {"a": {"type": "number"}, "op": {"type": "string"}, "b": {"type": "number"}}, "required": ["a", "op", "b"]}),
            json!({"properties": {"result": {"type": "number"}}}),
        ).with_capabilities(vec![Capability::McpProtocol]));

        self.base.mark_initialized();
        Ok(())
    }

    async fn shutdown(&self) {
        self.base.mark_shutdown();
    }

    async fn discover_tools(&self, categories: Option<&[ToolCategory]>) -> Vec<ToolSpec> {
        self.base.discover(categories)
    }

    async fn get_tool_spec(&self, name: &str) -> Option<ToolSpec> {
        self.base.get(name)
    }

    async fn execute_tool(
        &self,
        name: &str,
        params: Value,
        context: &ToolExecutionContext,
    ) -> ToolResult {
        if name != "calculator" {
            return ToolResult::failure(
                context.execution_id.clone(),
                name,
                format!("unknown tool: {name}"),
                "tool_not_found",
            );
        }
        let (Some(a), Some(op), Some(b)) = (
            params.get("a").and_then(Value::as_f64),
            params.get("op").and_then(Value::as_str),
            params.get("b").and_then(Value::as_f64),
        ) else {
            return ToolResult::failure(
                context.execution_id.clone(),
                name,
                "missing required parameters: a, op, b",
                "invalid_params",
            );
        };
        let result = match op {
            "+" => a + b,
            "-" => a - b,
            "*" => a * b,
            "/" if b != 0.0 => a / b,
            "/" => {
                return ToolResult::failure(
                    context.execution_id.clone(),
                    name,
                    "division by zero",
                    "execution_error",
                );
            }
            other => {
                return ToolResult::failure(
                    context.execution_id.clone(),
                    name,
                    format!("unsupported operator: {other}"),
                    "invalid_params",
                );
            }
        };
        ToolResult::success(context.execution_id.clone(), name, json!({"result": result}))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn calculator_adds() {
        let adapter = FastMcpAdapter::new();
        adapter.initialize().await.unwrap();
        let ctx = ToolExecutionContext::new();
        let result = adapter.execute_tool("calculator", json!({"a": 2, "op": "+", "b": 3}), &ctx).await;
        assert!(result.is_success());
        assert_eq!(result.data.unwrap()["result"], 5.0);
    }

    #[tokio::test]
    async fn division_by_zero_is_execution_error() {
        let adapter = FastMcpAdapter::new();
        adapter.initialize().await.unwrap();
        let ctx = ToolExecutionContext::new();
        let result = adapter.execute_tool("calculator", json!({"a": 1, "op": "/", "b": 0}), &ctx).await;
        assert!(result.is_failed());
        assert_eq!(result.error_code.as_deref(), Some("execution_error"));
    }

    #[tokio::test]
    async fn unsupported_operator_is_invalid_params() {
        let adapter = FastMcpAdapter::new();
        adapter.initialize().await.unwrap();
        let ctx = ToolExecutionContext::new();
        let result = adapter.execute_tool("calculator", json!({"a": 1, "op": "%", "b": 2}), &ctx).await;
        assert!(result.is_failed());
        assert_eq!(result.error_code.as_deref(), Some("invalid_params"));
    }
}
