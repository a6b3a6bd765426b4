//! The `demo` provider — a single `echo` tool used by the literal
//! end-to-end scenarios in spec §8 (Scenario 1: "Basic discover + execute").

use async_trait::async_trait;
use serde_json::{Value, json};

use crate::adapter::{Adapter, AdapterState, BaseAdapter, FrameworkInfo};
use crate::context::ToolExecutionContext;
use crate::model::{ToolCategory, ToolSpec};
use crate::result::ToolResult;

/// Minimal adapter exposing one `echo` tool that returns its `msg` param.
pub struct DemoAdapter {
    base: BaseAdapter,
    categories: Vec<ToolCategory>,
}

impl DemoAdapter {
    /// Construct an uninitialized demo adapter.
    #[must_use]
    pub fn new() -> Self {
        Self {
            base: BaseAdapter::new(),
            categories: vec![ToolCategory::Custom],
        }
    }
}

impl Default for DemoAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Adapter for DemoAdapter {
    fn provider_name(&self) -> &str {
        "demo"
    }

    fn supported_categories(&self) -> &[ToolCategory] {
        &self.categories
    }

    fn framework_info(&self) -> FrameworkInfo {
        FrameworkInfo {
            name: "demo".to_string(),
            version: "1.0.0".to_string(),
            description: "In-process demonstration adapter for end-to-end tests".to_string(),
            capabilities: Vec::new(),
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
        let spec = ToolSpec::new(
            "echo",
            "1.0.0",
            "Echoes its `msg` parameter back as-is",
            ToolCategory::Custom,
            self.provider_name(),
            json!({"properties": {"msg": {"type": "string"}}, "required": ["msg"]}),
            json!({"properties": {"msg": {"type": "string"}}}),
        );
        self.base.insert(spec);

        self.base.insert(ToolSpec::new(
            "sleep",
            "1.0.0",
            "Sleeps for `millis` milliseconds before returning, for exercising timeouts",
            ToolCategory::Custom,
            self.provider_name(),
            json!({"properties": {"millis": {"type": "integer"}}, "required": ["millis"]}),
            json!({"properties": {"slept_ms": {"type": "integer"}}}),
        ));

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
        match name {
            "echo" => {
                let Some(msg) = params.get("msg") else {
                    return ToolResult::failure(
                        context.execution_id.clone(),
                        name,
                        "missing required parameter: msg",
                        "invalid_params",
                    );
                };
                ToolResult::success(context.execution_id.clone(), name, json!({"msg": msg}))
            }
            "sleep" => {
                let Some(millis) = params.get("millis").and_then(serde_json::Value::as_u64) else {
                    return ToolResult::failure(
                        context.execution_id.clone(),
                        name,
                        "missing required parameter: millis",
                        "invalid_params",
                    );
                };
                tokio::time::sleep(std::time::Duration::from_millis(millis)).await;
                ToolResult::success(context.execution_id.clone(), name, json!({"slept_ms": millis}))
            }
            other => ToolResult::failure(
                context.execution_id.clone(),
                other,
                format!("unknown tool: {other}"),
                "tool_not_found",
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn echo_roundtrips_message() {
        let adapter = DemoAdapter::new();
        adapter.initialize().await.unwrap();

        let tools = adapter.discover_tools(None).await;
        assert_eq!(tools.len(), 2);
        assert!(tools.iter().any(|t| t.name == "echo"));

        let ctx = ToolExecutionContext::new();
        let result = adapter.execute_tool("echo", json!({"msg": "hi"}), &ctx).await;
        assert!(result.is_success());
        assert_eq!(result.data.unwrap()["msg"], "hi");
    }

    #[tokio::test]
    async fn missing_param_is_invalid_params() {
        let adapter = DemoAdapter::new();
        adapter.initialize().await.unwrap();
        let ctx = ToolExecutionContext::new();
        let result = adapter.execute_tool("echo", json!({}), &ctx).await;
        assert!(result.is_failed());
        assert_eq!(result.error_code.as_deref(), Some("invalid_params"));
    }
}
