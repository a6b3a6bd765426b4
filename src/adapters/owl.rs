//! Illustrative `owl` adapter: agentic search and file-management tools.
//!
//! Shape grounded in `app/adapters/owl_adapter.py` — the real adapter
//! wraps OWL's multi-toolkit agent (web search, code execution, document
//! tools); this stands in with deterministic, sandboxed equivalents.

use async_trait::async_trait;
use serde_json::{Value, json};

use crate::adapter::{Adapter, AdapterState, BaseAdapter, FrameworkInfo};
use crate::context::ToolExecutionContext;
use crate::model::{Capability, ToolCategory, ToolSpec};
use crate::result::ToolResult;

/// In-process stand-in for the OWL multi-toolkit agent framework.
pub struct OwlAdapter {
    base: BaseAdapter,
    categories: Vec<ToolCategory>,
}

impl OwlAdapter {
    /// Construct an uninitialized adapter.
    #[must_use]
    pub fn new() -> Self {
        Self {
            base: BaseAdapter::new(),
            categories: vec![
                ToolCategory::Search,
                ToolCategory::FileManagement,
                ToolCategory::Knowledge,
                ToolCategory::Integration,
                ToolCategory::Custom,
            ],
        }
    }
}

impl Default for OwlAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Adapter for OwlAdapter {
    fn provider_name(&self) -> &str {
        "owl"
    }

    fn supported_categories(&self) -> &[ToolCategory] {
        &self.categories
    }

    fn framework_info(&self) -> FrameworkInfo {
        FrameworkInfo {
            name: "owl".to_string(),
            version: "1.0.0".to_string(),
            description: "Multi-toolkit agentic search and file-management adapter".to_string(),
            capabilities: vec![Capability::MultiAgent, Capability::ToolCalling],
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
            "search",
            "1.0.0",
            "Agentic, iterative search that refines its query across rounds",
            ToolCategory::AgenticSearch,
            self.provider_name(),
            json!({"properties": {"query": {"type": "string"}, "rounds": {"type": "integer"}}, "required": ["query"]}),
            json!({"properties": {"rounds_used": {"type": "integer"}, "summary": {"type": "string"}}}),
        ).with_capabilities(vec![Capability::SemanticSearch]));

        self.base.insert(ToolSpec::new(
            "list_files",
            "1.0.0",
            "Lists file names under a virtual workspace root",
            ToolCategory::FileManagement,
            self.provider_name(),
            json!({"properties": {"path": {"type": "string"}}, "required": ["path"]}),
            json!({"properties": {"entries": {"type": "array"}}}),
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
            "search" => {
                let Some(query) = params.get("query").and_then(Value::as_str) else {
                    return ToolResult::failure(
                        context.execution_id.clone(),
                        name,
                        "missing required parameter: query",
                        "invalid_params",
                    );
                };
                let rounds = params.get("rounds").and_then(Value::as_u64).unwrap_or(1).max(1);
                ToolResult::success(
                    context.execution_id.clone(),
                    name,
                    json!({"rounds_used": rounds, "summary": format!("refined results for \"{query}\" over {rounds} round(s)")}),
                )
            }
            "list_files" => {
                let Some(path) = params.get("path").and_then(Value::as_str) else {
                    return ToolResult::failure(
                        context.execution_id.clone(),
                        name,
                        "missing required parameter: path",
                        "invalid_params",
                    );
                };
                let entries = vec![
                    format!("{path}/README.md"),
                    format!("{path}/notes.txt"),
                ];
                ToolResult::success(context.execution_id.clone(), name, json!({"entries": entries}))
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
    async fn search_reports_rounds_used() {
        let adapter = OwlAdapter::new();
        adapter.initialize().await.unwrap();
        let ctx = ToolExecutionContext::new();
        let result = adapter
            .execute_tool("search", json!({"query": "toolmesh", "rounds": 3}), &ctx)
            .await;
        assert!(result.is_success());
        assert_eq!(result.data.unwrap()["rounds_used"], 3);
    }

    #[tokio::test]
    async fn list_files_returns_virtual_entries() {
        let adapter = OwlAdapter::new();
        adapter.initialize().await.unwrap();
        let ctx = ToolExecutionContext::new();
        let result = adapter.execute_tool("list_files", json!({"path": "/workspace"}), &ctx).await;
        assert!(result.is_success());
        assert_eq!(result.data.unwrap()["entries"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn unknown_tool_is_tool_not_found() {
        let adapter = OwlAdapter::new();
        adapter.initialize().await.unwrap();
        let ctx = ToolExecutionContext::new();
        let result = adapter.execute_tool("nope", json!({}), &ctx).await;
        assert!(result.is_failed());
        assert_eq!(result.error_code.as_deref(), Some("tool_not_found"));
    }
}
